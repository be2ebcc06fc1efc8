use super::*;

#[test]
fn mul_div255_endpoints() {
    assert_eq!(mul_div255_u8(255, 255), 255);
    assert_eq!(mul_div255_u8(255, 0), 0);
    assert_eq!(mul_div255_u8(128, 255), 128);
}

#[test]
fn scale_u8_clamps_opacity() {
    assert_eq!(scale_u8(200, 0.5), 100);
    assert_eq!(scale_u8(200, 2.0), 200);
    assert_eq!(scale_u8(200, -1.0), 0);
}
