use super::*;
use serde_json::json;

#[test]
fn parses_hex_rgb_and_rgba() {
    let c: Color = serde_json::from_value(json!("#00f3ff")).unwrap();
    assert_eq!(c, Color::rgb(0, 0xf3, 0xff));

    let c: Color = serde_json::from_value(json!("#0000FF80")).unwrap();
    assert_eq!(c.to_array(), [0, 0, 255, 128]);
}

#[test]
fn parses_byte_arrays() {
    let c: Color = serde_json::from_value(json!([10, 20, 30])).unwrap();
    assert_eq!(c, Color::rgb(10, 20, 30));
    assert!(serde_json::from_value::<Color>(json!([1, 2])).is_err());
}

#[test]
fn rejects_bad_hex() {
    assert!(Color::from_hex("#12345").is_err());
    assert!(Color::from_hex("#gg0000").is_err());
    assert!(Color::from_hex("#ééé").is_err());
}

#[test]
fn hex_serialization_roundtrips() {
    let c = Color::rgb(0x0a, 0x0a, 0x0a);
    assert_eq!(serde_json::to_value(c).unwrap(), json!("#0a0a0a"));
    let half = Color { a: 0x80, ..c };
    assert_eq!(half.to_hex(), "#0a0a0a80");
}
