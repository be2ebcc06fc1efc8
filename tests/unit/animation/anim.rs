use super::*;

#[test]
fn point_lerp_midpoint() {
    let p = <Point as Lerp>::lerp(&Point::new(0.0, 10.0), &Point::new(4.0, -2.0), 0.5);
    assert_eq!(p, Point::new(2.0, 4.0));
}

#[test]
fn color_lerp_rounds_channels() {
    let a = Color::rgb(0, 0, 0);
    let b = Color::rgb(255, 100, 1);
    let c = Color::lerp(&a, &b, 0.5);
    assert_eq!((c.r, c.g, c.b, c.a), (128, 50, 1, 255));
}

