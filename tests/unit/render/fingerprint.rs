use super::*;
use crate::foundation::core::Rect;
use kurbo::Shape;
use std::sync::Arc;

fn frame(color: Color, opacity: f64) -> EvaluatedFrame {
    let grid = RgbaGrid::from_fn(2, 2, |x, y| [x as u8, y as u8, 0, 255]);
    EvaluatedFrame {
        width: 16,
        height: 16,
        background: Color::rgb(1, 2, 3),
        items: vec![
            DrawItem::Fill {
                path: Rect::new(1.0, 1.0, 5.0, 5.0).to_path(0.1),
                color,
            },
            DrawItem::Image {
                grid: Arc::new(grid),
                rect: Rect::new(0.0, 0.0, 8.0, 8.0),
                opacity,
            },
        ],
    }
}

#[test]
fn identical_frames_share_a_fingerprint() {
    let a = fingerprint_frame(&frame(Color::WHITE, 1.0));
    let b = fingerprint_frame(&frame(Color::WHITE, 1.0));
    assert_eq!(a, b);
}

#[test]
fn paint_and_opacity_changes_are_detected() {
    let base = fingerprint_frame(&frame(Color::WHITE, 1.0));
    assert_ne!(base, fingerprint_frame(&frame(Color::GRAY, 1.0)));
    assert_ne!(base, fingerprint_frame(&frame(Color::WHITE, 0.5)));
}

#[test]
fn background_is_part_of_the_fingerprint() {
    let a = frame(Color::WHITE, 1.0);
    let mut b = a.clone();
    b.background = Color::rgb(3, 2, 1);
    assert_ne!(fingerprint_frame(&a), fingerprint_frame(&b));
}

#[test]
fn grid_fingerprint_follows_content() {
    let a = RgbaGrid::from_fn(3, 3, |x, _| [x as u8, 0, 0, 255]);
    let b = RgbaGrid::from_fn(3, 3, |x, _| [x as u8, 0, 0, 255]);
    let mut c = b.clone();
    c.set_pixel(2, 2, [9, 9, 9, 255]);
    assert_eq!(fingerprint_grid(&a), fingerprint_grid(&b));
    assert_ne!(fingerprint_grid(&a), fingerprint_grid(&c));

    let wide = RgbaGrid::new(4, 1);
    let tall = RgbaGrid::new(1, 4);
    assert_ne!(fingerprint_grid(&wide), fingerprint_grid(&tall));
}
