//! Placement helpers over scene-space bounds (y grows upward).

use crate::foundation::core::{Canvas, Point, Rect, Vec2};

/// Gap used by `next_to` when no explicit buffer is given.
pub const DEFAULT_BUFF: f64 = 0.25;
/// Gap used by `to_corner` when no explicit buffer is given.
pub const CORNER_BUFF: f64 = 0.5;

/// Side or corner of a box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// +y.
    Up,
    /// -y.
    Down,
    /// -x.
    Left,
    /// +x.
    Right,
    /// Upper-left corner.
    UpLeft,
}

impl Direction {
    /// Unit-ish step `(-1|0|1, -1|0|1)`.
    pub fn step(self) -> Vec2 {
        match self {
            Self::Up => Vec2::new(0.0, 1.0),
            Self::Down => Vec2::new(0.0, -1.0),
            Self::Left => Vec2::new(-1.0, 0.0),
            Self::Right => Vec2::new(1.0, 0.0),
            Self::UpLeft => Vec2::new(-1.0, 1.0),
        }
    }
}

/// The visible frame in scene units: `units_per_width` wide, centered on the origin.
pub fn frame_rect(canvas: Canvas, units_per_width: f64) -> Rect {
    let w = units_per_width;
    let h = units_per_width * f64::from(canvas.height) / f64::from(canvas.width);
    Rect::from_center_size(Point::ORIGIN, (w, h))
}

/// Point on the boundary of `r` in direction `dir` (edge midpoints and corners).
pub fn anchor(r: Rect, dir: Direction) -> Point {
    let c = r.center();
    let s = dir.step();
    Point::new(c.x + s.x * r.width() / 2.0, c.y + s.y * r.height() / 2.0)
}

/// Center for a box of `size` placed beside `target` in direction `dir`, `buff` apart.
///
/// The axis not named by `dir` keeps the target's center.
pub fn next_to(target: Rect, size: Vec2, dir: Direction, buff: f64) -> Point {
    let c = target.center();
    let s = dir.step();
    let x = if s.x == 0.0 {
        c.x
    } else {
        c.x + s.x * (target.width() / 2.0 + buff + size.x / 2.0)
    };
    let y = if s.y == 0.0 {
        c.y
    } else {
        c.y + s.y * (target.height() / 2.0 + buff + size.y / 2.0)
    };
    Point::new(x, y)
}

/// Center that pushes `bounds` against the frame edge (or corner) named by `dir`, `buff` inside.
///
/// Axes not named by `dir` keep the current center.
pub fn to_edge(frame: Rect, bounds: Rect, dir: Direction, buff: f64) -> Point {
    let c = bounds.center();
    let s = dir.step();
    let x = if s.x < 0.0 {
        frame.x0 + buff + bounds.width() / 2.0
    } else if s.x > 0.0 {
        frame.x1 - buff - bounds.width() / 2.0
    } else {
        c.x
    };
    let y = if s.y < 0.0 {
        frame.y0 + buff + bounds.height() / 2.0
    } else if s.y > 0.0 {
        frame.y1 - buff - bounds.height() / 2.0
    } else {
        c.y
    };
    Point::new(x, y)
}

/// Bounds after scaling `r` by `factor` about its own center.
pub fn scale_about_center(r: Rect, factor: f64) -> Rect {
    Rect::from_center_size(r.center(), (r.width() * factor, r.height() * factor))
}

/// Center offsets for items of the given widths laid out left to right, `buff` apart, with the
/// row centered on zero.
pub fn arrange_row(widths: &[f64], buff: f64) -> Vec<f64> {
    let total: f64 = widths.iter().sum::<f64>() + buff * widths.len().saturating_sub(1) as f64;
    let mut cursor = -total / 2.0;
    widths
        .iter()
        .map(|w| {
            let c = cursor + w / 2.0;
            cursor += w + buff;
            c
        })
        .collect()
}

/// Center offsets for items of the given heights stacked top to bottom, `buff` apart, with the
/// column centered on zero.
pub fn arrange_column(heights: &[f64], buff: f64) -> Vec<f64> {
    arrange_row(heights, buff).into_iter().map(|c| -c).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/scene/layout.rs"]
mod tests;
