use kurbo::PathEl;
use xxhash_rust::xxh3::Xxh3;

use crate::assets::color::Color;
use crate::latent::grid::RgbaGrid;
use crate::scene::flatten::{DrawItem, EvaluatedFrame};

const XXH3_SEED: u64 = 0x8b5ad4a0c7d8e9f1;

/// Stable per-frame fingerprint used by static-frame elision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct FrameFingerprint {
    pub(crate) hi: u64,
    pub(crate) lo: u64,
}

/// Compute a stable fingerprint for an evaluated frame.
///
/// The frame index is not part of the hash, so a held scene elides across time.
pub(crate) fn fingerprint_frame(frame: &EvaluatedFrame) -> FrameFingerprint {
    let mut h = StableHasher::new();
    h.write_u32(frame.width);
    h.write_u32(frame.height);
    write_color(&mut h, frame.background);
    h.write_u32(frame.items.len() as u32);
    for item in &frame.items {
        write_item(&mut h, item);
    }
    h.finish()
}

/// Content hash of a pixel grid.
pub(crate) fn fingerprint_grid(grid: &RgbaGrid) -> FrameFingerprint {
    let mut h = StableHasher::new();
    write_grid(&mut h, grid);
    h.finish()
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_f32(&mut self, v: f32) {
        self.write_u32(v.to_bits());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn finish(self) -> FrameFingerprint {
        let v = self.inner.digest128();
        FrameFingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

fn write_color(h: &mut StableHasher, c: Color) {
    h.write_bytes(&c.to_array());
}

fn write_grid(h: &mut StableHasher, grid: &RgbaGrid) {
    h.write_u32(grid.width());
    h.write_u32(grid.height());
    h.write_bytes(grid.as_bytes());
}

fn write_item(h: &mut StableHasher, item: &DrawItem) {
    match item {
        DrawItem::Fill { path, color } => {
            h.write_u8(0);
            write_color(h, *color);
            h.write_u32(path.elements().len() as u32);
            for el in path.elements() {
                match *el {
                    PathEl::MoveTo(p) => {
                        h.write_u8(0);
                        h.write_f64(p.x);
                        h.write_f64(p.y);
                    }
                    PathEl::LineTo(p) => {
                        h.write_u8(1);
                        h.write_f64(p.x);
                        h.write_f64(p.y);
                    }
                    PathEl::QuadTo(p1, p2) => {
                        h.write_u8(2);
                        for p in [p1, p2] {
                            h.write_f64(p.x);
                            h.write_f64(p.y);
                        }
                    }
                    PathEl::CurveTo(p1, p2, p3) => {
                        h.write_u8(3);
                        for p in [p1, p2, p3] {
                            h.write_f64(p.x);
                            h.write_f64(p.y);
                        }
                    }
                    PathEl::ClosePath => h.write_u8(4),
                }
            }
        }
        DrawItem::Glyphs {
            shaped,
            count,
            transform,
            color,
        } => {
            h.write_u8(1);
            write_color(h, *color);
            for c in transform.as_coeffs() {
                h.write_f64(c);
            }
            h.write_u32(shaped.font.index);
            h.write_f32(shaped.font_size);
            h.write_u64(*count as u64);
            for g in shaped.glyphs.iter().take(*count) {
                h.write_u32(g.id);
                h.write_f32(g.x);
                h.write_f32(g.y);
            }
        }
        DrawItem::Image {
            grid,
            rect,
            opacity,
        } => {
            h.write_u8(2);
            write_grid(h, grid);
            for v in [rect.x0, rect.y0, rect.x1, rect.y1, *opacity] {
                h.write_f64(v);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/fingerprint.rs"]
mod tests;
