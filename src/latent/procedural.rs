//! Procedural latents: a uniform noise field, a synthetic "decoded" target, and the blend between
//! them that stands in for denoising.

use crate::foundation::error::{ReelError, ReelResult};
use crate::latent::grid::RgbaGrid;

/// Background above the horizon.
pub const SKY_RGB: [u8; 3] = [10, 0, 30];
/// Base color below the horizon.
pub const GROUND_RGB: [u8; 3] = [20, 20, 40];
/// Cyan speckle.
pub const NEON_CYAN_RGB: [u8; 3] = [0, 240, 255];
/// Pink speckle.
pub const NEON_PINK_RGB: [u8; 3] = [255, 0, 170];
/// The "sun" disc.
pub const HIGHLIGHT_RGB: [u8; 3] = [255, 100, 50];

const HIGHLIGHT_RADIUS_SQ: f64 = 20.0;
const SPECKLE_THRESHOLD: f64 = 0.8;

/// Deterministic region of a target-image pixel, before speckling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatternRegion {
    /// Above the sine horizon.
    Sky,
    /// Below the sine horizon; eligible for neon speckles.
    Ground,
    /// Inside the highlight disc (wins over both other regions).
    Highlight,
}

/// Classify pixel `(x, y)` of a `size × size` target image.
///
/// The horizon is `y > size/2 + 5·sin(x/5)` with integer `size/2`. The highlight disc is centered
/// at `(0.8·size, 0.2·size)` with squared radius 20.
pub fn pattern_region(size: u32, x: u32, y: u32) -> PatternRegion {
    let fx = f64::from(x);
    let fy = f64::from(y);
    let s = f64::from(size);

    let dx = fx - s * 0.8;
    let dy = fy - s * 0.2;
    if dx * dx + dy * dy < HIGHLIGHT_RADIUS_SQ {
        return PatternRegion::Highlight;
    }

    if below_horizon(size, x, y) {
        PatternRegion::Ground
    } else {
        PatternRegion::Sky
    }
}

/// A `size × size` grid with every RGB channel drawn uniformly from `[0, 255]` and alpha 255.
pub fn noise_image(size: u32, rng: &mut fastrand::Rng) -> RgbaGrid {
    RgbaGrid::from_fn(size, size, |_, _| [rng.u8(..), rng.u8(..), rng.u8(..), 255])
}

/// The synthetic target image the denoising animation converges to.
///
/// Ground pixels off the 4/6-pixel grid lines turn cyan or pink with ~20% probability, the
/// choice between the two being a fair coin. Alpha is always 255.
pub fn pattern_image(size: u32, rng: &mut fastrand::Rng) -> RgbaGrid {
    RgbaGrid::from_fn(size, size, |x, y| {
        let mut rgb = SKY_RGB;

        // Speckle draws also happen under the highlight disc.
        if below_horizon(size, x, y) {
            rgb = GROUND_RGB;
            if x % 4 != 0 && y % 6 != 0 && rng.f64() > SPECKLE_THRESHOLD {
                rgb = if rng.f64() > 0.5 {
                    NEON_CYAN_RGB
                } else {
                    NEON_PINK_RGB
                };
            }
        }
        if pattern_region(size, x, y) == PatternRegion::Highlight {
            rgb = HIGHLIGHT_RGB;
        }

        [rgb[0], rgb[1], rgb[2], 255]
    })
}

fn below_horizon(size: u32, x: u32, y: u32) -> bool {
    f64::from(y) > f64::from(size / 2) + (f64::from(x) / 5.0).sin() * 5.0
}

/// Blend `noise` toward `target`: `round(noise·(1-alpha) + target·alpha)` per RGB channel.
///
/// The output alpha channel is always 255. `alpha` is clamped to `[0, 1]`.
pub fn interpolate(noise: &RgbaGrid, target: &RgbaGrid, alpha: f64) -> ReelResult<RgbaGrid> {
    if noise.shape() != target.shape() {
        let (nh, nw, _) = noise.shape();
        let (th, tw, _) = target.shape();
        return Err(ReelError::validation(format!(
            "interpolate expects equal shapes, got {nw}x{nh} and {tw}x{th}"
        )));
    }
    if !alpha.is_finite() {
        return Err(ReelError::validation("interpolate alpha must be finite"));
    }
    let alpha = alpha.clamp(0.0, 1.0);
    let inv = 1.0 - alpha;

    let mut out = Vec::with_capacity(noise.as_bytes().len());
    for (n, t) in noise.pixels().zip(target.pixels()) {
        for c in 0..3 {
            let v = f64::from(n[c]) * inv + f64::from(t[c]) * alpha;
            out.push(v.round().clamp(0.0, 255.0) as u8);
        }
        out.push(255);
    }
    RgbaGrid::from_raw(noise.width(), noise.height(), out)
}

/// The noise/target pair shown during the denoising sequence.
#[derive(Clone, Debug)]
pub struct LatentPair {
    /// Starting point, `x_T`.
    pub noise: RgbaGrid,
    /// What the sequence converges to.
    pub target: RgbaGrid,
}

impl LatentPair {
    /// Generate both grids from one random source, noise first.
    pub fn generate(size: u32, rng: &mut fastrand::Rng) -> Self {
        let noise = noise_image(size, rng);
        let target = pattern_image(size, rng);
        Self { noise, target }
    }

    /// The latent shown at blend factor `alpha`.
    pub fn blend(&self, alpha: f64) -> ReelResult<RgbaGrid> {
        interpolate(&self.noise, &self.target, alpha)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/latent/procedural.rs"]
mod tests;
