//! Immutable run configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all) yields the stock
//! 1080×1920 @ 60 fps explainer.

use std::path::{Path, PathBuf};

use crate::assets::color::Color;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ReelError, ReelResult};

/// Named colors used by the explainer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Palette {
    /// Frame background.
    pub background: Color,
    /// Cyan accents: panel outline, cursor, embedding numbers, attention lines.
    pub primary: Color,
    /// Pink accents: tokens, U-Net blocks, scan line.
    pub secondary: Color,
    /// Gold accents: bottleneck block, timestep label.
    pub accent: Color,
    /// Input panel fill.
    pub glass: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Color::rgb(0x0a, 0x0a, 0x0a),
            primary: Color::rgb(0x00, 0xf3, 0xff),
            secondary: Color::rgb(0xff, 0x00, 0xaa),
            accent: Color::rgb(0xff, 0xd7, 0x00),
            glass: Color::rgb(0x1a, 0x1a, 0x1a),
        }
    }
}

/// Font selection.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontConfig {
    /// Family name or generic family (`Monospace`, `SansSerif`, `Serif`).
    pub family: String,
    /// Extra directories scanned for `.ttf`/`.otf`/`.ttc` files.
    pub font_dirs: Vec<PathBuf>,
    /// Whether to load system fonts.
    pub system_fonts: bool,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: "Monospace".to_owned(),
            font_dirs: Vec::new(),
            system_fonts: true,
        }
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReelConfig {
    /// Output size in pixels.
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: Fps,
    /// Colors.
    pub palette: Palette,
    /// Fonts.
    pub fonts: FontConfig,
    /// Prompt typed into the input panel; words are split on `", "`.
    pub prompt: String,
    /// Seed for every random draw in the run. `None` draws a fresh one.
    pub seed: Option<u64>,
    /// Side length of the latent grids in pixels.
    pub latent_size: u32,
    /// Scene units spanning the canvas width.
    pub units_per_width: f64,
}

impl Default for ReelConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas {
                width: 1080,
                height: 1920,
            },
            fps: Fps { num: 60, den: 1 },
            palette: Palette::default(),
            fonts: FontConfig::default(),
            prompt: "cyberpunk city, neon lights, 8k".to_owned(),
            seed: None,
            latent_size: 64,
            units_per_width: 6.75,
        }
    }
}

impl ReelConfig {
    /// Read and validate a JSON config file.
    pub fn from_json_file(path: &Path) -> ReelResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            ReelError::validation(format!("read config '{}': {e}", path.display()))
        })?;
        Self::from_json_slice(&bytes)
    }

    /// Parse and validate JSON config bytes.
    pub fn from_json_slice(bytes: &[u8]) -> ReelResult<Self> {
        let cfg: Self =
            serde_json::from_slice(bytes).map_err(|e| ReelError::serde(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check ranges that the renderer and timeline rely on.
    pub fn validate(&self) -> ReelResult<()> {
        self.canvas.validate()?;
        Fps::new(self.fps.num, self.fps.den)?;
        if self.latent_size == 0 {
            return Err(ReelError::validation("latent_size must be > 0"));
        }
        if !self.units_per_width.is_finite() || self.units_per_width <= 0.0 {
            return Err(ReelError::validation(
                "units_per_width must be finite and > 0",
            ));
        }
        if self.prompt.is_empty() {
            return Err(ReelError::validation("prompt must be non-empty"));
        }
        Ok(())
    }

    /// Pixels per scene unit.
    pub fn pixels_per_unit(&self) -> f64 {
        f64::from(self.canvas.width) / self.units_per_width
    }

    /// The configured seed, or a freshly drawn one.
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| fastrand::u64(..))
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
