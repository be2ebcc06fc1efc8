use std::path::{Path, PathBuf};

use crate::encode::sink::{FrameSink, SinkConfig, ensure_parent_dir};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ReelError, ReelResult};
use crate::latent::grid::RgbaGrid;
use crate::render::backend::FrameRGBA;

/// Writes each pushed frame as `<dir>/<prefix><index:06>.png` with straight alpha.
pub struct PngSequenceSink {
    dir: PathBuf,
    prefix: String,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
    written: u64,
}

impl PngSequenceSink {
    /// Sink writing into `dir` with the `frame_` prefix.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: "frame_".to_owned(),
            cfg: None,
            last_idx: None,
            written: 0,
        }
    }

    /// Replace the file name prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Path the frame `idx` is written to.
    pub fn frame_path(&self, idx: FrameIndex) -> PathBuf {
        self.dir.join(format!("{}{:06}.png", self.prefix, idx.0))
    }

    /// Number of files written since the last `begin`.
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        use anyhow::Context as _;
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create png directory '{}'", self.dir.display()))?;
        self.cfg = Some(cfg);
        self.last_idx = None;
        self.written = 0;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ReelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ReelError::encode("png sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(ReelError::encode(
                "png sink received out-of-order frame index",
            ));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(ReelError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        self.last_idx = Some(idx);
        write_frame_png(&self.frame_path(idx), frame)?;
        self.written += 1;
        Ok(())
    }

    fn end(&mut self) -> ReelResult<()> {
        tracing::info!(dir = %self.dir.display(), frames = self.written, "png sequence written");
        self.cfg = None;
        Ok(())
    }
}

/// Write a rendered frame as PNG, converting premultiplied pixels to straight alpha.
pub fn write_frame_png(path: &Path, frame: &FrameRGBA) -> ReelResult<()> {
    let data = if frame.premultiplied {
        let mut out = frame.data.clone();
        for px in out.chunks_exact_mut(4) {
            let straight = unpremultiply_px([px[0], px[1], px[2], px[3]]);
            px.copy_from_slice(&straight);
        }
        out
    } else {
        frame.data.clone()
    };
    write_rgba_png(path, frame.width, frame.height, data)
}

/// Write a latent grid as PNG, optionally upscaled (nearest) by an integer factor.
pub fn write_grid_png(path: &Path, grid: &RgbaGrid, scale: u32) -> ReelResult<()> {
    let scale = scale.max(1);
    let scaled = if scale == 1 {
        grid.clone()
    } else {
        grid.upscale_nearest(grid.width() * scale, grid.height() * scale)
    };
    let (w, h) = (scaled.width(), scaled.height());
    write_rgba_png(path, w, h, scaled.into_bytes())
}

fn write_rgba_png(path: &Path, width: u32, height: u32, data: Vec<u8>) -> ReelResult<()> {
    ensure_parent_dir(path)?;
    let img = image::RgbaImage::from_raw(width, height, data)
        .ok_or_else(|| ReelError::encode("png buffer does not match width*height*4"))?;
    img.save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| ReelError::encode(format!("write png '{}': {e}", path.display())))?;
    Ok(())
}

pub(crate) fn unpremultiply_px(px: [u8; 4]) -> [u8; 4] {
    let a = u32::from(px[3]);
    match a {
        0 => [0, 0, 0, 0],
        255 => px,
        _ => {
            let u = |c: u8| ((u32::from(c) * 255 + a / 2) / a).min(255) as u8;
            [u(px[0]), u(px[1]), u(px[2]), px[3]]
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/png.rs"]
mod tests;
