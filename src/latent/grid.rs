use crate::foundation::error::{ReelError, ReelResult};

/// A row-major grid of straight-alpha RGBA8 pixels.
///
/// Shape is always `height × width × 4`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaGrid {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RgbaGrid {
    /// Allocate a grid filled with transparent black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; (width as usize) * (height as usize) * 4],
        }
    }

    /// Wrap raw RGBA8 bytes, validating the length against `width × height × 4`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> ReelResult<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if data.len() != expected {
            return Err(ReelError::validation(format!(
                "rgba grid byte len mismatch: got {}, expected {expected} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a grid by evaluating `f(x, y)` for every pixel in row-major order.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 4]) -> Self {
        let mut grid = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                grid.set_pixel(x, y, f(x, y));
            }
        }
        grid
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(height, width, channels)`.
    pub fn shape(&self) -> (u32, u32, usize) {
        (self.height, self.width, 4)
    }

    /// Borrow the raw RGBA8 bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the grid and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }

    /// Read one pixel. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Write one pixel. Panics when out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, px: [u8; 4]) {
        let i = self.offset(x, y);
        self.data[i..i + 4].copy_from_slice(&px);
    }

    /// Iterate pixels as `[r, g, b, a]` slices in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(4)
    }

    /// Resample to `width × height` with nearest-neighbour sampling.
    ///
    /// Output pixel `(x, y)` reads source pixel `(x·sw/width, y·sh/height)`, so every source
    /// texel becomes a hard-edged block.
    pub fn upscale_nearest(&self, width: u32, height: u32) -> Self {
        if self.width == 0 || self.height == 0 {
            return Self::new(width, height);
        }
        let sw = u64::from(self.width);
        let sh = u64::from(self.height);
        let dw = u64::from(width.max(1));
        let dh = u64::from(height.max(1));

        let mut out = Self::new(width, height);
        for y in 0..height {
            let sy = ((u64::from(y) * sh) / dh).min(sh - 1) as u32;
            let src_row = self.offset(0, sy);
            let dst_row = out.offset(0, y);
            for x in 0..width {
                let sx = ((u64::from(x) * sw) / dw).min(sw - 1) as usize;
                let s = src_row + sx * 4;
                let d = dst_row + (x as usize) * 4;
                out.data[d..d + 4].copy_from_slice(&self.data[s..s + 4]);
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/latent/grid.rs"]
mod tests;
