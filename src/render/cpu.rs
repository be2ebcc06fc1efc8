use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::color::Color;
use crate::foundation::core::{Affine, BezPath, Canvas};
use crate::foundation::error::{ReelError, ReelResult};
use crate::latent::grid::RgbaGrid;
use crate::render::backend::{FrameRGBA, RenderBackend, RenderSettings};
use crate::render::fingerprint::fingerprint_grid;
use crate::scene::flatten::{DrawItem, EvaluatedFrame};

const IMAGE_CACHE_LIMIT: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct ImageKey {
    hi: u64,
    lo: u64,
    w: u32,
    h: u32,
}

/// CPU raster backend powered by `vello_cpu`.
///
/// Latent images are upscaled nearest-neighbour to their on-screen pixel size and drawn 1:1, so
/// they keep hard pixel edges.
pub struct CpuBackend {
    settings: RenderSettings,
    ctx: Option<vello_cpu::RenderContext>,
    image_cache: HashMap<ImageKey, vello_cpu::Image>,
}

impl CpuBackend {
    /// Create a backend with the given settings.
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            ctx: None,
            image_cache: HashMap::new(),
        }
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut Self, &mut vello_cpu::RenderContext) -> ReelResult<R>,
    ) -> ReelResult<R> {
        let mut ctx = match self.ctx.take() {
            None => vello_cpu::RenderContext::new(width, height),
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            Some(_) => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(self, &mut ctx)?;
        self.ctx = Some(ctx);
        Ok(out)
    }

    fn image_paint(&mut self, grid: &RgbaGrid, w: u32, h: u32) -> ReelResult<vello_cpu::Image> {
        let fp = fingerprint_grid(grid);
        let key = ImageKey {
            hi: fp.hi,
            lo: fp.lo,
            w,
            h,
        };
        if let Some(img) = self.image_cache.get(&key) {
            return Ok(img.clone());
        }

        let scaled = grid.upscale_nearest(w, h);
        let img = rgba_straight_to_image_premul(scaled.as_bytes(), w, h)?;
        if self.image_cache.len() >= IMAGE_CACHE_LIMIT {
            self.image_cache.clear();
        }
        self.image_cache.insert(key, img.clone());
        Ok(img)
    }

    fn draw_item(
        &mut self,
        item: &DrawItem,
        ctx: &mut vello_cpu::RenderContext,
    ) -> ReelResult<()> {
        match item {
            DrawItem::Fill { path, color } => {
                ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.set_paint(to_cpu_color(*color));
                ctx.fill_path(&bezpath_to_cpu(path));
            }
            DrawItem::Glyphs {
                shaped,
                count,
                transform,
                color,
            } => {
                ctx.set_transform(affine_to_cpu(*transform));
                ctx.set_paint(to_cpu_color(*color));
                let glyphs = shaped.glyphs.iter().take(*count).map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&shaped.font)
                    .font_size(shaped.font_size)
                    .fill_glyphs(glyphs);
            }
            DrawItem::Image {
                grid,
                rect,
                opacity,
            } => {
                let x0 = rect.x0.round();
                let y0 = rect.y0.round();
                let w = (rect.x1.round() - x0).max(0.0) as u32;
                let h = (rect.y1.round() - y0).max(0.0) as u32;
                if w == 0 || h == 0 || *opacity <= 0.0 {
                    return Ok(());
                }
                let img = self.image_paint(grid, w, h)?;

                ctx.set_transform(affine_to_cpu(Affine::translate((x0, y0))));
                ctx.set_paint(img);
                let opacity = *opacity as f32;
                if opacity < 1.0 {
                    ctx.push_opacity_layer(opacity);
                }
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    0.0,
                    0.0,
                    f64::from(w),
                    f64::from(h),
                ));
                if opacity < 1.0 {
                    ctx.pop_layer();
                }
            }
        }
        Ok(())
    }
}

impl RenderBackend for CpuBackend {
    #[tracing::instrument(skip_all, fields(items = frame.items.len()))]
    fn render(&mut self, frame: &EvaluatedFrame) -> ReelResult<FrameRGBA> {
        Canvas {
            width: frame.width,
            height: frame.height,
        }
        .validate()?;
        let w: u16 = frame
            .width
            .try_into()
            .map_err(|_| ReelError::evaluation("frame width exceeds u16"))?;
        let h: u16 = frame
            .height
            .try_into()
            .map_err(|_| ReelError::evaluation("frame height exceeds u16"))?;

        let background = match self.settings.clear_rgba {
            Some([r, g, b, a]) => Color { r, g, b, a },
            None => frame.background,
        };

        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        self.with_ctx_mut(w, h, |this, ctx| {
            if background.a > 0 {
                ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.set_paint(to_cpu_color(background));
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    0.0,
                    0.0,
                    f64::from(w),
                    f64::from(h),
                ));
            }
            for item in &frame.items {
                this.draw_item(item, ctx)?;
            }
            ctx.flush();
            ctx.render_to_pixmap(&mut pixmap);
            Ok(())
        })?;

        Ok(FrameRGBA {
            width: frame.width,
            height: frame.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    fn worker_render_settings(&self) -> Option<RenderSettings> {
        Some(self.settings.clone())
    }
}

fn to_cpu_color(c: Color) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn rgba_straight_to_image_premul(
    bytes_rgba: &[u8],
    width: u32,
    height: u32,
) -> ReelResult<vello_cpu::Image> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ReelError::evaluation("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ReelError::evaluation("image height exceeds u16"))?;
    if bytes_rgba.len() != (width as usize) * (height as usize) * 4 {
        return Err(ReelError::evaluation("image byte len mismatch"));
    }

    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    let mut opaque = true;
    for px in bytes_rgba.chunks_exact(4) {
        let p = premultiply_px([px[0], px[1], px[2], px[3]]);
        opaque &= p[3] == 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array(p));
    }
    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, !opaque);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

pub(crate) fn premultiply_px(px: [u8; 4]) -> [u8; 4] {
    let a = u16::from(px[3]);
    if a == 0 {
        return [0, 0, 0, 0];
    }
    let m = |c: u8| crate::foundation::math::mul_div255_u8(u16::from(c), a);
    [m(px[0]), m(px[1]), m(px[2]), px[3]]
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
