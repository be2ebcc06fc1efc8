//! Scene → pixel-space draw list.

use std::sync::Arc;

use kurbo::{PathEl, Shape as _};

use crate::animation::anim::Lerp;
use crate::assets::color::Color;
use crate::assets::text::ShapedGlyphs;
use crate::foundation::core::{Affine, BezPath, Canvas, Point, Rect, Vec2};
use crate::foundation::error::ReelResult;
use crate::foundation::math::scale_u8;
use crate::latent::grid::RgbaGrid;
use crate::scene::model::{NodeId, NodeKind, Scene, Tint};

const FLATTEN_TOLERANCE_PX: f64 = 0.1;
const ARROW_TIP_UNITS: f64 = 0.35;
const ARROW_TIP_MAX_RATIO: f64 = 0.25;

/// One primitive in output pixel space (y down). Colors are straight RGBA with all opacity
/// multipliers folded into alpha.
#[derive(Clone, Debug)]
pub enum DrawItem {
    /// Non-zero fill of a path.
    Fill {
        /// Path in pixels.
        path: BezPath,
        /// Paint.
        color: Color,
    },
    /// The first `count` glyphs of a shaped block.
    Glyphs {
        /// Shaped glyphs.
        shaped: Arc<ShapedGlyphs>,
        /// How many glyphs to draw.
        count: usize,
        /// Block-space (top-left origin) to pixel transform.
        transform: Affine,
        /// Paint.
        color: Color,
    },
    /// Nearest-neighbour image stretched over `rect`.
    Image {
        /// Source pixels (straight alpha).
        grid: Arc<RgbaGrid>,
        /// Destination in pixels.
        rect: Rect,
        /// Opacity in `[0, 1]`.
        opacity: f64,
    },
}

/// Everything needed to rasterize one frame.
#[derive(Clone, Debug)]
pub struct EvaluatedFrame {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Background fill.
    pub background: Color,
    /// Draw list in painter order.
    pub items: Vec<DrawItem>,
}

/// Affine from scene units (y up, origin at center) to pixels (y down, origin top-left).
pub fn scene_to_pixels(canvas: Canvas, pixels_per_unit: f64) -> Affine {
    Affine::new([
        pixels_per_unit,
        0.0,
        0.0,
        -pixels_per_unit,
        f64::from(canvas.width) / 2.0,
        f64::from(canvas.height) / 2.0,
    ])
}

/// Flatten the staged nodes of `scene` into a draw list.
pub fn flatten(scene: &Scene, canvas: Canvas, background: Color) -> ReelResult<EvaluatedFrame> {
    let mut ctx = FlattenCtx {
        scene,
        to_px: scene_to_pixels(canvas, scene.pixels_per_unit()),
        ppu: scene.pixels_per_unit(),
        items: Vec::new(),
    };
    for &id in scene.stage() {
        ctx.node(id)?;
    }
    Ok(EvaluatedFrame {
        width: canvas.width,
        height: canvas.height,
        background,
        items: ctx.items,
    })
}

struct FlattenCtx<'a> {
    scene: &'a Scene,
    to_px: Affine,
    ppu: f64,
    items: Vec<DrawItem>,
}

impl FlattenCtx<'_> {
    fn node(&mut self, id: NodeId) -> ReelResult<()> {
        let node = self.scene.node(id)?;
        if let NodeKind::Group { children } = &node.kind {
            for &c in children {
                self.node(c)?;
            }
            return Ok(());
        }

        let opacity = self.scene.world_opacity(id)?;
        let reveal = self.scene.world_reveal(id)?;
        if opacity <= 0.0 || reveal <= 0.0 {
            return Ok(());
        }
        let tint = self.scene.world_tint(id)?;
        let scale = self.scene.world_scale(id)?;
        let affine = self.to_px * self.scene.world_affine(id)?;
        let center_px = affine * Point::ORIGIN;

        match &node.kind {
            NodeKind::Rect {
                width,
                height,
                corner_radius,
            } => {
                let (w, h) = (*width, *height);
                let local = if *corner_radius > 0.0 {
                    kurbo::RoundedRect::new(-w / 2.0, -h / 2.0, w / 2.0, h / 2.0, *corner_radius)
                        .to_path(FLATTEN_TOLERANCE_PX / self.ppu)
                } else {
                    Rect::new(-w / 2.0, -h / 2.0, w / 2.0, h / 2.0).to_path(0.0)
                };
                let mut path = local;
                path.apply_affine(affine);

                if let Some(fill) = node.style.fill {
                    let color = paint(fill.color, tint, fill.opacity * opacity * reveal);
                    self.push_fill(path.clone(), color);
                }
                if let Some(stroke) = node.style.stroke {
                    let outline = if reveal < 1.0 {
                        partial_outline(&path, reveal)
                    } else {
                        path
                    };
                    let color = paint(stroke.color, tint, stroke.opacity * opacity);
                    let dash = stroke.dash.map(|(on, off)| {
                        (on * self.ppu * scale, off * self.ppu * scale)
                    });
                    self.push_stroke(&outline, stroke.width_pt, dash, color);
                }
            }
            NodeKind::Line { from, to, tip } => {
                let Some(stroke) = node.style.stroke else {
                    return Ok(());
                };
                let p0 = affine * from.to_point();
                let full_end = affine * to.to_point();
                let end = <Point as Lerp>::lerp(&p0, &full_end, reveal);
                let color = paint(stroke.color, tint, stroke.opacity * opacity);

                let seg = end - p0;
                let len = seg.hypot();
                let mut shaft_end = end;
                if *tip && len > 0.0 {
                    let tip_len =
                        (ARROW_TIP_UNITS * self.ppu * scale).min(ARROW_TIP_MAX_RATIO * len);
                    let dir = seg / len;
                    shaft_end = end - dir * tip_len;
                    self.push_fill(arrow_tip(end, dir, tip_len), color);
                }

                let mut path = BezPath::new();
                path.move_to(p0);
                path.line_to(shaft_end);
                let dash = stroke
                    .dash
                    .map(|(on, off)| (on * self.ppu * scale, off * self.ppu * scale));
                self.push_stroke(&path, stroke.width_pt, dash, color);
            }
            NodeKind::Text { block } => {
                let Some(shaped) = &block.glyphs else {
                    return Ok(());
                };
                let total = shaped.glyphs.len();
                let count = if reveal >= 1.0 {
                    total
                } else {
                    ((reveal * total as f64).ceil() as usize).min(total)
                };
                if count == 0 {
                    return Ok(());
                }
                let (base, fill_opacity) = node
                    .style
                    .fill
                    .map_or((Color::WHITE, 1.0), |f| (f.color, f.opacity));
                let transform = Affine::translate(center_px.to_vec2())
                    * Affine::scale(scale)
                    * Affine::translate(Vec2::new(-block.width / 2.0, -block.height / 2.0));
                self.items.push(DrawItem::Glyphs {
                    shaped: shaped.clone(),
                    count,
                    transform,
                    color: paint(base, tint, fill_opacity * opacity),
                });
            }
            NodeKind::Image { source, height } => {
                let grid = source.resolve()?;
                let h_px = height * self.ppu * scale;
                let w_px = if grid.height() == 0 {
                    h_px
                } else {
                    h_px * f64::from(grid.width()) / f64::from(grid.height())
                };
                self.items.push(DrawItem::Image {
                    grid,
                    rect: Rect::from_center_size(center_px, (w_px, h_px)),
                    opacity: (opacity * reveal).clamp(0.0, 1.0),
                });
            }
            NodeKind::Group { .. } => {}
        }
        Ok(())
    }

    fn push_fill(&mut self, path: BezPath, color: Color) {
        if color.a > 0 {
            self.items.push(DrawItem::Fill { path, color });
        }
    }

    fn push_stroke(
        &mut self,
        path: &BezPath,
        width_pt: f64,
        dash: Option<(f64, f64)>,
        color: Color,
    ) {
        let width_px = width_pt / 100.0 * self.ppu;
        if width_px <= 0.0 || color.a == 0 || path.elements().len() < 2 {
            return;
        }
        let mut style = kurbo::Stroke::new(width_px);
        if let Some((on, off)) = dash
            && on > 0.0
            && off > 0.0
        {
            style = style.with_dashes(0.0, [on, off]);
        }
        let outline = kurbo::stroke(
            path.iter(),
            &style,
            &kurbo::StrokeOpts::default(),
            FLATTEN_TOLERANCE_PX,
        );
        self.push_fill(outline, color);
    }
}

fn paint(color: Color, tint: Option<Tint>, opacity: f64) -> Color {
    let base = match tint {
        Some(t) => Color {
            a: color.a,
            ..Color::lerp(&color, &t.color, t.amount.clamp(0.0, 1.0))
        },
        None => color,
    };
    Color {
        a: scale_u8(base.a, opacity),
        ..base
    }
}

fn arrow_tip(apex: Point, dir: Vec2, len: f64) -> BezPath {
    let base = apex - dir * len;
    let normal = Vec2::new(-dir.y, dir.x) * (len / 2.0);
    let mut p = BezPath::new();
    p.move_to(apex);
    p.line_to(base + normal);
    p.line_to(base - normal);
    p.close_path();
    p
}

/// The leading `fraction` of `path`'s arc length, as an open polyline.
pub fn partial_outline(path: &BezPath, fraction: f64) -> BezPath {
    let mut polylines: Vec<Vec<Point>> = Vec::new();
    kurbo::flatten(path.iter(), FLATTEN_TOLERANCE_PX, |el| match el {
        PathEl::MoveTo(p) => polylines.push(vec![p]),
        PathEl::LineTo(p) => {
            if let Some(line) = polylines.last_mut() {
                line.push(p);
            }
        }
        PathEl::ClosePath => {
            if let Some(line) = polylines.last_mut()
                && let Some(&first) = line.first()
            {
                line.push(first);
            }
        }
        PathEl::QuadTo(..) | PathEl::CurveTo(..) => {}
    });

    let total: f64 = polylines
        .iter()
        .flat_map(|l| l.windows(2).map(|w| (w[1] - w[0]).hypot()))
        .sum();
    let mut budget = total * fraction.clamp(0.0, 1.0);

    let mut out = BezPath::new();
    for line in &polylines {
        let Some(&first) = line.first() else {
            continue;
        };
        if budget <= 0.0 {
            break;
        }
        out.move_to(first);
        for w in line.windows(2) {
            let seg = (w[1] - w[0]).hypot();
            if seg <= budget {
                out.line_to(w[1]);
                budget -= seg;
            } else {
                let t = if seg > 0.0 { budget / seg } else { 0.0 };
                out.line_to(<Point as Lerp>::lerp(&w[0], &w[1], t));
                budget = 0.0;
                break;
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/scene/flatten.rs"]
mod tests;
