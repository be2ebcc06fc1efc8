use std::sync::Arc;

use crate::assets::fonts::{FontBook, FontWeight, ResolvedFont};
use crate::foundation::error::{ReelError, ReelResult};

/// Style inputs for shaping one text run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    /// Font size in output pixels.
    pub size_px: f32,
    /// Requested weight.
    pub weight: FontWeight,
}

impl TextStyle {
    /// Regular weight at `size_px`.
    pub fn regular(size_px: f32) -> Self {
        Self {
            size_px,
            weight: FontWeight::Normal,
        }
    }

    /// Bold weight at `size_px`.
    pub fn bold(size_px: f32) -> Self {
        Self {
            size_px,
            weight: FontWeight::Bold,
        }
    }
}

/// One positioned glyph. `y` is the baseline, relative to the block's top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedGlyph {
    /// Glyph id in the face.
    pub id: u32,
    /// Horizontal offset in pixels.
    pub x: f32,
    /// Baseline offset in pixels.
    pub y: f32,
}

/// Glyphs ready for rasterization together with the face they index into.
#[derive(Clone, Debug)]
pub struct ShapedGlyphs {
    /// Face data shared with the rasterizer.
    pub font: vello_cpu::peniko::FontData,
    /// Size the glyphs were shaped at.
    pub font_size: f32,
    /// Glyphs in logical order.
    pub glyphs: Vec<PlacedGlyph>,
}

/// Measured (and optionally shaped) single-line text.
#[derive(Clone, Debug)]
pub struct TextBlock {
    /// Source string.
    pub text: String,
    /// Advance width in pixels.
    pub width: f64,
    /// Line height in pixels.
    pub height: f64,
    /// `None` for metrics-only shaping; such blocks occupy space but draw nothing.
    pub glyphs: Option<Arc<ShapedGlyphs>>,
}

impl TextBlock {
    /// Number of glyphs available for drawing.
    pub fn glyph_count(&self) -> usize {
        self.glyphs.as_ref().map_or(0, |g| g.glyphs.len())
    }
}

/// Turns strings into measured [`TextBlock`]s.
pub trait TextShaper {
    /// Shape `text` as a single line.
    fn shape(&mut self, text: &str, style: TextStyle) -> ReelResult<TextBlock>;
}

struct FaceSlot {
    family: String,
    font: vello_cpu::peniko::FontData,
}

/// [`TextShaper`] backed by Parley, using faces resolved from a [`FontBook`].
pub struct ParleyShaper {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    regular: FaceSlot,
    bold: FaceSlot,
}

impl ParleyShaper {
    /// Resolve regular and bold faces of `family` and register them with Parley.
    pub fn new(book: &FontBook, family: &str) -> ReelResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let regular = register(&mut font_ctx, book.resolve(family, FontWeight::Normal)?)?;
        let bold = register(&mut font_ctx, book.resolve(family, FontWeight::Bold)?)?;
        tracing::info!(regular = %regular.family, bold = %bold.family, "text faces registered");
        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            regular,
            bold,
        })
    }
}

fn register(font_ctx: &mut parley::FontContext, face: ResolvedFont) -> ReelResult<FaceSlot> {
    let blob = parley::fontique::Blob::from(face.bytes.as_ref().clone());
    let families = font_ctx.collection.register_fonts(blob, None);
    let family_id = families
        .first()
        .map(|(id, _)| *id)
        .ok_or_else(|| ReelError::validation("no font families registered from font bytes"))?;
    let family = font_ctx
        .collection
        .family_name(family_id)
        .ok_or_else(|| ReelError::validation("registered font family has no name"))?
        .to_string();

    let font = vello_cpu::peniko::FontData::new(
        vello_cpu::peniko::Blob::from(face.bytes.as_ref().clone()),
        face.index,
    );
    Ok(FaceSlot { family, font })
}

impl TextShaper for ParleyShaper {
    fn shape(&mut self, text: &str, style: TextStyle) -> ReelResult<TextBlock> {
        if !style.size_px.is_finite() || style.size_px <= 0.0 {
            return Err(ReelError::validation("text size_px must be finite and > 0"));
        }
        let slot = match style.weight {
            FontWeight::Normal => &self.regular,
            FontWeight::Bold => &self.bold,
        };
        let weight = match style.weight {
            FontWeight::Normal => parley::style::FontWeight::NORMAL,
            FontWeight::Bold => parley::style::FontWeight::BOLD,
        };

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(slot.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(style.size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(weight));

        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);

        let mut glyphs = Vec::with_capacity(text.len());
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                glyphs.extend(run.positioned_glyphs().map(|g| PlacedGlyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                }));
            }
        }

        Ok(TextBlock {
            text: text.to_owned(),
            width: f64::from(layout.width()),
            height: f64::from(layout.height()),
            glyphs: Some(Arc::new(ShapedGlyphs {
                font: slot.font.clone(),
                font_size: style.size_px,
                glyphs,
            })),
        })
    }
}

/// Fixed-advance metrics without glyph output: each char is `0.6 em` wide, lines are
/// `1.2 em` tall. Keeps layout deterministic where no fonts are installed.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonospaceMetrics;

impl TextShaper for MonospaceMetrics {
    fn shape(&mut self, text: &str, style: TextStyle) -> ReelResult<TextBlock> {
        if !style.size_px.is_finite() || style.size_px <= 0.0 {
            return Err(ReelError::validation("text size_px must be finite and > 0"));
        }
        let size = f64::from(style.size_px);
        Ok(TextBlock {
            text: text.to_owned(),
            width: text.chars().count() as f64 * size * 0.6,
            height: size * 1.2,
            glyphs: None,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/text.rs"]
mod tests;
