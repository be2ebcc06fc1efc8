//! The explainer sequence: prompt → tokens → embeddings → denoising U-Net → VAE decode → image.
//!
//! Every stage writes its directives into a [`TimelineBuilder`]; positions are computed against
//! the builder's projected scene, so later stages can anchor on where earlier ones left things.

use std::sync::Arc;

use crate::animation::ease::Ease;
use crate::assets::color::Color;
use crate::assets::fonts::FontWeight;
use crate::assets::text::TextShaper;
use crate::config::{Palette, ReelConfig};
use crate::foundation::core::{Point, Rect, Vec2};
use crate::foundation::error::{ReelError, ReelResult};
use crate::latent::procedural::LatentPair;
use crate::scene::layout::{
    CORNER_BUFF, DEFAULT_BUFF, Direction, anchor, arrange_column, arrange_row, next_to,
    scale_about_center, to_edge,
};
use crate::scene::model::{
    FillStyle, ImageSource, NodeId, NodeKind, NodePatch, StrokeStyle, Style,
};
use crate::timeline::builder::{Timeline, TimelineBuilder};
use crate::timeline::directive::{Animation, AnimationKind};

/// Value shown on the timestep label before denoising starts.
pub const START_TIMESTEP: u32 = 50;
/// Length of the denoising loop.
pub const DENOISE_SECS: f64 = 6.0;
/// The network pulses once per this many seconds of the loop.
pub const PULSE_EVERY_SECS: f64 = 1.0;
/// Label prefix of every segment in the denoising loop.
pub const DENOISE_LABEL: &str = "denoise";

const TYPE_SECS: f64 = 0.03;
const PULSE_SECS: f64 = 0.2;
const SHAPE_STROKE_PT: f64 = 4.0;
const LATENT_HEIGHT: f64 = 3.5;
const FINAL_HEIGHT: f64 = 6.0;

/// Handles to the nodes worth inspecting after the script is built.
#[derive(Clone, Copy, Debug)]
pub struct Cast {
    /// Glass input panel.
    pub panel: NodeId,
    /// Typed prompt text.
    pub prompt: NodeId,
    /// Typing cursor.
    pub cursor: NodeId,
    /// Group of token chips.
    pub tokens: NodeId,
    /// Group of embedding columns.
    pub vectors: NodeId,
    /// Embedding box, caption and vectors, later parked in the corner.
    pub context: NodeId,
    /// The latent image being denoised.
    pub latent: NodeId,
    /// "TIMESTEP: n" label.
    pub step_label: NodeId,
    /// U-Net blocks, arrows and skip connection.
    pub unet: NodeId,
    /// Cross-attention lines.
    pub attention: NodeId,
    /// Decoded image shown at the end.
    pub final_image: NodeId,
    /// "GENERATED IMAGE" caption.
    pub final_label: NodeId,
}

/// A built explainer: the timeline plus what went into it.
#[derive(Clone, Debug)]
pub struct Explainer {
    /// The script.
    pub timeline: Timeline,
    /// Noise and target grids.
    pub latents: LatentPair,
    /// Seed every random draw came from.
    pub seed: u64,
    /// Node handles.
    pub cast: Cast,
}

/// Build the explainer for `config`, shaping text with `shaper`.
#[tracing::instrument(skip_all, fields(seed))]
pub fn build_explainer(
    config: &ReelConfig,
    shaper: &mut dyn TextShaper,
) -> ReelResult<Explainer> {
    config.validate()?;
    let seed = config.resolve_seed();
    tracing::Span::current().record("seed", seed);
    if config.seed.is_none() {
        tracing::info!(seed, "no seed configured, drew one");
    }
    let mut rng = fastrand::Rng::with_seed(seed);

    let mut b = TimelineBuilder::new(
        config.canvas,
        config.fps,
        config.palette.background,
        config.units_per_width,
        shaper,
    )?;
    let pal = &config.palette;

    let input = prompt_stage(&mut b, pal, &config.prompt)?;
    let tokens = tokenize_stage(&mut b, pal, &config.prompt, &input)?;
    let embed = embed_stage(&mut b, pal, &input, tokens, &mut rng)?;

    let latents = LatentPair::generate(config.latent_size, &mut rng);
    let net = network_stage(&mut b, pal, &latents, embed.context)?;
    denoise_stage(&mut b, &net)?;
    let ending = decode_stage(
        &mut b,
        pal,
        &latents,
        &net,
        embed.context,
        config.latent_size,
    )?;

    let timeline = b.build()?;
    tracing::debug!(
        frames = timeline.total_frames(),
        directives = timeline.directives.len(),
        "explainer built"
    );

    Ok(Explainer {
        timeline,
        latents,
        seed,
        cast: Cast {
            panel: input.panel,
            prompt: input.prompt,
            cursor: input.cursor,
            tokens,
            vectors: embed.vectors,
            context: embed.context,
            latent: net.latent,
            step_label: net.step_label,
            unet: net.unet,
            attention: net.attention,
            final_image: ending.final_image,
            final_label: ending.final_label,
        },
    })
}

fn stroked(color: Color, fill_opacity: f64) -> Style {
    Style {
        stroke: Some(StrokeStyle::solid(color, SHAPE_STROKE_PT)),
        fill: (fill_opacity > 0.0).then(|| FillStyle::new(color, fill_opacity)),
    }
}

struct InputPanel {
    panel: NodeId,
    caption: NodeId,
    prompt: NodeId,
    cursor: NodeId,
}

fn prompt_stage(
    b: &mut TimelineBuilder<'_>,
    pal: &Palette,
    prompt: &str,
) -> ReelResult<InputPanel> {
    let panel_size = Vec2::new(6.5, 1.2);
    let panel_center = to_edge(
        b.frame_rect(),
        Rect::from_center_size(Point::ORIGIN, panel_size.to_size()),
        Direction::Up,
        1.0,
    );
    let panel = b.rect(
        panel_size.x,
        panel_size.y,
        0.2,
        Style {
            stroke: Some(StrokeStyle::solid(pal.primary, 2.0)),
            fill: Some(FillStyle::new(pal.glass, 0.8)),
        },
        panel_center,
    );
    let panel_bounds = b.bounds(panel)?;

    let caption_size = b.measure_text("TEXT PROMPT", 16.0, FontWeight::Normal)?;
    let caption = b.text(
        "TEXT PROMPT",
        16.0,
        FontWeight::Normal,
        Color::GRAY,
        next_to(panel_bounds, caption_size, Direction::Up, 0.15),
    )?;
    b.play(
        "prompt panel",
        1.0,
        vec![
            Animation::new(AnimationKind::FadeIn(panel)),
            Animation::new(AnimationKind::FadeIn(caption)),
        ],
    )?;

    let cursor_size = Vec2::new(0.05, 0.5);
    let cursor = b.rect(
        cursor_size.x,
        cursor_size.y,
        0.0,
        Style {
            stroke: None,
            fill: Some(FillStyle::new(pal.primary, 1.0)),
        },
        panel_center,
    );
    let text = b.text("", 24.0, FontWeight::Normal, Color::WHITE, panel_center)?;

    let chars: Vec<char> = prompt.chars().collect();
    for i in 0..=chars.len() {
        if i > 0 {
            let typed: String = chars[..i].iter().collect();
            b.set_text(text, &typed, 24.0, FontWeight::Normal)?;
        }
        let typed_bounds = b.bounds(text)?;
        b.move_to(
            cursor,
            next_to(typed_bounds, cursor_size, Direction::Right, 0.05),
        )?;
        if i == 0 {
            b.add(&[text, cursor])?;
        }
        b.wait("typing", TYPE_SECS)?;
    }
    b.wait("typed", 0.5)?;
    b.remove(&[cursor])?;

    Ok(InputPanel {
        panel,
        caption,
        prompt: text,
        cursor,
    })
}

fn tokenize_stage(
    b: &mut TimelineBuilder<'_>,
    pal: &Palette,
    prompt: &str,
    input: &InputPanel,
) -> ReelResult<NodeId> {
    let chip_size = Vec2::new(1.5, 0.6);
    let center = b.scene().world_center(input.panel)?;

    let words: Vec<&str> = prompt.split(", ").collect();
    let mut widths = Vec::with_capacity(words.len());
    for w in &words {
        let label = b.measure_text(w, 14.0, FontWeight::Normal)?;
        widths.push(label.x.max(chip_size.x));
    }

    let mut chips = Vec::with_capacity(words.len());
    for (word, dx) in words.iter().zip(arrange_row(&widths, 0.2)) {
        let at = Point::new(center.x + dx, center.y);
        let rect = b.rect(chip_size.x, chip_size.y, 0.3, stroked(pal.secondary, 0.3), at);
        let label = b.text(word, 14.0, FontWeight::Normal, pal.secondary, at)?;
        chips.push(b.group(&[rect, label])?);
    }
    let tokens = b.group(&chips)?;

    b.play(
        "tokenize",
        1.0,
        vec![
            Animation::new(AnimationKind::FadeOut(input.prompt)),
            Animation::new(AnimationKind::FadeIn(tokens)),
        ],
    )?;
    Ok(tokens)
}

struct Embedding {
    vectors: NodeId,
    context: NodeId,
}

fn embed_stage(
    b: &mut TimelineBuilder<'_>,
    pal: &Palette,
    input: &InputPanel,
    tokens: NodeId,
    rng: &mut fastrand::Rng,
) -> ReelResult<Embedding> {
    let matrix = b.rect(6.0, 2.0, 0.0, stroked(Color::BLUE_E, 0.2), Point::new(0.0, 0.5));
    let matrix_bounds = b.bounds(matrix)?;
    let caption_text = "CLIP EMBEDDINGS (Vectors)";
    let caption_size = b.measure_text(caption_text, 18.0, FontWeight::Normal)?;
    let caption = b.text(
        caption_text,
        18.0,
        FontWeight::Normal,
        Color::BLUE,
        next_to(matrix_bounds, caption_size, Direction::Up, DEFAULT_BUFF),
    )?;

    b.play(
        "embed",
        1.0,
        vec![
            Animation::new(AnimationKind::Tween {
                node: input.panel,
                patch: NodePatch::opacity(0.0),
            }),
            Animation::new(AnimationKind::Tween {
                node: input.caption,
                patch: NodePatch::opacity(0.0),
            }),
            Animation::new(AnimationKind::Tween {
                node: tokens,
                patch: NodePatch::center(matrix_bounds.center()),
            }),
            Animation::new(AnimationKind::Create(matrix)),
            Animation::new(AnimationKind::Write(caption)),
        ],
    )?;

    let chips = match &b.scene().node(tokens)?.kind {
        NodeKind::Group { children } => children.clone(),
        _ => return Err(ReelError::animation("token row is not a group")),
    };

    let mut columns = Vec::with_capacity(chips.len());
    for chip in chips {
        let at = b.scene().world_center(chip)?;
        let values: Vec<String> = (0..4).map(|_| format!("{:.2}", rng.f64())).collect();
        let mut heights = Vec::with_capacity(values.len());
        for v in &values {
            heights.push(b.measure_text(v, 12.0, FontWeight::Normal)?.y);
        }
        let mut nums = Vec::with_capacity(values.len());
        for (v, dy) in values.iter().zip(arrange_column(&heights, 0.15)) {
            nums.push(b.text(
                v,
                12.0,
                FontWeight::Normal,
                pal.primary,
                Point::new(at.x, at.y + dy),
            )?);
        }
        columns.push(b.group(&nums)?);
    }
    let vectors = b.group(&columns)?;

    b.play(
        "vectorize",
        1.5,
        vec![Animation::new(AnimationKind::Transform {
            from: tokens,
            to: vectors,
        })],
    )?;
    b.wait("vectors", 0.5)?;

    let context = b.group(&[matrix, caption, vectors])?;
    let parked = scale_about_center(b.bounds(context)?, 0.4);
    let corner = to_edge(b.frame_rect(), parked, Direction::UpLeft, CORNER_BUFF);
    b.play(
        "park context",
        1.0,
        vec![Animation::new(AnimationKind::Tween {
            node: context,
            patch: NodePatch {
                center: Some(corner),
                scale: Some(0.4),
                opacity: Some(0.8),
            },
        })],
    )?;

    Ok(Embedding { vectors, context })
}

struct Network {
    latent: NodeId,
    latent_label: NodeId,
    step_label: NodeId,
    unet: NodeId,
    unet_label: NodeId,
    attention: NodeId,
    rule: NodeId,
    primary: Color,
}

fn network_stage(
    b: &mut TimelineBuilder<'_>,
    pal: &Palette,
    latents: &LatentPair,
    context: NodeId,
) -> ReelResult<Network> {
    let latent = b.image(
        ImageSource::Blend {
            from: Arc::new(latents.noise.clone()),
            to: Arc::new(latents.target.clone()),
            alpha: 0.0,
        },
        LATENT_HEIGHT,
        Point::new(0.0, 1.0),
    );
    let latent_bounds = b.bounds(latent)?;
    let label_text = "LATENT NOISE x_T";
    let label_size = b.measure_text(label_text, 20.0, FontWeight::Normal)?;
    let latent_label = b.text(
        label_text,
        20.0,
        FontWeight::Normal,
        Color::WHITE,
        next_to(latent_bounds, label_size, Direction::Up, DEFAULT_BUFF),
    )?;
    b.play(
        "latent",
        1.0,
        vec![
            Animation::new(AnimationKind::FadeIn(latent)),
            Animation::new(AnimationKind::Write(latent_label)),
        ],
    )?;

    // Encoder down, bottleneck, decoder up.
    let positions = [
        Point::new(-2.0, -2.0),
        Point::new(-1.0, -3.0),
        Point::new(0.0, -3.5),
        Point::new(1.0, -3.0),
        Point::new(2.0, -2.0),
    ];
    let mut blocks = Vec::with_capacity(positions.len());
    for (i, at) in positions.into_iter().enumerate() {
        let style = if i == 2 {
            stroked(pal.accent, 0.8)
        } else {
            stroked(pal.secondary, 0.5)
        };
        blocks.push(b.rect(0.5, 0.5, 0.0, style, at));
    }
    let mut rects = Vec::with_capacity(blocks.len());
    for &blk in &blocks {
        rects.push(b.bounds(blk)?);
    }

    let arrow = StrokeStyle::solid(Color::GRAY, SHAPE_STROKE_PT);
    let links = [
        (anchor(rects[0], Direction::Down), anchor(rects[1], Direction::Up)),
        (anchor(rects[1], Direction::Down), anchor(rects[2], Direction::Left)),
        (anchor(rects[2], Direction::Right), anchor(rects[3], Direction::Down)),
        (anchor(rects[3], Direction::Up), anchor(rects[4], Direction::Down)),
    ];
    let mut members = blocks.clone();
    for (from, to) in links {
        members.push(b.line(from, to, true, arrow));
    }
    members.push(b.line(
        anchor(rects[1], Direction::Right),
        anchor(rects[3], Direction::Left),
        false,
        StrokeStyle::solid(pal.secondary, SHAPE_STROKE_PT)
            .with_opacity(0.5)
            .dashed(0.05, 0.05),
    ));
    let unet = b.group(&members)?;

    let unet_text = "U-NET (Noise Predictor)";
    let unet_size = b.measure_text(unet_text, 20.0, FontWeight::Normal)?;
    let unet_label = b.text(
        unet_text,
        20.0,
        FontWeight::Normal,
        pal.secondary,
        next_to(rects[2], unet_size, Direction::Down, DEFAULT_BUFF),
    )?;
    b.play(
        "u-net",
        1.0,
        vec![
            Animation::new(AnimationKind::Create(unet)),
            Animation::new(AnimationKind::FadeIn(unet_label)),
        ],
    )?;

    let source = anchor(b.bounds(context)?, Direction::Down);
    let attn_style = StrokeStyle::solid(pal.primary, SHAPE_STROKE_PT).with_opacity(0.3);
    let mut lines = Vec::with_capacity(4);
    for i in [0, 1, 3, 4] {
        lines.push(b.line(source, anchor(rects[i], Direction::Up), false, attn_style));
    }
    let attention = b.group(&lines)?;
    b.play(
        "cross-attention",
        1.0,
        vec![Animation::new(AnimationKind::Create(attention))],
    )?;

    let step_text = timestep_text(START_TIMESTEP);
    let step_size = b.measure_text(&step_text, 24.0, FontWeight::Normal)?;
    let step_label = b.text(
        &step_text,
        24.0,
        FontWeight::Normal,
        pal.accent,
        next_to(latent_bounds, step_size, Direction::Down, DEFAULT_BUFF),
    )?;
    b.add(&[step_label])?;

    let rule_text = "x_{t-1} ← x_t - ε_θ(x_t, prompt)";
    let rule_size = b.measure_text(rule_text, 24.0, FontWeight::Normal)?;
    let unet_label_bounds = b.bounds(unet_label)?;
    let rule = b.text(
        rule_text,
        24.0,
        FontWeight::Normal,
        Color::WHITE,
        next_to(unet_label_bounds, rule_size, Direction::Down, DEFAULT_BUFF),
    )?;
    b.play(
        "update rule",
        1.0,
        vec![Animation::new(AnimationKind::Write(rule))],
    )?;

    Ok(Network {
        latent,
        latent_label,
        step_label,
        unet,
        unet_label,
        attention,
        rule,
        primary: pal.primary,
    })
}

/// Label text for timestep `t`.
pub fn timestep_text(t: u32) -> String {
    format!("TIMESTEP: {t}")
}

/// Timestep shown at loop progress `p` in `[0, 1]`.
pub fn timestep_at(p: f64) -> u32 {
    let elapsed = (p.clamp(0.0, 1.0) * f64::from(START_TIMESTEP)).floor() as u32;
    START_TIMESTEP.saturating_sub(elapsed)
}

fn denoise_stage(b: &mut TimelineBuilder<'_>, net: &Network) -> ReelResult<()> {
    let fps = b.fps();
    let frames = fps.secs_to_frames_ceil(DENOISE_SECS);
    let pulse_every = fps.secs_to_frames_ceil(PULSE_EVERY_SECS).max(1);
    let last = frames.saturating_sub(1).max(1) as f64;

    let mut shown = START_TIMESTEP;
    for i in 0..frames {
        let p = i as f64 / last;
        b.set_blend(net.latent, Ease::Smooth.apply(p))?;
        let t = timestep_at(p);
        if t != shown {
            b.set_text(net.step_label, &timestep_text(t), 24.0, FontWeight::Normal)?;
            shown = t;
        }

        if i % pulse_every == 0 {
            b.play(
                format!("{DENOISE_LABEL}: pulse attention"),
                PULSE_SECS,
                vec![Animation::new(AnimationKind::Indicate {
                    node: net.attention,
                    color: net.primary,
                    scale: 1.1,
                })],
            )?;
            b.play(
                format!("{DENOISE_LABEL}: pulse u-net"),
                PULSE_SECS,
                vec![Animation::new(AnimationKind::Indicate {
                    node: net.unet,
                    color: Color::WHITE,
                    scale: 1.05,
                })],
            )?;
        }
        b.wait_frames(DENOISE_LABEL, 1)?;
    }
    Ok(())
}

struct Ending {
    final_image: NodeId,
    final_label: NodeId,
}

fn decode_stage(
    b: &mut TimelineBuilder<'_>,
    pal: &Palette,
    latents: &LatentPair,
    net: &Network,
    context: NodeId,
    latent_size: u32,
) -> ReelResult<Ending> {
    let latent_bounds = b.bounds(net.latent)?;
    let result_text = format!("LATENT RESULT ({latent_size}x{latent_size})");
    let result_size = b.measure_text(&result_text, 20.0, FontWeight::Normal)?;
    let result_label = b.text(
        &result_text,
        20.0,
        FontWeight::Normal,
        Color::WHITE,
        next_to(latent_bounds, result_size, Direction::Up, DEFAULT_BUFF),
    )?;
    b.play(
        "clear network",
        1.0,
        vec![
            Animation::new(AnimationKind::FadeOut(net.unet)),
            Animation::new(AnimationKind::FadeOut(net.attention)),
            Animation::new(AnimationKind::FadeOut(net.unet_label)),
            Animation::new(AnimationKind::FadeOut(net.rule)),
            Animation::new(AnimationKind::FadeOut(net.step_label)),
            Animation::new(AnimationKind::FadeOut(context)),
            Animation::new(AnimationKind::Transform {
                from: net.latent_label,
                to: result_label,
            }),
        ],
    )?;

    let vae = b.rect(4.0, 1.5, 0.0, stroked(Color::PURPLE, 0.0), Point::new(0.0, -2.5));
    let vae_bounds = b.bounds(vae)?;
    let vae_text = b.text(
        "VAE DECODER",
        24.0,
        FontWeight::Normal,
        Color::PURPLE,
        vae_bounds.center(),
    )?;
    let top = anchor(latent_bounds, Direction::Down);
    let bottom = anchor(vae_bounds, Direction::Up);
    let gap = bottom - top;
    let len = gap.hypot();
    let (from, to) = if len > 2.0 * DEFAULT_BUFF {
        let dir = gap / len;
        (top + dir * DEFAULT_BUFF, bottom - dir * DEFAULT_BUFF)
    } else {
        (top, bottom)
    };
    let flow = b.line(
        from,
        to,
        true,
        StrokeStyle::solid(Color::WHITE, SHAPE_STROKE_PT),
    );
    b.play(
        "vae",
        1.0,
        vec![
            Animation::new(AnimationKind::Create(vae)),
            Animation::new(AnimationKind::Write(vae_text)),
            Animation::new(AnimationKind::GrowArrow(flow)),
        ],
    )?;

    b.play(
        "enlarge",
        1.0,
        vec![
            Animation::new(AnimationKind::FadeOut(flow)),
            Animation::new(AnimationKind::FadeOut(vae)),
            Animation::new(AnimationKind::FadeOut(vae_text)),
            Animation::new(AnimationKind::FadeOut(result_label)),
            Animation::new(AnimationKind::Tween {
                node: net.latent,
                patch: NodePatch {
                    center: Some(Point::ORIGIN),
                    scale: Some(FINAL_HEIGHT / LATENT_HEIGHT),
                    opacity: None,
                },
            }),
        ],
    )?;

    let final_image = b.image(
        ImageSource::Static(Arc::new(latents.target.clone())),
        FINAL_HEIGHT,
        Point::ORIGIN,
    );
    let final_bounds = b.bounds(final_image)?;
    let flash = b.rect(
        final_bounds.width(),
        final_bounds.height(),
        0.0,
        Style {
            stroke: Some(StrokeStyle::solid(Color::WHITE, SHAPE_STROKE_PT)),
            fill: None,
        },
        final_bounds.center(),
    );
    b.play(
        "flash",
        0.5,
        vec![
            Animation::new(AnimationKind::FadeIn(final_image)),
            Animation::new(AnimationKind::FadeOut(net.latent)),
            Animation::new(AnimationKind::Create(flash)).with_ease(Ease::ThereAndBack),
        ],
    )?;
    b.remove(&[flash])?;

    let title = "GENERATED IMAGE";
    let title_size = b.measure_text(title, 32.0, FontWeight::Bold)?;
    let final_label = b.text(
        title,
        32.0,
        FontWeight::Bold,
        pal.primary,
        next_to(final_bounds, title_size, Direction::Down, 0.5),
    )?;
    let scan = b.line(
        Point::new(final_bounds.x0, final_bounds.y1),
        Point::new(final_bounds.x1, final_bounds.y1),
        false,
        StrokeStyle::solid(pal.secondary, SHAPE_STROKE_PT),
    );
    b.add(&[scan])?;
    b.play(
        "reveal",
        1.5,
        vec![
            Animation::new(AnimationKind::Write(final_label)),
            Animation::new(AnimationKind::Tween {
                node: scan,
                patch: NodePatch::center(anchor(final_bounds, Direction::Down)),
            }),
        ],
    )?;
    b.play(
        "scan out",
        1.0,
        vec![Animation::new(AnimationKind::FadeOut(scan))],
    )?;
    b.wait("hold", 3.0)?;

    Ok(Ending {
        final_image,
        final_label,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/explainer/script.rs"]
mod tests;
