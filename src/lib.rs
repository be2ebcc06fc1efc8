//! `diffusion-reel` renders a vertical explainer video of a text-to-image diffusion pipeline.
//!
//! The reel walks a prompt through tokenization, embeddings, a U-Net with cross-attention, a
//! simulated denoising loop over a procedural latent, and a final VAE decode. The API is split the
//! same way a render runs:
//!
//! - Build an [`Explainer`] from a [`ReelConfig`] (choreography recorded as a [`Timeline`])
//! - Evaluate frames with a [`Player`] and rasterize them with a [`CpuBackend`]
//! - Stream a range into a [`FrameSink`] such as [`FfmpegSink`] or [`PngSequenceSink`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod animation;
mod assets;
mod config;
mod encode;
mod explainer;
mod foundation;
mod latent;
mod render;
mod scene;
mod timeline;

pub use crate::foundation::core::{
    Affine, BezPath, Canvas, Fps, FrameIndex, FrameRange, Point, Rect, Vec2,
};
pub use crate::foundation::error::{ReelError, ReelResult};

pub use crate::animation::ease::Ease;
pub use crate::assets::color::Color;
pub use crate::assets::fonts::{FontBook, FontWeight, ResolvedFont};
pub use crate::assets::text::{
    MonospaceMetrics, ParleyShaper, PlacedGlyph, ShapedGlyphs, TextBlock, TextShaper, TextStyle,
};
pub use crate::config::{FontConfig, Palette, ReelConfig};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::png::{PngSequenceSink, write_frame_png, write_grid_png};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::explainer::script::{
    Cast, DENOISE_LABEL, DENOISE_SECS, Explainer, PULSE_EVERY_SECS, START_TIMESTEP,
    build_explainer, timestep_at, timestep_text,
};
pub use crate::latent::grid::RgbaGrid;
pub use crate::latent::procedural::{
    LatentPair, PatternRegion, interpolate, noise_image, pattern_image, pattern_region,
};
pub use crate::render::backend::{
    BackendKind, FrameRGBA, RenderBackend, RenderSettings, create_backend,
};
pub use crate::render::cpu::CpuBackend;
pub use crate::render::pipeline::{RenderStats, RenderThreading, render_frame, render_range};
pub use crate::scene::flatten::{DrawItem, EvaluatedFrame};
pub use crate::scene::model::{NodeId, NodeKind, Scene};
pub use crate::timeline::builder::{Timeline, TimelineBuilder};
pub use crate::timeline::player::Player;
pub use crate::timeline::schedule::{Schedule, Segment, SegmentKind};
