use std::collections::HashMap;

use rayon::prelude::*;

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{FrameIndex, FrameRange};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::backend::{FrameRGBA, RenderBackend, RenderSettings};
use crate::render::fingerprint::{FrameFingerprint, fingerprint_frame};
use crate::scene::flatten::EvaluatedFrame;
use crate::timeline::builder::Timeline;
use crate::timeline::player::Player;

/// Evaluate and render a single frame.
///
/// Returns a [`FrameRGBA`] containing **premultiplied** RGBA8 pixels.
pub fn render_frame(
    timeline: &Timeline,
    frame: FrameIndex,
    backend: &mut dyn RenderBackend,
) -> ReelResult<FrameRGBA> {
    let mut player = Player::new(timeline);
    let eval = player.evaluate(frame)?;
    backend.render(&eval)
}

#[derive(Clone, Debug)]
/// Threading and chunking controls for multi-frame rendering.
pub struct RenderThreading {
    /// Enable parallel rendering when `true`.
    pub parallel: bool,
    /// Chunk size in frames for batched scheduling.
    pub chunk_size: usize,
    /// Optional explicit worker thread count.
    pub threads: Option<usize>,
    /// Enable static-frame fingerprint elision in parallel mode.
    pub static_frame_elision: bool,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_size: 64,
            threads: None,
            static_frame_elision: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Aggregated rendering counters.
pub struct RenderStats {
    /// Total requested frames.
    pub frames_total: u64,
    /// Frames that were actually rendered.
    pub frames_rendered: u64,
    /// Frames reused via static-frame elision.
    pub frames_elided: u64,
}

/// Render `range` of `timeline` into `sink`, in increasing frame order.
///
/// Sequential mode walks the timeline with one [`Player`] and renders on `backend`. Parallel mode
/// evaluates each chunk sequentially, then rasterizes it on a `rayon` pool with one CPU backend
/// per worker (built from `backend`'s worker settings).
#[tracing::instrument(skip_all, fields(start = range.start.0, end = range.end.0))]
pub fn render_range(
    timeline: &Timeline,
    range: FrameRange,
    backend: &mut dyn RenderBackend,
    sink: &mut dyn FrameSink,
    threading: &RenderThreading,
) -> ReelResult<RenderStats> {
    if range.is_empty() {
        return Err(ReelError::validation("render range must be non-empty"));
    }
    let total = timeline.total_frames();
    if range.end.0 > total {
        return Err(ReelError::validation(format!(
            "render range end {} exceeds timeline length {total}",
            range.end.0
        )));
    }

    let mut player = Player::new(timeline);
    let mut stats = RenderStats::default();
    let chunk_size = normalized_chunk_size(threading.chunk_size);

    let mut maybe_pool = None;
    let mut maybe_worker_settings = None;
    if threading.parallel {
        maybe_pool = Some(build_thread_pool(threading.threads)?);
        maybe_worker_settings = Some(backend.worker_render_settings().ok_or_else(|| {
            ReelError::evaluation(
                "parallel render requires backend worker settings support (CpuBackend)",
            )
        })?);
    }

    sink.begin(SinkConfig {
        width: timeline.canvas.width,
        height: timeline.canvas.height,
        fps: timeline.fps,
    })?;

    let mut chunk_start = range.start.0;
    while chunk_start < range.end.0 {
        let chunk_end = (chunk_start + chunk_size).min(range.end.0);
        let chunk = FrameRange::new(FrameIndex(chunk_start), FrameIndex(chunk_end))
            .map_err(|e| ReelError::evaluation(format!("invalid chunk range: {e}")))?;

        let chunk_out = match (&maybe_pool, &maybe_worker_settings) {
            (Some(pool), Some(settings)) => {
                render_chunk_parallel_cpu_unique(&mut player, chunk, settings, threading, pool)?
            }
            _ => {
                let frames = render_chunk_sequential(&mut player, chunk, backend)?;
                let frame_count = frames.len();
                ChunkParallelOut {
                    unique_frames: frames,
                    frame_to_unique: (0..frame_count).collect(),
                    stats: RenderStats {
                        frames_total: frame_count as u64,
                        frames_rendered: frame_count as u64,
                        frames_elided: 0,
                    },
                }
            }
        };

        for (offset, &u) in chunk_out.frame_to_unique.iter().enumerate() {
            let frame = chunk_out.unique_frames.get(u).ok_or_else(|| {
                ReelError::evaluation("internal error: unique frame index out of range")
            })?;
            sink.push_frame(FrameIndex(chunk_start + offset as u64), frame)?;
        }

        stats.frames_total += chunk_out.stats.frames_total;
        stats.frames_rendered += chunk_out.stats.frames_rendered;
        stats.frames_elided += chunk_out.stats.frames_elided;
        tracing::debug!(chunk_start, chunk_end, "chunk pushed");
        chunk_start = chunk_end;
    }

    sink.end()?;
    tracing::info!(
        frames_total = stats.frames_total,
        frames_rendered = stats.frames_rendered,
        frames_elided = stats.frames_elided,
        "render finished"
    );
    Ok(stats)
}

fn render_chunk_sequential(
    player: &mut Player<'_>,
    range: FrameRange,
    backend: &mut dyn RenderBackend,
) -> ReelResult<Vec<FrameRGBA>> {
    let mut out = Vec::with_capacity(range.len_frames() as usize);
    for f in range.start.0..range.end.0 {
        let eval = player.evaluate(FrameIndex(f))?;
        out.push(backend.render(&eval)?);
    }
    Ok(out)
}

struct ChunkParallelOut {
    unique_frames: Vec<FrameRGBA>,
    frame_to_unique: Vec<usize>,
    stats: RenderStats,
}

fn render_chunk_parallel_cpu_unique(
    player: &mut Player<'_>,
    range: FrameRange,
    settings: &RenderSettings,
    threading: &RenderThreading,
    pool: &rayon::ThreadPool,
) -> ReelResult<ChunkParallelOut> {
    let mut evals = Vec::<EvaluatedFrame>::with_capacity(range.len_frames() as usize);
    for f in range.start.0..range.end.0 {
        evals.push(player.evaluate(FrameIndex(f))?);
    }

    let mut unique_indices = Vec::<usize>::with_capacity(evals.len());
    let mut frame_to_unique = Vec::<usize>::with_capacity(evals.len());
    if threading.static_frame_elision {
        let mut first = HashMap::<FrameFingerprint, usize>::new();
        for (idx, eval) in evals.iter().enumerate() {
            let fingerprint = fingerprint_frame(eval);
            if let Some(existing) = first.get(&fingerprint).copied() {
                frame_to_unique.push(existing);
            } else {
                let slot = unique_indices.len();
                unique_indices.push(idx);
                first.insert(fingerprint, slot);
                frame_to_unique.push(slot);
            }
        }
    } else {
        for idx in 0..evals.len() {
            frame_to_unique.push(idx);
            unique_indices.push(idx);
        }
    }

    let rendered = pool.install(|| {
        unique_indices
            .par_iter()
            .map_init(
                || crate::render::cpu::CpuBackend::new(settings.clone()),
                |worker_backend, eval_idx| -> ReelResult<FrameRGBA> {
                    worker_backend.render(&evals[*eval_idx])
                },
            )
            .collect::<Vec<_>>()
    });

    let mut unique_frames = Vec::<FrameRGBA>::with_capacity(rendered.len());
    for item in rendered {
        unique_frames.push(item?);
    }

    let total = evals.len() as u64;
    let rendered_count = unique_indices.len() as u64;
    Ok(ChunkParallelOut {
        unique_frames,
        frame_to_unique,
        stats: RenderStats {
            frames_total: total,
            frames_rendered: rendered_count,
            frames_elided: total.saturating_sub(rendered_count),
        },
    })
}

fn build_thread_pool(threads: Option<usize>) -> ReelResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(ReelError::validation(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ReelError::evaluation(format!("failed to build rayon thread pool: {e}")))
}

fn normalized_chunk_size(chunk_size: usize) -> u64 {
    if chunk_size == 0 {
        1
    } else {
        chunk_size as u64
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
