use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ReelError, ReelResult};
use crate::scene::flatten::{EvaluatedFrame, flatten};
use crate::scene::model::Scene;
use crate::timeline::builder::Timeline;
use crate::timeline::directive::Directive;

/// Evaluates a [`Timeline`] frame by frame.
///
/// The player keeps the scene as of the start of the segment it last visited, so walking frames
/// forward replays each directive once. Seeking backward restarts from the initial scene.
pub struct Player<'a> {
    timeline: &'a Timeline,
    starts: Vec<u64>,
    total_frames: u64,
    base: Scene,
    next: usize,
}

impl<'a> Player<'a> {
    /// Player positioned before the first directive.
    pub fn new(timeline: &'a Timeline) -> Self {
        let mut starts = Vec::with_capacity(timeline.directives.len());
        let mut cursor = 0u64;
        for d in &timeline.directives {
            starts.push(cursor);
            cursor += d.frames();
        }
        Self {
            timeline,
            starts,
            total_frames: cursor,
            base: timeline.initial.clone(),
            next: 0,
        }
    }

    /// Frames in the timeline.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Scene state shown on `frame`.
    pub fn scene_at(&mut self, frame: FrameIndex) -> ReelResult<Scene> {
        if frame.0 >= self.total_frames {
            return Err(ReelError::validation(format!(
                "frame {} is outside the timeline (0..{})",
                frame.0, self.total_frames
            )));
        }
        if self.starts.get(self.next).is_some_and(|&s| s > frame.0) {
            tracing::debug!(frame = frame.0, "seeking backward, replaying from start");
            self.base = self.timeline.initial.clone();
            self.next = 0;
        }

        loop {
            let Some(d) = self.timeline.directives.get(self.next) else {
                return Err(ReelError::evaluation(format!(
                    "no directive covers frame {}",
                    frame.0
                )));
            };
            let frames = d.frames();
            let start = self.starts[self.next];
            if frames == 0 || frame.0 >= start + frames {
                d.apply(&mut self.base)?;
                self.next += 1;
                continue;
            }

            let mut scene = self.base.clone();
            if let Directive::Play(play) = d {
                play.sample(&self.base, &mut scene, play.progress(frame.0 - start))?;
            }
            return Ok(scene);
        }
    }

    /// Flattened draw list for `frame`.
    #[tracing::instrument(skip(self), fields(frame = frame.0))]
    pub fn evaluate(&mut self, frame: FrameIndex) -> ReelResult<EvaluatedFrame> {
        let scene = self.scene_at(frame)?;
        flatten(&scene, self.timeline.canvas, self.timeline.background)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/player.rs"]
mod tests;
