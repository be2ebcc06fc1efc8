use crate::foundation::core::{Fps, FrameIndex, FrameRange};
use crate::foundation::error::{ReelError, ReelResult};
use crate::timeline::directive::Directive;

/// Whether a segment animates or holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    /// A `Play` directive.
    Play,
    /// A `Wait` directive.
    Wait,
}

/// One timed directive placed on the frame axis.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Segment {
    /// Index of the directive in the timeline.
    pub directive: usize,
    /// Human-readable label.
    pub label: String,
    /// Segment kind.
    pub kind: SegmentKind,
    /// Frames covered by the segment.
    pub range: FrameRange,
}

/// Frame layout of a whole timeline.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Schedule {
    /// Frame rate the schedule was computed for.
    pub fps: Fps,
    /// Sum of all segment lengths.
    pub total_frames: u64,
    /// `total_frames` in seconds.
    pub duration_secs: f64,
    /// Timed segments in order; instantaneous directives are omitted.
    pub segments: Vec<Segment>,
}

impl Schedule {
    /// Lay directives out back to back.
    pub fn from_directives(directives: &[Directive], fps: Fps) -> Self {
        let mut segments = Vec::new();
        let mut cursor = 0u64;
        for (i, d) in directives.iter().enumerate() {
            let (label, kind) = match d {
                Directive::Play(p) => (p.label.clone(), SegmentKind::Play),
                Directive::Wait { label, .. } => (label.clone(), SegmentKind::Wait),
                _ => continue,
            };
            let frames = d.frames();
            if frames == 0 {
                continue;
            }
            segments.push(Segment {
                directive: i,
                label,
                kind,
                range: FrameRange {
                    start: FrameIndex(cursor),
                    end: FrameIndex(cursor + frames),
                },
            });
            cursor += frames;
        }
        Self {
            fps,
            total_frames: cursor,
            duration_secs: fps.frames_to_secs(cursor),
            segments,
        }
    }

    /// Segment covering `frame`.
    pub fn segment_at(&self, frame: FrameIndex) -> Option<&Segment> {
        let idx = self
            .segments
            .partition_point(|s| s.range.end.0 <= frame.0);
        self.segments.get(idx).filter(|s| s.range.contains(frame))
    }

    /// Segments whose label starts with `prefix`.
    pub fn segments_labelled<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a Segment> {
        self.segments
            .iter()
            .filter(move |s| s.label.starts_with(prefix))
    }

    /// Pretty JSON rendering.
    pub fn to_json_pretty(&self) -> ReelResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ReelError::serde(e.to_string()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/schedule.rs"]
mod tests;
