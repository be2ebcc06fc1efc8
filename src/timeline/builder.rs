//! Builder DSL for timelines.
//!
//! The builder keeps a projection of the scene as it will look once every recorded directive has
//! finished, so layout code can measure and place nodes against the current state while the
//! script is being written.

use std::collections::HashMap;

use crate::assets::color::Color;
use crate::assets::fonts::FontWeight;
use crate::assets::text::{TextBlock, TextShaper, TextStyle};
use crate::foundation::core::{Canvas, Fps, Point, Rect, Vec2};
use crate::foundation::error::{ReelError, ReelResult};
use crate::scene::layout::frame_rect;
use crate::scene::model::{
    FillStyle, ImageSource, Node, NodeId, NodeKind, NodePatch, Scene, StrokeStyle, Style,
};
use crate::timeline::directive::{Animation, Directive, Play};
use crate::timeline::schedule::Schedule;

/// Scene units per font point.
pub const UNITS_PER_FONT_PT: f64 = 1.0 / 96.0;

/// A complete, replayable animation script.
#[derive(Clone, Debug)]
pub struct Timeline {
    /// Output size.
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: Fps,
    /// Frame background.
    pub background: Color,
    /// Every node, as created, with an empty stage.
    pub initial: Scene,
    /// Instructions in order.
    pub directives: Vec<Directive>,
}

impl Timeline {
    /// Frame layout of the directives.
    pub fn schedule(&self) -> Schedule {
        Schedule::from_directives(&self.directives, self.fps)
    }

    /// Number of frames.
    pub fn total_frames(&self) -> u64 {
        self.directives.iter().map(Directive::frames).sum()
    }
}

/// Records directives while tracking the resulting scene.
pub struct TimelineBuilder<'s> {
    canvas: Canvas,
    fps: Fps,
    background: Color,
    frame: Rect,
    initial: Scene,
    current: Scene,
    directives: Vec<Directive>,
    shaper: &'s mut dyn TextShaper,
    text_cache: HashMap<(String, u32, FontWeight), TextBlock>,
}

impl<'s> TimelineBuilder<'s> {
    /// Start an empty timeline. `units_per_width` fixes the scene scale.
    pub fn new(
        canvas: Canvas,
        fps: Fps,
        background: Color,
        units_per_width: f64,
        shaper: &'s mut dyn TextShaper,
    ) -> ReelResult<Self> {
        canvas.validate()?;
        let fps = Fps::new(fps.num, fps.den)?;
        if !units_per_width.is_finite() || units_per_width <= 0.0 {
            return Err(ReelError::validation(
                "units_per_width must be finite and > 0",
            ));
        }
        let ppu = f64::from(canvas.width) / units_per_width;
        Ok(Self {
            canvas,
            fps,
            background,
            frame: frame_rect(canvas, units_per_width),
            initial: Scene::new(ppu),
            current: Scene::new(ppu),
            directives: Vec::new(),
            shaper,
            text_cache: HashMap::new(),
        })
    }

    /// Scene as of the end of the recorded directives.
    pub fn scene(&self) -> &Scene {
        &self.current
    }

    /// Visible frame in scene units.
    pub fn frame_rect(&self) -> Rect {
        self.frame
    }

    /// Output frame rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Current bounds of `id`.
    pub fn bounds(&self, id: NodeId) -> ReelResult<Rect> {
        self.current.bounds(id)
    }

    /// Add a node to the arena without staging it.
    pub fn insert(&mut self, node: Node) -> NodeId {
        let id = self.initial.insert(node.clone());
        let mirrored = self.current.insert(node);
        debug_assert_eq!(id, mirrored);
        id
    }

    /// Rectangle node.
    pub fn rect(
        &mut self,
        width: f64,
        height: f64,
        corner_radius: f64,
        style: Style,
        center: Point,
    ) -> NodeId {
        self.insert(Node::new(
            NodeKind::Rect {
                width,
                height,
                corner_radius,
            },
            style,
            center,
        ))
    }

    /// Segment from `from` to `to` (scene space), optionally with an arrow tip at `to`.
    pub fn line(&mut self, from: Point, to: Point, tip: bool, stroke: StrokeStyle) -> NodeId {
        let center = from.midpoint(to);
        self.insert(Node::new(
            NodeKind::Line {
                from: from - center,
                to: to - center,
                tip,
            },
            Style {
                stroke: Some(stroke),
                fill: None,
            },
            center,
        ))
    }

    /// Shape `text` at `size_pt` font points.
    pub fn shape_text(
        &mut self,
        text: &str,
        size_pt: f64,
        weight: FontWeight,
    ) -> ReelResult<TextBlock> {
        let size_px = (size_pt * UNITS_PER_FONT_PT * self.current.pixels_per_unit()) as f32;
        let key = (text.to_owned(), size_px.to_bits(), weight);
        if let Some(block) = self.text_cache.get(&key) {
            return Ok(block.clone());
        }
        let style = match weight {
            FontWeight::Normal => TextStyle::regular(size_px),
            FontWeight::Bold => TextStyle::bold(size_px),
        };
        let block = self.shaper.shape(text, style)?;
        self.text_cache.insert(key, block.clone());
        Ok(block)
    }

    /// Size of `text` in scene units.
    pub fn measure_text(
        &mut self,
        text: &str,
        size_pt: f64,
        weight: FontWeight,
    ) -> ReelResult<Vec2> {
        let block = self.shape_text(text, size_pt, weight)?;
        let ppu = self.current.pixels_per_unit();
        Ok(Vec2::new(block.width / ppu, block.height / ppu))
    }

    /// Text node centered on `center`.
    pub fn text(
        &mut self,
        text: &str,
        size_pt: f64,
        weight: FontWeight,
        color: Color,
        center: Point,
    ) -> ReelResult<NodeId> {
        let block = self.shape_text(text, size_pt, weight)?;
        Ok(self.insert(Node::new(
            NodeKind::Text { block },
            Style {
                stroke: None,
                fill: Some(FillStyle::new(color, 1.0)),
            },
            center,
        )))
    }

    /// Image node `height` units tall.
    pub fn image(&mut self, source: ImageSource, height: f64, center: Point) -> NodeId {
        self.insert(Node::new(
            NodeKind::Image { source, height },
            Style::default(),
            center,
        ))
    }

    /// Group `children` around the center of their bounds.
    pub fn group(&mut self, children: &[NodeId]) -> ReelResult<NodeId> {
        let center = self.current.bounds_of(children)?.center();
        let id = self.insert(Node::new(
            NodeKind::Group {
                children: Vec::new(),
            },
            Style::default(),
            center,
        ));
        self.push(Directive::Group {
            group: id,
            children: children.to_vec(),
        })?;
        Ok(id)
    }

    /// Record a directive and apply it to the projection.
    pub fn push(&mut self, directive: Directive) -> ReelResult<()> {
        directive.apply(&mut self.current)?;
        self.directives.push(directive);
        Ok(())
    }

    /// Stage nodes.
    pub fn add(&mut self, ids: &[NodeId]) -> ReelResult<()> {
        self.push(Directive::Add(ids.to_vec()))
    }

    /// Unstage nodes.
    pub fn remove(&mut self, ids: &[NodeId]) -> ReelResult<()> {
        self.push(Directive::Remove(ids.to_vec()))
    }

    /// Instant patch.
    pub fn set(&mut self, node: NodeId, patch: NodePatch) -> ReelResult<()> {
        self.push(Directive::Set { node, patch })
    }

    /// Move `node` so its scene-space center lands on `target`.
    pub fn move_to(&mut self, node: NodeId, target: Point) -> ReelResult<()> {
        let patch = NodePatch::center(self.local_center_for(node, target)?);
        self.set(node, patch)
    }

    /// Parent-space center that puts `node`'s world center on `target`.
    pub fn local_center_for(&self, node: NodeId, target: Point) -> ReelResult<Point> {
        match self.current.node(node)?.parent {
            Some(p) => Ok(self.current.world_affine(p)?.inverse() * target),
            None => Ok(target),
        }
    }

    /// Replace a text node's content, keeping its size and weight.
    pub fn set_text(
        &mut self,
        node: NodeId,
        text: &str,
        size_pt: f64,
        weight: FontWeight,
    ) -> ReelResult<()> {
        let block = self.shape_text(text, size_pt, weight)?;
        self.push(Directive::SetText { node, block })
    }

    /// Set a blended image's factor.
    pub fn set_blend(&mut self, node: NodeId, alpha: f64) -> ReelResult<()> {
        self.push(Directive::SetBlend { node, alpha })
    }

    /// Run `animations` together for `run_time` seconds.
    pub fn play(
        &mut self,
        label: impl Into<String>,
        run_time: f64,
        animations: Vec<Animation>,
    ) -> ReelResult<()> {
        let label = label.into();
        let frames = self.fps.secs_to_frames_ceil(run_time);
        if frames == 0 {
            return Err(ReelError::animation(format!(
                "play '{label}' must last at least one frame (run_time={run_time})"
            )));
        }
        if animations.is_empty() {
            return Err(ReelError::animation(format!(
                "play '{label}' has no animations"
            )));
        }
        self.push(Directive::Play(Play {
            label,
            frames,
            animations,
        }))
    }

    /// Hold for `secs` seconds.
    pub fn wait(&mut self, label: impl Into<String>, secs: f64) -> ReelResult<()> {
        let frames = self.fps.secs_to_frames_ceil(secs);
        self.wait_frames(label, frames)
    }

    /// Hold for exactly `frames` frames.
    pub fn wait_frames(&mut self, label: impl Into<String>, frames: u64) -> ReelResult<()> {
        if frames == 0 {
            return Err(ReelError::animation("wait must last at least one frame"));
        }
        self.push(Directive::Wait {
            label: label.into(),
            frames,
        })
    }

    /// Finish the script.
    pub fn build(self) -> ReelResult<Timeline> {
        let timeline = Timeline {
            canvas: self.canvas,
            fps: self.fps,
            background: self.background,
            initial: self.initial,
            directives: self.directives,
        };
        if timeline.total_frames() == 0 {
            return Err(ReelError::animation("timeline has no timed directives"));
        }
        Ok(timeline)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/builder.rs"]
mod tests;
