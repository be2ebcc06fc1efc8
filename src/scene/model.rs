//! Retained scene graph.
//!
//! Nodes live in an arena addressed by [`NodeId`]. Positions are in scene units with y growing
//! upward and the origin at the canvas center. A node's `center` is relative to its parent
//! group's center (in the parent's scaled space), or absolute for root nodes.
//!
//! The stage is the painter-ordered list of nodes currently on screen. Staging a group draws all
//! of its descendants.

use std::sync::Arc;

use crate::animation::anim::Lerp;
use crate::assets::color::Color;
use crate::assets::text::TextBlock;
use crate::foundation::core::{Affine, Point, Rect, Vec2};
use crate::foundation::error::{ReelError, ReelResult};
use crate::latent::grid::RgbaGrid;
use crate::latent::procedural::interpolate;

/// Index of a node in the scene arena.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct NodeId(pub u32);

/// Outline paint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    /// Stroke color.
    pub color: Color,
    /// Width in stroke points (1/100 scene unit).
    pub width_pt: f64,
    /// Opacity multiplier in `[0, 1]`.
    pub opacity: f64,
    /// Dash `(on, off)` lengths in scene units.
    pub dash: Option<(f64, f64)>,
}

impl StrokeStyle {
    /// Solid opaque stroke.
    pub fn solid(color: Color, width_pt: f64) -> Self {
        Self {
            color,
            width_pt,
            opacity: 1.0,
            dash: None,
        }
    }

    /// Same stroke with a different opacity.
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    /// Same stroke, dashed.
    pub fn dashed(mut self, on: f64, off: f64) -> Self {
        self.dash = Some((on, off));
        self
    }
}

/// Interior paint (also the glyph color for text).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FillStyle {
    /// Fill color.
    pub color: Color,
    /// Opacity multiplier in `[0, 1]`.
    pub opacity: f64,
}

impl FillStyle {
    /// Fill with `color` at `opacity`.
    pub fn new(color: Color, opacity: f64) -> Self {
        Self { color, opacity }
    }
}

/// Paint applied to a node's geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Style {
    /// Optional outline.
    pub stroke: Option<StrokeStyle>,
    /// Optional interior.
    pub fill: Option<FillStyle>,
}

/// Pixels behind an image node.
#[derive(Clone, Debug)]
pub enum ImageSource {
    /// A fixed grid.
    Static(Arc<RgbaGrid>),
    /// `interpolate(from, to, alpha)`, recomputed whenever the node is drawn.
    Blend {
        /// Grid at `alpha = 0`.
        from: Arc<RgbaGrid>,
        /// Grid at `alpha = 1`.
        to: Arc<RgbaGrid>,
        /// Current blend factor.
        alpha: f64,
    },
}

impl ImageSource {
    /// Grid to display, resolving blends.
    pub fn resolve(&self) -> ReelResult<Arc<RgbaGrid>> {
        match self {
            Self::Static(grid) => Ok(grid.clone()),
            Self::Blend { from, to, alpha } => Ok(Arc::new(interpolate(from, to, *alpha)?)),
        }
    }

    fn aspect(&self) -> f64 {
        let grid = match self {
            Self::Static(grid) => grid,
            Self::Blend { from, .. } => from,
        };
        if grid.height() == 0 {
            1.0
        } else {
            f64::from(grid.width()) / f64::from(grid.height())
        }
    }
}

/// Geometry of a node, in local scene units around its center.
#[derive(Clone, Debug)]
pub enum NodeKind {
    /// Axis-aligned (optionally rounded) rectangle.
    Rect {
        /// Width.
        width: f64,
        /// Height.
        height: f64,
        /// Corner radius; 0 for sharp corners.
        corner_radius: f64,
    },
    /// Straight segment between two offsets from the center, optionally ending in an arrow tip.
    Line {
        /// Start offset.
        from: Vec2,
        /// End offset.
        to: Vec2,
        /// Draw a filled tip at `to`.
        tip: bool,
    },
    /// Single-line text, centered on the node.
    Text {
        /// Shaped text (sizes in output pixels).
        block: TextBlock,
    },
    /// Raster image shown with hard pixel edges.
    Image {
        /// Pixel source.
        source: ImageSource,
        /// Displayed height; width follows the grid aspect ratio.
        height: f64,
    },
    /// Container; members are positioned relative to the group's center.
    Group {
        /// Members in paint order.
        children: Vec<NodeId>,
    },
}

/// Temporary color override used by highlight animations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tint {
    /// Target color.
    pub color: Color,
    /// Blend amount toward `color` in `[0, 1]`.
    pub amount: f64,
}

/// One scene node.
#[derive(Clone, Debug)]
pub struct Node {
    /// Geometry.
    pub kind: NodeKind,
    /// Paint.
    pub style: Style,
    /// Center relative to the parent (or the scene origin).
    pub center: Point,
    /// Uniform scale about the center.
    pub scale: f64,
    /// Opacity multiplier, inherited by descendants.
    pub opacity: f64,
    /// Fraction of the outline (or glyphs) drawn, inherited by descendants.
    pub reveal: f64,
    /// Highlight override, inherited by descendants that have none.
    pub tint: Option<Tint>,
    /// Owning group.
    pub parent: Option<NodeId>,
}

impl Node {
    /// A root node at `center` with identity scale, full opacity and full reveal.
    pub fn new(kind: NodeKind, style: Style, center: Point) -> Self {
        Self {
            kind,
            style,
            center,
            scale: 1.0,
            opacity: 1.0,
            reveal: 1.0,
            tint: None,
            parent: None,
        }
    }

    /// Transform from this node's local space to its parent's space.
    pub fn local_affine(&self) -> Affine {
        Affine::translate(self.center.to_vec2()) * Affine::scale(self.scale)
    }
}

/// Instant or tweened change to a node's placement and opacity.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodePatch {
    /// New center (parent space).
    pub center: Option<Point>,
    /// New scale.
    pub scale: Option<f64>,
    /// New opacity.
    pub opacity: Option<f64>,
}

impl NodePatch {
    /// Patch that only moves the node.
    pub fn center(p: Point) -> Self {
        Self {
            center: Some(p),
            ..Self::default()
        }
    }

    /// Patch that only changes opacity.
    pub fn opacity(v: f64) -> Self {
        Self {
            opacity: Some(v),
            ..Self::default()
        }
    }

    /// Write the patch's fields onto `node`.
    pub fn apply(&self, node: &mut Node) {
        if let Some(c) = self.center {
            node.center = c;
        }
        if let Some(s) = self.scale {
            node.scale = s;
        }
        if let Some(o) = self.opacity {
            node.opacity = o;
        }
    }

    /// Write `start` moved `t` of the way toward the patch onto `node`.
    pub fn apply_partial(&self, start: &Node, node: &mut Node, t: f64) {
        if let Some(c) = self.center {
            node.center = <Point as Lerp>::lerp(&start.center, &c, t);
        }
        if let Some(s) = self.scale {
            node.scale = <f64 as Lerp>::lerp(&start.scale, &s, t);
        }
        if let Some(o) = self.opacity {
            node.opacity = <f64 as Lerp>::lerp(&start.opacity, &o, t);
        }
    }
}

/// Node arena plus the stage.
#[derive(Clone, Debug)]
pub struct Scene {
    nodes: Vec<Node>,
    stage: Vec<NodeId>,
    pixels_per_unit: f64,
}

impl Scene {
    /// Empty scene. `pixels_per_unit` converts shaped text sizes into scene units.
    pub fn new(pixels_per_unit: f64) -> Self {
        Self {
            nodes: Vec::new(),
            stage: Vec::new(),
            pixels_per_unit,
        }
    }

    /// Pixels per scene unit.
    pub fn pixels_per_unit(&self) -> f64 {
        self.pixels_per_unit
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Return `true` when the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a node to the arena (not to the stage).
    pub fn insert(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Borrow a node.
    pub fn node(&self, id: NodeId) -> ReelResult<&Node> {
        self.nodes
            .get(id.0 as usize)
            .ok_or_else(|| ReelError::evaluation(format!("unknown node id {}", id.0)))
    }

    /// Mutably borrow a node.
    pub fn node_mut(&mut self, id: NodeId) -> ReelResult<&mut Node> {
        self.nodes
            .get_mut(id.0 as usize)
            .ok_or_else(|| ReelError::evaluation(format!("unknown node id {}", id.0)))
    }

    /// Painter-ordered staged nodes.
    pub fn stage(&self) -> &[NodeId] {
        &self.stage
    }

    /// Return `true` when `id` or one of its ancestors is staged.
    pub fn is_staged(&self, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(n) = cur {
            if self.stage.contains(&n) {
                return true;
            }
            cur = self.nodes.get(n.0 as usize).and_then(|node| node.parent);
        }
        false
    }

    /// Put `id` on top of the stage. No-op when it is already visible.
    pub fn stage_add(&mut self, id: NodeId) -> ReelResult<()> {
        self.node(id)?;
        if !self.is_staged(id) {
            self.stage.push(id);
        }
        Ok(())
    }

    /// Take `id` and all its descendants off the stage.
    pub fn stage_remove(&mut self, id: NodeId) -> ReelResult<()> {
        let mut doomed = vec![id];
        self.collect_descendants(id, &mut doomed)?;
        self.stage.retain(|s| !doomed.contains(s));
        Ok(())
    }

    fn collect_descendants(&self, id: NodeId, out: &mut Vec<NodeId>) -> ReelResult<()> {
        if let NodeKind::Group { children } = &self.node(id)?.kind {
            for &c in children {
                out.push(c);
                self.collect_descendants(c, out)?;
            }
        }
        Ok(())
    }

    /// Make `children` members of `group`, keeping their on-screen placement.
    ///
    /// Children must not already belong to a group.
    pub fn adopt(&mut self, group: NodeId, children: &[NodeId]) -> ReelResult<()> {
        if !matches!(self.node(group)?.kind, NodeKind::Group { .. }) {
            return Err(ReelError::animation(format!(
                "node {} is not a group",
                group.0
            )));
        }
        let group_world = self.world_affine(group)?;
        let inv = group_world.inverse();
        for &c in children {
            if c == group {
                return Err(ReelError::animation("a group cannot contain itself"));
            }
            if self.node(c)?.parent.is_some() {
                return Err(ReelError::animation(format!(
                    "node {} already belongs to a group",
                    c.0
                )));
            }
            let world = self.world_center(c)?;
            let group_scale = self.world_scale(group)?;
            let node = self.node_mut(c)?;
            node.center = inv * world;
            node.scale /= group_scale;
            node.parent = Some(group);
        }
        if let NodeKind::Group { children: members } = &mut self.node_mut(group)?.kind {
            members.extend_from_slice(children);
        }
        Ok(())
    }

    /// Local-to-scene transform of `id`.
    pub fn world_affine(&self, id: NodeId) -> ReelResult<Affine> {
        let node = self.node(id)?;
        let local = node.local_affine();
        match node.parent {
            Some(p) => Ok(self.world_affine(p)? * local),
            None => Ok(local),
        }
    }

    /// Product of scales along the parent chain.
    pub fn world_scale(&self, id: NodeId) -> ReelResult<f64> {
        let node = self.node(id)?;
        match node.parent {
            Some(p) => Ok(self.world_scale(p)? * node.scale),
            None => Ok(node.scale),
        }
    }

    /// Center of `id` in scene space.
    pub fn world_center(&self, id: NodeId) -> ReelResult<Point> {
        Ok(self.world_affine(id)? * Point::ORIGIN)
    }

    /// Opacity multiplied down the parent chain.
    pub fn world_opacity(&self, id: NodeId) -> ReelResult<f64> {
        let node = self.node(id)?;
        let own = node.opacity.clamp(0.0, 1.0);
        match node.parent {
            Some(p) => Ok(self.world_opacity(p)? * own),
            None => Ok(own),
        }
    }

    /// Reveal fraction multiplied down the parent chain.
    pub fn world_reveal(&self, id: NodeId) -> ReelResult<f64> {
        let node = self.node(id)?;
        let own = node.reveal.clamp(0.0, 1.0);
        match node.parent {
            Some(p) => Ok(self.world_reveal(p)? * own),
            None => Ok(own),
        }
    }

    /// Nearest tint along the parent chain.
    pub fn world_tint(&self, id: NodeId) -> ReelResult<Option<Tint>> {
        let node = self.node(id)?;
        match (node.tint, node.parent) {
            (Some(t), _) => Ok(Some(t)),
            (None, Some(p)) => self.world_tint(p),
            (None, None) => Ok(None),
        }
    }

    /// Local bounds of a leaf (empty for groups), in scene units around the center.
    pub fn local_bounds(&self, id: NodeId) -> ReelResult<Option<Rect>> {
        let node = self.node(id)?;
        let r = match &node.kind {
            NodeKind::Rect { width, height, .. } => {
                Rect::from_center_size(Point::ORIGIN, (*width, *height))
            }
            NodeKind::Line { from, to, .. } => {
                Rect::from_points(from.to_point(), to.to_point())
            }
            NodeKind::Text { block } => Rect::from_center_size(
                Point::ORIGIN,
                (
                    block.width / self.pixels_per_unit,
                    block.height / self.pixels_per_unit,
                ),
            ),
            NodeKind::Image { source, height } => {
                Rect::from_center_size(Point::ORIGIN, (height * source.aspect(), *height))
            }
            NodeKind::Group { .. } => return Ok(None),
        };
        Ok(Some(r))
    }

    /// Scene-space bounds of `id`; groups union their members.
    pub fn bounds(&self, id: NodeId) -> ReelResult<Rect> {
        if let NodeKind::Group { children } = &self.node(id)?.kind {
            let mut acc: Option<Rect> = None;
            for &c in children {
                let b = self.bounds(c)?;
                acc = Some(acc.map_or(b, |a| a.union(b)));
            }
            return match acc {
                Some(r) => Ok(r),
                None => {
                    let c = self.world_center(id)?;
                    Ok(Rect::from_center_size(c, (0.0, 0.0)))
                }
            };
        }

        let local = self.local_bounds(id)?.unwrap_or_default();
        Ok(self.world_affine(id)?.transform_rect_bbox(local))
    }

    /// Union of the bounds of several nodes.
    pub fn bounds_of(&self, ids: &[NodeId]) -> ReelResult<Rect> {
        let mut acc: Option<Rect> = None;
        for &id in ids {
            let b = self.bounds(id)?;
            acc = Some(acc.map_or(b, |a| a.union(b)));
        }
        acc.ok_or_else(|| ReelError::validation("bounds_of expects at least one node"))
    }

    /// Replace the text of a text node.
    pub fn set_text(&mut self, id: NodeId, block: TextBlock) -> ReelResult<()> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Text { block: b } => {
                *b = block;
                Ok(())
            }
            _ => Err(ReelError::animation(format!(
                "node {} is not a text node",
                id.0
            ))),
        }
    }

    /// Set the blend factor of a blended image node.
    pub fn set_blend(&mut self, id: NodeId, value: f64) -> ReelResult<()> {
        if !value.is_finite() {
            return Err(ReelError::animation("blend alpha must be finite"));
        }
        match &mut self.node_mut(id)?.kind {
            NodeKind::Image {
                source: ImageSource::Blend { alpha, .. },
                ..
            } => {
                *alpha = value.clamp(0.0, 1.0);
                Ok(())
            }
            _ => Err(ReelError::animation(format!(
                "node {} is not a blended image",
                id.0
            ))),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
