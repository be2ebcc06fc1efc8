//! Declarative timeline instructions and the rules for applying them to a [`Scene`].

use crate::animation::anim::Lerp;
use crate::animation::ease::Ease;
use crate::assets::color::Color;
use crate::assets::text::TextBlock;
use crate::foundation::core::Vec2;
use crate::foundation::error::{ReelError, ReelResult};
use crate::scene::model::{NodeId, NodePatch, Scene, Tint};

/// What an animation does to its target(s).
#[derive(Clone, Debug)]
pub enum AnimationKind {
    /// Stage the node and raise its opacity from 0 to its current value.
    FadeIn(NodeId),
    /// Lower the node's opacity to 0, then unstage it and restore the opacity.
    FadeOut(NodeId),
    /// Stage the node and draw its outline progressively.
    Create(NodeId),
    /// Stage a text node and reveal its glyphs left to right.
    Write(NodeId),
    /// Stage an arrow and extend it from its start point.
    GrowArrow(NodeId),
    /// Cross-fade `from` into `to` while `to` travels from `from`'s center to its own.
    /// `from` is unstaged at the end.
    Transform {
        /// Outgoing node.
        from: NodeId,
        /// Incoming node.
        to: NodeId,
    },
    /// Interpolate center, scale and opacity toward the patch.
    Tween {
        /// Target node.
        node: NodeId,
        /// End values.
        patch: NodePatch,
    },
    /// Briefly scale the node up and tint it, then return.
    Indicate {
        /// Target node.
        node: NodeId,
        /// Tint color at the peak.
        color: Color,
        /// Scale factor at the peak.
        scale: f64,
    },
}

impl AnimationKind {
    /// Rate function used when none is given.
    pub fn default_ease(&self) -> Ease {
        match self {
            Self::Write(_) => Ease::Linear,
            Self::Indicate { .. } => Ease::ThereAndBack,
            _ => Ease::Smooth,
        }
    }
}

/// An animation with its rate function.
#[derive(Clone, Debug)]
pub struct Animation {
    /// Effect.
    pub kind: AnimationKind,
    /// Rate function applied to play progress.
    pub ease: Ease,
}

impl Animation {
    /// Wrap `kind` with its default rate function.
    pub fn new(kind: AnimationKind) -> Self {
        let ease = kind.default_ease();
        Self { kind, ease }
    }

    /// Override the rate function.
    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }
}

/// Animations sharing one time span.
#[derive(Clone, Debug)]
pub struct Play {
    /// Segment label shown in schedules.
    pub label: String,
    /// Span in frames (at least 1).
    pub frames: u64,
    /// Effects, applied in order.
    pub animations: Vec<Animation>,
}

/// One timeline instruction. Only `Play` and `Wait` take time.
#[derive(Clone, Debug)]
pub enum Directive {
    /// Stage nodes on top.
    Add(Vec<NodeId>),
    /// Unstage nodes (and their members).
    Remove(Vec<NodeId>),
    /// Make `children` members of `group`.
    Group {
        /// Group node.
        group: NodeId,
        /// New members.
        children: Vec<NodeId>,
    },
    /// Instant placement/opacity change.
    Set {
        /// Target node.
        node: NodeId,
        /// New values.
        patch: NodePatch,
    },
    /// Replace a text node's content.
    SetText {
        /// Target node.
        node: NodeId,
        /// New shaped text.
        block: TextBlock,
    },
    /// Set a blended image's blend factor.
    SetBlend {
        /// Target node.
        node: NodeId,
        /// Blend factor.
        alpha: f64,
    },
    /// Run animations over a span of frames.
    Play(Play),
    /// Hold the scene.
    Wait {
        /// Segment label shown in schedules.
        label: String,
        /// Span in frames.
        frames: u64,
    },
}

impl Directive {
    /// Frames this directive occupies.
    pub fn frames(&self) -> u64 {
        match self {
            Self::Play(p) => p.frames,
            Self::Wait { frames, .. } => *frames,
            _ => 0,
        }
    }

    /// Apply the directive to completion.
    pub fn apply(&self, scene: &mut Scene) -> ReelResult<()> {
        match self {
            Self::Add(ids) => {
                for &id in ids {
                    scene.stage_add(id)?;
                }
                Ok(())
            }
            Self::Remove(ids) => {
                for &id in ids {
                    scene.stage_remove(id)?;
                }
                Ok(())
            }
            Self::Group { group, children } => scene.adopt(*group, children),
            Self::Set { node, patch } => {
                patch.apply(scene.node_mut(*node)?);
                Ok(())
            }
            Self::SetText { node, block } => scene.set_text(*node, block.clone()),
            Self::SetBlend { node, alpha } => scene.set_blend(*node, *alpha),
            Self::Play(play) => {
                let start = scene.clone();
                play.sample(&start, scene, 1.0)?;
                play.finish(&start, scene)
            }
            Self::Wait { .. } => Ok(()),
        }
    }
}

impl Play {
    /// Progress sampled on local frame `k` of the span: `(k + 1) / frames`.
    pub fn progress(&self, local_frame: u64) -> f64 {
        if self.frames == 0 {
            return 1.0;
        }
        ((local_frame + 1) as f64 / self.frames as f64).min(1.0)
    }

    /// Write the state at raw progress `t` into `scene`, starting from `start`.
    pub fn sample(&self, start: &Scene, scene: &mut Scene, t: f64) -> ReelResult<()> {
        for anim in &self.animations {
            let e = anim.ease.apply(t);
            sample_animation(&anim.kind, start, scene, e)?;
        }
        Ok(())
    }

    /// Post-play cleanup: unstage faded-out and transformed-away nodes and restore their opacity.
    pub fn finish(&self, start: &Scene, scene: &mut Scene) -> ReelResult<()> {
        for anim in &self.animations {
            match &anim.kind {
                AnimationKind::FadeOut(id) | AnimationKind::Transform { from: id, .. } => {
                    scene.stage_remove(*id)?;
                    scene.node_mut(*id)?.opacity = start.node(*id)?.opacity;
                }
                AnimationKind::Indicate { node, .. } => {
                    let orig = start.node(*node)?;
                    let (scale, tint) = (orig.scale, orig.tint);
                    let n = scene.node_mut(*node)?;
                    n.scale = scale;
                    n.tint = tint;
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn sample_animation(
    kind: &AnimationKind,
    start: &Scene,
    scene: &mut Scene,
    e: f64,
) -> ReelResult<()> {
    match kind {
        AnimationKind::FadeIn(id) => {
            scene.stage_add(*id)?;
            let base = start.node(*id)?.opacity;
            scene.node_mut(*id)?.opacity = base * e;
        }
        AnimationKind::FadeOut(id) => {
            let base = start.node(*id)?.opacity;
            scene.node_mut(*id)?.opacity = base * (1.0 - e);
        }
        AnimationKind::Create(id) | AnimationKind::Write(id) | AnimationKind::GrowArrow(id) => {
            scene.stage_add(*id)?;
            scene.node_mut(*id)?.reveal = e;
        }
        AnimationKind::Transform { from, to } => {
            if from == to {
                return Err(ReelError::animation("transform needs two distinct nodes"));
            }
            scene.stage_add(*to)?;
            let from_base = start.node(*from)?.opacity;
            let to_start = start.node(*to)?;
            let to_base = to_start.opacity;
            let to_center = to_start.center;
            let offset: Vec2 = start.world_center(*from)? - start.world_center(*to)?;
            let travel = <Vec2 as Lerp>::lerp(&offset, &Vec2::ZERO, e);

            scene.node_mut(*from)?.opacity = from_base * (1.0 - e);
            let n = scene.node_mut(*to)?;
            n.opacity = to_base * e;
            n.center = to_center + travel;
        }
        AnimationKind::Tween { node, patch } => {
            let start_node = start.node(*node)?.clone();
            patch.apply_partial(&start_node, scene.node_mut(*node)?, e);
        }
        AnimationKind::Indicate { node, color, scale } => {
            let base = start.node(*node)?.scale;
            let n = scene.node_mut(*node)?;
            n.scale = base * <f64 as Lerp>::lerp(&1.0, scale, e);
            n.tint = Some(Tint {
                color: *color,
                amount: e,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/directive.rs"]
mod tests;
