use super::*;
use crate::animation::ease::Ease;
use crate::assets::color::Color;
use crate::assets::text::MonospaceMetrics;
use crate::foundation::core::{Canvas, Fps, Point};
use crate::scene::model::{FillStyle, NodeId, Style};
use crate::timeline::builder::TimelineBuilder;
use crate::timeline::directive::{Animation, AnimationKind};

fn fade_timeline() -> (Timeline, NodeId) {
    let mut shaper = MonospaceMetrics;
    let mut b = TimelineBuilder::new(
        Canvas {
            width: 64,
            height: 64,
        },
        Fps::new(10, 1).unwrap(),
        Color::rgb(10, 10, 10),
        4.0,
        &mut shaper,
    )
    .unwrap();
    let style = Style {
        stroke: None,
        fill: Some(FillStyle::new(Color::WHITE, 1.0)),
    };
    let id = b.rect(1.0, 1.0, 0.0, style, Point::ORIGIN);
    b.play(
        "in",
        0.4,
        vec![Animation::new(AnimationKind::FadeIn(id)).with_ease(Ease::Linear)],
    )
    .unwrap();
    b.wait("hold", 0.2).unwrap();
    b.play(
        "out",
        0.2,
        vec![Animation::new(AnimationKind::FadeOut(id)).with_ease(Ease::Linear)],
    )
    .unwrap();
    (b.build().unwrap(), id)
}

#[test]
fn walks_plays_and_waits() {
    let (tl, id) = fade_timeline();
    let mut p = Player::new(&tl);
    assert_eq!(p.total_frames(), 8);

    let s0 = p.scene_at(FrameIndex(0)).unwrap();
    assert!(s0.is_staged(id));
    assert!((s0.node(id).unwrap().opacity - 0.25).abs() < 1e-12);

    let s3 = p.scene_at(FrameIndex(3)).unwrap();
    assert_eq!(s3.node(id).unwrap().opacity, 1.0);

    let s5 = p.scene_at(FrameIndex(5)).unwrap();
    assert_eq!(s5.node(id).unwrap().opacity, 1.0);

    let s6 = p.scene_at(FrameIndex(6)).unwrap();
    assert!((s6.node(id).unwrap().opacity - 0.5).abs() < 1e-12);
    let s7 = p.scene_at(FrameIndex(7)).unwrap();
    assert_eq!(s7.node(id).unwrap().opacity, 0.0);
}

#[test]
fn seeking_backward_matches_fresh_evaluation() {
    let (tl, id) = fade_timeline();
    let mut walked = Player::new(&tl);
    walked.scene_at(FrameIndex(7)).unwrap();
    let back = walked.scene_at(FrameIndex(1)).unwrap();

    let mut fresh = Player::new(&tl);
    let direct = fresh.scene_at(FrameIndex(1)).unwrap();
    assert_eq!(
        back.node(id).unwrap().opacity,
        direct.node(id).unwrap().opacity
    );
    assert_eq!(back.stage(), direct.stage());
}

#[test]
fn out_of_range_frame_is_rejected() {
    let (tl, _) = fade_timeline();
    let mut p = Player::new(&tl);
    assert!(matches!(
        p.scene_at(FrameIndex(8)),
        Err(ReelError::Validation(_))
    ));
}

#[test]
fn evaluate_flattens_with_background() {
    let (tl, _) = fade_timeline();
    let mut p = Player::new(&tl);
    let f = p.evaluate(FrameIndex(4)).unwrap();
    assert_eq!((f.width, f.height), (64, 64));
    assert_eq!(f.background, Color::rgb(10, 10, 10));
    assert_eq!(f.items.len(), 1);
}
