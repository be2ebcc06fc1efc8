use super::*;
use crate::foundation::core::Point;
use crate::scene::model::{FillStyle, Node, NodeKind, Style};

fn scene_with_rects(centers: &[Point]) -> (Scene, Vec<NodeId>) {
    let mut scene = Scene::new(100.0);
    let ids = centers
        .iter()
        .map(|&c| {
            scene.insert(Node::new(
                NodeKind::Rect {
                    width: 1.0,
                    height: 1.0,
                    corner_radius: 0.0,
                },
                Style {
                    stroke: None,
                    fill: Some(FillStyle::new(Color::WHITE, 1.0)),
                },
                c,
            ))
        })
        .collect();
    (scene, ids)
}

fn play(frames: u64, animations: Vec<Animation>) -> Play {
    Play {
        label: "test".to_owned(),
        frames,
        animations,
    }
}

#[test]
fn default_rates() {
    let id = NodeId(0);
    assert_eq!(AnimationKind::Write(id).default_ease(), Ease::Linear);
    assert_eq!(AnimationKind::FadeIn(id).default_ease(), Ease::Smooth);
    assert_eq!(
        AnimationKind::Indicate {
            node: id,
            color: Color::WHITE,
            scale: 1.1
        }
        .default_ease(),
        Ease::ThereAndBack
    );
    let a = Animation::new(AnimationKind::Create(id)).with_ease(Ease::Linear);
    assert_eq!(a.ease, Ease::Linear);
}

#[test]
fn progress_reaches_one_on_last_frame() {
    let p = play(4, Vec::new());
    assert_eq!(p.progress(0), 0.25);
    assert_eq!(p.progress(3), 1.0);
    assert_eq!(p.progress(10), 1.0);
}

#[test]
fn fade_in_stages_and_scales_opacity() {
    let (start, ids) = scene_with_rects(&[Point::ORIGIN]);
    let p = play(
        2,
        vec![Animation::new(AnimationKind::FadeIn(ids[0])).with_ease(Ease::Linear)],
    );
    let mut scene = start.clone();
    p.sample(&start, &mut scene, 0.5).unwrap();
    assert!(scene.is_staged(ids[0]));
    assert!((scene.node(ids[0]).unwrap().opacity - 0.5).abs() < 1e-12);
}

#[test]
fn fade_out_unstages_and_restores_opacity() {
    let (mut scene, ids) = scene_with_rects(&[Point::ORIGIN]);
    scene.stage_add(ids[0]).unwrap();
    scene.node_mut(ids[0]).unwrap().opacity = 0.8;

    let d = Directive::Play(play(
        3,
        vec![Animation::new(AnimationKind::FadeOut(ids[0]))],
    ));
    d.apply(&mut scene).unwrap();
    assert!(scene.stage().is_empty());
    assert_eq!(scene.node(ids[0]).unwrap().opacity, 0.8);
}

#[test]
fn transform_travels_and_swaps() {
    let (mut start, ids) = scene_with_rects(&[Point::ORIGIN, Point::new(2.0, 0.0)]);
    start.stage_add(ids[0]).unwrap();
    let p = play(
        4,
        vec![
            Animation::new(AnimationKind::Transform {
                from: ids[0],
                to: ids[1],
            })
            .with_ease(Ease::Linear),
        ],
    );

    let mut mid = start.clone();
    p.sample(&start, &mut mid, 0.5).unwrap();
    assert_eq!(mid.node(ids[1]).unwrap().center, Point::new(1.0, 0.0));
    assert!((mid.node(ids[0]).unwrap().opacity - 0.5).abs() < 1e-12);

    let mut end = start.clone();
    Directive::Play(p).apply(&mut end).unwrap();
    assert_eq!(end.stage(), &[ids[1]]);
    assert_eq!(end.node(ids[1]).unwrap().center, Point::new(2.0, 0.0));
    assert_eq!(end.node(ids[0]).unwrap().opacity, 1.0);
}

#[test]
fn indicate_peaks_mid_play_and_resets() {
    let (start, ids) = scene_with_rects(&[Point::ORIGIN]);
    let p = play(
        12,
        vec![Animation::new(AnimationKind::Indicate {
            node: ids[0],
            color: Color::GRAY,
            scale: 1.1,
        })],
    );

    let mut mid = start.clone();
    p.sample(&start, &mut mid, 0.5).unwrap();
    let n = mid.node(ids[0]).unwrap();
    assert!((n.scale - 1.1).abs() < 1e-9);
    assert_eq!(n.tint.map(|t| t.color), Some(Color::GRAY));

    let mut end = start.clone();
    Directive::Play(p).apply(&mut end).unwrap();
    let n = end.node(ids[0]).unwrap();
    assert_eq!(n.scale, 1.0);
    assert!(n.tint.is_none());
}

#[test]
fn tween_moves_toward_patch() {
    let (start, ids) = scene_with_rects(&[Point::ORIGIN]);
    let patch = NodePatch {
        center: Some(Point::new(-2.0, 4.0)),
        scale: Some(0.4),
        opacity: Some(0.8),
    };
    let d = Directive::Play(play(
        5,
        vec![Animation::new(AnimationKind::Tween {
            node: ids[0],
            patch,
        })],
    ));
    let mut scene = start.clone();
    d.apply(&mut scene).unwrap();
    let n = scene.node(ids[0]).unwrap();
    assert_eq!(n.center, Point::new(-2.0, 4.0));
    assert!((n.scale - 0.4).abs() < 1e-12);
    assert!((n.opacity - 0.8).abs() < 1e-12);
}

#[test]
fn instant_directives_and_frames() {
    let (mut scene, ids) = scene_with_rects(&[Point::ORIGIN]);
    let add = Directive::Add(vec![ids[0]]);
    assert_eq!(add.frames(), 0);
    add.apply(&mut scene).unwrap();
    assert_eq!(scene.stage(), &[ids[0]]);

    Directive::Set {
        node: ids[0],
        patch: NodePatch::opacity(0.3),
    }
    .apply(&mut scene)
    .unwrap();
    assert_eq!(scene.node(ids[0]).unwrap().opacity, 0.3);

    let wait = Directive::Wait {
        label: "hold".to_owned(),
        frames: 7,
    };
    assert_eq!(wait.frames(), 7);
    Directive::Remove(vec![ids[0]]).apply(&mut scene).unwrap();
    assert!(scene.stage().is_empty());
    assert!(
        Directive::SetBlend {
            node: ids[0],
            alpha: 0.5
        }
        .apply(&mut scene)
        .is_err()
    );
}
