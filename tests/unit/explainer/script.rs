use super::*;
use crate::assets::text::MonospaceMetrics;
use crate::foundation::core::FrameIndex;
use crate::scene::flatten::DrawItem;
use crate::timeline::directive::Directive;
use crate::timeline::player::Player;

fn seeded(seed: u64) -> Explainer {
    let config = ReelConfig {
        seed: Some(seed),
        ..ReelConfig::default()
    };
    build_explainer(&config, &mut MonospaceMetrics).unwrap()
}

fn step_values(ex: &Explainer) -> Vec<u32> {
    let mut out = Vec::new();
    for d in &ex.timeline.directives {
        if let Directive::SetText { node, block } = d
            && *node == ex.cast.step_label
        {
            let n = block.text.trim_start_matches("TIMESTEP: ");
            out.push(n.parse::<u32>().unwrap());
        }
    }
    out
}

#[test]
fn schedule_sums_play_and_wait_frames() {
    let ex = seeded(7);
    let schedule = ex.timeline.schedule();
    let summed: u64 = schedule.segments.iter().map(|s| s.range.len_frames()).sum();
    assert_eq!(summed, schedule.total_frames);
    assert_eq!(schedule.total_frames, ex.timeline.total_frames());
    assert!((schedule.duration_secs - summed as f64 / 60.0).abs() < 1e-9);
}

#[test]
fn timestep_counts_down_to_zero() {
    let ex = seeded(7);
    match &ex.timeline.initial.node(ex.cast.step_label).unwrap().kind {
        NodeKind::Text { block } => assert_eq!(block.text, "TIMESTEP: 50"),
        other => panic!("unexpected step label kind: {other:?}"),
    }

    let values = step_values(&ex);
    assert_eq!(values.len(), 50);
    assert_eq!(values.first(), Some(&49));
    assert_eq!(values.last(), Some(&0));
    assert!(values.windows(2).all(|w| w[1] < w[0]));
}

#[test]
fn timestep_mapping_endpoints() {
    assert_eq!(timestep_at(0.0), 50);
    assert_eq!(timestep_at(0.5), 25);
    assert_eq!(timestep_at(1.0), 0);
    assert_eq!(timestep_text(12), "TIMESTEP: 12");
}

#[test]
fn denoise_loop_spans_six_seconds_plus_pulses() {
    let ex = seeded(7);
    let schedule = ex.timeline.schedule();
    let loop_frames: u64 = schedule
        .segments_labelled(DENOISE_LABEL)
        .map(|s| s.range.len_frames())
        .sum();
    // 360 one-frame holds and six pairs of 12-frame pulses.
    assert_eq!(loop_frames, 360 + 6 * 24);

    let blends: Vec<f64> = ex
        .timeline
        .directives
        .iter()
        .filter_map(|d| match d {
            Directive::SetBlend { node, alpha } if *node == ex.cast.latent => Some(*alpha),
            _ => None,
        })
        .collect();
    assert_eq!(blends.len(), 360);
    assert_eq!(blends[0], 0.0);
    assert_eq!(blends[359], 1.0);
    assert!(blends.windows(2).all(|w| w[1] >= w[0]));
}

#[test]
fn final_frame_shows_the_target_image() {
    let ex = seeded(11);
    let mut player = Player::new(&ex.timeline);
    let last = FrameIndex(player.total_frames() - 1);

    let scene = player.scene_at(last).unwrap();
    assert!(scene.is_staged(ex.cast.final_image));
    assert!(scene.is_staged(ex.cast.final_label));
    assert!(!scene.is_staged(ex.cast.latent));
    assert!(!scene.is_staged(ex.cast.context));
    assert_eq!(scene.world_opacity(ex.cast.final_image).unwrap(), 1.0);

    let frame = player.evaluate(last).unwrap();
    let images: Vec<_> = frame
        .items
        .iter()
        .filter_map(|item| match item {
            DrawItem::Image { grid, opacity, .. } => Some((grid.clone(), *opacity)),
            _ => None,
        })
        .collect();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].0.as_bytes(), ex.latents.target.as_bytes());
    assert_eq!(images[0].1, 1.0);
}

#[test]
fn seed_fixes_every_random_draw() {
    let a = seeded(3);
    let b = seeded(3);
    let c = seeded(4);
    assert_eq!(a.seed, 3);
    assert_eq!(a.latents.noise.as_bytes(), b.latents.noise.as_bytes());
    assert_eq!(a.latents.target.as_bytes(), b.latents.target.as_bytes());
    assert_ne!(a.latents.noise.as_bytes(), c.latents.noise.as_bytes());
    assert_eq!(a.timeline.directives.len(), b.timeline.directives.len());
}

#[test]
fn tokens_follow_the_prompt_words() {
    let ex = seeded(7);
    match &ex.timeline.initial.node(ex.cast.tokens).unwrap().kind {
        NodeKind::Group { .. } => {}
        other => panic!("tokens should be a group, got {other:?}"),
    }
    let mut player = Player::new(&ex.timeline);
    let schedule = ex.timeline.schedule();
    let tokenize = schedule
        .segments_labelled("tokenize")
        .next()
        .unwrap()
        .range;
    // First frame after the play: the faded prompt has been unstaged.
    let scene = player.scene_at(tokenize.end).unwrap();
    assert!(scene.is_staged(ex.cast.tokens));
    assert!(!scene.is_staged(ex.cast.prompt));
    match &scene.node(ex.cast.tokens).unwrap().kind {
        NodeKind::Group { children } => assert_eq!(children.len(), 3),
        other => panic!("tokens should be a group, got {other:?}"),
    }
}
