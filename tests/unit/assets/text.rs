use super::*;

#[test]
fn monospace_metrics_measure_by_char_count() {
    let mut shaper = MonospaceMetrics;
    let block = shaper.shape("8k", TextStyle::regular(40.0)).unwrap();
    assert!((block.width - 48.0).abs() < 1e-9);
    assert!((block.height - 48.0).abs() < 1e-9);
    assert_eq!(block.glyph_count(), 0);

    let bold = shaper.shape("héllo", TextStyle::bold(10.0)).unwrap();
    assert!((bold.width - 30.0).abs() < 1e-9);
}

#[test]
fn empty_text_has_zero_width() {
    let block = MonospaceMetrics
        .shape("", TextStyle::regular(12.0))
        .unwrap();
    assert_eq!(block.width, 0.0);
    assert_eq!(block.text, "");
}

#[test]
fn invalid_size_is_rejected() {
    assert!(MonospaceMetrics.shape("x", TextStyle::regular(0.0)).is_err());
    assert!(
        MonospaceMetrics
            .shape("x", TextStyle::regular(f32::NAN))
            .is_err()
    );
}
