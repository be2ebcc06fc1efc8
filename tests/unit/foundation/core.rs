use super::*;

#[test]
fn frame_range_contains_boundaries() {
    let r = FrameRange::new(FrameIndex(2), FrameIndex(5)).unwrap();
    assert!(!r.contains(FrameIndex(1)));
    assert!(r.contains(FrameIndex(2)));
    assert!(r.contains(FrameIndex(4)));
    assert!(!r.contains(FrameIndex(5)));
    assert_eq!(r.len_frames(), 3);
}

#[test]
fn frame_range_rejects_inverted_bounds() {
    assert!(FrameRange::new(FrameIndex(5), FrameIndex(2)).is_err());
}

#[test]
fn secs_to_frames_ceil_absorbs_float_noise() {
    let fps = Fps::new(60, 1).unwrap();
    assert_eq!(fps.secs_to_frames_ceil(0.2), 12);
    assert_eq!(fps.secs_to_frames_ceil(1.0 / 60.0), 1);
    assert_eq!(fps.secs_to_frames_ceil(0.03), 2);
    assert_eq!(fps.secs_to_frames_ceil(1.5), 90);
    assert_eq!(fps.secs_to_frames_ceil(0.0), 0);
    assert_eq!(fps.secs_to_frames_ceil(-1.0), 0);
}

#[test]
fn canvas_validate_rejects_zero_and_oversized() {
    assert!(
        Canvas {
            width: 0,
            height: 10
        }
        .validate()
        .is_err()
    );
    assert!(
        Canvas {
            width: 70_000,
            height: 10
        }
        .validate()
        .is_err()
    );
    let c = Canvas {
        width: 1080,
        height: 1920,
    };
    assert!(c.validate().is_ok());
}
