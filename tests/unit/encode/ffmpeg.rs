use super::*;
use crate::foundation::core::Fps;

fn cfg(width: u32, height: u32, num: u32) -> SinkConfig {
    SinkConfig {
        width,
        height,
        fps: Fps { num, den: 1 },
    }
}

fn px(rgba: [u8; 4], premultiplied: bool) -> FrameRGBA {
    FrameRGBA {
        width: 1,
        height: 1,
        data: rgba.to_vec(),
        premultiplied,
    }
}

fn flattened(frame: &FrameRGBA, bg: Color) -> Vec<u8> {
    let mut dst = vec![0u8; frame.data.len()];
    flatten_onto(&mut dst, frame, bg).unwrap();
    dst
}

#[test]
fn config_validation_catches_bad_values() {
    assert!(validate_sink_config(&cfg(0, 10, 30)).is_err());
    assert!(validate_sink_config(&cfg(11, 10, 30)).is_err());
    assert!(validate_sink_config(&cfg(10, 10, 0)).is_err());
    assert!(validate_sink_config(&cfg(1080, 1920, 60)).is_ok());
}

#[test]
fn encoder_args_describe_rgba_pipe_to_h264_mp4() {
    let cfg = SinkConfig {
        width: 1080,
        height: 1920,
        fps: Fps { num: 60, den: 1 },
    };
    let args: Vec<String> = encoder_args(&cfg, Path::new("out/reel.mp4"), true)
        .into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();

    assert_eq!(args.first().map(String::as_str), Some("-y"));
    assert_eq!(args.last().map(String::as_str), Some("out/reel.mp4"));
    let after = |flag: &str| {
        let i = args.iter().position(|a| a == flag).unwrap();
        args[i + 1].clone()
    };
    assert_eq!(after("-s"), "1080x1920");
    assert_eq!(after("-r"), "60/1");
    assert_eq!(after("-i"), "pipe:0");
    assert_eq!(after("-c:v"), "libx264");
    assert_eq!(after("-movflags"), "+faststart");
    // Input pixel format precedes `-i`, output pixel format follows it.
    let input = args.iter().position(|a| a == "-i").unwrap();
    assert_eq!(args[..input].iter().filter(|a| *a == "rgba").count(), 1);
    assert_eq!(args[input..].iter().filter(|a| *a == "yuv420p").count(), 1);
    assert!(args.iter().any(|a| a == "-an"));

    let keep = encoder_args(&cfg, Path::new("reel.mp4"), false);
    assert_eq!(keep[0], OsString::from("-n"));
}

#[test]
fn flatten_premul_over_black_produces_expected_rgb() {
    let out = flattened(&px([128, 0, 0, 128], true), Color::rgb(0, 0, 0));
    assert_eq!(out, vec![128, 0, 0, 255]);
}

#[test]
fn flatten_straight_over_black_produces_expected_rgb() {
    let out = flattened(&px([255, 0, 0, 128], false), Color::rgb(0, 0, 0));
    assert_eq!(out, vec![128, 0, 0, 255]);
}

#[test]
fn flatten_transparent_pixel_shows_background() {
    let out = flattened(&px([0, 0, 0, 0], true), Color::rgb(10, 20, 30));
    assert_eq!(out, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_opaque_pixel_is_unchanged() {
    let out = flattened(&px([1, 2, 3, 255], true), Color::rgb(10, 20, 30));
    assert_eq!(out, vec![1, 2, 3, 255]);
}

#[test]
fn flatten_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    let frame = px([0, 0, 0, 255], true);
    assert!(flatten_onto(&mut dst, &frame, Color::rgb(0, 0, 0)).is_err());
}

#[test]
fn push_before_begin_is_an_error() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("out.mp4"));
    let frame = FrameRGBA {
        width: 2,
        height: 2,
        data: vec![0; 16],
        premultiplied: true,
    };
    assert!(sink.push_frame(FrameIndex(0), &frame).is_err());
    assert!(sink.end().is_err());
}

#[test]
fn begin_rejects_odd_size_before_spawning() {
    let dir = std::env::temp_dir().join("diffusion-reel-ffmpeg-odd");
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(dir.join("odd.mp4")));
    let err = sink.begin(cfg(11, 10, 30)).unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
    assert!(sink.end().is_err());
}
