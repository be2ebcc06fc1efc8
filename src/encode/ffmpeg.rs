//! MP4 output: opaque RGBA frames piped into the system `ffmpeg`, encoded as H.264 `yuv420p`.

use std::ffi::OsString;
use std::io::{Read as _, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use crate::assets::color::Color;
use crate::encode::sink::{FrameSink, SinkConfig, ensure_parent_dir};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::backend::FrameRGBA;

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output MP4 file path.
    pub out_path: PathBuf,
    /// Replace an existing file at `out_path`.
    pub overwrite: bool,
    /// Opaque color that translucent pixels are composited over.
    pub background: Color,
}

impl FfmpegSinkOpts {
    /// Overwriting output to `out_path` over black.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            background: Color::rgb(0, 0, 0),
        }
    }
}

/// Streams frames into a child `ffmpeg` process between `begin` and `end`.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    encoder: Option<Encoder>,
    scratch: Vec<u8>,
}

struct Encoder {
    cfg: SinkConfig,
    child: Child,
    stdin: ChildStdin,
    stderr: JoinHandle<std::io::Result<Vec<u8>>>,
    last: Option<FrameIndex>,
}

impl FfmpegSink {
    /// Idle sink; nothing is spawned until `begin`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            encoder: None,
            scratch: Vec::new(),
        }
    }
}

/// Reject configurations libx264/yuv420p cannot encode.
pub fn validate_sink_config(cfg: &SinkConfig) -> ReelResult<()> {
    if cfg.fps.num == 0 || cfg.fps.den == 0 {
        return Err(ReelError::validation("fps must be non-zero"));
    }
    if cfg.width == 0 || cfg.height == 0 {
        return Err(ReelError::validation("mp4 output needs a non-empty frame"));
    }
    if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
        return Err(ReelError::validation(format!(
            "mp4 output needs even dimensions, got {}x{}",
            cfg.width, cfg.height
        )));
    }
    Ok(())
}

/// Command line for one encode: raw RGBA on stdin, no audio, faststart MP4 at `out`.
pub(crate) fn encoder_args(cfg: &SinkConfig, out: &Path, overwrite: bool) -> Vec<OsString> {
    let size = format!("{}x{}", cfg.width, cfg.height);
    let rate = format!("{}/{}", cfg.fps.num, cfg.fps.den);
    let mut args: Vec<OsString> = vec![if overwrite { "-y" } else { "-n" }.into()];
    let input = ["-loglevel", "error", "-f", "rawvideo", "-pix_fmt", "rgba", "-s", size.as_str()];
    let output = ["-an", "-c:v", "libx264", "-pix_fmt", "yuv420p", "-movflags", "+faststart"];
    args.extend(input.map(OsString::from));
    args.extend(["-r", rate.as_str(), "-i", "pipe:0"].map(OsString::from));
    args.extend(output.map(OsString::from));
    args.push(out.into());
    args
}

impl Encoder {
    fn spawn(cfg: SinkConfig, args: Vec<OsString>) -> ReelResult<Self> {
        let mut child = Command::new("ffmpeg")
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ReelError::encode(format!("could not start ffmpeg: {e}")))?;
        let (Some(stdin), Some(mut err)) = (child.stdin.take(), child.stderr.take()) else {
            return Err(ReelError::encode("ffmpeg pipes were not opened"));
        };
        let stderr = std::thread::spawn(move || {
            let mut buf = Vec::new();
            err.read_to_end(&mut buf)?;
            Ok(buf)
        });
        Ok(Self {
            cfg,
            child,
            stdin,
            stderr,
            last: None,
        })
    }

    fn finish(self) -> ReelResult<()> {
        let Self {
            mut child,
            stdin,
            stderr,
            ..
        } = self;
        drop(stdin);
        let status = child
            .wait()
            .map_err(|e| ReelError::encode(format!("waiting for ffmpeg: {e}")))?;
        let log = match stderr.join() {
            Ok(Ok(bytes)) => String::from_utf8_lossy(&bytes).trim().to_owned(),
            Ok(Err(e)) => format!("<stderr unreadable: {e}>"),
            Err(_) => "<stderr reader panicked>".to_owned(),
        };
        if status.success() {
            Ok(())
        } else {
            Err(ReelError::encode(format!("ffmpeg failed ({status}): {log}")))
        }
    }
}

impl FrameSink for FfmpegSink {
    #[tracing::instrument(skip(self), fields(out = %self.opts.out_path.display()))]
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        validate_sink_config(&cfg)?;
        if self.encoder.is_some() {
            return Err(ReelError::encode("ffmpeg sink already started"));
        }
        let out = &self.opts.out_path;
        ensure_parent_dir(out)?;
        if !self.opts.overwrite && out.exists() {
            return Err(ReelError::validation(format!(
                "output file '{}' already exists",
                out.display()
            )));
        }

        let encoder = Encoder::spawn(cfg, encoder_args(&cfg, out, self.opts.overwrite))?;
        tracing::debug!(width = cfg.width, height = cfg.height, "ffmpeg spawned");
        self.scratch = vec![0; cfg.width as usize * cfg.height as usize * 4];
        self.encoder = Some(encoder);
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ReelResult<()> {
        let enc = self
            .encoder
            .as_mut()
            .ok_or_else(|| ReelError::encode("ffmpeg sink not started"))?;
        if enc.last.is_some_and(|last| idx <= last) {
            return Err(ReelError::encode(format!(
                "frame {} arrived out of order",
                idx.0
            )));
        }
        if (frame.width, frame.height) != (enc.cfg.width, enc.cfg.height) {
            return Err(ReelError::validation(format!(
                "frame is {}x{}, encoder expects {}x{}",
                frame.width, frame.height, enc.cfg.width, enc.cfg.height
            )));
        }
        enc.last = Some(idx);

        flatten_onto(&mut self.scratch, frame, self.opts.background)?;
        enc.stdin
            .write_all(&self.scratch)
            .map_err(|e| ReelError::encode(format!("writing frame {} to ffmpeg: {e}", idx.0)))
    }

    fn end(&mut self) -> ReelResult<()> {
        let enc = self
            .encoder
            .take()
            .ok_or_else(|| ReelError::encode("ffmpeg sink not started"))?;
        enc.finish()?;
        tracing::info!(out = %self.opts.out_path.display(), "mp4 written");
        Ok(())
    }
}

/// Composite `frame` over the opaque `bg` into `dst` (same length as the frame data).
pub(crate) fn flatten_onto(dst: &mut [u8], frame: &FrameRGBA, bg: Color) -> ReelResult<()> {
    if dst.len() != frame.data.len() || !dst.len().is_multiple_of(4) {
        return Err(ReelError::validation(
            "flatten buffer does not match the frame size",
        ));
    }
    let bg = [bg.r, bg.g, bg.b].map(u16::from);
    for (d, s) in dst.chunks_exact_mut(4).zip(frame.data.chunks_exact(4)) {
        let a = u16::from(s[3]);
        for c in 0..3 {
            let fg = u16::from(s[c]);
            let fg = if frame.premultiplied {
                fg
            } else {
                mul_div255_u16(fg, a)
            };
            d[c] = (fg + mul_div255_u16(bg[c], 255 - a)).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
