use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use image::RgbaImage;

use crate::encode::artifact::{Container, EncodedStream, VideoCodec};
use crate::encode::codec::{CODEC_CASCADE, CodecChoice, negotiate};
use crate::encode::sink::{FrameSink, SinkConfig, check_frame_size, flatten_premul_over_bg};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{StripError, StripResult};
use crate::render::surface::Surface;

const STDOUT_CHUNK: usize = 64 * 1024;

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FfmpegOptions {
    /// ffmpeg executable, resolved through `PATH` when relative.
    pub binary: PathBuf,
    /// Codec preference, walked in order until ffmpeg has a matching encoder.
    pub codecs: Vec<VideoCodec>,
    /// Background color used to flatten alpha (straight RGBA8).
    pub bg_rgba: [u8; 4],
}

impl Default for FfmpegOptions {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("ffmpeg"),
            codecs: CODEC_CASCADE.iter().map(|c| c.codec).collect(),
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

/// Sink that spawns ffmpeg, streams raw frames into stdin and collects the encoded stream from
/// stdout in chunks.
pub struct FfmpegSink {
    opts: FfmpegOptions,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout_drain: Option<JoinHandle<std::io::Result<Vec<Vec<u8>>>>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,

    choice: Option<CodecChoice>,
    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegOptions) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stdout_drain: None,
            stderr_drain: None,
            choice: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }

    /// Codec negotiated in `begin`.
    pub fn codec(&self) -> Option<CodecChoice> {
        self.choice
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        self.stdout_drain = None;
        self.stderr_drain = None;
        self.cfg = None;
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        self.abort();
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> StripResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(StripError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(StripError::validation(
                "ffmpeg sink width/height must be even (required for yuv420p output)",
            ));
        }

        let choice = negotiate(&self.opts.binary, &self.opts.codecs)?;

        let mut cmd = Command::new(&self.opts.binary);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd.args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0", "-an", "-c:v", choice.encoder]);
        cmd.args(choice.output_args());
        cmd.args(["-pix_fmt", "yuv420p"]);
        if choice.container == Container::Mp4 {
            // A seekable moov atom cannot be written to a pipe.
            cmd.args(["-movflags", "frag_keyframe+empty_moov+default_base_moof"]);
        }
        cmd.args(["-f", choice.container.muxer(), "pipe:1"]);

        let mut child = cmd.spawn().map_err(|e| {
            StripError::encoding_unavailable(format!(
                "failed to spawn '{}': {e}",
                self.opts.binary.display()
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| StripError::encoding_failed("failed to open ffmpeg stdin"))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| StripError::encoding_failed("failed to open ffmpeg stdout"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| StripError::encoding_failed("failed to open ffmpeg stderr"))?;

        let stdout_drain = std::thread::spawn(move || {
            let mut chunks = Vec::new();
            loop {
                let mut buf = vec![0u8; STDOUT_CHUNK];
                let n = stdout.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                buf.truncate(n);
                chunks.push(buf);
            }
            Ok(chunks)
        });
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        tracing::debug!(
            width = cfg.width,
            height = cfg.height,
            fps = cfg.fps.as_f64(),
            encoder = choice.encoder,
            "ffmpeg encoder started"
        );

        self.scratch = vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stdout_drain = Some(stdout_drain);
        self.stderr_drain = Some(stderr_drain);
        self.choice = Some(choice);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &Surface) -> StripResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| StripError::encoding_failed("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(StripError::encoding_failed(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        check_frame_size(cfg, frame)?;
        self.last_idx = Some(idx);

        flatten_premul_over_bg(&mut self.scratch, frame.data(), self.opts.bg_rgba)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(StripError::encoding_failed("ffmpeg sink is already finalized"));
        };
        if let Err(e) = stdin.write_all(&self.scratch) {
            self.abort();
            return Err(StripError::encoding_failed(format!(
                "failed to write frame to ffmpeg stdin: {e}"
            )));
        }
        Ok(())
    }

    fn end(&mut self) -> StripResult<EncodedStream> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| StripError::encoding_failed("ffmpeg sink not started"))?;

        let status = child.wait().map_err(|e| {
            StripError::encoding_failed(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let chunks = join_drain(self.stdout_drain.take(), "stdout")?;
        let stderr_bytes = join_drain(self.stderr_drain.take(), "stderr")?;
        self.cfg = None;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(StripError::encoding_failed(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        let choice = self
            .choice
            .ok_or_else(|| StripError::encoding_failed("ffmpeg sink has no negotiated codec"))?;
        let data = chunks.concat();
        if data.is_empty() {
            return Err(StripError::encoding_failed("ffmpeg produced no output"));
        }
        tracing::debug!(bytes = data.len(), chunks = chunks.len(), "ffmpeg encoder finished");
        Ok(EncodedStream {
            data,
            codec: choice.codec,
            container: choice.container,
        })
    }
}

fn join_drain<T: Default>(
    handle: Option<JoinHandle<std::io::Result<T>>>,
    what: &str,
) -> StripResult<T> {
    match handle {
        Some(h) => h
            .join()
            .map_err(|_| StripError::encoding_failed(format!("ffmpeg {what} drain panicked")))?
            .map_err(|e| StripError::encoding_failed(format!("ffmpeg {what} read failed: {e}"))),
        None => Ok(T::default()),
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

/// Decode an encoded clip into straight RGBA frames by piping it through ffmpeg.
pub fn decode_rgba_frames(
    ffmpeg_bin: &Path,
    data: &[u8],
    container: Container,
    width: u32,
    height: u32,
) -> StripResult<Vec<RgbaImage>> {
    let frame_len = (width as usize) * (height as usize) * 4;
    if frame_len == 0 {
        return Err(StripError::load("clip has zero width or height"));
    }

    let mut child = Command::new(ffmpeg_bin)
        .args(["-hide_banner", "-loglevel", "error", "-f", container.muxer()])
        .args(["-i", "pipe:0", "-an", "-f", "rawvideo", "-pix_fmt", "rgba"])
        .args(["-s", &format!("{width}x{height}"), "pipe:1"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            StripError::load(format!(
                "failed to spawn '{}' for clip decode: {e}",
                ffmpeg_bin.display()
            ))
        })?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| StripError::load("failed to open ffmpeg stdin"))?;
    let input = data.to_vec();
    let writer = std::thread::spawn(move || stdin.write_all(&input));

    let out = child
        .wait_with_output()
        .map_err(|e| StripError::load(format!("ffmpeg clip decode failed: {e}")))?;
    // A broken pipe here only means ffmpeg stopped reading early; its exit status decides.
    let _ = writer.join();

    if !out.status.success() {
        return Err(StripError::load(format!(
            "ffmpeg clip decode exited with {}: {}",
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    split_raw_frames(&out.stdout, width, height)
}

/// Slice back-to-back RGBA8 frames.
pub fn split_raw_frames(data: &[u8], width: u32, height: u32) -> StripResult<Vec<RgbaImage>> {
    let frame_len = (width as usize) * (height as usize) * 4;
    if frame_len == 0 || !data.len().is_multiple_of(frame_len) {
        return Err(StripError::load(format!(
            "raw clip has invalid size: got {} bytes, expected multiples of {frame_len}",
            data.len()
        )));
    }
    data.chunks_exact(frame_len)
        .map(|chunk| {
            RgbaImage::from_raw(width, height, chunk.to_vec())
                .ok_or_else(|| StripError::load("raw frame size mismatch"))
        })
        .collect()
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> StripResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_raw_frames_rejects_partial_frames() {
        assert!(split_raw_frames(&[0u8; 10], 1, 2).is_err());
        let frames = split_raw_frames(&[7u8; 16], 1, 2).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].get_pixel(0, 1).0, [7, 7, 7, 7]);
    }

    #[test]
    fn begin_rejects_odd_dimensions_before_spawning() {
        let mut sink = FfmpegSink::new(FfmpegOptions {
            binary: PathBuf::from("/nonexistent/ffmpeg-binary"),
            ..FfmpegOptions::default()
        });
        let err = sink
            .begin(SinkConfig {
                width: 3,
                height: 2,
                fps: Fps::whole(15).unwrap(),
            })
            .unwrap_err();
        assert!(matches!(err, StripError::Validation(_)));
    }

    #[test]
    fn begin_without_ffmpeg_is_encoding_unavailable() {
        let mut sink = FfmpegSink::new(FfmpegOptions {
            binary: PathBuf::from("/nonexistent/ffmpeg-binary"),
            ..FfmpegOptions::default()
        });
        let err = sink
            .begin(SinkConfig {
                width: 2,
                height: 2,
                fps: Fps::whole(15).unwrap(),
            })
            .unwrap_err();
        assert!(matches!(err, StripError::EncodingUnavailable(_)));
    }

    #[test]
    fn default_options_walk_full_cascade() {
        let opts = FfmpegOptions::default();
        assert_eq!(
            opts.codecs,
            vec![
                VideoCodec::H264,
                VideoCodec::Vp9,
                VideoCodec::Vp8,
                VideoCodec::Mpeg4
            ]
        );
    }
}
