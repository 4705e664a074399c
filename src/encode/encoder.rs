use crate::encode::artifact::VideoArtifact;
use crate::encode::ffmpeg::{FfmpegOptions, FfmpegSink};
use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{StripError, StripResult};
use crate::media::frame::Frame;
use crate::render::composite::cover;
use crate::render::surface::Surface;

/// Where encoded frames go.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EncoderBackend {
    /// Compressed video through the system ffmpeg.
    Ffmpeg(FfmpegOptions),
    /// Raw frames kept in memory.
    InMemory,
}

impl Default for EncoderBackend {
    fn default() -> Self {
        Self::Ffmpeg(FfmpegOptions::default())
    }
}

impl EncoderBackend {
    pub fn open(&self) -> Box<dyn FrameSink> {
        match self {
            Self::Ffmpeg(opts) => Box::new(FfmpegSink::new(opts.clone())),
            Self::InMemory => Box::new(InMemorySink::new()),
        }
    }
}

/// Lifecycle of a [`FrameVideoEncoder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncoderState {
    Idle,
    Recording,
    Finalizing,
    Done,
}

/// Encodes an ordered run of frames into one [`VideoArtifact`].
///
/// Timestamps derive from the frame index, so the artifact lasts exactly
/// `frame_count / fps` regardless of how long rendering took.
pub struct FrameVideoEncoder {
    sink: Option<Box<dyn FrameSink>>,
    state: EncoderState,
    cfg: Option<SinkConfig>,
    frames: u64,
    mirrored: bool,
}

impl std::fmt::Debug for FrameVideoEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameVideoEncoder")
            .field("state", &self.state)
            .field("cfg", &self.cfg)
            .field("frames", &self.frames)
            .finish()
    }
}

impl FrameVideoEncoder {
    pub fn new(backend: &EncoderBackend) -> Self {
        Self::with_sink(backend.open())
    }

    pub fn with_sink(sink: Box<dyn FrameSink>) -> Self {
        Self {
            sink: Some(sink),
            state: EncoderState::Idle,
            cfg: None,
            frames: 0,
            mirrored: false,
        }
    }

    pub fn state(&self) -> EncoderState {
        self.state
    }

    pub fn frames_written(&self) -> u64 {
        self.frames
    }

    /// Record whether pushed frames were mirror-corrected; carried into the artifact.
    pub fn set_mirrored(&mut self, mirrored: bool) {
        self.mirrored = mirrored;
    }

    /// `Idle -> Recording`.
    pub fn start(&mut self, width: u32, height: u32, fps: Fps) -> StripResult<()> {
        if self.state != EncoderState::Idle {
            return Err(StripError::encoding_failed(format!(
                "encoder cannot start from {:?}",
                self.state
            )));
        }
        let sink = self
            .sink
            .as_mut()
            .ok_or_else(|| StripError::encoding_failed("encoder has no sink"))?;
        let cfg = SinkConfig { width, height, fps };
        sink.begin(cfg.clone())?;
        self.cfg = Some(cfg);
        self.state = EncoderState::Recording;
        Ok(())
    }

    pub fn push(&mut self, frame: &Surface) -> StripResult<()> {
        if self.state != EncoderState::Recording {
            return Err(StripError::encoding_failed(format!(
                "encoder cannot accept frames in {:?}",
                self.state
            )));
        }
        let sink = self
            .sink
            .as_mut()
            .ok_or_else(|| StripError::encoding_failed("encoder has no sink"))?;
        sink.push_frame(FrameIndex(self.frames), frame)?;
        self.frames += 1;
        Ok(())
    }

    /// `Recording -> Finalizing -> Done`, blocking until the sink has flushed.
    pub fn finish_blocking(&mut self) -> StripResult<VideoArtifact> {
        let (mut sink, cfg) = self.begin_finalize()?;
        let stream = sink.end();
        self.complete(stream, cfg)
    }

    /// `Recording -> Finalizing -> Done`; the sink is drained on the blocking pool.
    pub async fn finish(&mut self) -> StripResult<VideoArtifact> {
        let (mut sink, cfg) = self.begin_finalize()?;
        let stream = tokio::task::spawn_blocking(move || sink.end())
            .await
            .map_err(|e| StripError::encoding_failed(format!("finalize task failed: {e}")))?;
        self.complete(stream, cfg)
    }

    fn begin_finalize(&mut self) -> StripResult<(Box<dyn FrameSink>, SinkConfig)> {
        if self.state != EncoderState::Recording {
            return Err(StripError::encoding_failed(format!(
                "encoder cannot finish from {:?}",
                self.state
            )));
        }
        let sink = self
            .sink
            .take()
            .ok_or_else(|| StripError::encoding_failed("encoder has no sink"))?;
        let cfg = self
            .cfg
            .clone()
            .ok_or_else(|| StripError::encoding_failed("encoder was never configured"))?;
        self.state = EncoderState::Finalizing;
        Ok((sink, cfg))
    }

    fn complete(
        &mut self,
        stream: StripResult<crate::encode::artifact::EncodedStream>,
        cfg: SinkConfig,
    ) -> StripResult<VideoArtifact> {
        let stream = stream?;
        self.state = EncoderState::Done;
        if self.frames == 0 {
            return Err(StripError::encoding_failed("no frames were encoded"));
        }
        Ok(VideoArtifact::new(
            stream,
            cfg.width,
            cfg.height,
            cfg.fps,
            self.frames,
            self.mirrored,
        ))
    }
}

/// Parameters for encoding a captured frame sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodeSettings {
    pub fps: Fps,
    /// Explicit output size; wins over every other source.
    pub target: Option<(u32, u32)>,
    /// Flip frames horizontally before encoding.
    pub mirror: bool,
}

/// Output size: explicit target, else non-zero native source size, else the first frame.
///
/// Dimensions are floored to even values (yuv420p), with a minimum of 2.
pub fn resolve_dimensions(
    explicit: Option<(u32, u32)>,
    native: Option<(u32, u32)>,
    first_frame: Option<(u32, u32)>,
) -> StripResult<(u32, u32)> {
    let non_zero = |d: Option<(u32, u32)>| d.filter(|&(w, h)| w > 0 && h > 0);
    let (w, h) = non_zero(explicit)
        .or_else(|| non_zero(native))
        .or_else(|| non_zero(first_frame))
        .ok_or_else(|| StripError::validation("cannot determine video dimensions"))?;
    Ok(((w & !1).max(2), (h & !1).max(2)))
}

/// Encode `frames` in order, mirror-correcting and cover-scaling each to the output size.
#[tracing::instrument(skip(frames, backend), fields(frames = frames.len()))]
pub fn encode_frames_blocking(
    frames: &[Frame],
    settings: &EncodeSettings,
    native: Option<(u32, u32)>,
    backend: &EncoderBackend,
) -> StripResult<VideoArtifact> {
    let first = frames
        .first()
        .ok_or_else(|| StripError::validation("no frames to encode"))?;
    let (width, height) = resolve_dimensions(settings.target, native, Some(first.dimensions()))?;

    let mut encoder = FrameVideoEncoder::new(backend);
    encoder.set_mirrored(settings.mirror);
    encoder.start(width, height, settings.fps)?;
    for frame in frames {
        let frame = if settings.mirror {
            frame.mirrored()?
        } else {
            frame.clone()
        };
        let img = frame.decode()?;
        let scaled = cover(&img, width, height)?;
        encoder.push(&Surface::from_rgba_image(&scaled)?)?;
    }
    let artifact = encoder.finish_blocking()?;
    tracing::info!(
        frames = artifact.frame_count,
        duration_ms = artifact.duration().as_millis() as u64,
        codec = ?artifact.codec,
        "encoded frame sequence"
    );
    Ok(artifact)
}

/// Async wrapper running [`encode_frames_blocking`] on the blocking pool.
pub async fn encode_frames(
    frames: Vec<Frame>,
    settings: EncodeSettings,
    native: Option<(u32, u32)>,
    backend: EncoderBackend,
) -> StripResult<VideoArtifact> {
    tokio::task::spawn_blocking(move || {
        encode_frames_blocking(&frames, &settings, native, &backend)
    })
    .await
    .map_err(|e| StripError::encoding_failed(format!("encode task failed: {e}")))?
}
