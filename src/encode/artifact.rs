use std::sync::Arc;
use std::time::Duration;

use crate::foundation::core::Fps;

/// Video codecs the encoder can negotiate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VideoCodec {
    H264,
    Vp9,
    Vp8,
    Mpeg4,
    /// Uncompressed opaque RGBA8 frames, back to back.
    RawRgba,
}

/// Containers the encoder can write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Container {
    Mp4,
    Webm,
    Raw,
}

impl Container {
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Webm => "video/webm",
            Self::Raw => "application/octet-stream",
        }
    }

    /// Extension matching the actual container bytes.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
            Self::Raw => "rgba",
        }
    }

    /// `ffmpeg -f` muxer name.
    pub(crate) fn muxer(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
            Self::Raw => "rawvideo",
        }
    }
}

/// Encoded bytes returned by a sink once the stream is closed.
#[derive(Clone, Debug)]
pub struct EncodedStream {
    pub data: Vec<u8>,
    pub codec: VideoCodec,
    pub container: Container,
}

/// A finished, immutable video: one concatenated buffer plus what is needed to play it back.
#[derive(Clone, Debug)]
pub struct VideoArtifact {
    data: Arc<[u8]>,
    pub codec: VideoCodec,
    pub container: Container,
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    pub frame_count: u64,
    /// Frames were mirror-corrected before encoding.
    pub mirrored: bool,
}

impl VideoArtifact {
    pub fn new(
        stream: EncodedStream,
        width: u32,
        height: u32,
        fps: Fps,
        frame_count: u64,
        mirrored: bool,
    ) -> Self {
        Self {
            data: stream.data.into(),
            codec: stream.codec,
            container: stream.container,
            width,
            height,
            fps,
            frame_count,
            mirrored,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Playback duration, `frame_count / fps`.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.fps.frames_to_secs(self.frame_count))
    }

    pub fn mime_type(&self) -> &'static str {
        self.container.mime_type()
    }

    /// Extension used for downloads. Always `mp4`, whatever codec was negotiated.
    pub fn download_extension(&self) -> &'static str {
        "mp4"
    }

    /// Write the bytes to `path`.
    pub fn save(&self, path: &std::path::Path) -> crate::StripResult<()> {
        use anyhow::Context as _;
        crate::encode::ffmpeg::ensure_parent_dir(path)?;
        std::fs::write(path, &self.data[..])
            .with_context(|| format!("write video to '{}'", path.display()))?;
        Ok(())
    }
}
