use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;
use tokio::time::Instant;

use crate::encode::artifact::{Container, VideoArtifact};
use crate::encode::ffmpeg::{decode_rgba_frames, split_raw_frames};
use crate::foundation::error::{StripError, StripResult};

/// Readiness of a [`VideoSource`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Unloaded,
    /// Dimensions, rate and duration are known.
    MetadataReady,
    /// Every frame is decoded; playback can start immediately.
    Playable,
    Playing { origin: Instant },
    Stopped,
}

/// A muted, looping player over one encoded clip.
///
/// The clip is decoded completely before it becomes playable, so drawing a frame never blocks.
#[derive(Debug)]
pub struct VideoSource {
    artifact: VideoArtifact,
    ffmpeg_bin: PathBuf,
    state: PlaybackState,
    frames: Vec<Arc<RgbaImage>>,
}

impl VideoSource {
    pub fn new(artifact: VideoArtifact, ffmpeg_bin: impl Into<PathBuf>) -> Self {
        Self {
            artifact,
            ffmpeg_bin: ffmpeg_bin.into(),
            state: PlaybackState::Unloaded,
            frames: Vec::new(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.artifact.width, self.artifact.height)
    }

    pub fn duration(&self) -> Duration {
        self.artifact.duration()
    }

    /// Frames still carry the camera's mirrored orientation and must be flipped when drawn.
    pub fn needs_mirror(&self) -> bool {
        !self.artifact.mirrored
    }

    /// `Unloaded -> MetadataReady`.
    pub fn load_metadata(&mut self) -> StripResult<()> {
        if self.state != PlaybackState::Unloaded {
            return Ok(());
        }
        if self.artifact.width == 0 || self.artifact.height == 0 {
            return Err(StripError::load("clip has zero width or height"));
        }
        if self.artifact.frame_count == 0 || self.artifact.is_empty() {
            return Err(StripError::load("clip has no frames"));
        }
        self.state = PlaybackState::MetadataReady;
        Ok(())
    }

    /// Decode every frame and become `Playable`.
    pub async fn ensure_playable(&mut self) -> StripResult<()> {
        self.load_metadata()?;
        if self.state != PlaybackState::MetadataReady {
            return Ok(());
        }

        let artifact = self.artifact.clone();
        let bin = self.ffmpeg_bin.clone();
        let frames = tokio::task::spawn_blocking(move || decode_all(&artifact, &bin))
            .await
            .map_err(|e| StripError::load(format!("clip decode task failed: {e}")))??;
        if frames.is_empty() {
            return Err(StripError::load("clip decoded to zero frames"));
        }
        tracing::debug!(
            frames = frames.len(),
            codec = ?self.artifact.codec,
            "clip ready for playback"
        );
        self.frames = frames.into_iter().map(Arc::new).collect();
        self.state = PlaybackState::Playable;
        Ok(())
    }

    /// Seek back to the first frame and wait for `play`.
    pub fn rewind(&mut self) -> StripResult<()> {
        match self.state {
            PlaybackState::Playable | PlaybackState::Playing { .. } => {
                self.state = PlaybackState::Playable;
                Ok(())
            }
            other => Err(StripError::load(format!("cannot rewind a clip in {other:?}"))),
        }
    }

    /// Start playback with `origin` as time zero.
    pub fn play(&mut self, origin: Instant) -> StripResult<()> {
        match self.state {
            PlaybackState::Playable | PlaybackState::Playing { .. } => {
                self.state = PlaybackState::Playing { origin };
                Ok(())
            }
            other => Err(StripError::load(format!("cannot play a clip in {other:?}"))),
        }
    }

    /// Frame shown `elapsed` after the playback origin, looping at the end.
    pub fn frame_at(&self, elapsed: Duration) -> StripResult<Arc<RgbaImage>> {
        if !matches!(
            self.state,
            PlaybackState::Playable | PlaybackState::Playing { .. }
        ) {
            return Err(StripError::load(format!(
                "clip is not playable ({:?})",
                self.state
            )));
        }
        let idx = self.artifact.fps.secs_to_frames_floor(elapsed.as_secs_f64()) as usize;
        let frame = &self.frames[idx % self.frames.len()];
        Ok(Arc::clone(frame))
    }

    /// Stop and release decoded frames. Idempotent.
    pub fn stop(&mut self) {
        self.frames = Vec::new();
        self.state = PlaybackState::Stopped;
    }
}

fn decode_all(artifact: &VideoArtifact, ffmpeg_bin: &std::path::Path) -> StripResult<Vec<RgbaImage>> {
    match artifact.container {
        Container::Raw => split_raw_frames(artifact.data(), artifact.width, artifact.height),
        container => decode_rgba_frames(
            ffmpeg_bin,
            artifact.data(),
            container,
            artifact.width,
            artifact.height,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::artifact::{EncodedStream, VideoCodec};
    use crate::foundation::core::Fps;

    fn raw_clip(values: &[u8]) -> VideoArtifact {
        let data = values.iter().flat_map(|&v| [v, v, v, 255]).collect();
        VideoArtifact::new(
            EncodedStream {
                data,
                codec: VideoCodec::RawRgba,
                container: Container::Raw,
            },
            1,
            1,
            Fps::whole(10).unwrap(),
            values.len() as u64,
            true,
        )
    }

    #[tokio::test]
    async fn lifecycle_walks_every_state() {
        let mut src = VideoSource::new(raw_clip(&[1, 2, 3]), "ffmpeg");
        assert_eq!(src.state(), PlaybackState::Unloaded);
        assert!(src.frame_at(Duration::ZERO).is_err());
        src.load_metadata().unwrap();
        assert_eq!(src.state(), PlaybackState::MetadataReady);
        src.ensure_playable().await.unwrap();
        assert_eq!(src.state(), PlaybackState::Playable);
        src.play(Instant::now()).unwrap();
        assert!(matches!(src.state(), PlaybackState::Playing { .. }));
        src.rewind().unwrap();
        assert_eq!(src.state(), PlaybackState::Playable);
        src.stop();
        src.stop();
        assert_eq!(src.state(), PlaybackState::Stopped);
        assert!(src.play(Instant::now()).is_err());
    }

    #[tokio::test]
    async fn frames_loop_by_elapsed_time() {
        let mut src = VideoSource::new(raw_clip(&[10, 20, 30]), "ffmpeg");
        src.ensure_playable().await.unwrap();
        let px = |ms: u64| src.frame_at(Duration::from_millis(ms)).unwrap().get_pixel(0, 0).0[0];
        assert_eq!(px(0), 10);
        assert_eq!(px(150), 20);
        assert_eq!(px(250), 30);
        assert_eq!(px(300), 10);
        assert_eq!(src.duration(), Duration::from_millis(300));
        assert!(!src.needs_mirror());
    }

    #[test]
    fn empty_clip_fails_metadata() {
        let mut src = VideoSource::new(raw_clip(&[]), "ffmpeg");
        assert!(matches!(src.load_metadata(), Err(StripError::LoadFailure(_))));
    }
}
