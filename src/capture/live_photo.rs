use chrono::{DateTime, Local};

use crate::capture::session::LivePhotoCapture;
use crate::config::EncoderConfig;
use crate::encode::artifact::VideoArtifact;
use crate::encode::encoder::{EncodeSettings, encode_frames};
use crate::foundation::core::Fps;
use crate::foundation::error::StripResult;
use crate::media::frame::Frame;

/// A still paired with the short clip recorded around it.
#[derive(Clone, Debug)]
pub struct LivePhoto {
    pub still: Frame,
    /// `None` when no motion was captured or encoding failed.
    pub clip: Option<VideoArtifact>,
    pub timestamp: DateTime<Local>,
}

impl LivePhoto {
    pub fn still_only(still: Frame) -> Self {
        Self {
            still,
            clip: None,
            timestamp: Local::now(),
        }
    }

    /// Encode the captured frames into a clip.
    ///
    /// Never fails because of the video: an empty capture or an encoder error yields a Live
    /// Photo without a clip and the still is kept.
    #[tracing::instrument(skip_all, fields(frames = capture.live_frames.len()))]
    pub async fn from_capture(
        capture: LivePhotoCapture,
        cfg: &EncoderConfig,
        native: Option<(u32, u32)>,
    ) -> StripResult<Self> {
        if !capture.has_motion() {
            tracing::info!("no live frames captured; keeping the still only");
            return Ok(Self {
                still: capture.still,
                clip: None,
                timestamp: capture.timestamp,
            });
        }
        let LivePhotoCapture {
            still,
            live_frames,
            timestamp,
            ..
        } = capture;

        let settings = EncodeSettings {
            fps: Fps::whole(cfg.live_photo_fps)?,
            target: cfg.target,
            mirror: cfg.mirror,
        };
        let clip = match encode_frames(live_frames, settings, native, cfg.backend.clone()).await {
            Ok(clip) => Some(clip),
            Err(err) => {
                tracing::warn!(
                    %err,
                    recoverable = err.is_recoverable(),
                    "live photo encoding failed; keeping the still only"
                );
                None
            }
        };
        Ok(Self {
            still,
            clip,
            timestamp,
        })
    }

    pub fn has_clip(&self) -> bool {
        self.clip.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use image::RgbaImage;

    use super::*;
    use crate::encode::encoder::EncoderBackend;
    use crate::encode::ffmpeg::FfmpegOptions;

    fn frame(v: u8) -> Frame {
        Frame::from_image(
            RgbaImage::from_pixel(4, 4, image::Rgba([v, v, v, 255])),
            Duration::ZERO,
        )
        .unwrap()
    }

    fn capture(n: usize) -> LivePhotoCapture {
        LivePhotoCapture {
            still: frame(200),
            live_frames: (0..n).map(|i| frame(i as u8)).collect(),
            before_count: n,
            timestamp: Local::now(),
        }
    }

    #[tokio::test]
    async fn empty_capture_keeps_still_only() {
        let cfg = EncoderConfig {
            backend: EncoderBackend::InMemory,
            ..EncoderConfig::default()
        };
        let lp = LivePhoto::from_capture(capture(0), &cfg, None).await.unwrap();
        assert!(!lp.has_clip());
        assert_eq!(lp.still.dimensions(), (4, 4));
    }

    #[tokio::test]
    async fn frames_become_a_clip() {
        let cfg = EncoderConfig {
            backend: EncoderBackend::InMemory,
            ..EncoderConfig::default()
        };
        let lp = LivePhoto::from_capture(capture(15), &cfg, Some((8, 6)))
            .await
            .unwrap();
        let clip = lp.clip.unwrap();
        assert_eq!((clip.width, clip.height), (8, 6));
        assert_eq!(clip.frame_count, 15);
        assert_eq!(clip.duration(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn encoder_failure_degrades_to_still() {
        let cfg = EncoderConfig {
            backend: EncoderBackend::Ffmpeg(FfmpegOptions {
                binary: "/nonexistent/ffmpeg-binary".into(),
                ..FfmpegOptions::default()
            }),
            ..EncoderConfig::default()
        };
        let lp = LivePhoto::from_capture(capture(3), &cfg, None).await.unwrap();
        assert!(!lp.has_clip());
    }
}
