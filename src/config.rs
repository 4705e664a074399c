//! Booth-wide settings and the CLI job description.
//!
//! Every field has a default so partial JSON documents are accepted.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::background::BackgroundStyle;
use crate::encode::encoder::EncoderBackend;
use crate::filters::FilterKind;
use crate::foundation::core::Fps;
use crate::foundation::error::{StripError, StripResult};
use crate::strip::layout::LayoutKind;

/// Live feed sampling around the shutter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Sampling rate in frames per second.
    pub rate: u32,
    /// Look-back window kept in the ring buffer.
    pub look_back_secs: f64,
    /// Frames sampled after the shutter.
    pub after_secs: f64,
    /// Flip the still horizontally (front cameras preview mirrored).
    pub mirror_still: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            rate: 15,
            look_back_secs: 1.5,
            after_secs: 0.5,
            mirror_still: true,
        }
    }
}

impl CaptureConfig {
    pub fn validate(&self) -> StripResult<()> {
        if self.rate == 0 {
            return Err(StripError::validation("capture.rate must be > 0"));
        }
        if !(self.look_back_secs.is_finite() && self.look_back_secs > 0.0) {
            return Err(StripError::validation("capture.look_back_secs must be > 0"));
        }
        if !(self.after_secs.is_finite() && self.after_secs >= 0.0) {
            return Err(StripError::validation("capture.after_secs must be >= 0"));
        }
        Ok(())
    }
}

/// Live Photo encoding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Playback rate of Live Photo clips; matches the capture rate by default.
    pub live_photo_fps: u32,
    /// Flip frames horizontally before encoding.
    pub mirror: bool,
    /// Explicit clip size; falls back to the camera's native size, then the first frame.
    pub target: Option<(u32, u32)>,
    pub backend: EncoderBackend,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            live_photo_fps: 15,
            mirror: true,
            target: None,
            backend: EncoderBackend::default(),
        }
    }
}

/// How the Live Strip loop advances time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pacing {
    /// Tick time is `frame_index / fps`; renders as fast as possible.
    #[default]
    Offline,
    /// Ticks follow a timer at the output rate; elapsed time is read from the clock.
    Realtime,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveStripConfig {
    pub fps: u32,
    /// Lower bound on the output duration.
    pub min_duration_ms: u64,
    /// Pause between rewinding every clip and starting playback.
    pub settle_ms: u64,
    pub pacing: Pacing,
    /// Encoder for the composite video.
    pub backend: EncoderBackend,
}

impl Default for LiveStripConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            min_duration_ms: 2000,
            settle_ms: 100,
            pacing: Pacing::Offline,
            backend: EncoderBackend::default(),
        }
    }
}

impl LiveStripConfig {
    pub fn fps(&self) -> StripResult<Fps> {
        Fps::whole(self.fps)
    }

    pub fn min_duration(&self) -> Duration {
        Duration::from_millis(self.min_duration_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Seed for randomized backgrounds; entropy when unset.
    pub background_seed: Option<u64>,
    /// Extra directories scanned for `.ttf`/`.otf`/`.ttc` fonts.
    pub font_dirs: Vec<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandingConfig {
    /// Title used when the user gave no caption.
    pub title: String,
    pub subtext: String,
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            title: "Photobooth".to_string(),
            subtext: "made with photostrip".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoothConfig {
    pub capture: CaptureConfig,
    pub encoder: EncoderConfig,
    pub live_strip: LiveStripConfig,
    pub render: RenderConfig,
    pub branding: BrandingConfig,
}

impl BoothConfig {
    pub fn from_json(json: &str) -> StripResult<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| StripError::validation(format!("invalid booth config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> StripResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> StripResult<()> {
        self.capture.validate()?;
        if self.encoder.live_photo_fps == 0 {
            return Err(StripError::validation("encoder.live_photo_fps must be > 0"));
        }
        if let Some((w, h)) = self.encoder.target
            && (w == 0 || h == 0)
        {
            return Err(StripError::validation(
                "encoder.target must have non-zero width and height",
            ));
        }
        if self.live_strip.fps == 0 {
            return Err(StripError::validation("live_strip.fps must be > 0"));
        }
        if self.live_strip.min_duration_ms == 0 {
            return Err(StripError::validation(
                "live_strip.min_duration_ms must be > 0",
            ));
        }
        Ok(())
    }
}

/// One slot of a CLI job.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSlot {
    /// Still image file.
    pub photo: Option<PathBuf>,
    /// Directory of frames encoded into this slot's Live Photo clip.
    pub live_frames: Option<PathBuf>,
}

/// A photostrip described as JSON, paths relative to the job file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSpec {
    pub layout: LayoutKind,
    pub photo_count: usize,
    pub filter: FilterKind,
    pub background: BackgroundStyle,
    pub caption: Option<String>,
    pub slots: Vec<JobSlot>,
}

impl Default for JobSpec {
    fn default() -> Self {
        Self {
            layout: LayoutKind::Vertical,
            photo_count: 4,
            filter: FilterKind::None,
            background: BackgroundStyle::Classic,
            caption: None,
            slots: Vec::new(),
        }
    }
}

impl JobSpec {
    /// Parse a job file and resolve its paths against the file's directory.
    pub fn load(path: &Path) -> StripResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read job '{}'", path.display()))?;
        let mut job: Self = serde_json::from_str(&text)
            .map_err(|e| StripError::validation(format!("invalid job '{}': {e}", path.display())))?;
        if let Some(base) = path.parent() {
            job.resolve_paths(base);
        }
        Ok(job)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let join = |p: &mut Option<PathBuf>| {
            if let Some(rel) = p.as_ref().filter(|p| p.is_relative()) {
                *p = Some(base.join(rel));
            }
        };
        for slot in &mut self.slots {
            join(&mut slot.photo);
            join(&mut slot.live_frames);
        }
    }
}
