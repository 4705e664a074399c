use std::path::PathBuf;
use std::time::Duration;

use image::imageops;
use tokio::time::{Instant, MissedTickBehavior};

use crate::background::draw_film_strip_overlay;
use crate::config::{LiveStripConfig, Pacing};
use crate::encode::artifact::VideoArtifact;
use crate::encode::encoder::{EncoderBackend, FrameVideoEncoder};
use crate::foundation::core::{Fps, Rect};
use crate::foundation::error::{StripError, StripResult};
use crate::media::source::VideoSource;
use crate::render::surface::Surface;
use crate::strip::branding::{BrandingText, Palette, draw_slot_border, render_branding};
use crate::strip::compositor::{PhotostripCompositor, StripRequest, slot_origin};

/// What a slot shows on every tick: a fixed filtered still or a playing clip.
enum SlotContent {
    Still(Surface),
    Clip(VideoSource),
}

/// Layers that stay the same on every tick.
struct StaticLayers {
    background: Surface,
    branding: Surface,
    palette: Palette,
    rects: Vec<Rect>,
    overlay: bool,
}

/// Renders a Live Strip: the still strip with every captured clip playing in its slot.
///
/// The output lasts as long as the longest clip, and never less than the configured minimum.
#[derive(Debug)]
pub struct LiveStripSynthesizer<'a> {
    compositor: &'a PhotostripCompositor,
    cfg: LiveStripConfig,
    ffmpeg_bin: PathBuf,
}

impl<'a> LiveStripSynthesizer<'a> {
    pub fn new(compositor: &'a PhotostripCompositor, cfg: LiveStripConfig) -> Self {
        let ffmpeg_bin = match &cfg.backend {
            EncoderBackend::Ffmpeg(opts) => opts.binary.clone(),
            EncoderBackend::InMemory => PathBuf::from("ffmpeg"),
        };
        Self {
            compositor,
            cfg,
            ffmpeg_bin,
        }
    }

    /// Binary used to decode compressed clips back into frames.
    pub fn with_decoder(mut self, ffmpeg_bin: impl Into<PathBuf>) -> Self {
        self.ffmpeg_bin = ffmpeg_bin.into();
        self
    }

    /// Every visible slot needs a still, and at least one needs a clip.
    pub fn validate(req: &StripRequest<'_>) -> StripResult<()> {
        let n = req.layout.slot_count();
        if let Some(missing) = (0..n).find(|&i| req.slots.get(i).is_none_or(|s| s.still.is_none())) {
            return Err(StripError::validation(format!(
                "live strip needs a photo in every slot; slot {} is empty",
                missing + 1
            )));
        }
        if !req.slots.iter().take(n).any(|s| s.live_clip.is_some()) {
            return Err(StripError::validation(
                "live strip needs at least one live photo",
            ));
        }
        Ok(())
    }

    /// Output length for clips of the given durations.
    pub fn duration_for(&self, clips: impl IntoIterator<Item = Duration>) -> Duration {
        clips
            .into_iter()
            .fold(self.cfg.min_duration(), Duration::max)
    }

    #[tracing::instrument(
        skip_all,
        fields(layout = %req.layout.kind(), filter = %req.filter, pacing = ?self.cfg.pacing)
    )]
    pub async fn synthesize(&self, req: &StripRequest<'_>) -> StripResult<VideoArtifact> {
        Self::validate(req)?;
        let fps = self.cfg.fps()?;

        let mut contents = self.preload(req).await?;
        let result = self.run(req, fps, &mut contents).await;
        for content in &mut contents {
            if let SlotContent::Clip(source) = content {
                source.stop();
            }
        }
        result
    }

    async fn preload(&self, req: &StripRequest<'_>) -> StripResult<Vec<SlotContent>> {
        let rects = req.layout.slot_rects();
        let mut contents = Vec::with_capacity(rects.len());
        for (slot, rect) in req.slots.iter().zip(&rects) {
            let content = match (&slot.live_clip, &slot.still) {
                (Some(clip), _) => {
                    let mut source = VideoSource::new(clip.clone(), &self.ffmpeg_bin);
                    source.ensure_playable().await?;
                    SlotContent::Clip(source)
                }
                (None, Some(still)) => {
                    let img = still.decode()?;
                    SlotContent::Still(self.compositor.slot_photo(&img, *rect, req.filter).await?)
                }
                (None, None) => {
                    return Err(StripError::validation("live strip slot has no content"));
                }
            };
            contents.push(content);
        }
        Ok(contents)
    }

    fn static_layers(&self, req: &StripRequest<'_>) -> StripResult<StaticLayers> {
        let palette = Palette::for_dark(req.background.is_dark());
        let text = BrandingText::new(self.compositor.branding(), req.caption, req.date);
        Ok(StaticLayers {
            background: self.compositor.background(req.layout, req.background)?,
            branding: render_branding(self.compositor.text(), req.layout, &text, &palette)?,
            palette,
            rects: req.layout.slot_rects(),
            overlay: req.background.has_overlay(),
        })
    }

    async fn run(
        &self,
        req: &StripRequest<'_>,
        fps: Fps,
        contents: &mut [SlotContent],
    ) -> StripResult<VideoArtifact> {
        let duration = self.duration_for(contents.iter().filter_map(|c| match c {
            SlotContent::Clip(source) => Some(source.duration()),
            SlotContent::Still(_) => None,
        }));
        let layers = self.static_layers(req)?;
        let canvas = req.layout.canvas();

        let mut encoder = FrameVideoEncoder::new(&self.cfg.backend);
        encoder.set_mirrored(true);
        encoder.start(canvas.width, canvas.height, fps)?;

        for content in contents.iter_mut() {
            if let SlotContent::Clip(source) = content {
                source.rewind()?;
            }
        }
        tokio::time::sleep(self.cfg.settle()).await;
        let origin = Instant::now();
        for content in contents.iter_mut() {
            if let SlotContent::Clip(source) = content {
                source.play(origin)?;
            }
        }
        tracing::debug!(duration_ms = duration.as_millis() as u64, "clips started");

        match self.cfg.pacing {
            Pacing::Offline => {
                let total = frames_covering(fps, duration);
                for i in 0..total {
                    let elapsed = Duration::from_secs_f64(fps.frames_to_secs(i));
                    let frame = self.render_tick(req, &layers, contents, elapsed).await?;
                    encoder.push(&frame)?;
                }
            }
            Pacing::Realtime => {
                // Slow ticks repeat the last frame so frame `i` still lands at `i / fps`.
                let total = frames_covering(fps, duration);
                let mut ticker = tokio::time::interval_at(origin, fps.frame_interval());
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                while encoder.frames_written() < total {
                    ticker.tick().await;
                    let elapsed = origin.elapsed();
                    let frame = self.render_tick(req, &layers, contents, elapsed).await?;
                    let due = frames_due(fps, origin.elapsed())
                        .clamp(encoder.frames_written() + 1, total);
                    while encoder.frames_written() < due {
                        encoder.push(&frame)?;
                    }
                }
            }
        }

        let artifact = encoder.finish().await?;
        tracing::info!(
            frames = artifact.frame_count,
            duration_ms = artifact.duration().as_millis() as u64,
            codec = ?artifact.codec,
            "live strip encoded"
        );
        Ok(artifact)
    }

    async fn render_tick(
        &self,
        req: &StripRequest<'_>,
        layers: &StaticLayers,
        contents: &[SlotContent],
        elapsed: Duration,
    ) -> StripResult<Surface> {
        let mut frame = layers.background.clone();
        for (content, rect) in contents.iter().zip(&layers.rects) {
            let (x, y) = slot_origin(*rect);
            match content {
                SlotContent::Still(photo) => frame.draw_over(photo, x, y, 1.0),
                SlotContent::Clip(source) => {
                    let raw = source.frame_at(elapsed)?;
                    let img = if source.needs_mirror() {
                        imageops::flip_horizontal(raw.as_ref())
                    } else {
                        raw.as_ref().clone()
                    };
                    let photo = self.compositor.slot_photo(&img, *rect, req.filter).await?;
                    frame.draw_over(&photo, x, y, 1.0);
                }
            }
            draw_slot_border(&mut frame, *rect, layers.palette.border);
        }
        if layers.overlay {
            draw_film_strip_overlay(&mut frame, &layers.rects)?;
        }
        frame.draw_over(&layers.branding, 0, 0, 1.0);
        Ok(frame)
    }
}

/// Ticks at `i / fps` for every `i` whose time is still inside `duration`.
fn frames_covering(fps: Fps, duration: Duration) -> u64 {
    let exact = duration.as_secs_f64() * fps.as_f64();
    ((exact - 1e-9).ceil().max(1.0)) as u64
}

/// Frames whose start time has passed after `elapsed`.
fn frames_due(fps: Fps, elapsed: Duration) -> u64 {
    fps.secs_to_frames_floor(elapsed.as_secs_f64()) + 1
}
