use chrono::{DateTime, Local};

use crate::background::BackgroundStyle;
use crate::capture::live_photo::LivePhoto;
use crate::capture::session::LivePhotoCaptureSession;
use crate::config::BoothConfig;
use crate::encode::artifact::VideoArtifact;
use crate::encode::encoder::EncoderBackend;
use crate::filters::{FilterKind, FilterPipeline};
use crate::foundation::error::{StripError, StripResult};
use crate::media::frame::Frame;
use crate::render::surface::Surface;
use crate::strip::branding::MAX_CAPTION_CHARS;
use crate::strip::compositor::{PhotostripCompositor, StripRequest};
use crate::strip::layout::{Layout, LayoutKind, MAX_SLOTS};
use crate::strip::live::LiveStripSynthesizer;
use crate::strip::slots::SlotBoard;

/// One photobooth session: slot contents plus the user's layout, filter, background and
/// caption choices.
///
/// All mutations take `&mut self`, so slot updates are serialized by construction.
#[derive(Debug)]
pub struct Photobooth {
    cfg: BoothConfig,
    compositor: PhotostripCompositor,
    board: SlotBoard,
    layout: Layout,
    filter: FilterKind,
    background: BackgroundStyle,
    caption: Option<String>,
}

impl Photobooth {
    pub fn new(cfg: BoothConfig) -> StripResult<Self> {
        cfg.validate()?;
        let compositor = PhotostripCompositor::new(&cfg.render, cfg.branding.clone());
        let layout = Layout::default();
        Ok(Self {
            cfg,
            compositor,
            board: SlotBoard::new(layout.slot_count())?,
            layout,
            filter: FilterKind::default(),
            background: BackgroundStyle::default(),
            caption: None,
        })
    }

    /// Replace the filter pipeline, e.g. to plug in another effects engine.
    pub fn with_filters(mut self, filters: FilterPipeline) -> Self {
        self.compositor = self.compositor.with_filters(filters);
        self
    }

    pub fn config(&self) -> &BoothConfig {
        &self.cfg
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn filter(&self) -> FilterKind {
        self.filter
    }

    pub fn background(&self) -> BackgroundStyle {
        self.background
    }

    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    pub fn slots(&self) -> &SlotBoard {
        &self.board
    }

    /// Shoot a Live Photo into the first empty slot and return that slot's index.
    ///
    /// Clip encoding failures leave the slot with a still only.
    pub async fn capture_from(&mut self, session: &mut LivePhotoCaptureSession) -> StripResult<usize> {
        let slot = self
            .board
            .next_empty()
            .ok_or_else(|| StripError::validation("every slot already has a photo"))?;
        let capture = session.capture_live_photo().await?;
        let photo = LivePhoto::from_capture(capture, &self.cfg.encoder, session.native_size()).await?;
        tracing::info!(slot, clip = photo.has_clip(), "live photo captured");
        self.board.place_live_photo(slot, photo)?;
        Ok(slot)
    }

    pub fn place_upload(&mut self, slot: usize, frame: Frame) -> StripResult<()> {
        self.board.place_still(slot, frame)
    }

    pub fn place_live_photo(&mut self, slot: usize, photo: LivePhoto) -> StripResult<()> {
        self.board.place_live_photo(slot, photo)
    }

    pub fn remove(&mut self, slot: usize) -> StripResult<()> {
        self.board.remove(slot)
    }

    /// Empty every slot; selections are kept.
    pub fn reset(&mut self) {
        self.board.clear();
    }

    /// Show `n` photos, switching the arrangement when the current one cannot hold them.
    pub fn set_photo_count(&mut self, n: usize) -> StripResult<()> {
        let layout = Layout::for_photo_count(self.layout.kind(), n)?;
        self.board.set_active_count(n)?;
        if layout.kind() != self.layout.kind() {
            tracing::debug!(from = %self.layout.kind(), to = %layout.kind(), "layout switched");
        }
        self.layout = layout;
        Ok(())
    }

    /// Change the arrangement, keeping the photo count when the new one supports it.
    pub fn set_layout(&mut self, kind: LayoutKind) -> StripResult<()> {
        let count = match kind {
            LayoutKind::Polaroid => 1,
            _ if kind.supports(self.layout.slot_count()) => self.layout.slot_count(),
            _ => MAX_SLOTS,
        };
        let layout = Layout::new(kind, count)?;
        self.board.set_active_count(count)?;
        self.layout = layout;
        Ok(())
    }

    pub fn set_filter(&mut self, filter: FilterKind) {
        self.filter = filter;
    }

    pub fn set_background(&mut self, background: BackgroundStyle) {
        self.background = background;
    }

    /// Blank captions clear it; anything over the limit is rejected.
    pub fn set_caption(&mut self, caption: Option<String>) -> StripResult<()> {
        let caption = caption.filter(|c| !c.trim().is_empty());
        if let Some(c) = &caption
            && c.chars().count() > MAX_CAPTION_CHARS
        {
            return Err(StripError::validation(format!(
                "caption is longer than {MAX_CAPTION_CHARS} characters"
            )));
        }
        self.caption = caption;
        Ok(())
    }

    fn request(&self, date: DateTime<Local>) -> StripRequest<'_> {
        StripRequest {
            layout: self.layout,
            slots: self.board.active(),
            filter: self.filter,
            background: self.background,
            caption: self.caption.as_deref(),
            date,
        }
    }

    /// Render the still strip; empty slots show placeholders.
    pub async fn export_still(&self) -> StripResult<Surface> {
        self.compositor.compose(&self.request(Local::now())).await
    }

    /// Render the Live Strip video.
    ///
    /// Fails validation unless every slot has a photo and at least one has a clip.
    pub async fn export_live_strip(&self) -> StripResult<VideoArtifact> {
        let req = self.request(Local::now());
        LiveStripSynthesizer::validate(&req)?;
        let mut synth = LiveStripSynthesizer::new(&self.compositor, self.cfg.live_strip.clone());
        // Clips were encoded by the Live Photo backend, so decode them with its binary.
        if let EncoderBackend::Ffmpeg(opts) = &self.cfg.encoder.backend {
            synth = synth.with_decoder(&opts.binary);
        }
        synth.synthesize(&req).await
    }

    /// The clip of one slot, for downloading a single Live Photo.
    pub fn live_photo_clip(&self, slot: usize) -> Option<&VideoArtifact> {
        self.board
            .active()
            .get(slot)
            .and_then(|s| s.live_clip.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use image::RgbaImage;

    use super::*;

    fn frame() -> Frame {
        Frame::from_image(RgbaImage::from_pixel(4, 3, image::Rgba([9, 9, 9, 255])), Duration::ZERO)
            .unwrap()
    }

    fn booth() -> Photobooth {
        Photobooth::new(BoothConfig::default()).unwrap()
    }

    #[test]
    fn photo_count_drives_layout() {
        let mut b = booth();
        b.set_photo_count(2).unwrap();
        assert_eq!(b.layout(), Layout::new(LayoutKind::Vertical, 2).unwrap());
        b.set_photo_count(1).unwrap();
        assert_eq!(b.layout().kind(), LayoutKind::Polaroid);
        b.set_photo_count(3).unwrap();
        assert_eq!(b.layout().kind(), LayoutKind::Vertical);
        b.set_layout(LayoutKind::Grid).unwrap();
        b.set_photo_count(4).unwrap();
        assert_eq!(b.layout().kind(), LayoutKind::Grid);
        assert!(b.set_photo_count(0).is_err());
        assert_eq!(b.layout().slot_count(), 4);
    }

    #[test]
    fn photo_count_changes_keep_slot_contents() {
        let mut b = booth();
        for i in 0..4 {
            b.place_upload(i, frame()).unwrap();
        }
        b.set_photo_count(2).unwrap();
        assert_eq!(b.slots().filled_count(), 2);
        b.set_photo_count(4).unwrap();
        assert_eq!(b.slots().filled_count(), 4);
    }

    #[test]
    fn caption_limit() {
        let mut b = booth();
        b.set_caption(Some("Jess & Sam".into())).unwrap();
        assert_eq!(b.caption(), Some("Jess & Sam"));
        assert!(b.set_caption(Some("y".repeat(31))).is_err());
        b.set_caption(Some("   ".into())).unwrap();
        assert_eq!(b.caption(), None);
    }

    #[test]
    fn polaroid_layout_forces_one_slot() {
        let mut b = booth();
        b.set_layout(LayoutKind::Polaroid).unwrap();
        assert_eq!(b.slots().active_count(), 1);
        b.set_layout(LayoutKind::Vertical).unwrap();
        assert_eq!(b.layout().slot_count(), 4);
    }

    #[test]
    fn reset_empties_slots_but_keeps_choices() {
        let mut b = booth();
        b.set_filter(FilterKind::Noir);
        b.place_live_photo(1, LivePhoto::still_only(frame())).unwrap();
        assert!(b.live_photo_clip(1).is_none());
        b.reset();
        assert_eq!(b.slots().filled_count(), 0);
        assert_eq!(b.filter(), FilterKind::Noir);
    }

    #[tokio::test]
    async fn live_strip_without_clips_fails_validation() {
        let mut b = booth();
        b.set_photo_count(2).unwrap();
        b.place_upload(0, frame()).unwrap();
        b.place_upload(1, frame()).unwrap();
        let err = b.export_live_strip().await.unwrap_err();
        assert!(matches!(err, StripError::Validation(_)));
    }
}
