use chrono::{DateTime, Local};
use image::RgbaImage;

use crate::background::{self, BackgroundStyle, draw_film_strip_overlay, rng_for};
use crate::config::{BrandingConfig, RenderConfig};
use crate::filters::{FilterKind, FilterPipeline};
use crate::foundation::core::Rect;
use crate::foundation::error::StripResult;
use crate::render::composite::cover;
use crate::render::surface::Surface;
use crate::render::text::TextRenderer;
use crate::strip::branding::{
    BrandingText, Palette, branding_runs, draw_placeholder, draw_slot_border,
};
use crate::strip::layout::Layout;
use crate::strip::slots::Slot;

/// Everything that decides how one strip looks.
#[derive(Clone, Debug)]
pub struct StripRequest<'a> {
    pub layout: Layout,
    /// Slot contents in strip order; missing entries render as placeholders.
    pub slots: &'a [Slot],
    pub filter: FilterKind,
    pub background: BackgroundStyle,
    pub caption: Option<&'a str>,
    pub date: DateTime<Local>,
}

/// Renders still photostrips.
///
/// Draw order: background, then per slot the photo (or a placeholder) and its border, then
/// the film-strip frame when the background has one, then branding.
#[derive(Clone, Debug)]
pub struct PhotostripCompositor {
    text: TextRenderer,
    filters: FilterPipeline,
    branding: BrandingConfig,
    background_seed: Option<u64>,
}

impl PhotostripCompositor {
    pub fn new(render: &RenderConfig, branding: BrandingConfig) -> Self {
        Self {
            text: TextRenderer::new(&render.font_dirs),
            filters: FilterPipeline::default(),
            branding,
            background_seed: render.background_seed,
        }
    }

    pub fn with_filters(mut self, filters: FilterPipeline) -> Self {
        self.filters = filters;
        self
    }

    pub fn text(&self) -> &TextRenderer {
        &self.text
    }

    pub fn filters(&self) -> &FilterPipeline {
        &self.filters
    }

    pub fn branding(&self) -> &BrandingConfig {
        &self.branding
    }

    /// A full-canvas background for `layout`.
    pub fn background(&self, layout: Layout, style: BackgroundStyle) -> StripResult<Surface> {
        let mut surface = Surface::for_canvas(layout.canvas())?;
        background::draw(&mut surface, style, &mut rng_for(self.background_seed))?;
        Ok(surface)
    }

    /// `img` cover-scaled to the slot and filtered, ready to draw at the slot origin.
    pub async fn slot_photo(
        &self,
        img: &RgbaImage,
        rect: Rect,
        filter: FilterKind,
    ) -> StripResult<Surface> {
        let (w, h) = slot_size(rect);
        let fitted = cover(img, w, h)?;
        let mut photo = Surface::from_rgba_image(&fitted)?;
        self.filters.apply(&mut photo, filter).await?;
        Ok(photo)
    }

    #[tracing::instrument(
        skip_all,
        fields(
            layout = %req.layout.kind(),
            slots = req.layout.slot_count(),
            filter = %req.filter,
            background = %req.background
        )
    )]
    pub async fn compose(&self, req: &StripRequest<'_>) -> StripResult<Surface> {
        let layout = req.layout;
        let rects = layout.slot_rects();
        let palette = Palette::for_dark(req.background.is_dark());

        // Decode everything up front so a bad photo fails before any drawing.
        let stills = rects
            .iter()
            .enumerate()
            .map(|(i, _)| {
                req.slots
                    .get(i)
                    .and_then(|s| s.still.as_ref())
                    .map(|f| f.decode())
                    .transpose()
            })
            .collect::<StripResult<Vec<_>>>()?;

        let mut surface = self.background(layout, req.background)?;
        for (i, (rect, still)) in rects.iter().zip(&stills).enumerate() {
            match still {
                Some(img) => {
                    let photo = self.slot_photo(img, *rect, req.filter).await?;
                    let (x, y) = slot_origin(*rect);
                    surface.draw_over(&photo, x, y, 1.0);
                }
                None => {
                    tracing::debug!(slot = i, "placeholder");
                    draw_placeholder(&mut surface, &self.text, *rect, i, &palette)?;
                }
            }
            draw_slot_border(&mut surface, *rect, palette.border);
        }
        if req.background.has_overlay() {
            draw_film_strip_overlay(&mut surface, &rects)?;
        }

        let text = BrandingText::new(&self.branding, req.caption, req.date);
        self.text
            .draw(&mut surface, &branding_runs(layout, &text, &palette))?;
        tracing::info!(
            width = surface.width(),
            height = surface.height(),
            photos = stills.iter().flatten().count(),
            "strip composed"
        );
        Ok(surface)
    }
}

pub(crate) fn slot_origin(rect: Rect) -> (i64, i64) {
    (rect.x0.round() as i64, rect.y0.round() as i64)
}

pub(crate) fn slot_size(rect: Rect) -> (u32, u32) {
    (
        rect.width().round().max(1.0) as u32,
        rect.height().round().max(1.0) as u32,
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::foundation::error::StripError;
    use crate::media::frame::Frame;
    use crate::strip::layout::LayoutKind;

    fn compositor() -> PhotostripCompositor {
        PhotostripCompositor::new(
            &RenderConfig {
                background_seed: Some(1),
                ..Default::default()
            },
            BrandingConfig::default(),
        )
    }

    fn slot(rgb: [u8; 3]) -> Slot {
        let img = RgbaImage::from_pixel(64, 48, image::Rgba([rgb[0], rgb[1], rgb[2], 255]));
        Slot {
            still: Some(Frame::from_image(img, Duration::ZERO).unwrap()),
            live_clip: None,
        }
    }

    fn request(slots: &[Slot]) -> StripRequest<'_> {
        StripRequest {
            layout: Layout::new(LayoutKind::Vertical, 2).unwrap(),
            slots,
            filter: FilterKind::None,
            background: BackgroundStyle::Classic,
            caption: None,
            date: Local::now(),
        }
    }

    #[tokio::test]
    async fn photos_land_in_their_slots() {
        let slots = [slot([200, 10, 10]), slot([10, 10, 200])];
        let out = compositor().compose(&request(&slots)).await.unwrap();
        assert_eq!((out.width(), out.height()), (600, 990));
        assert_eq!(out.pixel(300, 250), [200, 10, 10, 255]);
        assert_eq!(out.pixel(300, 700), [10, 10, 200, 255]);
        // side padding shows the background
        assert_eq!(out.pixel(10, 250), [255, 255, 255, 255]);
    }

    #[tokio::test]
    async fn missing_photo_becomes_placeholder() {
        let slots = [slot([200, 10, 10])];
        let out = compositor().compose(&request(&slots)).await.unwrap();
        assert_eq!(out.pixel(60, 500), Palette::LIGHT.placeholder_fill.premul());
    }

    #[tokio::test]
    async fn undecodable_photo_aborts() {
        let bad = Slot {
            still: Some(Frame::from_encoded(broken_png()).unwrap()),
            live_clip: None,
        };
        let slots = [slot([1, 2, 3]), bad];
        let err = compositor().compose(&request(&slots)).await.unwrap_err();
        assert!(matches!(err, StripError::LoadFailure(_)));
    }

    #[tokio::test]
    async fn grayscale_filter_reaches_slots() {
        let slots = [slot([200, 40, 90]), slot([20, 140, 90])];
        let mut req = request(&slots);
        req.filter = FilterKind::Grayscale;
        let out = compositor().compose(&req).await.unwrap();
        let [r, g, b, _] = out.pixel(300, 250);
        assert_eq!((r, r), (g, b));
    }

    #[tokio::test]
    async fn translucent_uploads_sit_on_the_background() {
        let upload = |px: [u8; 4]| Slot {
            still: Some(
                Frame::from_image(RgbaImage::from_pixel(64, 48, image::Rgba(px)), Duration::ZERO)
                    .unwrap(),
            ),
            live_clip: None,
        };
        let slots = [upload([200, 0, 0, 0]), upload([200, 0, 0, 128])];
        let out = compositor().compose(&request(&slots)).await.unwrap();
        assert_eq!(out.pixel(300, 250), [255, 255, 255, 255]);
        let [r, g, b, a] = out.pixel(300, 700);
        assert_eq!(a, 255);
        assert!(r > g && g == b, "{:?}", [r, g, b, a]);
    }

    /// A PNG whose header parses but whose pixel data is truncated.
    fn broken_png() -> Vec<u8> {
        let mut bytes = Vec::new();
        RgbaImage::from_pixel(8, 8, image::Rgba([9, 9, 9, 255]))
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes.truncate(bytes.len() - 20);
        bytes
    }
}
