use chrono::{DateTime, Local};

use crate::config::BrandingConfig;
use crate::foundation::core::{Rect, Rgba8};
use crate::foundation::error::StripResult;
use crate::render::surface::Surface;
use crate::render::text::{TextRenderer, TextRun};
use crate::render::vector::VectorLayer;
use crate::strip::layout::Layout;

/// Longest caption accepted for the title line.
pub const MAX_CAPTION_CHARS: usize = 30;

/// The three lines printed under the photos.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrandingText {
    pub date: String,
    pub title: String,
    pub subtext: String,
}

impl BrandingText {
    /// A non-blank caption replaces the configured title.
    pub fn new(cfg: &BrandingConfig, caption: Option<&str>, date: DateTime<Local>) -> Self {
        let title = match caption.map(str::trim).filter(|c| !c.is_empty()) {
            Some(c) => c.chars().take(MAX_CAPTION_CHARS).collect(),
            None => cfg.title.clone(),
        };
        Self {
            date: date.format("%B %-d, %Y").to_string(),
            title,
            subtext: cfg.subtext.clone(),
        }
    }
}

/// Ink colors for one background tone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub date: Rgba8,
    pub title: Rgba8,
    pub subtext: Rgba8,
    pub border: Rgba8,
    pub placeholder_fill: Rgba8,
    pub placeholder_ink: Rgba8,
}

impl Palette {
    pub const LIGHT: Palette = Palette {
        date: Rgba8::rgb(96, 96, 96),
        title: Rgba8::rgb(28, 28, 30),
        subtext: Rgba8::rgb(128, 128, 128),
        border: Rgba8::rgba(0, 0, 0, 31),
        placeholder_fill: Rgba8::rgb(236, 236, 238),
        placeholder_ink: Rgba8::rgb(160, 160, 166),
    };

    pub const DARK: Palette = Palette {
        date: Rgba8::rgb(200, 200, 200),
        title: Rgba8::rgb(250, 250, 250),
        subtext: Rgba8::rgb(168, 168, 168),
        border: Rgba8::rgba(255, 255, 255, 46),
        placeholder_fill: Rgba8::rgb(48, 48, 52),
        placeholder_ink: Rgba8::rgb(128, 128, 136),
    };

    pub fn for_dark(dark: bool) -> Self {
        if dark { Self::DARK } else { Self::LIGHT }
    }
}

/// Text runs for the branding area of `layout`, centered horizontally.
pub fn branding_runs(layout: Layout, text: &BrandingText, palette: &Palette) -> Vec<TextRun> {
    let area = layout.branding_rect();
    let cx = area.center().x;
    let h = area.height();
    vec![
        TextRun::new(&text.date, cx, area.y0 + h * 0.28, 15.0)
            .color(palette.date)
            .letter_spacing(1.0),
        TextRun::new(&text.title, cx, area.y0 + h * 0.6, 30.0)
            .weight(700)
            .family("serif")
            .color(palette.title),
        TextRun::new(&text.subtext, cx, area.y0 + h * 0.83, 13.0)
            .italic()
            .color(palette.subtext),
    ]
}

/// Branding rasterized once into a transparent layer the size of the strip.
pub fn render_branding(
    renderer: &TextRenderer,
    layout: Layout,
    text: &BrandingText,
    palette: &Palette,
) -> StripResult<Surface> {
    renderer.render(layout.canvas(), &branding_runs(layout, text, palette))
}

/// 1px translucent outline just inside `rect`.
pub fn draw_slot_border(surface: &mut Surface, rect: Rect, color: Rgba8) {
    let Rect { x0, y0, x1, y1 } = rect;
    surface.fill_rect_over(Rect::new(x0, y0, x1, y0 + 1.0), color);
    surface.fill_rect_over(Rect::new(x0, y1 - 1.0, x1, y1), color);
    surface.fill_rect_over(Rect::new(x0, y0 + 1.0, x0 + 1.0, y1 - 1.0), color);
    surface.fill_rect_over(Rect::new(x1 - 1.0, y0 + 1.0, x1, y1 - 1.0), color);
}

/// Empty-slot card: flat fill, dashed inset outline and the 1-based slot number.
pub fn draw_placeholder(
    surface: &mut Surface,
    renderer: &TextRenderer,
    rect: Rect,
    index: usize,
    palette: &Palette,
) -> StripResult<()> {
    surface.fill_rect_over(rect, palette.placeholder_fill);

    let mut layer = VectorLayer::for_surface(surface)?;
    let inset = rect.inset(-12.0);
    layer.stroke_dashed(
        &kurbo::Shape::to_path(&inset, 0.1),
        2.0,
        &[10.0, 6.0],
        palette.placeholder_ink,
    );
    layer.composite_onto(surface)?;

    let size = (rect.height() * 0.22).clamp(24.0, 72.0);
    let run = TextRun::new(
        (index + 1).to_string(),
        rect.center().x,
        rect.center().y + size * 0.35,
        size,
    )
    .weight(600)
    .color(palette.placeholder_ink);
    renderer.draw(surface, &[run])
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::strip::layout::LayoutKind;

    fn date() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap()
    }

    #[test]
    fn caption_overrides_title_and_is_capped() {
        let cfg = BrandingConfig::default();
        let t = BrandingText::new(&cfg, Some("  "), date());
        assert_eq!(t.title, cfg.title);
        assert_eq!(t.date, "March 9, 2024");
        let long = "x".repeat(45);
        let t = BrandingText::new(&cfg, Some(&long), date());
        assert_eq!(t.title.chars().count(), MAX_CAPTION_CHARS);
    }

    #[test]
    fn runs_sit_inside_the_reservation() {
        let layout = Layout::new(LayoutKind::Vertical, 4).unwrap();
        let text = BrandingText::new(&BrandingConfig::default(), None, date());
        let area = layout.branding_rect();
        for run in branding_runs(layout, &text, &Palette::LIGHT) {
            assert!(run.y > area.y0 && run.y < area.y1);
            assert_eq!(run.x, 300.0);
        }
    }

    #[test]
    fn border_touches_only_the_edge() {
        let mut s = Surface::filled(10, 10, Rgba8::rgb(255, 255, 255)).unwrap();
        draw_slot_border(&mut s, Rect::new(2.0, 2.0, 8.0, 8.0), Rgba8::rgba(0, 0, 0, 128));
        assert!(s.pixel(2, 5)[0] < 255);
        assert!(s.pixel(7, 7)[0] < 255);
        assert_eq!(s.pixel(5, 5)[0], 255);
        assert_eq!(s.pixel(1, 1)[0], 255);
        // corners are covered once
        assert_eq!(s.pixel(2, 2), s.pixel(5, 2));
    }

    #[test]
    fn placeholder_fills_the_slot() {
        let renderer = TextRenderer::new(&[]);
        let mut s = Surface::filled(200, 160, Rgba8::rgb(255, 255, 255)).unwrap();
        let rect = Rect::new(20.0, 20.0, 180.0, 140.0);
        draw_placeholder(&mut s, &renderer, rect, 0, &Palette::LIGHT).unwrap();
        assert_eq!(s.pixel(25, 25), Palette::LIGHT.placeholder_fill.premul());
        assert_eq!(s.pixel(5, 5), [255, 255, 255, 255]);
    }
}
