use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{StripError, StripResult};
use crate::render::surface::Surface;

/// Horizontal anchoring of a text run around its `x` coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    #[default]
    Middle,
    End,
}

impl TextAnchor {
    fn as_svg(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

/// One line of text placed in surface coordinates (`y` is the baseline).
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub weight: u16,
    pub italic: bool,
    pub family: &'static str,
    pub color: Rgba8,
    pub letter_spacing: f64,
    pub anchor: TextAnchor,
}

impl TextRun {
    pub fn new(text: impl Into<String>, x: f64, y: f64, size: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            size,
            weight: 400,
            italic: false,
            family: "sans-serif",
            color: Rgba8::rgb(0, 0, 0),
            letter_spacing: 0.0,
            anchor: TextAnchor::Middle,
        }
    }

    pub fn weight(mut self, weight: u16) -> Self {
        self.weight = weight;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn family(mut self, family: &'static str) -> Self {
        self.family = family;
        self
    }

    pub fn color(mut self, color: Rgba8) -> Self {
        self.color = color;
        self
    }

    pub fn letter_spacing(mut self, spacing: f64) -> Self {
        self.letter_spacing = spacing;
        self
    }

    pub fn anchor(mut self, anchor: TextAnchor) -> Self {
        self.anchor = anchor;
        self
    }
}

/// Rasterizes text runs through `usvg`/`resvg` against a shared font database.
#[derive(Clone)]
pub struct TextRenderer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer")
            .field("faces", &self.fontdb.len())
            .finish()
    }
}

impl TextRenderer {
    /// System fonts plus any `.ttf`/`.otf`/`.ttc` files found in `font_dirs`.
    pub fn new(font_dirs: &[PathBuf]) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        for dir in font_dirs {
            load_fonts_from_dir(&mut db, dir);
        }
        tracing::debug!(faces = db.len(), "text renderer font database ready");
        Self {
            fontdb: Arc::new(db),
        }
    }

    /// Render `runs` into a transparent surface of `canvas` size.
    ///
    /// With no usable font faces the result is simply transparent.
    pub fn render(&self, canvas: Canvas, runs: &[TextRun]) -> StripResult<Surface> {
        let svg = svg_document(canvas, runs);
        let opts = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            ..Default::default()
        };
        let tree = usvg::Tree::from_data(svg.as_bytes(), &opts)
            .context("parse text svg")
            .map_err(StripError::from)?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(canvas.width, canvas.height)
            .ok_or_else(|| StripError::rendering("failed to allocate text pixmap"))?;
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::identity(),
            &mut pixmap.as_mut(),
        );
        Surface::from_premul_bytes(canvas.width, canvas.height, pixmap.data().to_vec())
    }

    /// Render `runs` and blend them over `dst`.
    pub fn draw(&self, dst: &mut Surface, runs: &[TextRun]) -> StripResult<()> {
        if runs.iter().all(|r| r.text.trim().is_empty()) {
            return Ok(());
        }
        let layer = self.render(dst.canvas(), runs)?;
        dst.draw_over(&layer, 0, 0, 1.0);
        Ok(())
    }
}

fn svg_document(canvas: Canvas, runs: &[TextRun]) -> String {
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = canvas.width,
        h = canvas.height
    );
    for run in runs {
        let _ = write!(
            svg,
            r#"<text x="{x}" y="{y}" font-family="{family}" font-size="{size}" font-weight="{weight}" font-style="{style}" letter-spacing="{spacing}" text-anchor="{anchor}" fill="{fill}" fill-opacity="{opacity}">{text}</text>"#,
            x = run.x,
            y = run.y,
            family = escape_xml(run.family),
            size = run.size,
            weight = run.weight,
            style = if run.italic { "italic" } else { "normal" },
            spacing = run.letter_spacing,
            anchor = run.anchor.as_svg(),
            fill = run.color.to_hex(),
            opacity = f32::from(run.color.a) / 255.0,
            text = escape_xml(&run.text),
        );
    }
    svg.push_str("</svg>");
    svg
}

pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::debug!(dir = %dir.display(), "font directory not readable");
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        if let Err(err) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), %err, "skipping unreadable font");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_xml_handles_markup_and_controls() {
        assert_eq!(escape_xml("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&apos;");
        assert_eq!(escape_xml("x\u{7}y"), "xy");
    }

    #[test]
    fn svg_document_parses_with_hostile_caption() {
        let runs = [TextRun::new("</text><script>", 10.0, 20.0, 12.0).italic()];
        let svg = svg_document(Canvas::new(40, 30), &runs);
        assert!(svg.contains("&lt;/text&gt;"));
        let tree = usvg::Tree::from_data(svg.as_bytes(), &usvg::Options::default());
        assert!(tree.is_ok());
    }

    #[test]
    fn blank_runs_do_not_touch_surface() {
        let renderer = TextRenderer {
            fontdb: Arc::new(usvg::fontdb::Database::new()),
        };
        let mut s = Surface::filled(8, 8, Rgba8::rgb(1, 2, 3)).unwrap();
        let before = s.clone();
        renderer
            .draw(&mut s, &[TextRun::new("   ", 4.0, 4.0, 8.0)])
            .unwrap();
        assert_eq!(s, before);
    }

    #[test]
    fn render_without_faces_is_transparent() {
        let renderer = TextRenderer {
            fontdb: Arc::new(usvg::fontdb::Database::new()),
        };
        let out = renderer
            .render(Canvas::new(16, 8), &[TextRun::new("Hi", 8.0, 6.0, 6.0)])
            .unwrap();
        assert!(out.data().iter().all(|&b| b == 0));
    }
}
