use kurbo::{RoundedRect, Shape};
use rand::Rng;

use crate::background::noise::{add_noise, vertical_gradient};
use crate::foundation::core::{Rect, Rgba8};
use crate::foundation::error::StripResult;
use crate::render::surface::Surface;
use crate::render::vector::VectorLayer;

const FILM_TOP: Rgba8 = Rgba8::rgb(24, 22, 20);
const FILM_BOTTOM: Rgba8 = Rgba8::rgb(14, 13, 12);
const PERFORATION: Rgba8 = Rgba8::rgba(236, 232, 220, 235);
const FRAME_EDGE: Rgba8 = Rgba8::rgba(0, 0, 0, 200);
const FRAME_HIGHLIGHT: Rgba8 = Rgba8::rgba(255, 240, 200, 40);

const PERF_WIDTH: f64 = 16.0;
const PERF_HEIGHT: f64 = 22.0;
const PERF_PITCH: f64 = 38.0;
const PERF_RADIUS: f64 = 4.0;
const PERF_INSET: f64 = 12.0;
const FRAME_WIDTH: f64 = 6.0;

pub(super) fn film_base(surface: &mut Surface, rng: &mut impl Rng) -> StripResult<()> {
    vertical_gradient(surface, FILM_TOP, FILM_BOTTOM);
    add_noise(surface, 0.05, rng);
    Ok(())
}

/// Sprocket holes down both margins and a dark gate around every photo.
///
/// Drawn after the photos so the gate overlaps their edges.
pub fn draw_film_strip_overlay(surface: &mut Surface, slots: &[Rect]) -> StripResult<()> {
    let w = f64::from(surface.width());
    let h = f64::from(surface.height());
    let mut layer = VectorLayer::for_surface(surface)?;

    for slot in slots {
        let gate = slot.inflate(FRAME_WIDTH / 2.0, FRAME_WIDTH / 2.0);
        layer.stroke_path(&gate.to_path(0.1), FRAME_WIDTH, FRAME_EDGE);
        layer.stroke_path(&slot.inflate(0.5, 0.5).to_path(0.1), 1.0, FRAME_HIGHLIGHT);
    }

    let columns = [PERF_INSET, w - PERF_INSET - PERF_WIDTH];
    let rows = ((h - PERF_PITCH / 2.0) / PERF_PITCH).floor().max(0.0) as usize;
    let offset = (h - rows as f64 * PERF_PITCH) / 2.0;
    for row in 0..rows {
        let y = offset + row as f64 * PERF_PITCH + (PERF_PITCH - PERF_HEIGHT) / 2.0;
        for x in columns {
            let hole = RoundedRect::new(x, y, x + PERF_WIDTH, y + PERF_HEIGHT, PERF_RADIUS);
            layer.fill_shape(&hole, PERFORATION);
        }
    }
    layer.composite_onto(surface)
}
