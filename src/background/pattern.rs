//! Flat and geometric backgrounds. None of these consume randomness.

use kurbo::Circle;

use crate::background::noise::{diagonal_gradient, vertical_gradient};
use crate::foundation::core::{Point, Rect, Rgba8};
use crate::foundation::error::StripResult;
use crate::render::surface::Surface;
use crate::render::vector::VectorLayer;

const CLASSIC: Rgba8 = Rgba8::rgb(255, 255, 255);

const GRADIENT_TOP: Rgba8 = Rgba8::rgb(255, 236, 210);
const GRADIENT_BOTTOM: Rgba8 = Rgba8::rgb(252, 182, 159);

const BLUSH_FROM: Rgba8 = Rgba8::rgb(255, 231, 238);
const BLUSH_TO: Rgba8 = Rgba8::rgb(250, 196, 212);

const MIDNIGHT_TOP: Rgba8 = Rgba8::rgb(15, 23, 42);
const MIDNIGHT_BOTTOM: Rgba8 = Rgba8::rgb(49, 46, 129);

const DOT_BASE: Rgba8 = Rgba8::rgb(255, 246, 238);
const DOT_COLOR: Rgba8 = Rgba8::rgba(255, 160, 180, 150);
const DOT_SPACING: f64 = 40.0;
const DOT_RADIUS: f64 = 7.0;

const GRID_BASE: Rgba8 = Rgba8::rgb(250, 250, 252);
const GRID_LINE: Rgba8 = Rgba8::rgba(150, 170, 210, 70);
const GRID_SPACING: u32 = 30;

pub(super) fn classic(surface: &mut Surface) {
    surface.fill(CLASSIC);
}

pub(super) fn gradient(surface: &mut Surface) {
    vertical_gradient(surface, GRADIENT_TOP, GRADIENT_BOTTOM);
}

pub(super) fn blush(surface: &mut Surface) {
    diagonal_gradient(surface, BLUSH_FROM, BLUSH_TO);
}

pub(super) fn midnight(surface: &mut Surface) {
    vertical_gradient(surface, MIDNIGHT_TOP, MIDNIGHT_BOTTOM);
}

/// Staggered dot lattice; odd rows shift by half a period.
pub(super) fn polka_dot(surface: &mut Surface) -> StripResult<()> {
    surface.fill(DOT_BASE);
    let mut layer = VectorLayer::for_surface(surface)?;
    let w = f64::from(surface.width());
    let h = f64::from(surface.height());
    let mut row = 0u32;
    let mut y = DOT_SPACING / 2.0;
    while y < h + DOT_RADIUS {
        let shift = if row % 2 == 1 { DOT_SPACING / 2.0 } else { 0.0 };
        let mut x = shift;
        while x < w + DOT_RADIUS {
            layer.fill_shape(&Circle::new(Point::new(x, y), DOT_RADIUS), DOT_COLOR);
            x += DOT_SPACING;
        }
        y += DOT_SPACING;
        row += 1;
    }
    layer.composite_onto(surface)
}

/// Graph paper: hairlines every [`GRID_SPACING`] pixels.
pub(super) fn grid(surface: &mut Surface) {
    surface.fill(GRID_BASE);
    let w = f64::from(surface.width());
    let h = f64::from(surface.height());
    for x in (0..surface.width()).step_by(GRID_SPACING as usize) {
        let x = f64::from(x);
        surface.fill_rect_over(Rect::new(x, 0.0, x + 1.0, h), GRID_LINE);
    }
    for y in (0..surface.height()).step_by(GRID_SPACING as usize) {
        let y = f64::from(y);
        surface.fill_rect_over(Rect::new(0.0, y, w, y + 1.0), GRID_LINE);
    }
}
