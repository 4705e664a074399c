//! Paper-like textures: grain, torn sheets, tape, stains and wear.

use std::f64::consts::TAU;

use kurbo::Circle;
use rand::Rng;

use crate::background::noise::{add_noise, edge_burn, radial_tint, ring_tint};
use crate::foundation::core::{Point, Rgba8};
use crate::foundation::error::StripResult;
use crate::render::composite::over;
use crate::render::surface::Surface;
use crate::render::vector::{VectorLayer, polygon, polyline};

const PAPER: Rgba8 = Rgba8::rgb(250, 246, 238);
const KRAFT: Rgba8 = Rgba8::rgb(196, 164, 120);
const CHALKBOARD: Rgba8 = Rgba8::rgb(38, 54, 47);
const TORN_BACKING: Rgba8 = Rgba8::rgb(214, 206, 192);
const TORN_SHEET: Rgba8 = Rgba8::rgb(250, 247, 240);
const TAPE: Rgba8 = Rgba8::rgba(250, 236, 170, 140);
const STAIN: Rgba8 = Rgba8::rgb(128, 86, 46);
const WORN: Rgba8 = Rgba8::rgb(236, 226, 206);

const CONFETTI: [Rgba8; 6] = [
    Rgba8::rgb(255, 99, 132),
    Rgba8::rgb(255, 205, 86),
    Rgba8::rgb(75, 192, 192),
    Rgba8::rgb(54, 162, 235),
    Rgba8::rgb(153, 102, 255),
    Rgba8::rgb(255, 159, 64),
];

pub(super) fn paper_grain(surface: &mut Surface, rng: &mut impl Rng) -> StripResult<()> {
    surface.fill(PAPER);
    fibers(surface, rng, 80, Rgba8::rgba(150, 130, 100, 20))?;
    add_noise(surface, 0.06, rng);
    Ok(())
}

pub(super) fn kraft(surface: &mut Surface, rng: &mut impl Rng) -> StripResult<()> {
    surface.fill(KRAFT);
    fibers(surface, rng, 220, Rgba8::rgba(110, 80, 45, 45))?;
    add_noise(surface, 0.12, rng);
    Ok(())
}

/// Dark slate with a few erased-chalk smudges.
pub(super) fn chalkboard(surface: &mut Surface, rng: &mut impl Rng) -> StripResult<()> {
    surface.fill(CHALKBOARD);
    let w = surface.width() as f32;
    let h = surface.height() as f32;
    for _ in 0..6 {
        let cx = rng.gen_range(0.0..w);
        let cy = rng.gen_range(0.0..h);
        let r = rng.gen_range(0.15..0.4) * w;
        let k = rng.gen_range(0.04..0.09);
        radial_tint(surface, cx, cy, r, Rgba8::rgb(230, 235, 230), k);
    }
    add_noise(surface, 0.10, rng);
    Ok(())
}

/// Stacked paper scraps whose top and bottom edges are jittered polylines.
pub(super) fn torn_paper(surface: &mut Surface, rng: &mut impl Rng) -> StripResult<()> {
    surface.fill(TORN_BACKING);
    let w = f64::from(surface.width());
    let h = f64::from(surface.height());
    let sheets = rng.gen_range(3..=5);
    let band = h / f64::from(sheets);
    let mut layer = VectorLayer::for_surface(surface)?;
    for i in 0..sheets {
        let top = f64::from(i) * band + rng.gen_range(4.0..16.0);
        let bottom = (top + band - rng.gen_range(10.0..24.0)).min(h);
        let mut outline = torn_edge(rng, -4.0, w + 4.0, top, 5.0);
        let mut lower = torn_edge(rng, -4.0, w + 4.0, bottom, 5.0);
        lower.reverse();
        outline.extend(lower);
        let shadow: Vec<Point> = outline.iter().map(|p| Point::new(p.x + 2.0, p.y + 3.0)).collect();
        layer.fill_path(&polygon(&shadow), Rgba8::rgba(0, 0, 0, 40));
        layer.fill_path(&polygon(&outline), TORN_SHEET);
    }
    layer.composite_onto(surface)?;
    add_noise(surface, 0.05, rng);
    Ok(())
}

/// Points along a horizontal edge at height `y`, displaced by up to `jitter` pixels.
fn torn_edge(rng: &mut impl Rng, x0: f64, x1: f64, y: f64, jitter: f64) -> Vec<Point> {
    let mut points = Vec::new();
    let mut x = x0;
    while x < x1 {
        points.push(Point::new(x, y + rng.gen_range(-jitter..=jitter)));
        x += rng.gen_range(3.0..9.0);
    }
    points.push(Point::new(x1, y + rng.gen_range(-jitter..=jitter)));
    points
}

/// Paper with translucent tape strips across the corners.
pub(super) fn taped(surface: &mut Surface, rng: &mut impl Rng) -> StripResult<()> {
    surface.fill(PAPER);
    add_noise(surface, 0.06, rng);
    let w = surface.width() as f32;
    let h = surface.height() as f32;
    let anchors = [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)];
    for (ax, ay) in anchors {
        let angle = if (ax == 0.0) == (ay == 0.0) { -0.78 } else { 0.78 };
        let tape = TapeStrip {
            cx: ax + if ax == 0.0 { 45.0 } else { -45.0 },
            cy: ay + if ay == 0.0 { 35.0 } else { -35.0 },
            angle: angle + rng.gen_range(-0.2..0.2),
            length: rng.gen_range(120.0..170.0),
            width: rng.gen_range(32.0..42.0),
        };
        tape.draw(surface);
    }
    Ok(())
}

struct TapeStrip {
    cx: f32,
    cy: f32,
    angle: f32,
    length: f32,
    width: f32,
}

impl TapeStrip {
    const HATCH: i32 = 5;

    /// Rasterize the band in its local frame; the crosshatch darkens every few diagonals.
    fn draw(&self, surface: &mut Surface) {
        let (sin, cos) = self.angle.sin_cos();
        let reach = (self.length + self.width) / 2.0;
        let x0 = (self.cx - reach).floor().max(0.0) as u32;
        let y0 = (self.cy - reach).floor().max(0.0) as u32;
        let x1 = ((self.cx + reach).ceil().max(0.0) as u32).min(surface.width());
        let y1 = ((self.cy + reach).ceil().max(0.0) as u32).min(surface.height());
        let plain = TAPE.premul();
        let hatched = Rgba8 { a: TAPE.a.saturating_add(40), ..TAPE }.premul();
        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - self.cx;
                let dy = y as f32 + 0.5 - self.cy;
                let u = dx * cos + dy * sin;
                let v = -dx * sin + dy * cos;
                if u.abs() > self.length / 2.0 || v.abs() > self.width / 2.0 {
                    continue;
                }
                let (ui, vi) = (u.round() as i32, v.round() as i32);
                let on_hatch = (ui + vi).rem_euclid(Self::HATCH) == 0
                    || (ui - vi).rem_euclid(Self::HATCH) == 0;
                let src = if on_hatch { hatched } else { plain };
                surface.set_pixel(x, y, over(surface.pixel(x, y), src, 1.0));
            }
        }
    }
}

/// Paper with cup rings and drips.
pub(super) fn coffee_stain(surface: &mut Surface, rng: &mut impl Rng) -> StripResult<()> {
    surface.fill(PAPER);
    let w = surface.width() as f32;
    let h = surface.height() as f32;
    for _ in 0..rng.gen_range(2..=4) {
        let cx = rng.gen_range(0.0..w);
        let cy = rng.gen_range(0.0..h);
        let r = rng.gen_range(50.0..110.0);
        ring_tint(surface, cx, cy, r, 0.08, STAIN, rng.gen_range(0.25..0.4));
    }
    for _ in 0..rng.gen_range(3..=7) {
        let cx = rng.gen_range(0.0..w);
        let cy = rng.gen_range(0.0..h);
        radial_tint(surface, cx, cy, rng.gen_range(6.0..22.0), STAIN, 0.3);
    }
    add_noise(surface, 0.08, rng);
    Ok(())
}

/// Aged paper: scratches, burnt edges and heavy grain.
pub(super) fn worn(surface: &mut Surface, rng: &mut impl Rng) -> StripResult<()> {
    surface.fill(WORN);
    let w = f64::from(surface.width());
    let h = f64::from(surface.height());
    let mut layer = VectorLayer::for_surface(surface)?;
    for _ in 0..40 {
        let start = Point::new(rng.gen_range(0.0..w), rng.gen_range(0.0..h));
        let heading = rng.gen_range(0.0..TAU);
        let len = rng.gen_range(20.0..120.0);
        let end = start + kurbo::Vec2::from_angle(heading) * len;
        let color = if rng.gen_bool(0.5) {
            Rgba8::rgba(255, 255, 255, 70)
        } else {
            Rgba8::rgba(90, 70, 40, 35)
        };
        layer.stroke_path(&polyline(&[start, end]), rng.gen_range(0.5..1.5), color);
    }
    layer.composite_onto(surface)?;
    edge_burn(surface, 0.25);
    add_noise(surface, 0.18, rng);
    Ok(())
}

/// White field scattered with colored squares and dots.
pub(super) fn confetti(surface: &mut Surface, rng: &mut impl Rng) -> StripResult<()> {
    surface.fill(Rgba8::rgb(255, 255, 255));
    let w = f64::from(surface.width());
    let h = f64::from(surface.height());
    let count = ((w * h) / 2500.0).round() as usize;
    let mut layer = VectorLayer::for_surface(surface)?;
    for _ in 0..count {
        let color = CONFETTI[rng.gen_range(0..CONFETTI.len())].with_opacity(rng.gen_range(0.55..0.9));
        let c = Point::new(rng.gen_range(0.0..w), rng.gen_range(0.0..h));
        if rng.gen_bool(0.4) {
            layer.fill_shape(&Circle::new(c, rng.gen_range(2.0..4.5)), color);
        } else {
            let half = rng.gen_range(2.5..5.0);
            let (sin, cos) = rng.gen_range(0.0..TAU).sin_cos();
            let corners = [(-1.0, -0.5), (1.0, -0.5), (1.0, 0.5), (-1.0, 0.5)].map(|(u, v)| {
                let (u, v) = (u * half, v * half);
                Point::new(c.x + u * cos - v * sin, c.y + u * sin + v * cos)
            });
            layer.fill_path(&polygon(&corners), color);
        }
    }
    layer.composite_onto(surface)?;
    add_noise(surface, 0.05, rng);
    Ok(())
}

/// Short, faint strokes that read as pulp fibers.
fn fibers(surface: &mut Surface, rng: &mut impl Rng, count: usize, color: Rgba8) -> StripResult<()> {
    let w = f64::from(surface.width());
    let h = f64::from(surface.height());
    let mut layer = VectorLayer::for_surface(surface)?;
    for _ in 0..count {
        let a = Point::new(rng.gen_range(0.0..w), rng.gen_range(0.0..h));
        let mid = a + kurbo::Vec2::new(rng.gen_range(-6.0..6.0), rng.gen_range(-6.0..6.0));
        let b = mid + kurbo::Vec2::new(rng.gen_range(-6.0..6.0), rng.gen_range(-6.0..6.0));
        layer.stroke_path(&polyline(&[a, mid, b]), 0.6, color);
    }
    layer.composite_onto(surface)
}
