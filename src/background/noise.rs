use rand::Rng;

use crate::foundation::core::Rgba8;
use crate::foundation::math::{clamp_u8, smoothstep};
use crate::render::surface::Surface;

/// Add monochrome grain of up to `amplitude * 255` to every opaque pixel.
pub fn add_noise(surface: &mut Surface, amplitude: f32, rng: &mut impl Rng) {
    if amplitude <= 0.0 {
        return;
    }
    let span = amplitude * 255.0;
    for px in surface.data_mut().chunks_exact_mut(4) {
        let n: f32 = rng.gen_range(-1.0..=1.0) * span;
        let a = px[3];
        for c in &mut px[..3] {
            *c = clamp_u8(f32::from(*c) + n).min(a);
        }
    }
}

/// Fill with a top-to-bottom gradient.
pub fn vertical_gradient(surface: &mut Surface, top: Rgba8, bottom: Rgba8) {
    let h = surface.height();
    let w = surface.width();
    let denom = (h.saturating_sub(1)).max(1) as f32;
    for y in 0..h {
        let px = top.lerp(bottom, y as f32 / denom).premul();
        for x in 0..w {
            surface.set_pixel(x, y, px);
        }
    }
}

/// Fill with a gradient running from the top-left to the bottom-right corner.
pub fn diagonal_gradient(surface: &mut Surface, from: Rgba8, to: Rgba8) {
    let w = surface.width();
    let h = surface.height();
    let denom = ((w + h).saturating_sub(2)).max(1) as f32;
    for y in 0..h {
        for x in 0..w {
            let px = from.lerp(to, (x + y) as f32 / denom).premul();
            surface.set_pixel(x, y, px);
        }
    }
}

/// Blend `color` into a disc around `(cx, cy)`, fading out toward `radius`.
pub fn radial_tint(surface: &mut Surface, cx: f32, cy: f32, radius: f32, color: Rgba8, strength: f32) {
    radial_profile(surface, cx, cy, radius, color, |d| {
        strength * (1.0 - smoothstep(0.0, 1.0, d))
    });
}

/// Blend `color` into a ring of normalized `width` at `radius` (coffee cup marks).
pub fn ring_tint(surface: &mut Surface, cx: f32, cy: f32, radius: f32, width: f32, color: Rgba8, strength: f32) {
    let w = width.max(1e-3);
    radial_profile(surface, cx, cy, radius * (1.0 + w), color, |d| {
        let edge = 1.0 / (1.0 + w);
        let t = ((d - edge).abs() / (w / (1.0 + w))).min(1.0);
        let rim = 1.0 - smoothstep(0.0, 1.0, t);
        let fill = if d < edge { 0.25 } else { 0.0 };
        strength * rim.max(fill)
    });
}

fn radial_profile(
    surface: &mut Surface,
    cx: f32,
    cy: f32,
    radius: f32,
    color: Rgba8,
    weight: impl Fn(f32) -> f32,
) {
    if radius <= 0.0 {
        return;
    }
    let x0 = (cx - radius).floor().max(0.0) as u32;
    let y0 = (cy - radius).floor().max(0.0) as u32;
    let x1 = ((cx + radius).ceil().max(0.0) as u32).min(surface.width());
    let y1 = ((cy + radius).ceil().max(0.0) as u32).min(surface.height());
    let tint = [f32::from(color.r), f32::from(color.g), f32::from(color.b)];
    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let d = (dx * dx + dy * dy).sqrt() / radius;
            if d >= 1.0 {
                continue;
            }
            let k = weight(d).clamp(0.0, 1.0);
            if k <= 0.0 {
                continue;
            }
            let mut px = surface.pixel(x, y);
            for c in 0..3 {
                let v = f32::from(px[c]);
                px[c] = clamp_u8(v + (tint[c] - v) * k);
            }
            surface.set_pixel(x, y, px);
        }
    }
}

/// Darken toward the edges by up to `strength`.
pub fn edge_burn(surface: &mut Surface, strength: f32) {
    let w = surface.width() as f32;
    let h = surface.height() as f32;
    let (cx, cy) = (w / 2.0, h / 2.0);
    for y in 0..surface.height() {
        for x in 0..surface.width() {
            let nx = (x as f32 + 0.5 - cx).abs() / cx;
            let ny = (y as f32 + 0.5 - cy).abs() / cy;
            let d = nx.max(ny);
            let k = 1.0 - strength * smoothstep(0.75, 1.0, d);
            let mut px = surface.pixel(x, y);
            for c in &mut px[..3] {
                *c = clamp_u8(f32::from(*c) * k);
            }
            surface.set_pixel(x, y, px);
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn noise_stays_within_amplitude() {
        let mut s = Surface::filled(32, 32, Rgba8::rgb(128, 128, 128)).unwrap();
        add_noise(&mut s, 0.05, &mut StdRng::seed_from_u64(3));
        for px in s.data().chunks_exact(4) {
            assert!((i32::from(px[0]) - 128).abs() <= 13);
            assert_eq!(px[0], px[1]);
            assert_eq!(px[3], 255);
        }
    }

    #[test]
    fn gradient_hits_both_endpoints() {
        let mut s = Surface::new(2, 5).unwrap();
        vertical_gradient(&mut s, Rgba8::rgb(0, 0, 0), Rgba8::rgb(200, 100, 50));
        assert_eq!(s.pixel(0, 0), [0, 0, 0, 255]);
        assert_eq!(s.pixel(1, 4), [200, 100, 50, 255]);
    }

    #[test]
    fn radial_tint_fades_out() {
        let mut s = Surface::filled(41, 41, Rgba8::rgb(255, 255, 255)).unwrap();
        radial_tint(&mut s, 20.5, 20.5, 20.0, Rgba8::rgb(0, 0, 0), 1.0);
        assert!(s.pixel(20, 20)[0] < 10);
        assert_eq!(s.pixel(0, 0)[0], 255);
    }
}
