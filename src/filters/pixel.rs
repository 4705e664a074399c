//! Closed-form per-pixel color math on straight `0..=255` channels.

use crate::foundation::core::Rgba8;
use crate::foundation::math::{clamp_u8, luminance};
use crate::render::composite::BlendMode;
use crate::render::surface::Surface;

pub type Rgb = [f32; 3];

/// Translucent color laid over a filtered pixel with a blend mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorOverlay {
    pub color: Rgba8,
    pub alpha: f32,
    pub mode: BlendMode,
}

impl ColorOverlay {
    pub const fn new(r: u8, g: u8, b: u8, alpha: f32, mode: BlendMode) -> Self {
        Self {
            color: Rgba8::rgb(r, g, b),
            alpha,
            mode,
        }
    }

    pub fn apply(&self, c: Rgb) -> Rgb {
        let s = [
            f32::from(self.color.r),
            f32::from(self.color.g),
            f32::from(self.color.b),
        ];
        [
            self.mode.mix(c[0], s[0], self.alpha),
            self.mode.mix(c[1], s[1], self.alpha),
            self.mode.mix(c[2], s[2], self.alpha),
        ]
    }
}

pub fn gray(c: Rgb) -> Rgb {
    let l = luminance(c[0], c[1], c[2]);
    [l, l, l]
}

pub fn sepia(c: Rgb) -> Rgb {
    let [r, g, b] = c;
    [
        0.393 * r + 0.769 * g + 0.189 * b,
        0.349 * r + 0.686 * g + 0.168 * b,
        0.272 * r + 0.534 * g + 0.131 * b,
    ]
}

/// `factor * (v - 128) + 128` per channel.
pub fn contrast(c: Rgb, factor: f32) -> Rgb {
    c.map(|v| factor * (v - 128.0) + 128.0)
}

/// Push channels away from (or toward) the pixel's luminance.
pub fn saturate(c: Rgb, amount: f32) -> Rgb {
    let l = luminance(c[0], c[1], c[2]);
    c.map(|v| l + (v - l) * amount)
}

pub fn scale(c: Rgb, r: f32, g: f32, b: f32) -> Rgb {
    [c[0] * r, c[1] * g, c[2] * b]
}

pub fn offset(c: Rgb, d: f32) -> Rgb {
    c.map(|v| v + d)
}

/// Compress the range into `lift..=255`.
pub fn lift(c: Rgb, lift: f32) -> Rgb {
    c.map(|v| lift + v * (255.0 - lift) / 255.0)
}

pub fn mix(a: Rgb, b: Rgb, t: f32) -> Rgb {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

fn clamp(c: Rgb) -> Rgb {
    c.map(|v| if v.is_nan() { 0.0 } else { v.clamp(0.0, 255.0) })
}

/// Apply `op` to every pixel of `surface`, unpremultiplying translucent pixels first.
///
/// Results are clamped to `0..=255`; alpha is preserved.
pub fn map_pixels(surface: &mut Surface, mut op: impl FnMut(Rgb, u32, u32) -> Rgb) {
    let width = surface.width();
    for (i, px) in surface.data_mut().chunks_exact_mut(4).enumerate() {
        let a = px[3];
        if a == 0 {
            continue;
        }
        let x = (i as u32) % width;
        let y = (i as u32) / width;
        let af = f32::from(a);
        let straight = if a == 255 {
            [f32::from(px[0]), f32::from(px[1]), f32::from(px[2])]
        } else {
            [
                f32::from(px[0]) * 255.0 / af,
                f32::from(px[1]) * 255.0 / af,
                f32::from(px[2]) * 255.0 / af,
            ]
        };
        let out = clamp(op(straight, x, y));
        for c in 0..3 {
            px[c] = if a == 255 {
                clamp_u8(out[c])
            } else {
                clamp_u8(out[c] * af / 255.0)
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_has_equal_channels() {
        let g = gray([200.0, 10.0, 50.0]);
        assert_eq!(g[0], g[1]);
        assert_eq!(g[1], g[2]);
    }

    #[test]
    fn contrast_pivots_on_128() {
        assert_eq!(contrast([128.0; 3], 3.0), [128.0; 3]);
        assert_eq!(contrast([138.0, 118.0, 128.0], 2.0), [148.0, 108.0, 128.0]);
    }

    #[test]
    fn saturate_zero_is_gray() {
        let c = saturate([200.0, 10.0, 50.0], 0.0);
        assert!((c[0] - c[1]).abs() < 1e-3 && (c[1] - c[2]).abs() < 1e-3);
    }

    #[test]
    fn map_pixels_clamps_and_keeps_alpha() {
        let mut s = Surface::filled(2, 1, Rgba8::rgba(100, 100, 100, 255)).unwrap();
        s.set_pixel(1, 0, [50, 50, 50, 128]);
        map_pixels(&mut s, |c, _, _| offset(c, 400.0));
        assert_eq!(s.pixel(0, 0), [255, 255, 255, 255]);
        assert_eq!(s.pixel(1, 0), [128, 128, 128, 128]);
    }

    #[test]
    fn overlay_alpha_zero_is_identity() {
        let o = ColorOverlay::new(255, 0, 0, 0.0, BlendMode::Overlay);
        assert_eq!(o.apply([10.0, 20.0, 30.0]), [10.0, 20.0, 30.0]);
    }
}
