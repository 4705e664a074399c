use image::{RgbaImage, imageops};

use crate::foundation::error::{StripError, StripResult};
use crate::foundation::math::mul_div255_u8;

pub type PremulRgba8 = [u8; 4];

/// Source-over for premultiplied pixels, with an extra layer opacity.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> StripResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(StripError::rendering(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Separable blend modes used by the tinted filters, on straight `0..=255` channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendMode {
    Overlay,
    SoftLight,
    Screen,
}

impl BlendMode {
    /// Blend one backdrop channel `b` with source channel `s`.
    pub fn blend(self, b: f32, s: f32) -> f32 {
        let cb = b / 255.0;
        let cs = s / 255.0;
        let r = match self {
            Self::Screen => cb + cs - cb * cs,
            Self::Overlay => {
                if cb <= 0.5 {
                    2.0 * cb * cs
                } else {
                    1.0 - 2.0 * (1.0 - cb) * (1.0 - cs)
                }
            }
            Self::SoftLight => {
                if cs <= 0.5 {
                    cb - (1.0 - 2.0 * cs) * cb * (1.0 - cb)
                } else {
                    let d = if cb <= 0.25 {
                        ((16.0 * cb - 12.0) * cb + 4.0) * cb
                    } else {
                        cb.sqrt()
                    };
                    cb + (2.0 * cs - 1.0) * (d - cb)
                }
            }
        };
        r * 255.0
    }

    /// Blend, then mix with the backdrop by `alpha` (the overlay's translucency).
    pub fn mix(self, b: f32, s: f32, alpha: f32) -> f32 {
        let blended = self.blend(b, s);
        b + (blended - b) * alpha.clamp(0.0, 1.0)
    }
}

/// Scale `img` to fill `width`x`height` completely, cropping the overflow symmetrically.
pub fn cover(img: &RgbaImage, width: u32, height: u32) -> StripResult<RgbaImage> {
    let (sw, sh) = img.dimensions();
    if sw == 0 || sh == 0 {
        return Err(StripError::load("cannot cover-scale an empty image"));
    }
    if width == 0 || height == 0 {
        return Err(StripError::rendering("cover target must be non-empty"));
    }
    if (sw, sh) == (width, height) {
        return Ok(img.clone());
    }

    let src_aspect = f64::from(sw) / f64::from(sh);
    let dst_aspect = f64::from(width) / f64::from(height);
    let (cw, ch) = if src_aspect > dst_aspect {
        let cw = (f64::from(sh) * dst_aspect).round().clamp(1.0, f64::from(sw)) as u32;
        (cw, sh)
    } else {
        let ch = (f64::from(sw) / dst_aspect).round().clamp(1.0, f64::from(sh)) as u32;
        (sw, ch)
    };
    let cx = (sw - cw) / 2;
    let cy = (sh - ch) / 2;

    let cropped = imageops::crop_imm(img, cx, cy, cw, ch).to_image();
    if (cw, ch) == (width, height) {
        return Ok(cropped);
    }
    Ok(imageops::resize(
        &cropped,
        width,
        height,
        imageops::FilterType::Triangle,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_opacity_0_is_noop() {
        let dst = [1, 2, 3, 4];
        let src = [200, 200, 200, 200];
        assert_eq!(over(dst, src, 0.0), dst);
    }

    #[test]
    fn over_src_opaque_replaces_dst() {
        let dst = [0, 0, 0, 255];
        let src = [255, 0, 0, 255];
        assert_eq!(over(dst, src, 1.0), src);
    }

    #[test]
    fn over_in_place_rejects_mismatched_buffers() {
        let mut dst = vec![0u8; 8];
        assert!(over_in_place(&mut dst, &[0u8; 4], 1.0).is_err());
    }

    #[test]
    fn screen_never_darkens() {
        for b in [0.0f32, 64.0, 128.0, 255.0] {
            for s in [0.0f32, 100.0, 255.0] {
                assert!(BlendMode::Screen.blend(b, s) + 1e-3 >= b);
            }
        }
    }

    #[test]
    fn blend_endpoints() {
        assert!((BlendMode::Overlay.blend(0.0, 200.0)).abs() < 1e-3);
        assert!((BlendMode::Overlay.blend(255.0, 10.0) - 255.0).abs() < 1e-3);
        assert!((BlendMode::SoftLight.blend(100.0, 127.5) - 100.0).abs() < 1e-3);
        assert!((BlendMode::Screen.mix(40.0, 255.0, 0.0) - 40.0).abs() < 1e-3);
    }

    #[test]
    fn cover_crops_wide_source_to_target_aspect() {
        let mut img = RgbaImage::new(8, 2);
        for x in 0..8 {
            for y in 0..2 {
                let v = if (2..6).contains(&x) { 255 } else { 0 };
                img.put_pixel(x, y, image::Rgba([v, v, v, 255]));
            }
        }
        // 4:2 center crop of an 8x2 source keeps only the white band.
        let out = cover(&img, 4, 2).unwrap();
        assert_eq!(out.dimensions(), (4, 2));
        assert!(out.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn cover_resizes_to_exact_target() {
        let img = RgbaImage::from_pixel(30, 20, image::Rgba([9, 9, 9, 255]));
        let out = cover(&img, 520, 390).unwrap();
        assert_eq!(out.dimensions(), (520, 390));
    }
}
