use image::RgbaImage;

use crate::foundation::core::{Canvas, Rect, Rgba8};
use crate::foundation::error::{StripError, StripResult};
use crate::render::composite::{over, over_in_place};

/// Largest edge accepted by the vector rasterizer (`vello_cpu` addresses pixmaps with `u16`).
pub const MAX_SURFACE_DIM: u32 = u16::MAX as u32;

/// A drawable RGBA8 raster.
///
/// Pixels are **premultiplied alpha**, tightly packed, row-major. Every composite surface is
/// fully opaque once the background has been drawn, so filters may treat `r, g, b` as
/// straight values on those surfaces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Surface {
    /// Allocate a transparent surface.
    pub fn new(width: u32, height: u32) -> StripResult<Self> {
        if width == 0 || height == 0 {
            return Err(StripError::rendering(format!(
                "cannot allocate a {width}x{height} surface"
            )));
        }
        if width > MAX_SURFACE_DIM || height > MAX_SURFACE_DIM {
            return Err(StripError::rendering(format!(
                "surface {width}x{height} exceeds {MAX_SURFACE_DIM}px"
            )));
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| StripError::rendering("surface size overflow"))?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; len],
        })
    }

    pub fn for_canvas(canvas: Canvas) -> StripResult<Self> {
        Self::new(canvas.width, canvas.height)
    }

    /// Allocate a surface filled with a solid color.
    pub fn filled(width: u32, height: u32, color: Rgba8) -> StripResult<Self> {
        let mut s = Self::new(width, height)?;
        s.fill(color);
        Ok(s)
    }

    /// Wrap premultiplied bytes.
    pub fn from_premul_bytes(width: u32, height: u32, data: Vec<u8>) -> StripResult<Self> {
        if data.len() != (width as usize) * (height as usize) * 4 {
            return Err(StripError::rendering(
                "surface bytes do not match width*height*4",
            ));
        }
        let mut s = Self::new(width, height)?;
        s.data = data;
        Ok(s)
    }

    /// Convert a straight-alpha image into a premultiplied surface.
    pub fn from_rgba_image(img: &RgbaImage) -> StripResult<Self> {
        let (w, h) = img.dimensions();
        let mut s = Self::new(w, h)?;
        for (d, px) in s.data.chunks_exact_mut(4).zip(img.as_raw().chunks_exact(4)) {
            d.copy_from_slice(&Rgba8::rgba(px[0], px[1], px[2], px[3]).premul());
        }
        Ok(s)
    }

    /// Unpremultiply into a straight-alpha image.
    pub fn to_rgba_image(&self) -> StripResult<RgbaImage> {
        let mut out = Vec::with_capacity(self.data.len());
        for px in self.data.chunks_exact(4) {
            let a = px[3];
            if a == 0 {
                out.extend_from_slice(&[0, 0, 0, 0]);
                continue;
            }
            if a == 255 {
                out.extend_from_slice(px);
                continue;
            }
            let un = |c: u8| -> u8 { ((u32::from(c) * 255 + u32::from(a) / 2) / u32::from(a)).min(255) as u8 };
            out.extend_from_slice(&[un(px[0]), un(px[1]), un(px[2]), a]);
        }
        RgbaImage::from_raw(self.width, self.height, out)
            .ok_or_else(|| StripError::rendering("surface to image conversion failed"))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn canvas(&self) -> Canvas {
        Canvas::new(self.width, self.height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn fill(&mut self, color: Rgba8) {
        let px = color.premul();
        for d in self.data.chunks_exact_mut(4) {
            d.copy_from_slice(&px);
        }
    }

    /// Premultiplied pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.index(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, px: [u8; 4]) {
        let i = self.index(x, y);
        self.data[i..i + 4].copy_from_slice(&px);
    }

    fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }

    /// Blend a solid color over the pixels covered by `rect` (pixel-aligned, clipped).
    pub fn fill_rect_over(&mut self, rect: Rect, color: Rgba8) {
        let Some((x0, y0, x1, y1)) = self.clip_rect(rect) else {
            return;
        };
        let src = color.premul();
        for y in y0..y1 {
            for x in x0..x1 {
                let i = self.index(x, y);
                let dst = [
                    self.data[i],
                    self.data[i + 1],
                    self.data[i + 2],
                    self.data[i + 3],
                ];
                self.data[i..i + 4].copy_from_slice(&over(dst, src, 1.0));
            }
        }
    }

    /// Composite `src` over this surface with its top-left corner at `(x, y)`.
    pub fn draw_over(&mut self, src: &Surface, x: i64, y: i64, opacity: f32) {
        self.for_each_overlap(src, x, y, |dst_row, src_row| {
            // Rows always have equal length here, so this cannot fail.
            let _ = over_in_place(dst_row, src_row, opacity);
        });
    }

    /// Copy out the pixels covered by `rect` into a new surface.
    pub fn crop(&self, rect: Rect) -> StripResult<Surface> {
        let (x0, y0, x1, y1) = self
            .clip_rect(rect)
            .ok_or_else(|| StripError::rendering("crop rectangle is outside the surface"))?;
        let mut out = Surface::new(x1 - x0, y1 - y0)?;
        let row_bytes = (out.width as usize) * 4;
        for row in 0..out.height {
            let si = self.index(x0, y0 + row);
            let di = (row as usize) * row_bytes;
            out.data[di..di + row_bytes].copy_from_slice(&self.data[si..si + row_bytes]);
        }
        Ok(out)
    }

    fn clip_rect(&self, rect: Rect) -> Option<(u32, u32, u32, u32)> {
        let x0 = rect.x0.round().max(0.0) as u32;
        let y0 = rect.y0.round().max(0.0) as u32;
        let x1 = (rect.x1.round().max(0.0) as u32).min(self.width);
        let y1 = (rect.y1.round().max(0.0) as u32).min(self.height);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0, y0, x1, y1))
    }

    fn for_each_overlap(
        &mut self,
        src: &Surface,
        x: i64,
        y: i64,
        mut f: impl FnMut(&mut [u8], &[u8]),
    ) {
        let dst_w = i64::from(self.width);
        let dst_h = i64::from(self.height);
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + i64::from(src.width)).min(dst_w);
        let y1 = (y + i64::from(src.height)).min(dst_h);
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        let span = ((x1 - x0) as usize) * 4;
        for dy in y0..y1 {
            let sy = (dy - y) as usize;
            let sx = (x0 - x) as usize;
            let si = (sy * (src.width as usize) + sx) * 4;
            let di = ((dy as usize) * (self.width as usize) + (x0 as usize)) * 4;
            f(&mut self.data[di..di + span], &src.data[si..si + span]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_empty_and_oversized() {
        assert!(Surface::new(0, 4).is_err());
        assert!(Surface::new(4, MAX_SURFACE_DIM + 1).is_err());
        assert!(matches!(
            Surface::new(0, 0),
            Err(StripError::RenderingUnavailable(_))
        ));
    }

    #[test]
    fn rgba_image_roundtrip_is_lossless_for_opaque_pixels() {
        let img = RgbaImage::from_raw(2, 1, vec![10, 20, 30, 255, 200, 100, 0, 255]).unwrap();
        let s = Surface::from_rgba_image(&img).unwrap();
        assert_eq!(s.to_rgba_image().unwrap(), img);
    }

    #[test]
    fn draw_over_clips_to_destination_and_keeps_holes_filled() {
        let mut dst = Surface::filled(4, 4, Rgba8::rgb(0, 0, 0)).unwrap();
        let mut src = Surface::filled(3, 3, Rgba8::rgb(255, 0, 0)).unwrap();
        src.set_pixel(1, 2, [0, 0, 0, 0]);
        dst.draw_over(&src, 2, -1, 1.0);
        assert_eq!(dst.pixel(2, 0), [255, 0, 0, 255]);
        assert_eq!(dst.pixel(2, 1), [255, 0, 0, 255]);
        assert_eq!(dst.pixel(3, 1), [0, 0, 0, 255]);
        assert_eq!(dst.pixel(1, 0), [0, 0, 0, 255]);
        assert_eq!(dst.pixel(3, 2), [0, 0, 0, 255]);
    }

    #[test]
    fn fill_rect_over_blends_translucent_color() {
        let mut s = Surface::filled(2, 2, Rgba8::rgb(0, 0, 0)).unwrap();
        s.fill_rect_over(Rect::new(0.0, 0.0, 1.0, 1.0), Rgba8::rgba(255, 255, 255, 128));
        assert_eq!(s.pixel(0, 0), [128, 128, 128, 255]);
        assert_eq!(s.pixel(1, 1), [0, 0, 0, 255]);
    }

    #[test]
    fn crop_copies_region() {
        let mut s = Surface::filled(4, 4, Rgba8::rgb(0, 0, 0)).unwrap();
        s.set_pixel(2, 1, [9, 8, 7, 255]);
        let c = s.crop(Rect::new(2.0, 1.0, 4.0, 3.0)).unwrap();
        assert_eq!((c.width(), c.height()), (2, 2));
        assert_eq!(c.pixel(0, 0), [9, 8, 7, 255]);
    }
}
