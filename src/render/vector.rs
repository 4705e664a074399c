use kurbo::{PathEl, Shape, Stroke, StrokeOpts};

use crate::foundation::core::{Affine, BezPath, Point, Rect, Rgba8};
use crate::foundation::error::{StripError, StripResult};
use crate::render::surface::Surface;

const STROKE_TOLERANCE: f64 = 0.1;

/// An antialiased vector layer rasterized with `vello_cpu`.
///
/// Draw calls accumulate into one render context; [`VectorLayer::composite_onto`] rasterizes
/// them into a transparent pixmap and blends it over a [`Surface`].
pub struct VectorLayer {
    ctx: vello_cpu::RenderContext,
    width: u16,
    height: u16,
    empty: bool,
}

impl VectorLayer {
    pub fn new(width: u32, height: u32) -> StripResult<Self> {
        let w: u16 = width
            .try_into()
            .map_err(|_| StripError::rendering("vector layer width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| StripError::rendering("vector layer height exceeds u16"))?;
        if w == 0 || h == 0 {
            return Err(StripError::rendering("vector layer must be non-empty"));
        }
        Ok(Self {
            ctx: vello_cpu::RenderContext::new(w, h),
            width: w,
            height: h,
            empty: true,
        })
    }

    /// Layer matching the dimensions of `surface`.
    pub fn for_surface(surface: &Surface) -> StripResult<Self> {
        Self::new(surface.width(), surface.height())
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn set_transform(&mut self, transform: Affine) {
        self.ctx.set_transform(affine_to_cpu(transform));
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgba8) {
        self.set_color(color);
        self.ctx.fill_rect(&rect_to_cpu(rect));
        self.empty = false;
    }

    pub fn fill_path(&mut self, path: &BezPath, color: Rgba8) {
        self.set_color(color);
        self.ctx.fill_path(&bezpath_to_cpu(path));
        self.empty = false;
    }

    pub fn fill_shape(&mut self, shape: &impl Shape, color: Rgba8) {
        self.fill_path(&shape.to_path(STROKE_TOLERANCE), color);
    }

    /// Stroke `path` with a solid line of `width` pixels.
    pub fn stroke_path(&mut self, path: &BezPath, width: f64, color: Rgba8) {
        self.stroke_with(path, &Stroke::new(width), color);
    }

    /// Stroke `path` with a dash pattern (`on, off, ...` lengths in pixels).
    pub fn stroke_dashed(&mut self, path: &BezPath, width: f64, dashes: &[f64], color: Rgba8) {
        let style = Stroke::new(width).with_dashes(0.0, dashes.iter().copied());
        self.stroke_with(path, &style, color);
    }

    fn stroke_with(&mut self, path: &BezPath, style: &Stroke, color: Rgba8) {
        let outline = kurbo::stroke(
            path.iter(),
            style,
            &StrokeOpts::default(),
            STROKE_TOLERANCE,
        );
        self.fill_path(&outline, color);
    }

    fn set_color(&mut self, color: Rgba8) {
        self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color.r, color.g, color.b, color.a,
        ));
    }

    /// Rasterize the accumulated draw calls and blend them over `dst` at the origin.
    pub fn composite_onto(mut self, dst: &mut Surface) -> StripResult<()> {
        if self.empty {
            return Ok(());
        }
        if (u32::from(self.width), u32::from(self.height)) != (dst.width(), dst.height()) {
            return Err(StripError::rendering(
                "vector layer and destination surface differ in size",
            ));
        }
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);
        let layer = Surface::from_premul_bytes(
            dst.width(),
            dst.height(),
            pixmap.data_as_u8_slice().to_vec(),
        )?;
        dst.draw_over(&layer, 0, 0, 1.0);
        Ok(())
    }
}

/// Closed polyline through `points`.
pub fn polygon(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    let mut it = points.iter();
    if let Some(first) = it.next() {
        path.move_to(*first);
        for p in it {
            path.line_to(*p);
        }
        path.close_path();
    }
    path
}

/// Open polyline through `points`.
pub fn polyline(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    let mut it = points.iter();
    if let Some(first) = it.next() {
        path.move_to(*first);
        for p in it {
            path.line_to(*p);
        }
    }
    path
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_layer_leaves_surface_untouched() {
        let mut s = Surface::filled(8, 8, Rgba8::rgb(10, 20, 30)).unwrap();
        let before = s.clone();
        VectorLayer::for_surface(&s)
            .unwrap()
            .composite_onto(&mut s)
            .unwrap();
        assert_eq!(s, before);
    }

    #[test]
    fn fill_rect_covers_interior_pixels() {
        let mut s = Surface::filled(16, 16, Rgba8::rgb(0, 0, 0)).unwrap();
        let mut layer = VectorLayer::for_surface(&s).unwrap();
        layer.fill_rect(Rect::new(4.0, 4.0, 12.0, 12.0), Rgba8::rgb(255, 255, 255));
        layer.composite_onto(&mut s).unwrap();
        assert_eq!(s.pixel(8, 8), [255, 255, 255, 255]);
        assert_eq!(s.pixel(1, 1), [0, 0, 0, 255]);
    }

    #[test]
    fn polygon_closes_path() {
        let p = polygon(&[
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
        ]);
        assert!(matches!(p.elements().last(), Some(PathEl::ClosePath)));
        assert!(polyline(&[]).elements().is_empty());
    }

    #[test]
    fn layer_rejects_oversized_dimensions() {
        assert!(VectorLayer::new(70_000, 4).is_err());
        assert!(VectorLayer::new(0, 4).is_err());
    }
}
