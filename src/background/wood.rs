use std::f64::consts::TAU;

use rand::Rng;

use crate::background::noise::{add_noise, radial_tint, vertical_gradient};
use crate::foundation::core::{Point, Rgba8};
use crate::foundation::error::StripResult;
use crate::render::surface::Surface;
use crate::render::vector::{VectorLayer, polyline};

const WOOD_LIGHT: Rgba8 = Rgba8::rgb(150, 100, 62);
const WOOD_DARK: Rgba8 = Rgba8::rgb(118, 76, 44);
const KNOT: Rgba8 = Rgba8::rgb(62, 36, 18);

/// Horizontal planks: stacked sine-wave grain lines at a few frequencies plus dark knots.
pub(super) fn wood_grain(surface: &mut Surface, rng: &mut impl Rng) -> StripResult<()> {
    vertical_gradient(surface, WOOD_LIGHT, WOOD_DARK);
    let w = f64::from(surface.width());
    let h = f64::from(surface.height());

    let mut layer = VectorLayer::for_surface(surface)?;
    let mut y = rng.gen_range(0.0..6.0);
    while y < h + 10.0 {
        let amplitude = rng.gen_range(1.5..6.0);
        let freq = rng.gen_range(0.004..0.018);
        let phase = rng.gen_range(0.0..TAU);
        let ripple = rng.gen_range(0.5..1.8);
        let mut points = Vec::with_capacity((w / 6.0) as usize + 2);
        let mut x = -6.0;
        while x <= w + 6.0 {
            let dy = amplitude * (x * freq + phase).sin() + ripple * (x * freq * 5.3).sin();
            points.push(Point::new(x, y + dy));
            x += 6.0;
        }
        let color = if rng.gen_bool(0.7) {
            Rgba8::rgba(70, 42, 22, rng.gen_range(25..70))
        } else {
            Rgba8::rgba(200, 150, 100, rng.gen_range(20..45))
        };
        layer.stroke_path(&polyline(&points), rng.gen_range(0.6..2.2), color);
        y += rng.gen_range(3.0..9.0);
    }
    layer.composite_onto(surface)?;

    let knots = ((w * h) / 250_000.0).ceil().max(1.0) as usize;
    for _ in 0..knots {
        let cx = rng.gen_range(0.0..w) as f32;
        let cy = rng.gen_range(0.0..h) as f32;
        let r = rng.gen_range(10.0..26.0);
        radial_tint(surface, cx, cy, r * 2.2, WOOD_DARK, 0.5);
        radial_tint(surface, cx, cy, r, KNOT, 0.75);
    }
    add_noise(surface, 0.10, rng);
    Ok(())
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn wood_is_opaque_and_varied() {
        let mut s = Surface::new(200, 200).unwrap();
        wood_grain(&mut s, &mut StdRng::seed_from_u64(2)).unwrap();
        assert!(s.data().chunks_exact(4).all(|p| p[3] == 255));
        let first = s.pixel(0, 0);
        assert!((0..200).any(|y| s.pixel(100, y) != first));
    }

    #[test]
    fn same_seed_same_grain() {
        let mut a = Surface::new(64, 64).unwrap();
        let mut b = Surface::new(64, 64).unwrap();
        wood_grain(&mut a, &mut StdRng::seed_from_u64(8)).unwrap();
        wood_grain(&mut b, &mut StdRng::seed_from_u64(8)).unwrap();
        assert_eq!(a, b);
    }
}
