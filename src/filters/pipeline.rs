use std::sync::Arc;

use crate::filters::catalog::{FilterKind, FilterTransform};
use crate::filters::effects::{CpuEffectsEngine, EffectsEngine};
use crate::filters::pixel::map_pixels;
use crate::foundation::error::{StripError, StripResult};
use crate::render::surface::Surface;

/// Applies catalog filters to surfaces in place.
#[derive(Clone)]
pub struct FilterPipeline {
    engine: Arc<dyn EffectsEngine>,
}

impl std::fmt::Debug for FilterPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterPipeline").finish_non_exhaustive()
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new(Arc::new(CpuEffectsEngine))
    }
}

impl FilterPipeline {
    pub fn new(engine: Arc<dyn EffectsEngine>) -> Self {
        Self { engine }
    }

    /// Filter `surface` in place.
    ///
    /// An effects-engine failure is not fatal: the surface keeps its pre-effect pixels and the
    /// call still succeeds.
    pub async fn apply(&self, surface: &mut Surface, filter: FilterKind) -> StripResult<()> {
        match filter.transform() {
            FilterTransform::Identity => Ok(()),
            FilterTransform::Pixel { .. } => apply_pixel(surface, filter),
            FilterTransform::Effect(params) => {
                match self.engine.process(surface.clone(), params).await {
                    Ok(out) if out.canvas() == surface.canvas() => {
                        surface.data_mut().copy_from_slice(out.data());
                    }
                    Ok(out) => {
                        tracing::warn!(
                            filter = filter.id(),
                            got = ?out.canvas(),
                            "effects engine returned a surface of the wrong size; ignoring"
                        );
                    }
                    Err(err) => {
                        tracing::warn!(filter = filter.id(), %err, "effect skipped");
                    }
                }
                Ok(())
            }
        }
    }
}

/// Run a synchronous pixel filter. Effect filters are rejected with `EffectUnavailable`.
pub fn apply_pixel(surface: &mut Surface, filter: FilterKind) -> StripResult<()> {
    match filter.transform() {
        FilterTransform::Identity => Ok(()),
        FilterTransform::Pixel { op, overlay } => {
            match overlay {
                Some(o) => map_pixels(surface, |c, _, _| o.apply(op(c).map(|v| v.clamp(0.0, 255.0)))),
                None => map_pixels(surface, |c, _, _| op(c)),
            }
            Ok(())
        }
        FilterTransform::Effect(_) => Err(StripError::effect_unavailable(format!(
            "'{}' needs the effects engine",
            filter.id()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::effects::UnavailableEffects;
    use crate::foundation::core::Rgba8;

    fn gradient() -> Surface {
        let mut s = Surface::new(16, 1).unwrap();
        for x in 0..16 {
            let v = (x * 16) as u8;
            s.set_pixel(x, 0, [v, 255 - v, v / 2, 255]);
        }
        s
    }

    #[tokio::test]
    async fn grayscale_is_equal_channel_and_monotonic_in_luminance() {
        let mut s = Surface::new(8, 1).unwrap();
        // Increasing luminance along x.
        for x in 0..8u32 {
            let v = (x * 30) as u8;
            s.set_pixel(x, 0, [v, v / 2, 255 - v / 3, 255]);
        }
        FilterPipeline::default()
            .apply(&mut s, FilterKind::Grayscale)
            .await
            .unwrap();
        let mut prev = 0u8;
        for x in 0..8 {
            let [r, g, b, _] = s.pixel(x, 0);
            assert_eq!(r, g);
            assert_eq!(g, b);
            assert!(r >= prev);
            prev = r;
        }
    }

    #[tokio::test]
    async fn none_is_identity() {
        let mut s = gradient();
        let before = s.clone();
        FilterPipeline::default()
            .apply(&mut s, FilterKind::None)
            .await
            .unwrap();
        assert_eq!(s, before);
    }

    #[tokio::test]
    async fn every_filter_runs_and_keeps_alpha() {
        let pipeline = FilterPipeline::default();
        for kind in FilterKind::ALL {
            let mut s = gradient();
            pipeline.apply(&mut s, kind).await.unwrap();
            for x in 0..16 {
                assert_eq!(s.pixel(x, 0)[3], 255, "{kind} changed alpha");
            }
        }
    }

    #[tokio::test]
    async fn failed_effect_leaves_surface_unchanged() {
        let pipeline = FilterPipeline::new(Arc::new(UnavailableEffects));
        let mut s = gradient();
        let before = s.clone();
        pipeline.apply(&mut s, FilterKind::Pinhole).await.unwrap();
        assert_eq!(s, before);
    }

    #[tokio::test]
    async fn effects_change_pixels() {
        let mut s = Surface::filled(4, 4, Rgba8::rgb(120, 80, 40)).unwrap();
        let before = s.clone();
        FilterPipeline::default()
            .apply(&mut s, FilterKind::Nostalgia)
            .await
            .unwrap();
        assert_ne!(s, before);
    }

    #[test]
    fn pixel_entry_point_rejects_effects() {
        let mut s = gradient();
        assert!(matches!(
            apply_pixel(&mut s, FilterKind::Hazy),
            Err(StripError::EffectUnavailable(_))
        ));
        apply_pixel(&mut s, FilterKind::Sepia).unwrap();
    }
}
