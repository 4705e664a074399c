use futures::future::BoxFuture;

use crate::filters::pixel::{Rgb, map_pixels};
use crate::foundation::core::Rgba8;
use crate::foundation::error::{StripError, StripResult};
use crate::foundation::math::{luminance, smoothstep};
use crate::render::surface::Surface;

/// Screen-blended color wash.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tint {
    pub color: Rgba8,
    pub alpha: f32,
}

impl Tint {
    pub const fn new(r: u8, g: u8, b: u8, alpha: f32) -> Self {
        Self {
            color: Rgba8::rgb(r, g, b),
            alpha,
        }
    }
}

/// Parameters understood by a stylistic effects engine.
///
/// `brightness`, `contrast` and `saturation` are deltas in `-100..=100`; `sepia` is a strength
/// in `0..=100`; `vignette` darkens the corners by up to that fraction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectParams {
    pub brightness: i8,
    pub contrast: i8,
    pub saturation: i8,
    pub sepia: u8,
    pub grayscale: bool,
    pub vignette: f32,
    pub tint: Option<Tint>,
}

/// External stylistic effects, invoked asynchronously.
///
/// The engine receives a copy of the surface and returns the processed pixels; the caller
/// copies them back.
pub trait EffectsEngine: Send + Sync {
    fn process<'a>(
        &'a self,
        input: Surface,
        params: EffectParams,
    ) -> BoxFuture<'a, StripResult<Surface>>;
}

/// Effects computed on the CPU, off the async executor.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuEffectsEngine;

impl EffectsEngine for CpuEffectsEngine {
    fn process<'a>(
        &'a self,
        input: Surface,
        params: EffectParams,
    ) -> BoxFuture<'a, StripResult<Surface>> {
        Box::pin(async move {
            tokio::task::spawn_blocking(move || {
                let mut out = input;
                apply_effect(&mut out, &params);
                out
            })
            .await
            .map_err(|e| StripError::effect_unavailable(format!("effect task failed: {e}")))
        })
    }
}

/// Engine used when no effects backend is available; every call fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableEffects;

impl EffectsEngine for UnavailableEffects {
    fn process<'a>(
        &'a self,
        _input: Surface,
        _params: EffectParams,
    ) -> BoxFuture<'a, StripResult<Surface>> {
        Box::pin(async {
            Err(StripError::effect_unavailable(
                "no stylistic effects engine is loaded",
            ))
        })
    }
}

/// Synchronous effect math.
pub fn apply_effect(surface: &mut Surface, p: &EffectParams) {
    let cx = surface.width() as f32 / 2.0;
    let cy = surface.height() as f32 / 2.0;
    let corner = (cx * cx + cy * cy).sqrt().max(1.0);
    let contrast_factor = ((f32::from(p.contrast) + 100.0) / 100.0).powi(2);
    let brightness = 255.0 * f32::from(p.brightness) / 100.0;
    let saturation = -0.01 * f32::from(p.saturation);
    let sepia = f32::from(p.sepia.min(100)) / 100.0;

    map_pixels(surface, |c, x, y| {
        let mut c = c;
        if p.grayscale {
            let l = luminance(c[0], c[1], c[2]);
            c = [l, l, l];
        }
        if sepia > 0.0 {
            c = sepia_amount(c, sepia);
        }
        if p.brightness != 0 {
            c = c.map(|v| v + brightness);
        }
        if p.contrast != 0 {
            c = c.map(|v| ((v / 255.0 - 0.5) * contrast_factor + 0.5) * 255.0);
        }
        if p.saturation != 0 {
            let max = c[0].max(c[1]).max(c[2]);
            c = c.map(|v| if v == max { v } else { v + (max - v) * saturation });
        }
        if let Some(t) = p.tint {
            c = screen_tint(c, t);
        }
        if p.vignette > 0.0 {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let d = (dx * dx + dy * dy).sqrt() / corner;
            let k = 1.0 - p.vignette.clamp(0.0, 1.0) * smoothstep(0.35, 1.0, d);
            c = c.map(|v| v * k);
        }
        c
    });
}

fn sepia_amount(c: Rgb, a: f32) -> Rgb {
    let [r, g, b] = c;
    [
        r * (1.0 - 0.607 * a) + g * 0.769 * a + b * 0.189 * a,
        r * 0.349 * a + g * (1.0 - 0.314 * a) + b * 0.168 * a,
        r * 0.272 * a + g * 0.534 * a + b * (1.0 - 0.869 * a),
    ]
}

fn screen_tint(c: Rgb, t: Tint) -> Rgb {
    let s = [
        f32::from(t.color.r),
        f32::from(t.color.g),
        f32::from(t.color.b),
    ];
    let a = t.alpha.clamp(0.0, 1.0);
    [0, 1, 2].map(|i| {
        let screened = 255.0 - (255.0 - c[i]) * (255.0 - s[i]) / 255.0;
        c[i] + (screened - c[i]) * a
    })
}
