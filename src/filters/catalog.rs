use serde::{Deserialize, Serialize};

use crate::filters::effects::{EffectParams, Tint};
use crate::filters::pixel::{
    ColorOverlay, Rgb, contrast, gray, lift, mix, offset, saturate, scale, sepia,
};
use crate::foundation::math::luminance;
use crate::render::composite::BlendMode::{Overlay, Screen, SoftLight};

/// The closed filter catalog.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum FilterKind {
    #[default]
    None,
    Grayscale,
    Sepia,
    Vintage,
    Warm,
    Cool,
    HighContrast,
    Faded,
    Noir,
    Vivid,
    Retro,
    Dreamy,
    Polaroid,
    Kodachrome,
    Lomo,
    Cinematic,
    Pastel,
    GoldenHour,
    Moody,
    Cyberpunk,
    Blush,
    Clarity,
    Nostalgia,
    Sunrise,
    Pinhole,
    Hazy,
}

/// How a filter changes pixels.
#[derive(Clone, Copy, Debug)]
pub enum FilterTransform {
    Identity,
    /// Synchronous per-pixel math, then an optional translucent overlay.
    Pixel {
        op: fn(Rgb) -> Rgb,
        overlay: Option<ColorOverlay>,
    },
    /// Delegated to an [`EffectsEngine`](crate::filters::effects::EffectsEngine).
    Effect(EffectParams),
}

/// One catalog row.
#[derive(Clone, Copy, Debug)]
pub struct FilterEntry {
    pub kind: FilterKind,
    pub id: &'static str,
    pub label: &'static str,
    pub transform: FilterTransform,
}

const fn px(op: fn(Rgb) -> Rgb) -> FilterTransform {
    FilterTransform::Pixel { op, overlay: None }
}

const fn px_over(op: fn(Rgb) -> Rgb, overlay: ColorOverlay) -> FilterTransform {
    FilterTransform::Pixel {
        op,
        overlay: Some(overlay),
    }
}

const fn entry(
    kind: FilterKind,
    id: &'static str,
    label: &'static str,
    transform: FilterTransform,
) -> FilterEntry {
    FilterEntry {
        kind,
        id,
        label,
        transform,
    }
}

use FilterKind as K;

/// Indexed by `FilterKind as usize`.
static CATALOG: [FilterEntry; 26] = [
    entry(K::None, "none", "Original", FilterTransform::Identity),
    entry(K::Grayscale, "grayscale", "Grayscale", px(gray)),
    entry(K::Sepia, "sepia", "Sepia", px(sepia)),
    entry(
        K::Vintage,
        "vintage",
        "Vintage",
        px_over(vintage, ColorOverlay::new(255, 200, 150, 0.12, SoftLight)),
    ),
    entry(
        K::Warm,
        "warm",
        "Warm",
        px_over(warm, ColorOverlay::new(255, 160, 60, 0.08, Overlay)),
    ),
    entry(
        K::Cool,
        "cool",
        "Cool",
        px_over(cool, ColorOverlay::new(60, 140, 255, 0.08, Overlay)),
    ),
    entry(K::HighContrast, "high-contrast", "High Contrast", px(high_contrast)),
    entry(K::Faded, "faded", "Faded", px(faded)),
    entry(K::Noir, "noir", "Noir", px(noir)),
    entry(K::Vivid, "vivid", "Vivid", px(vivid)),
    entry(
        K::Retro,
        "retro",
        "Retro",
        px_over(retro, ColorOverlay::new(255, 180, 100, 0.15, Overlay)),
    ),
    entry(
        K::Dreamy,
        "dreamy",
        "Dreamy",
        px_over(dreamy, ColorOverlay::new(255, 220, 240, 0.2, Screen)),
    ),
    entry(
        K::Polaroid,
        "polaroid",
        "Polaroid",
        px_over(polaroid, ColorOverlay::new(255, 250, 230, 0.1, SoftLight)),
    ),
    entry(
        K::Kodachrome,
        "kodachrome",
        "Kodachrome",
        px_over(kodachrome, ColorOverlay::new(255, 120, 40, 0.06, Overlay)),
    ),
    entry(K::Lomo, "lomo", "Lomo", px(lomo)),
    entry(
        K::Cinematic,
        "cinematic",
        "Cinematic",
        px_over(cinematic, ColorOverlay::new(0, 80, 120, 0.12, SoftLight)),
    ),
    entry(K::Pastel, "pastel", "Pastel", px(pastel)),
    entry(
        K::GoldenHour,
        "golden-hour",
        "Golden Hour",
        px_over(golden_hour, ColorOverlay::new(255, 180, 60, 0.18, SoftLight)),
    ),
    entry(
        K::Moody,
        "moody",
        "Moody",
        px_over(moody, ColorOverlay::new(30, 40, 80, 0.15, Overlay)),
    ),
    entry(
        K::Cyberpunk,
        "cyberpunk",
        "Cyberpunk",
        px_over(cyberpunk, ColorOverlay::new(255, 0, 200, 0.12, Screen)),
    ),
    entry(
        K::Blush,
        "blush",
        "Blush",
        px_over(blush, ColorOverlay::new(255, 182, 193, 0.2, SoftLight)),
    ),
    entry(
        K::Clarity,
        "clarity",
        "Clarity",
        FilterTransform::Effect(EffectParams {
            brightness: 0,
            contrast: 20,
            saturation: 15,
            sepia: 0,
            grayscale: false,
            vignette: 0.25,
            tint: None,
        }),
    ),
    entry(
        K::Nostalgia,
        "nostalgia",
        "Nostalgia",
        FilterTransform::Effect(EffectParams {
            brightness: 5,
            contrast: 5,
            saturation: 20,
            sepia: 100,
            grayscale: true,
            vignette: 0.35,
            tint: None,
        }),
    ),
    entry(
        K::Sunrise,
        "sunrise",
        "Sunrise",
        FilterTransform::Effect(EffectParams {
            brightness: 4,
            contrast: 0,
            saturation: -5,
            sepia: 60,
            grayscale: false,
            vignette: 0.3,
            tint: Some(Tint::new(232, 123, 34, 0.12)),
        }),
    ),
    entry(
        K::Pinhole,
        "pinhole",
        "Pinhole",
        FilterTransform::Effect(EffectParams {
            brightness: 10,
            contrast: 15,
            saturation: 0,
            sepia: 10,
            grayscale: true,
            vignette: 0.6,
            tint: None,
        }),
    ),
    entry(
        K::Hazy,
        "hazy",
        "Hazy",
        FilterTransform::Effect(EffectParams {
            brightness: 10,
            contrast: -10,
            saturation: -20,
            sepia: 0,
            grayscale: false,
            vignette: 0.0,
            tint: Some(Tint::new(200, 200, 215, 0.3)),
        }),
    ),
];

impl FilterKind {
    pub const ALL: [FilterKind; 26] = [
        K::None,
        K::Grayscale,
        K::Sepia,
        K::Vintage,
        K::Warm,
        K::Cool,
        K::HighContrast,
        K::Faded,
        K::Noir,
        K::Vivid,
        K::Retro,
        K::Dreamy,
        K::Polaroid,
        K::Kodachrome,
        K::Lomo,
        K::Cinematic,
        K::Pastel,
        K::GoldenHour,
        K::Moody,
        K::Cyberpunk,
        K::Blush,
        K::Clarity,
        K::Nostalgia,
        K::Sunrise,
        K::Pinhole,
        K::Hazy,
    ];

    pub fn entry(self) -> &'static FilterEntry {
        &CATALOG[self as usize]
    }

    pub fn id(self) -> &'static str {
        self.entry().id
    }

    pub fn label(self) -> &'static str {
        self.entry().label
    }

    pub fn transform(self) -> FilterTransform {
        self.entry().transform
    }

    /// Handled by the external effects engine rather than pixel math.
    pub fn is_effect(self) -> bool {
        matches!(self.transform(), FilterTransform::Effect(_))
    }

    pub fn from_id(id: &str) -> Option<Self> {
        CATALOG.iter().find(|e| e.id == id).map(|e| e.kind)
    }
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

fn vintage(c: Rgb) -> Rgb {
    contrast(mix(c, sepia(c), 0.5), 0.9)
}

fn warm(c: Rgb) -> Rgb {
    scale(c, 1.1, 1.0, 0.9)
}

fn cool(c: Rgb) -> Rgb {
    scale(c, 0.9, 1.0, 1.1)
}

fn high_contrast(c: Rgb) -> Rgb {
    contrast(c, 1.5)
}

fn faded(c: Rgb) -> Rgb {
    lift(saturate(contrast(c, 0.8), 0.8), 30.0)
}

fn noir(c: Rgb) -> Rgb {
    contrast(gray(c), 1.6)
}

fn vivid(c: Rgb) -> Rgb {
    contrast(saturate(c, 1.5), 1.1)
}

fn retro(c: Rgb) -> Rgb {
    offset(scale(c, 1.1, 1.0, 0.85), 10.0)
}

fn dreamy(c: Rgb) -> Rgb {
    offset(saturate(c, 0.85), 15.0)
}

fn polaroid(c: Rgb) -> Rgb {
    lift(scale(contrast(c, 1.1), 1.05, 1.0, 0.95), 10.0)
}

fn kodachrome(c: Rgb) -> Rgb {
    scale(contrast(saturate(c, 1.3), 1.15), 1.05, 1.0, 1.0)
}

fn lomo(c: Rgb) -> Rgb {
    saturate(contrast(c, 1.35), 1.2)
}

/// Teal shadows, orange highlights.
fn cinematic(c: Rgb) -> Rgb {
    let t = luminance(c[0], c[1], c[2]) / 255.0;
    let shadows = scale(c, 0.9, 1.0, 1.1);
    let highlights = scale(c, 1.1, 1.0, 0.9);
    contrast(mix(shadows, highlights, t), 1.1)
}

fn pastel(c: Rgb) -> Rgb {
    lift(saturate(c, 0.6), 50.0)
}

fn golden_hour(c: Rgb) -> Rgb {
    scale(c, 1.15, 1.05, 0.8)
}

fn moody(c: Rgb) -> Rgb {
    offset(contrast(saturate(c, 0.7), 1.2), -15.0)
}

fn cyberpunk(c: Rgb) -> Rgb {
    contrast(scale(c, 1.1, 0.85, 1.25), 1.2)
}

fn blush(c: Rgb) -> Rgb {
    scale(c, 1.08, 0.97, 1.0)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn table_rows_line_up_with_variants() {
        for kind in FilterKind::ALL {
            assert_eq!(kind.entry().kind, kind);
        }
    }

    #[test]
    fn catalog_has_26_unique_kebab_ids() {
        let ids: HashSet<_> = FilterKind::ALL.iter().map(|k| k.id()).collect();
        assert_eq!(ids.len(), 26);
        for id in ids {
            assert!(id.chars().all(|c| c.is_ascii_lowercase() || c == '-'));
            assert_eq!(FilterKind::from_id(id).map(|k| k.id()), Some(id));
        }
    }

    #[test]
    fn ids_match_serde_names() {
        for kind in FilterKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.id()));
        }
    }

    #[test]
    fn exactly_five_external_effects() {
        let effects: Vec<_> = FilterKind::ALL
            .iter()
            .filter(|k| k.is_effect())
            .map(|k| k.id())
            .collect();
        assert_eq!(
            effects,
            vec!["clarity", "nostalgia", "sunrise", "pinhole", "hazy"]
        );
    }

    #[test]
    fn noir_is_gray() {
        let FilterTransform::Pixel { op, overlay } = FilterKind::Noir.transform() else {
            panic!("noir should be a pixel filter");
        };
        assert!(overlay.is_none());
        let c = op([10.0, 120.0, 240.0]);
        assert_eq!(c[0], c[1]);
        assert_eq!(c[1], c[2]);
    }
}
