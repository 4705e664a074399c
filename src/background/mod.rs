//! Procedural strip backgrounds.
//!
//! Every style fills the whole surface opaquely. Randomized styles draw from the injected
//! [`Rng`]; pass a seeded generator (see [`rng_for`]) for reproducible output.

mod film;
mod noise;
mod paper;
mod pattern;
mod wood;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::foundation::error::StripResult;
use crate::render::surface::Surface;

pub use film::draw_film_strip_overlay;

/// The closed background catalog.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum BackgroundStyle {
    #[default]
    Classic,
    Gradient,
    Blush,
    Midnight,
    PolkaDot,
    Grid,
    PaperGrain,
    Kraft,
    Chalkboard,
    TornPaper,
    Taped,
    CoffeeStain,
    WoodGrain,
    Worn,
    Confetti,
    FilmStrip,
}

struct StyleEntry {
    id: &'static str,
    label: &'static str,
    dark: bool,
    randomized: bool,
}

const fn style(id: &'static str, label: &'static str, dark: bool, randomized: bool) -> StyleEntry {
    StyleEntry {
        id,
        label,
        dark,
        randomized,
    }
}

// Indexed by `BackgroundStyle as usize`.
static STYLES: [StyleEntry; 16] = [
    style("classic", "Classic", false, false),
    style("gradient", "Gradient", false, false),
    style("blush", "Blush", false, false),
    style("midnight", "Midnight", true, false),
    style("polka-dot", "Polka Dot", false, false),
    style("grid", "Grid", false, false),
    style("paper-grain", "Paper Grain", false, true),
    style("kraft", "Kraft", false, true),
    style("chalkboard", "Chalkboard", true, true),
    style("torn-paper", "Torn Paper", false, true),
    style("taped", "Taped", false, true),
    style("coffee-stain", "Coffee Stain", false, true),
    style("wood-grain", "Wood Grain", true, true),
    style("worn", "Worn", false, true),
    style("confetti", "Confetti", false, true),
    style("film-strip", "Film Strip", true, true),
];

impl BackgroundStyle {
    pub const ALL: [BackgroundStyle; 16] = [
        Self::Classic,
        Self::Gradient,
        Self::Blush,
        Self::Midnight,
        Self::PolkaDot,
        Self::Grid,
        Self::PaperGrain,
        Self::Kraft,
        Self::Chalkboard,
        Self::TornPaper,
        Self::Taped,
        Self::CoffeeStain,
        Self::WoodGrain,
        Self::Worn,
        Self::Confetti,
        Self::FilmStrip,
    ];

    fn entry(self) -> &'static StyleEntry {
        &STYLES[self as usize]
    }

    pub fn id(self) -> &'static str {
        self.entry().id
    }

    pub fn label(self) -> &'static str {
        self.entry().label
    }

    /// Dark backgrounds get light branding text.
    pub fn is_dark(self) -> bool {
        self.entry().dark
    }

    /// Whether the output depends on the random generator.
    pub fn is_randomized(self) -> bool {
        self.entry().randomized
    }

    /// Film strip adds a frame after the photos are placed.
    pub fn has_overlay(self) -> bool {
        self == Self::FilmStrip
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }
}

impl std::fmt::Display for BackgroundStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Seeded generator when `seed` is given, entropy-seeded otherwise.
pub fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Fill `surface` with `style`.
pub fn draw(surface: &mut Surface, style: BackgroundStyle, rng: &mut impl Rng) -> StripResult<()> {
    use BackgroundStyle as B;
    tracing::debug!(style = style.id(), w = surface.width(), h = surface.height(), "background");
    match style {
        B::Classic => pattern::classic(surface),
        B::Gradient => pattern::gradient(surface),
        B::Blush => pattern::blush(surface),
        B::Midnight => pattern::midnight(surface),
        B::PolkaDot => pattern::polka_dot(surface)?,
        B::Grid => pattern::grid(surface),
        B::PaperGrain => paper::paper_grain(surface, rng)?,
        B::Kraft => paper::kraft(surface, rng)?,
        B::Chalkboard => paper::chalkboard(surface, rng)?,
        B::TornPaper => paper::torn_paper(surface, rng)?,
        B::Taped => paper::taped(surface, rng)?,
        B::CoffeeStain => paper::coffee_stain(surface, rng)?,
        B::WoodGrain => wood::wood_grain(surface, rng)?,
        B::Worn => paper::worn(surface, rng)?,
        B::Confetti => paper::confetti(surface, rng)?,
        B::FilmStrip => film::film_base(surface, rng)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_enum_order() {
        for (i, s) in BackgroundStyle::ALL.into_iter().enumerate() {
            assert_eq!(s as usize, i);
            assert_eq!(BackgroundStyle::from_id(s.id()), Some(s));
            let json = serde_json::to_string(&s).unwrap();
            assert_eq!(json, format!("\"{}\"", s.id()));
        }
    }

    #[test]
    fn dark_allow_list() {
        let dark: Vec<_> = BackgroundStyle::ALL
            .into_iter()
            .filter(|s| s.is_dark())
            .map(BackgroundStyle::id)
            .collect();
        assert_eq!(dark, ["midnight", "chalkboard", "wood-grain", "film-strip"]);
    }

    #[test]
    fn deterministic_styles_ignore_the_generator() {
        for style in BackgroundStyle::ALL.into_iter().filter(|s| !s.is_randomized()) {
            let mut a = Surface::new(90, 70).unwrap();
            let mut b = Surface::new(90, 70).unwrap();
            draw(&mut a, style, &mut rng_for(Some(1))).unwrap();
            draw(&mut b, style, &mut rng_for(Some(2))).unwrap();
            assert_eq!(a, b, "{style}");
        }
    }

    #[test]
    fn every_style_is_opaque() {
        let mut rng = rng_for(Some(42));
        for style in BackgroundStyle::ALL {
            let mut s = Surface::new(120, 90).unwrap();
            draw(&mut s, style, &mut rng).unwrap();
            assert!(s.data().chunks_exact(4).all(|p| p[3] == 255), "{style}");
        }
    }

    #[test]
    fn seeded_randomized_styles_reproduce() {
        let mut a = Surface::new(80, 80).unwrap();
        let mut b = Surface::new(80, 80).unwrap();
        draw(&mut a, BackgroundStyle::Confetti, &mut rng_for(Some(7))).unwrap();
        draw(&mut b, BackgroundStyle::Confetti, &mut rng_for(Some(7))).unwrap();
        assert_eq!(a, b);
    }
}
