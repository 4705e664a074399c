//! The filter catalog and the pipeline that applies it to surfaces.

pub mod catalog;
pub mod effects;
pub mod pipeline;
pub mod pixel;

pub use catalog::{FilterEntry, FilterKind, FilterTransform};
pub use effects::{CpuEffectsEngine, EffectParams, EffectsEngine, Tint, UnavailableEffects};
pub use pipeline::{FilterPipeline, apply_pixel};
