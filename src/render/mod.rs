//! Raster primitives shared by the compositor, the filters and the background generators.

pub mod composite;
pub mod surface;
pub mod text;
pub mod vector;

pub use composite::{BlendMode, cover, over};
pub use surface::Surface;
pub use text::{TextAnchor, TextRenderer, TextRun};
pub use vector::VectorLayer;
