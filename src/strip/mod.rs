//! Strip geometry, slot storage and the still and live compositors.

pub mod branding;
pub mod compositor;
pub mod layout;
pub mod live;
pub mod slots;

pub use branding::{BrandingText, MAX_CAPTION_CHARS, Palette};
pub use compositor::{PhotostripCompositor, StripRequest};
pub use layout::{Layout, LayoutKind, MAX_SLOTS};
pub use live::LiveStripSynthesizer;
pub use slots::{Slot, SlotBoard};
