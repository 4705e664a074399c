//! Photobooth strips: live photo capture, filters, procedural backgrounds, still composites
//! and Live Strip video.
//!
//! The usual entry point is [`Photobooth`], which owns the slot board and the user's choices
//! and exports either a still [`Surface`] or a Live Strip [`VideoArtifact`].

#![forbid(unsafe_code)]

pub mod background;
pub mod booth;
pub mod capture;
pub mod config;
pub mod encode;
pub mod export;
pub mod filters;
pub mod foundation;
pub mod media;
pub mod render;
pub mod strip;

pub use background::BackgroundStyle;
pub use booth::Photobooth;
pub use capture::{LivePhoto, LivePhotoCapture, LivePhotoCaptureSession};
pub use config::{BoothConfig, JobSpec, Pacing};
pub use encode::{EncoderBackend, FrameVideoEncoder, VideoArtifact};
pub use filters::{FilterKind, FilterPipeline};
pub use foundation::core::{Canvas, Fps, Rgba8};
pub use foundation::error::{StripError, StripResult};
pub use media::{Frame, FrameSource, LoopingSource};
pub use render::Surface;
pub use strip::{Layout, LayoutKind, PhotostripCompositor, StripRequest};
