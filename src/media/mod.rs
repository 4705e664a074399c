//! Still frames, live feeds and clip playback.

pub mod frame;
pub mod source;

pub use frame::{Frame, FrameSource, LoopingSource, load_frame_dir};
pub use source::{PlaybackState, VideoSource};
