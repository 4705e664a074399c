//! Live Photo capture: look-back buffering, shutter handling and clip building.

pub mod live_photo;
pub mod ring;
pub mod session;

pub use live_photo::LivePhoto;
pub use ring::FrameRingBuffer;
pub use session::{LivePhotoCapture, LivePhotoCaptureSession};
