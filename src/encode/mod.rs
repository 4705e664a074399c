//! Video encoding: frame sinks, the ffmpeg codec cascade and the frame-sequence encoder.

pub mod artifact;
pub mod codec;
pub mod encoder;
pub mod ffmpeg;
pub mod sink;

pub use artifact::{Container, EncodedStream, VideoArtifact, VideoCodec};
pub use codec::{CODEC_CASCADE, CodecChoice};
pub use encoder::{
    EncodeSettings, EncoderBackend, EncoderState, FrameVideoEncoder, encode_frames,
    encode_frames_blocking,
};
pub use ffmpeg::{FfmpegOptions, FfmpegSink, is_ffmpeg_on_path};
pub use sink::{FrameSink, InMemorySink, SinkConfig};
