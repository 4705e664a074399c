use crate::encode::artifact::{Container, EncodedStream, VideoCodec};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{StripError, StripResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::surface::Surface;

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
}

/// Sink contract for consuming rendered frames in playback order.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> StripResult<()>;
    /// Push one premultiplied frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &Surface) -> StripResult<()>;
    /// Close the stream and hand back everything the encoder produced.
    fn end(&mut self) -> StripResult<EncodedStream>;
}

/// Sink that keeps opaque RGBA8 frames in memory, back to back.
///
/// Stands in for a real encoder in tests and previews; the resulting artifact can be played
/// back by slicing.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    data: Vec<u8>,
    frames: u64,
    last_idx: Option<FrameIndex>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg.clone()
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> StripResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(StripError::validation("sink width/height must be non-zero"));
        }
        self.cfg = Some(cfg);
        self.data.clear();
        self.frames = 0;
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &Surface) -> StripResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| StripError::encoding_failed("in-memory sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(StripError::encoding_failed(
                "sink received out-of-order frame index",
            ));
        }
        check_frame_size(cfg, frame)?;
        self.last_idx = Some(idx);

        let start = self.data.len();
        self.data.resize(start + frame.data().len(), 0);
        flatten_premul_over_bg(&mut self.data[start..], frame.data(), [0, 0, 0, 255])?;
        self.frames += 1;
        Ok(())
    }

    fn end(&mut self) -> StripResult<EncodedStream> {
        if self.cfg.take().is_none() {
            return Err(StripError::encoding_failed("in-memory sink not started"));
        }
        Ok(EncodedStream {
            data: std::mem::take(&mut self.data),
            codec: VideoCodec::RawRgba,
            container: Container::Raw,
        })
    }
}

pub(crate) fn check_frame_size(cfg: &SinkConfig, frame: &Surface) -> StripResult<()> {
    if frame.width() != cfg.width || frame.height() != cfg.height {
        return Err(StripError::validation(format!(
            "frame size mismatch: got {}x{}, expected {}x{}",
            frame.width(),
            frame.height(),
            cfg.width,
            cfg.height
        )));
    }
    Ok(())
}

/// Flatten premultiplied RGBA8 over an opaque background color.
pub(crate) fn flatten_premul_over_bg(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> StripResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(StripError::validation(
            "flatten_premul_over_bg expects equal-length rgba8 buffers",
        ));
    }

    let bg = [
        u16::from(bg_rgba[0]),
        u16::from(bg_rgba[1]),
        u16::from(bg_rgba[2]),
    ];
    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255u16 - a;
        for i in 0..3 {
            d[i] = (u16::from(s[i]) + mul_div255_u16(bg[i], inv)).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::Rgba8;

    fn cfg(w: u32, h: u32) -> SinkConfig {
        SinkConfig {
            width: w,
            height: h,
            fps: Fps::whole(10).unwrap(),
        }
    }

    #[test]
    fn flatten_alpha_0_returns_bg() {
        let mut dst = vec![0u8; 4];
        flatten_premul_over_bg(&mut dst, &[0, 0, 0, 0], [10, 20, 30, 255]).unwrap();
        assert_eq!(dst, vec![10, 20, 30, 255]);
    }

    #[test]
    fn in_memory_sink_concatenates_frames() {
        let mut sink = InMemorySink::new();
        sink.begin(cfg(2, 1)).unwrap();
        let a = Surface::filled(2, 1, Rgba8::rgb(1, 2, 3)).unwrap();
        let b = Surface::filled(2, 1, Rgba8::rgb(4, 5, 6)).unwrap();
        sink.push_frame(FrameIndex(0), &a).unwrap();
        sink.push_frame(FrameIndex(1), &b).unwrap();
        assert_eq!(sink.frame_count(), 2);
        let out = sink.end().unwrap();
        assert_eq!(out.codec, VideoCodec::RawRgba);
        assert_eq!(&out.data[..8], &[1, 2, 3, 255, 1, 2, 3, 255]);
        assert_eq!(out.data.len(), 16);
    }

    #[test]
    fn in_memory_sink_rejects_reordered_and_mismatched_frames() {
        let mut sink = InMemorySink::new();
        sink.begin(cfg(2, 2)).unwrap();
        let f = Surface::filled(2, 2, Rgba8::rgb(0, 0, 0)).unwrap();
        sink.push_frame(FrameIndex(3), &f).unwrap();
        assert!(sink.push_frame(FrameIndex(3), &f).is_err());
        let wrong = Surface::filled(4, 2, Rgba8::rgb(0, 0, 0)).unwrap();
        assert!(sink.push_frame(FrameIndex(4), &wrong).is_err());
    }

    #[test]
    fn end_without_begin_fails() {
        assert!(InMemorySink::new().end().is_err());
    }
}
