use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use image::{ImageReader, RgbaImage, imageops};

use crate::foundation::error::{StripError, StripResult};

#[derive(Clone, Debug)]
enum FrameData {
    Raster(Arc<RgbaImage>),
    Encoded(Arc<[u8]>),
}

/// One still image with fixed dimensions, either already decoded or still encoded (PNG, JPEG...).
///
/// Frames are immutable; cloning shares the pixel or byte storage.
#[derive(Clone, Debug)]
pub struct Frame {
    data: FrameData,
    width: u32,
    height: u32,
    captured_at: Duration,
}

impl Frame {
    /// Wrap decoded pixels. `captured_at` is the offset from the start of the capture session.
    pub fn from_image(image: RgbaImage, captured_at: Duration) -> StripResult<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(StripError::load("frame has zero width or height"));
        }
        Ok(Self {
            data: FrameData::Raster(Arc::new(image)),
            width,
            height,
            captured_at,
        })
    }

    /// Wrap encoded image bytes. Only the header is read here; pixels decode lazily.
    pub fn from_encoded(bytes: impl Into<Arc<[u8]>>) -> StripResult<Self> {
        let bytes: Arc<[u8]> = bytes.into();
        let (width, height) = ImageReader::new(Cursor::new(&bytes[..]))
            .with_guessed_format()
            .context("sniff image format")
            .map_err(|e| StripError::load(format!("{e:#}")))?
            .into_dimensions()
            .map_err(|e| StripError::load(format!("read image header: {e}")))?;
        if width == 0 || height == 0 {
            return Err(StripError::load("image has zero width or height"));
        }
        Ok(Self {
            data: FrameData::Encoded(bytes),
            width,
            height,
            captured_at: Duration::ZERO,
        })
    }

    /// Read an uploaded image file.
    pub fn open(path: &Path) -> StripResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            StripError::load(format!("read image '{}': {e}", path.display()))
        })?;
        Self::from_encoded(bytes)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn captured_at(&self) -> Duration {
        self.captured_at
    }

    pub fn is_decoded(&self) -> bool {
        matches!(self.data, FrameData::Raster(_))
    }

    /// Decoded straight-alpha pixels.
    pub fn decode(&self) -> StripResult<Arc<RgbaImage>> {
        match &self.data {
            FrameData::Raster(img) => Ok(Arc::clone(img)),
            FrameData::Encoded(bytes) => {
                let img = image::load_from_memory(bytes)
                    .map_err(|e| StripError::load(format!("decode image: {e}")))?
                    .to_rgba8();
                if img.dimensions() != (self.width, self.height) {
                    return Err(StripError::load(
                        "decoded image dimensions differ from its header",
                    ));
                }
                Ok(Arc::new(img))
            }
        }
    }

    /// A decoded copy flipped horizontally (camera previews are mirrored).
    pub fn mirrored(&self) -> StripResult<Frame> {
        let img = self.decode()?;
        Ok(Self {
            data: FrameData::Raster(Arc::new(imageops::flip_horizontal(img.as_ref()))),
            width: self.width,
            height: self.height,
            captured_at: self.captured_at,
        })
    }
}

/// A live video feed sampled by a capture session.
///
/// `grab` returns `Ok(None)` while the feed has no frame ready (warming up) and
/// `Err(SourceUnavailable)` once the feed is gone.
pub trait FrameSource: Send + Sync + 'static {
    /// Acquire the device. Fails with `SourceUnavailable` when it cannot be opened.
    fn open(&self) -> StripResult<()> {
        Ok(())
    }

    /// Native resolution of the feed, when known.
    fn native_size(&self) -> Option<(u32, u32)>;

    /// The current frame in raw (unmirrored) orientation.
    fn grab(&self) -> StripResult<Option<RgbaImage>>;
}

/// A feed that replays a fixed list of images in a loop.
///
/// Drives capture sessions from recorded frames.
#[derive(Debug)]
pub struct LoopingSource {
    frames: Vec<Arc<RgbaImage>>,
    cursor: Mutex<usize>,
}

impl LoopingSource {
    pub fn new(frames: Vec<RgbaImage>) -> Self {
        Self {
            frames: frames.into_iter().map(Arc::new).collect(),
            cursor: Mutex::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for LoopingSource {
    fn native_size(&self) -> Option<(u32, u32)> {
        self.frames.first().map(|f| f.dimensions())
    }

    fn grab(&self) -> StripResult<Option<RgbaImage>> {
        if self.frames.is_empty() {
            return Ok(None);
        }
        let mut cursor = self
            .cursor
            .lock()
            .map_err(|_| StripError::source_unavailable("frame source lock poisoned"))?;
        let img = self.frames[*cursor % self.frames.len()].as_ref().clone();
        *cursor = cursor.wrapping_add(1);
        Ok(Some(img))
    }
}

/// Read every decodable image in `dir` (sorted by file name) as encoded frames.
///
/// `captured_at` is left at zero; callers that need timing assign it from their frame rate.
pub fn load_frame_dir(dir: &Path) -> StripResult<Vec<Frame>> {
    let rd = std::fs::read_dir(dir)
        .map_err(|e| StripError::load(format!("read frame dir '{}': {e}", dir.display())))?;
    let mut paths = rd
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|s| s.to_str())
                    .map(|ext| {
                        matches!(
                            ext.to_ascii_lowercase().as_str(),
                            "png" | "jpg" | "jpeg" | "webp" | "bmp"
                        )
                    })
                    .unwrap_or(false)
        })
        .collect::<Vec<_>>();
    paths.sort();
    paths.iter().map(|p| Frame::open(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, image::Rgba([1, 2, 3, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn encoded_frame_reads_header_and_decodes() {
        let f = Frame::from_encoded(png_bytes(3, 2)).unwrap();
        assert_eq!(f.dimensions(), (3, 2));
        assert!(!f.is_decoded());
        let img = f.decode().unwrap();
        assert_eq!(img.get_pixel(2, 1).0, [1, 2, 3, 255]);
    }

    #[test]
    fn garbage_bytes_are_a_load_failure() {
        let err = Frame::from_encoded(vec![0u8, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, StripError::LoadFailure(_)));
    }

    #[test]
    fn mirrored_flips_columns() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, image::Rgba([0, 0, 255, 255]));
        let f = Frame::from_image(img, Duration::from_millis(5)).unwrap();
        let m = f.mirrored().unwrap().decode().unwrap();
        assert_eq!(m.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!(f.mirrored().unwrap().captured_at(), Duration::from_millis(5));
    }

    #[test]
    fn looping_source_cycles() {
        let a = RgbaImage::from_pixel(1, 1, image::Rgba([1, 0, 0, 255]));
        let b = RgbaImage::from_pixel(1, 1, image::Rgba([2, 0, 0, 255]));
        let src = LoopingSource::new(vec![a, b]);
        let seq: Vec<u8> = (0..3)
            .map(|_| src.grab().unwrap().unwrap().get_pixel(0, 0).0[0])
            .collect();
        assert_eq!(seq, vec![1, 2, 1]);
        assert!(LoopingSource::new(vec![]).grab().unwrap().is_none());
    }

    #[test]
    fn frame_dir_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.png"), png_bytes(2, 2)).unwrap();
        std::fs::write(dir.path().join("a.png"), png_bytes(4, 2)).unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"skip").unwrap();
        let frames = load_frame_dir(dir.path()).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].dimensions(), (4, 2));
    }
}
