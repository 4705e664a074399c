//! File output: PNG stills, video artifacts and their timestamped names.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{DateTime, Local};

use crate::encode::artifact::VideoArtifact;
use crate::encode::ffmpeg::ensure_parent_dir;
use crate::foundation::error::StripResult;
use crate::render::surface::Surface;

const STAMP: &str = "%Y%m%d-%H%M%S";

/// `photostrip-YYYYMMDD-HHMMSS.png`
pub fn still_filename(at: DateTime<Local>) -> String {
    format!("photostrip-{}.png", at.format(STAMP))
}

/// `photostrip-live-YYYYMMDD-HHMMSS.<ext>`; the extension is always `mp4`.
pub fn live_strip_filename(at: DateTime<Local>, artifact: &VideoArtifact) -> String {
    format!(
        "photostrip-live-{}.{}",
        at.format(STAMP),
        artifact.download_extension()
    )
}

/// `live-photo-YYYYMMDD-HHMMSS-<slot>.<ext>` with a 1-based slot number.
pub fn live_photo_filename(at: DateTime<Local>, slot: usize, artifact: &VideoArtifact) -> String {
    format!(
        "live-photo-{}-{}.{}",
        at.format(STAMP),
        slot + 1,
        artifact.download_extension()
    )
}

/// PNG bytes of `surface` (straight alpha).
pub fn encode_png(surface: &Surface) -> StripResult<Vec<u8>> {
    let img = surface.to_rgba_image()?;
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(out)
}

/// Write `surface` as a PNG at `path`, creating parent directories.
pub fn save_png(surface: &Surface, path: &Path) -> StripResult<()> {
    ensure_parent_dir(path)?;
    let img = surface.to_rgba_image()?;
    image::save_buffer_with_format(
        path,
        img.as_raw(),
        img.width(),
        img.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

/// Save a still strip into `dir` under its timestamped name.
pub fn save_still(surface: &Surface, dir: &Path, at: DateTime<Local>) -> StripResult<PathBuf> {
    let path = dir.join(still_filename(at));
    save_png(surface, &path)?;
    tracing::info!(path = %path.display(), "saved still");
    Ok(path)
}

/// Save a video artifact into `dir` as `name`.
pub fn save_video(artifact: &VideoArtifact, dir: &Path, name: &str) -> StripResult<PathBuf> {
    let path = dir.join(name);
    artifact.save(&path)?;
    tracing::info!(path = %path.display(), bytes = artifact.len(), "saved video");
    Ok(path)
}
