use std::collections::BTreeSet;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::encode::artifact::{Container, VideoCodec};
use crate::foundation::error::{StripError, StripResult};

/// One rung of the codec cascade: the codec, the container it is muxed into and the ffmpeg
/// encoder that produces it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodecChoice {
    pub codec: VideoCodec,
    pub container: Container,
    pub encoder: &'static str,
}

/// Preference order: H.264/MP4, VP9/WebM, VP8/WebM, MPEG-4 Part 2/MP4.
pub const CODEC_CASCADE: [CodecChoice; 4] = [
    CodecChoice {
        codec: VideoCodec::H264,
        container: Container::Mp4,
        encoder: "libx264",
    },
    CodecChoice {
        codec: VideoCodec::Vp9,
        container: Container::Webm,
        encoder: "libvpx-vp9",
    },
    CodecChoice {
        codec: VideoCodec::Vp8,
        container: Container::Webm,
        encoder: "libvpx",
    },
    CodecChoice {
        codec: VideoCodec::Mpeg4,
        container: Container::Mp4,
        encoder: "mpeg4",
    },
];

impl CodecChoice {
    pub fn for_codec(codec: VideoCodec) -> Option<Self> {
        CODEC_CASCADE.iter().copied().find(|c| c.codec == codec)
    }

    /// Codec-specific output arguments (after `-c:v`).
    pub(crate) fn output_args(self) -> &'static [&'static str] {
        match self.codec {
            VideoCodec::H264 => &["-preset", "veryfast", "-crf", "20"],
            VideoCodec::Vp9 => &["-b:v", "0", "-crf", "32", "-deadline", "realtime"],
            VideoCodec::Vp8 => &["-b:v", "4M", "-deadline", "realtime"],
            VideoCodec::Mpeg4 => &["-q:v", "4"],
            VideoCodec::RawRgba => &[],
        }
    }
}

/// Video encoder names listed by `ffmpeg -encoders`.
///
/// Lines look like ` V....D libx264   libx264 H.264 / AVC ...`; only video (`V`) entries below
/// the `------` separator are collected.
pub fn parse_encoder_listing(listing: &str) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    let mut in_table = false;
    for line in listing.lines() {
        let trimmed = line.trim();
        if !in_table {
            in_table = trimmed.starts_with("------");
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let (Some(flags), Some(name)) = (parts.next(), parts.next()) else {
            continue;
        };
        if flags.len() == 6 && flags.starts_with('V') {
            out.insert(name.to_string());
        }
    }
    out
}

/// First entry of `preference` whose encoder is present in `available`.
pub fn select_codec(
    available: &BTreeSet<String>,
    preference: &[VideoCodec],
) -> StripResult<CodecChoice> {
    preference
        .iter()
        .filter_map(|&c| CodecChoice::for_codec(c))
        .find(|c| available.contains(c.encoder))
        .ok_or_else(|| {
            StripError::encoding_unavailable(format!(
                "none of the preferred codecs {preference:?} has an ffmpeg encoder"
            ))
        })
}

/// Ask `ffmpeg_bin` which video encoders it supports.
pub fn probe_encoders(ffmpeg_bin: &Path) -> StripResult<BTreeSet<String>> {
    let out = Command::new(ffmpeg_bin)
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            StripError::encoding_unavailable(format!(
                "failed to run '{}' (is ffmpeg installed?): {e}",
                ffmpeg_bin.display()
            ))
        })?;
    if !out.status.success() {
        return Err(StripError::encoding_unavailable(format!(
            "'{} -encoders' exited with {}",
            ffmpeg_bin.display(),
            out.status
        )));
    }
    let encoders = parse_encoder_listing(&String::from_utf8_lossy(&out.stdout));
    tracing::debug!(count = encoders.len(), "probed ffmpeg video encoders");
    Ok(encoders)
}

/// Probe ffmpeg and walk the cascade.
pub fn negotiate(ffmpeg_bin: &Path, preference: &[VideoCodec]) -> StripResult<CodecChoice> {
    let available = probe_encoders(ffmpeg_bin)?;
    let choice = select_codec(&available, preference)?;
    tracing::info!(codec = ?choice.codec, encoder = choice.encoder, "negotiated video codec");
    Ok(choice)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
Encoders:
 V..... = Video
 A..... = Audio
 ------
 V....D libvpx               libvpx VP8 (codec vp8)
 V....D mpeg4                MPEG-4 part 2
 A....D aac                  AAC (Advanced Audio Coding)
 V....D libvpx-vp9           libvpx VP9 (codec vp9)
";

    #[test]
    fn parser_keeps_video_encoders_only() {
        let set = parse_encoder_listing(LISTING);
        assert!(set.contains("libvpx"));
        assert!(set.contains("libvpx-vp9"));
        assert!(set.contains("mpeg4"));
        assert!(!set.contains("aac"));
        // Legend lines above the separator are not encoders.
        assert!(!set.contains("="));
    }

    #[test]
    fn cascade_skips_missing_h264() {
        let set = parse_encoder_listing(LISTING);
        let all: Vec<_> = CODEC_CASCADE.iter().map(|c| c.codec).collect();
        let choice = select_codec(&set, &all).unwrap();
        assert_eq!(choice.codec, VideoCodec::Vp9);
        assert_eq!(choice.container, Container::Webm);
    }

    #[test]
    fn empty_listing_is_encoding_unavailable() {
        let err = select_codec(&BTreeSet::new(), &[VideoCodec::H264]).unwrap_err();
        assert!(matches!(err, StripError::EncodingUnavailable(_)));
    }

    #[test]
    fn missing_binary_is_encoding_unavailable() {
        let err = probe_encoders(Path::new("/nonexistent/ffmpeg-binary")).unwrap_err();
        assert!(matches!(err, StripError::EncodingUnavailable(_)));
    }
}
