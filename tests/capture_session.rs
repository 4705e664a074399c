use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;

use photostrip::config::{BoothConfig, CaptureConfig, EncoderConfig};
use photostrip::encode::EncoderBackend;
use photostrip::{LivePhoto, LivePhotoCaptureSession, LoopingSource, Photobooth, StripError};

fn feed() -> Arc<LoopingSource> {
    let frames = (0..10u8)
        .map(|i| RgbaImage::from_pixel(8, 6, image::Rgba([i * 20, 0, 255 - i * 20, 255])))
        .collect();
    Arc::new(LoopingSource::new(frames))
}

#[tokio::test(start_paused = true)]
async fn capture_holds_look_back_and_after_frames() {
    let mut session = LivePhotoCaptureSession::new(feed(), &CaptureConfig::default()).unwrap();
    assert_eq!(session.ring_capacity(), 23);
    assert_eq!(session.after_frame_count(), 8);

    session.start().unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(session.buffered(), 23);

    let capture = session.capture_live_photo().await.unwrap();
    assert!(capture.before_count <= 23);
    assert_eq!(capture.after_count(), 8);
    assert!(capture.has_motion());
    assert!(
        capture
            .live_frames
            .windows(2)
            .all(|w| w[0].captured_at() <= w[1].captured_at())
    );
    assert_eq!(capture.still.dimensions(), (8, 6));

    session.stop();
    session.stop();
    assert!(!session.is_running());
    assert_eq!(session.buffered(), 0);
}

#[tokio::test(start_paused = true)]
async fn still_is_mirrored_from_the_newest_frame() {
    let mut session = LivePhotoCaptureSession::new(feed(), &CaptureConfig::default()).unwrap();
    session.start().unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    let capture = session.capture_live_photo().await.unwrap();
    let newest = capture.live_frames[capture.before_count - 1].decode().unwrap();
    let still = capture.still.decode().unwrap();
    assert_eq!(still.get_pixel(0, 0), newest.get_pixel(7, 0));
}

#[tokio::test]
async fn capture_needs_a_running_session() {
    let mut session = LivePhotoCaptureSession::new(feed(), &CaptureConfig::default()).unwrap();
    let err = session.capture_live_photo().await.unwrap_err();
    assert!(matches!(err, StripError::SourceUnavailable(_)), "{err}");
}

#[tokio::test(start_paused = true)]
async fn captured_frames_become_a_clip() {
    let mut session = LivePhotoCaptureSession::new(feed(), &CaptureConfig::default()).unwrap();
    session.start().unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    let capture = session.capture_live_photo().await.unwrap();
    let frames = capture.live_frames.len() as u64;
    session.stop();

    let cfg = EncoderConfig {
        backend: EncoderBackend::InMemory,
        ..Default::default()
    };
    let photo = LivePhoto::from_capture(capture, &cfg, session.native_size())
        .await
        .unwrap();
    let clip = photo.clip.unwrap();
    assert_eq!(clip.frame_count, frames);
    assert_eq!((clip.width, clip.height), (8, 6));
    assert!(clip.mirrored);
}

#[tokio::test(start_paused = true)]
async fn booth_fills_slots_in_order() {
    let mut cfg = BoothConfig::default();
    cfg.encoder.backend = EncoderBackend::InMemory;
    let mut booth = Photobooth::new(cfg).unwrap();
    booth.set_photo_count(2).unwrap();
    let mut session = LivePhotoCaptureSession::new(feed(), &booth.config().capture).unwrap();
    session.start().unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(booth.capture_from(&mut session).await.unwrap(), 0);
    assert_eq!(booth.capture_from(&mut session).await.unwrap(), 1);
    assert!(booth.slots().is_complete());
    assert!(booth.live_photo_clip(1).is_some());
    let err = booth.capture_from(&mut session).await.unwrap_err();
    assert!(matches!(err, StripError::Validation(_)), "{err}");
    session.stop();
}
