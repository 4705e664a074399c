use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::capture::ring::FrameRingBuffer;
use crate::config::CaptureConfig;
use crate::foundation::core::Fps;
use crate::foundation::error::{StripError, StripResult};
use crate::media::frame::{Frame, FrameSource};

/// Extra sampling intervals to wait for after-frames before giving up on a stalled feed.
const AFTER_GRACE_TICKS: u32 = 4;

/// Frames around one shutter press.
#[derive(Clone, Debug)]
pub struct LivePhotoCapture {
    /// Mirror-corrected still taken at the shutter.
    pub still: Frame,
    /// Raw-orientation frames: look-back buffer followed by the after run.
    pub live_frames: Vec<Frame>,
    /// How many of `live_frames` precede the shutter.
    pub before_count: usize,
    pub timestamp: DateTime<Local>,
}

impl LivePhotoCapture {
    pub fn after_count(&self) -> usize {
        self.live_frames.len() - self.before_count
    }

    pub fn has_motion(&self) -> bool {
        !self.live_frames.is_empty()
    }
}

struct Shared {
    ring: FrameRingBuffer,
    tx: broadcast::Sender<Frame>,
}

/// Samples a live feed into a look-back ring and assembles Live Photo captures on demand.
///
/// One session owns exactly one ring buffer; `stop` halts the sampler and drops the buffer.
pub struct LivePhotoCaptureSession {
    source: Arc<dyn FrameSource>,
    rate: Fps,
    look_back: Duration,
    after: Duration,
    mirror_still: bool,
    shared: Option<Arc<Mutex<Shared>>>,
    sampler: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for LivePhotoCaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LivePhotoCaptureSession")
            .field("rate", &self.rate)
            .field("look_back", &self.look_back)
            .field("after", &self.after)
            .field("running", &self.is_running())
            .finish()
    }
}

impl LivePhotoCaptureSession {
    pub fn new(source: Arc<dyn FrameSource>, cfg: &CaptureConfig) -> StripResult<Self> {
        cfg.validate()?;
        Ok(Self {
            source,
            rate: Fps::whole(cfg.rate)?,
            look_back: Duration::from_secs_f64(cfg.look_back_secs),
            after: Duration::from_secs_f64(cfg.after_secs),
            mirror_still: cfg.mirror_still,
            shared: None,
            sampler: None,
        })
    }

    pub fn rate(&self) -> Fps {
        self.rate
    }

    /// Ring capacity, `round(look_back * rate)`.
    pub fn ring_capacity(&self) -> usize {
        self.rate.secs_to_frames_round(self.look_back.as_secs_f64()) as usize
    }

    /// Frames sampled after the shutter, `round(after * rate)`.
    pub fn after_frame_count(&self) -> usize {
        self.rate.secs_to_frames_round(self.after.as_secs_f64()) as usize
    }

    pub fn native_size(&self) -> Option<(u32, u32)> {
        self.source.native_size().filter(|&(w, h)| w > 0 && h > 0)
    }

    pub fn is_running(&self) -> bool {
        self.sampler.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Frames currently buffered.
    pub fn buffered(&self) -> usize {
        self.shared
            .as_ref()
            .and_then(|s| s.lock().ok().map(|s| s.ring.len()))
            .unwrap_or(0)
    }

    /// Start sampling. Calling it on a running session does nothing.
    #[tracing::instrument(skip(self), fields(rate = self.rate.num))]
    pub fn start(&mut self) -> StripResult<()> {
        if self.sampler.is_some() {
            return Ok(());
        }
        self.source.open()?;

        let (tx, _) = broadcast::channel(self.after_frame_count().max(1) * 2 + 8);
        let shared = Arc::new(Mutex::new(Shared {
            ring: FrameRingBuffer::new(self.ring_capacity()),
            tx,
        }));
        let sampler = tokio::spawn(sample_loop(
            Arc::clone(&self.source),
            Arc::clone(&shared),
            self.rate,
        ));
        self.shared = Some(shared);
        self.sampler = Some(sampler);
        tracing::info!(capacity = self.ring_capacity(), "capture session started");
        Ok(())
    }

    /// Halt sampling and release the ring buffer. Idempotent.
    pub fn stop(&mut self) {
        if let Some(handle) = self.sampler.take() {
            handle.abort();
            tracing::info!("capture session stopped");
        }
        if let Some(shared) = self.shared.take()
            && let Ok(mut s) = shared.lock()
        {
            s.ring.clear();
        }
    }

    /// Freeze the look-back buffer and sample the after run.
    ///
    /// Suspends for roughly the after window. A feed that produced nothing yields a capture
    /// with no live frames; a feed with no frame at all for the still is `SourceUnavailable`.
    #[tracing::instrument(skip(self))]
    pub async fn capture_live_photo(&mut self) -> StripResult<LivePhotoCapture> {
        let shared = self
            .shared
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| StripError::source_unavailable("capture session is not running"))?;
        let timestamp = Local::now();

        let (before, mut rx) = {
            let s = shared
                .lock()
                .map_err(|_| StripError::source_unavailable("capture buffer lock poisoned"))?;
            (s.ring.snapshot(), s.tx.subscribe())
        };

        let still_raw = match before.last() {
            Some(f) => f.clone(),
            None => {
                let img = self.source.grab()?.ok_or_else(|| {
                    StripError::source_unavailable("camera produced no frame for the still")
                })?;
                Frame::from_image(img, Duration::ZERO)?
            }
        };
        let still = if self.mirror_still {
            still_raw.mirrored()?
        } else {
            still_raw
        };

        let wanted = self.after_frame_count();
        let deadline = Instant::now() + self.after + self.rate.frame_interval() * AFTER_GRACE_TICKS;
        let mut after = Vec::with_capacity(wanted);
        while after.len() < wanted && self.is_running() {
            match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(Ok(frame)) => after.push(frame),
                Ok(Err(broadcast::error::RecvError::Lagged(n))) => {
                    tracing::warn!(skipped = n, "after-frame receiver lagged");
                }
                Ok(Err(broadcast::error::RecvError::Closed)) => break,
                Err(_) => {
                    tracing::warn!(got = after.len(), wanted, "feed stalled during after window");
                    break;
                }
            }
        }

        let before_count = before.len();
        let mut live_frames = before;
        live_frames.extend(after);
        tracing::debug!(
            before = before_count,
            after = live_frames.len() - before_count,
            "live photo frames collected"
        );
        Ok(LivePhotoCapture {
            still,
            live_frames,
            before_count,
            timestamp,
        })
    }
}

impl Drop for LivePhotoCaptureSession {
    fn drop(&mut self) {
        if let Some(handle) = self.sampler.take() {
            handle.abort();
        }
    }
}

async fn sample_loop(source: Arc<dyn FrameSource>, shared: Arc<Mutex<Shared>>, rate: Fps) {
    let started = Instant::now();
    let mut ticker = tokio::time::interval(rate.frame_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let img = match source.grab() {
            Ok(Some(img)) => img,
            Ok(None) => continue,
            Err(err) => {
                tracing::warn!(%err, "camera feed lost; sampling halted");
                return;
            }
        };
        let frame = match Frame::from_image(img, started.elapsed()) {
            Ok(f) => f,
            Err(err) => {
                tracing::warn!(%err, "dropping malformed camera frame");
                continue;
            }
        };
        let Ok(mut s) = shared.lock() else {
            return;
        };
        s.ring.push(frame.clone());
        // No subscribers outside a capture; that is not an error.
        let _ = s.tx.send(frame);
    }
}
