use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::Local;
use clap::{Parser, Subcommand};

use photostrip::background::BackgroundStyle;
use photostrip::capture::{LivePhoto, LivePhotoCapture};
use photostrip::config::{BoothConfig, JobSpec};
use photostrip::encode::{EncodeSettings, encode_frames};
use photostrip::export::{live_photo_filename, live_strip_filename, save_still, save_video};
use photostrip::filters::FilterKind;
use photostrip::media::{Frame, load_frame_dir};
use photostrip::strip::LayoutKind;
use photostrip::{Fps, Photobooth};

#[derive(Parser, Debug)]
#[command(name = "photostrip", version)]
struct Cli {
    /// Booth configuration JSON; defaults apply to anything missing.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a still photostrip PNG from a job file.
    Still(JobArgs),
    /// Encode a directory of frames as one Live Photo clip.
    LivePhoto(LivePhotoArgs),
    /// Render a Live Strip video from a job file (requires `ffmpeg` unless configured in-memory).
    LiveStrip(JobArgs),
    /// List filters, backgrounds and layouts.
    Catalog,
}

#[derive(Parser, Debug)]
struct JobArgs {
    /// Job JSON describing layout, filter, background, caption and slot photos.
    #[arg(long)]
    job: PathBuf,

    /// Output directory.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct LivePhotoArgs {
    /// Directory of frames, encoded in file-name order.
    #[arg(long)]
    frames: PathBuf,

    /// Output directory.
    #[arg(long)]
    out: PathBuf,

    /// Clip frame rate; defaults to the configured Live Photo rate.
    #[arg(long)]
    fps: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cfg = match &cli.config {
        Some(path) => BoothConfig::load(path)?,
        None => BoothConfig::default(),
    };

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start async runtime")?
        .block_on(async move {
            match cli.cmd {
                Command::Still(args) => cmd_still(cfg, args).await,
                Command::LivePhoto(args) => cmd_live_photo(cfg, args).await,
                Command::LiveStrip(args) => cmd_live_strip(cfg, args).await,
                Command::Catalog => {
                    cmd_catalog();
                    Ok(())
                }
            }
        })
}

fn booth_for_job(cfg: BoothConfig, job: &JobSpec) -> anyhow::Result<Photobooth> {
    let mut booth = Photobooth::new(cfg)?;
    booth.set_layout(job.layout)?;
    booth.set_photo_count(job.photo_count)?;
    booth.set_filter(job.filter);
    booth.set_background(job.background);
    booth.set_caption(job.caption.clone())?;
    Ok(booth)
}

async fn cmd_still(cfg: BoothConfig, args: JobArgs) -> anyhow::Result<()> {
    let job = JobSpec::load(&args.job)?;
    let mut booth = booth_for_job(cfg, &job)?;
    for (i, slot) in job.slots.iter().enumerate().take(booth.layout().slot_count()) {
        if let Some(photo) = &slot.photo {
            booth.place_upload(i, Frame::open(photo)?)?;
        }
    }
    let strip = booth.export_still().await?;
    let path = save_still(&strip, &args.out, Local::now())?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

async fn cmd_live_photo(cfg: BoothConfig, args: LivePhotoArgs) -> anyhow::Result<()> {
    let frames = load_frame_dir(&args.frames)?;
    let settings = EncodeSettings {
        fps: Fps::whole(args.fps.unwrap_or(cfg.encoder.live_photo_fps))?,
        target: cfg.encoder.target,
        mirror: cfg.encoder.mirror,
    };
    let clip = encode_frames(frames, settings, None, cfg.encoder.backend.clone()).await?;
    let name = live_photo_filename(Local::now(), 0, &clip);
    let path = save_video(&clip, &args.out, &name)?;
    eprintln!("wrote {} ({})", path.display(), clip.mime_type());
    Ok(())
}

async fn cmd_live_strip(cfg: BoothConfig, args: JobArgs) -> anyhow::Result<()> {
    let job = JobSpec::load(&args.job)?;
    let encoder_cfg = cfg.encoder.clone();
    let mut booth = booth_for_job(cfg, &job)?;
    for (i, slot) in job.slots.iter().enumerate().take(booth.layout().slot_count()) {
        let photo = match &slot.live_frames {
            Some(dir) => {
                let capture = capture_from_dir(dir, slot.photo.as_deref())?;
                LivePhoto::from_capture(capture, &encoder_cfg, None).await?
            }
            None => match &slot.photo {
                Some(p) => LivePhoto::still_only(Frame::open(p)?),
                None => continue,
            },
        };
        booth.place_live_photo(i, photo)?;
    }
    let video = booth.export_live_strip().await?;
    let name = live_strip_filename(Local::now(), &video);
    let path = save_video(&video, &args.out, &name)?;
    eprintln!("wrote {} ({})", path.display(), video.mime_type());
    Ok(())
}

/// Treat a frame directory as a capture whose shutter fell on the middle frame.
fn capture_from_dir(dir: &Path, still: Option<&Path>) -> anyhow::Result<LivePhotoCapture> {
    let live_frames = load_frame_dir(dir)?;
    let before_count = live_frames.len() / 2;
    let still = match still {
        Some(p) => Frame::open(p)?,
        None => live_frames
            .get(before_count)
            .cloned()
            .with_context(|| format!("no frames in '{}'", dir.display()))?,
    };
    Ok(LivePhotoCapture {
        still,
        live_frames,
        before_count,
        timestamp: Local::now(),
    })
}

fn cmd_catalog() {
    println!("filters:");
    for f in FilterKind::ALL {
        let marker = if f.is_effect() { " (effect)" } else { "" };
        println!("  {:<14} {}{marker}", f.id(), f.label());
    }
    println!("backgrounds:");
    for b in BackgroundStyle::ALL {
        let marker = if b.is_dark() { " (dark)" } else { "" };
        println!("  {:<14} {}{marker}", b.id(), b.label());
    }
    println!("layouts:");
    for l in LayoutKind::ALL {
        println!("  {:<14} {}", l.id(), l.label());
    }
}
