//! sentryd - subject-of-interest camera daemon
//!
//! This daemon:
//! 1. Polls frames from the configured camera source
//! 2. Runs the decision pipeline (cascade or motion) on each frame
//! 3. Throttles positive decisions through the frame-counted alert gate
//! 4. Persists gated captures to the date-partitioned archive
//! 5. Mirrors saved captures to the remote store via the upload queue

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use sentry_cam::upload::InMemoryRemoteStore;
use sentry_cam::{
    AlertEvent, AlertGate, AlertSink, DecisionPipeline, DetectionStore, DetectorMode, FpsCounter,
    FrameSource, SentrydConfig, SyntheticCamera, UploadQueue, UploadQueueConfig,
};

#[derive(Debug, Parser)]
#[command(name = "sentryd", version, about = "Subject-of-interest camera daemon")]
struct Args {
    /// Path to the JSON config file.
    #[arg(long, env = "SENTRY_CONFIG")]
    config: Option<PathBuf>,

    /// Detector mode override: cascade or motion.
    #[arg(long)]
    mode: Option<DetectorMode>,

    /// Upload worker count override.
    #[arg(long)]
    workers: Option<usize>,

    /// Keep captures local; do not start the upload queue.
    #[arg(long)]
    no_upload: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = SentrydConfig::load(args.config.as_deref())?;
    if let Some(mode) = args.mode {
        cfg.mode = mode;
    }
    if let Some(workers) = args.workers {
        cfg.upload.workers = workers;
    }

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            log::info!("shutdown requested");
            running.store(false, Ordering::SeqCst);
        })
        .context("installing signal handler")?;
    }

    let mut pipeline = build_pipeline(&cfg)?;
    let mut camera = SyntheticCamera::open(&cfg.camera.url, cfg.camera.width, cfg.camera.height)?;
    let files = DetectionStore::new(&cfg.save_root);

    let queue = if args.no_upload {
        None
    } else {
        // No remote service credentials are wired up in this build; the
        // in-memory store still exercises the full upload path.
        let remote = Arc::new(InMemoryRemoteStore::new());
        Some(UploadQueue::start(
            remote,
            files.clone(),
            UploadQueueConfig {
                workers: cfg.upload.workers,
                retry_backoff: cfg.upload.retry_backoff,
                ..UploadQueueConfig::default()
            },
        )?)
    };
    let sink = AlertSink::spawn(files.clone(), queue.as_ref().map(UploadQueue::handle))?;

    let mut gate = AlertGate::new(cfg.cooldown_frames);
    let mut fps = FpsCounter::new();
    let frame_interval = Duration::from_millis(1000 / u64::from(cfg.camera.target_fps));
    let mut last_health_log = Instant::now();
    let mut alert_count = 0u64;

    log::info!(
        "sentryd running: mode={} save_root={} cooldown={} frames",
        cfg.mode,
        cfg.save_root,
        cfg.cooldown_frames
    );

    let run_result = (|| -> Result<()> {
        while running.load(Ordering::SeqCst) {
            let frame = camera.next_frame().context("capturing frame")?;
            let timestamp = frame.captured_at;
            let decision = pipeline.process(frame)?;

            if gate.offer(decision.detected) {
                alert_count += 1;
                log::info!("alert #{} at frame {}", alert_count, gate.total_frames());
                sink.submit(AlertEvent {
                    frame: decision.frame,
                    timestamp,
                })?;
            }

            fps.tick();
            if last_health_log.elapsed() >= Duration::from_secs(5) {
                let stats = camera.stats();
                let backlog = queue
                    .as_ref()
                    .map(|q| q.handle().len())
                    .unwrap_or_default();
                log::info!(
                    "camera health={} frames={} fps={} alerts={} upload_backlog={}",
                    camera.is_healthy(),
                    stats.frames_captured,
                    fps.current_fps(),
                    alert_count,
                    backlog
                );
                last_health_log = Instant::now();
            }

            std::thread::sleep(frame_interval);
        }
        Ok(())
    })();

    // Ordered shutdown: drain pending saves before stopping the uploaders.
    sink.stop()?;
    if let Some(queue) = queue {
        queue.quit()?;
    }
    log::info!("sentryd stopped after {} frame(s)", gate.total_frames());
    run_result
}

fn build_pipeline(cfg: &SentrydConfig) -> Result<DecisionPipeline> {
    match cfg.mode {
        DetectorMode::Motion => Ok(DecisionPipeline::motion(
            cfg.motion.min_blob_area,
            cfg.motion.baseline_refresh_frames,
        )),
        DetectorMode::Cascade => Err(anyhow!(
            "cascade mode needs a trained pattern-matcher; this build ships none"
        )),
    }
}
