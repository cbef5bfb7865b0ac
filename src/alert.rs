//! Alert persistence worker.
//!
//! Saving a PNG is slow relative to the frame interval, so alerts are
//! handed to a dedicated thread over a channel and the capture loop moves
//! straight on to the next frame. The worker saves each capture and, when
//! an upload queue is attached, enqueues the mirror task only after the
//! local save succeeded.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local};
use log::{error, info};

use crate::frame::Frame;
use crate::storage::DetectionStore;
use crate::upload::{QueueHandle, UploadTask};

/// A gated detection ready to persist. The timestamp names the file and
/// the remote folder chain.
pub struct AlertEvent {
    pub frame: Frame,
    pub timestamp: DateTime<Local>,
}

/// Handle to the persistence worker thread.
pub struct AlertSink {
    tx: Option<mpsc::Sender<AlertEvent>>,
    worker: Option<JoinHandle<()>>,
}

impl AlertSink {
    /// Spawn the worker. `uploads` is optional; without it captures stay
    /// local only.
    pub fn spawn(files: DetectionStore, uploads: Option<QueueHandle>) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<AlertEvent>();
        let worker = thread::Builder::new()
            .name("alert-sink".to_string())
            .spawn(move || {
                for event in rx {
                    match files.save(&event.frame.image, &event.timestamp) {
                        Ok(path) => {
                            info!("alert captured to {}", path.display());
                            if let Some(queue) = &uploads {
                                queue.enqueue(UploadTask {
                                    timestamp: event.timestamp,
                                });
                            }
                        }
                        Err(err) => {
                            // A capture that cannot be saved is lost; the
                            // next alert gets a fresh chance.
                            error!("failed to save alert capture: {:#}", err);
                        }
                    }
                }
            })
            .context("spawning alert sink worker")?;

        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    /// Queue one alert for persistence. Fails only if the worker has died.
    pub fn submit(&self, event: AlertEvent) -> Result<()> {
        match &self.tx {
            Some(tx) => tx
                .send(event)
                .map_err(|_| anyhow!("alert sink worker is gone")),
            None => Err(anyhow!("alert sink already stopped")),
        }
    }

    /// Close the channel and wait for queued alerts to finish persisting.
    pub fn stop(mut self) -> Result<()> {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            worker
                .join()
                .map_err(|_| anyhow!("alert sink worker panicked"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    #[test]
    fn submitted_alerts_are_saved_before_stop_returns() -> Result<()> {
        let dir = tempdir()?;
        let files = DetectionStore::new(dir.path());
        let sink = AlertSink::spawn(files.clone(), None)?;

        let stamp = Local.with_ymd_and_hms(2026, 8, 24, 14, 3, 27).unwrap();
        sink.submit(AlertEvent {
            frame: Frame::new(RgbImage::from_pixel(8, 8, Rgb([1, 2, 3])), stamp),
            timestamp: stamp,
        })?;
        sink.stop()?;

        assert!(files.file_path_for(&stamp).is_file());
        Ok(())
    }

    #[test]
    fn stopping_an_idle_sink_succeeds() -> Result<()> {
        let dir = tempdir()?;
        let sink = AlertSink::spawn(DetectionStore::new(dir.path()), None)?;
        sink.stop()
    }

    #[test]
    fn submit_on_a_closed_sink_is_an_error() {
        let dead = AlertSink {
            tx: None,
            worker: None,
        };
        let stamp = Local::now();
        let result = dead.submit(AlertEvent {
            frame: Frame::new(RgbImage::new(1, 1), stamp),
            timestamp: stamp,
        });
        assert!(result.is_err());
    }
}
