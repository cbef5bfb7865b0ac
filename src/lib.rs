//! sentry-cam: a subject-of-interest camera daemon.
//!
//! Frames flow one way through the system:
//!
//! ```text
//! camera -> decision pipeline -> alert gate -> alert sink -> upload queue -> remote store
//! ```
//!
//! The [`ingest`] module polls a [`ingest::FrameSource`] for frames. Each
//! frame runs through the [`detect::DecisionPipeline`], which fuses the
//! configured detectors (two-stage cascade or baseline motion difference)
//! into one boolean decision and annotates the frame in place. Positive
//! decisions pass through the frame-counted [`gate::AlertGate`] so a
//! detection storm cannot flood the archive; gated alerts are handed to the
//! [`alert::AlertSink`] worker, which writes the capture into the
//! date-partitioned [`storage::DetectionStore`] and enqueues a mirror task
//! on the [`upload::UploadQueue`]. Upload workers resolve the matching
//! date-folder chain on the [`upload::RemoteStore`] and retry failed
//! uploads indefinitely with a fixed backoff.
//!
//! Everything is synchronous threads and channels; there is no async
//! runtime.

pub mod alert;
pub mod config;
pub mod detect;
pub mod fps;
pub mod frame;
pub mod gate;
pub mod ingest;
pub mod storage;
pub mod upload;

pub use alert::{AlertEvent, AlertSink};
pub use config::SentrydConfig;
pub use detect::{Decision, DecisionPipeline, DetectorMode, Region, RegionDetector};
pub use fps::FpsCounter;
pub use frame::Frame;
pub use gate::AlertGate;
pub use ingest::{FrameSource, SyntheticCamera};
pub use storage::DetectionStore;
pub use upload::{RemoteStore, UploadQueue, UploadQueueConfig, UploadTask};
