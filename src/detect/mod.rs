//! Detection stages and the pipeline that fuses them.

mod detector;
mod motion;
mod pipeline;
mod region;

pub use detector::{RegionDetector, ScriptedDetector};
pub use motion::MotionDetector;
pub use pipeline::{CascadeWindows, Decision, DecisionPipeline, DetectorMode};
pub use region::{DetectionResult, Region};
