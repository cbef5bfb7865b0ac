use std::collections::VecDeque;

use anyhow::Result;
use image::RgbImage;

use crate::detect::{DetectionResult, Region};

/// A pattern-matching capability.
///
/// Given an image and a minimum search window, return candidate regions for
/// the pattern the detector was trained on. Smaller windows widen the range
/// of vision at a processing cost. A miss returns an empty list; detection
/// failure is a valid outcome, never an error.
///
/// Implementations must be deterministic for identical pixels and must not
/// mutate the input image.
pub trait RegionDetector: Send {
    /// Detector identifier, used in logs.
    fn name(&self) -> &'static str;

    /// Scan `image` for the pattern, ignoring matches smaller than
    /// `min_window` (width, height).
    fn detect(&mut self, image: &RgbImage, min_window: (u32, u32)) -> Result<DetectionResult>;
}

/// Scripted detector for tests and stub deployments.
///
/// Replays a queue of canned responses, one per `detect` call, filtering
/// each response by the requested minimum window. Once the script runs out
/// every call is a miss.
pub struct ScriptedDetector {
    script: VecDeque<Vec<Region>>,
    calls: u64,
}

impl ScriptedDetector {
    pub fn new(script: Vec<Vec<Region>>) -> Self {
        Self {
            script: script.into(),
            calls: 0,
        }
    }

    /// Detector that never matches anything.
    pub fn silent() -> Self {
        Self::new(Vec::new())
    }

    /// Number of `detect` calls observed so far.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl RegionDetector for ScriptedDetector {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect(&mut self, _image: &RgbImage, min_window: (u32, u32)) -> Result<DetectionResult> {
        self.calls += 1;
        let regions = self.script.pop_front().unwrap_or_default();
        Ok(DetectionResult::from_regions(
            regions
                .into_iter()
                .filter(|r| r.width() >= min_window.0 && r.height() >= min_window.1)
                .collect(),
        ))
    }
}
