//! Per-frame decision pipeline.
//!
//! Fuses the available detectors into a single boolean signal per frame.
//! The operating mode is fixed when the pipeline is built; switching modes
//! means building a new pipeline (and, for motion, capturing a fresh
//! baseline).

use std::str::FromStr;

use anyhow::{anyhow, Result};

use crate::detect::motion::MotionDetector;
use crate::detect::{Region, RegionDetector};
use crate::frame::{self, Frame, CONFIRM_COLOR, PRIMARY_COLOR};

/// Detector mode, selected once at configuration time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectorMode {
    /// Two-stage detection: a coarse proposal detector whose regions are
    /// re-scanned by a finer confirmatory detector.
    Cascade,
    /// Pixel-difference detection against a fixed baseline image.
    Motion,
}

impl FromStr for DetectorMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cascade" => Ok(DetectorMode::Cascade),
            "motion" => Ok(DetectorMode::Motion),
            other => Err(anyhow!(
                "unknown detector mode '{}'; expected 'cascade' or 'motion'",
                other
            )),
        }
    }
}

impl std::fmt::Display for DetectorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectorMode::Cascade => f.write_str("cascade"),
            DetectorMode::Motion => f.write_str("motion"),
        }
    }
}

/// Minimum search windows for the two cascade stages.
#[derive(Clone, Copy, Debug)]
pub struct CascadeWindows {
    /// Tuned for the primary target class ("upper body"-scale objects).
    pub primary: (u32, u32),
    /// Smaller window for the confirmatory stage ("face"-scale objects).
    pub secondary: (u32, u32),
}

impl Default for CascadeWindows {
    fn default() -> Self {
        Self {
            primary: (60, 60),
            secondary: (25, 25),
        }
    }
}

/// Outcome of processing one frame: the annotated frame plus the fused
/// boolean decision.
pub struct Decision {
    pub frame: Frame,
    pub detected: bool,
}

enum Stage {
    Cascade {
        primary: Box<dyn RegionDetector>,
        secondary: Box<dyn RegionDetector>,
        windows: CascadeWindows,
    },
    Motion(MotionDetector),
}

/// Composes the configured detectors into a single per-frame decision.
pub struct DecisionPipeline {
    stage: Stage,
}

impl DecisionPipeline {
    /// Cascade mode: the primary stage is a high-recall proposal generator
    /// and the secondary stage suppresses its false positives.
    pub fn cascade(
        primary: Box<dyn RegionDetector>,
        secondary: Box<dyn RegionDetector>,
        windows: CascadeWindows,
    ) -> Self {
        Self {
            stage: Stage::Cascade {
                primary,
                secondary,
                windows,
            },
        }
    }

    /// Motion mode: baseline difference, no trained model required.
    pub fn motion(min_blob_area: u64, baseline_refresh_frames: Option<u32>) -> Self {
        Self {
            stage: Stage::Motion(MotionDetector::new(
                min_blob_area,
                baseline_refresh_frames,
            )),
        }
    }

    pub fn mode(&self) -> DetectorMode {
        match self.stage {
            Stage::Cascade { .. } => DetectorMode::Cascade,
            Stage::Motion(_) => DetectorMode::Motion,
        }
    }

    /// Process one frame: annotate it in place and decide whether a subject
    /// of interest is present.
    pub fn process(&mut self, mut frame: Frame) -> Result<Decision> {
        let detected = match &mut self.stage {
            Stage::Cascade {
                primary,
                secondary,
                windows,
            } => run_cascade(primary.as_mut(), secondary.as_mut(), *windows, &mut frame)?,
            Stage::Motion(detector) => {
                let regions = detector.detect(&frame.image);
                for region in &regions {
                    frame::draw_region(&mut frame.image, region, CONFIRM_COLOR);
                }
                !regions.is_empty()
            }
        };
        Ok(Decision { frame, detected })
    }
}

fn run_cascade(
    primary: &mut dyn RegionDetector,
    secondary: &mut dyn RegionDetector,
    windows: CascadeWindows,
    frame: &mut Frame,
) -> Result<bool> {
    let proposals = primary.detect(&frame.image, windows.primary)?.regions;
    for region in &proposals {
        frame::draw_region(&mut frame.image, region, PRIMARY_COLOR);
    }

    // No proposals: skip the secondary stage entirely.
    if proposals.is_empty() {
        return Ok(false);
    }

    let mut confirmed: Vec<Region> = Vec::new();
    for proposal in &proposals {
        let crop = frame::crop_region(&frame.image, proposal);
        for local in secondary.detect(&crop, windows.secondary)?.regions {
            // Crop-local coordinates become frame coordinates here, and
            // only here.
            confirmed.push(local.translated(proposal.x1, proposal.y1));
        }
    }
    for region in &confirmed {
        frame::draw_region(&mut frame.image, region, CONFIRM_COLOR);
    }

    Ok(!confirmed.is_empty())
}
