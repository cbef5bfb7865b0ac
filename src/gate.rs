//! Frame-counted alert throttling.
//!
//! A detection storm should not produce an alert per frame. The gate counts
//! every processed frame and lets a positive decision through only when at
//! least `cooldown_frames` frames have elapsed since the previous alert.
//! Counting frames rather than wall-clock time ties the alert rate to the
//! pipeline's actual throughput: a slow pipeline cools down more slowly in
//! real time, matching how long the scene has actually been observed.

/// Cooldown gate over the per-frame decision stream.
pub struct AlertGate {
    total_frames: u64,
    last_alert_frame: u64,
    cooldown_frames: u64,
}

impl AlertGate {
    pub fn new(cooldown_frames: u64) -> Self {
        Self {
            total_frames: 0,
            last_alert_frame: 0,
            cooldown_frames,
        }
    }

    /// Feed one decision through the gate. Every call counts the frame,
    /// positive or not; returns `true` when the decision should fire an
    /// alert.
    ///
    /// `last_alert_frame == 0` means no alert has fired yet, so the first
    /// positive decision fires immediately instead of waiting out a full
    /// cooldown window.
    pub fn offer(&mut self, detected: bool) -> bool {
        self.total_frames += 1;
        if !detected {
            return false;
        }
        let armed = self.last_alert_frame == 0
            || self.total_frames - self.last_alert_frame > self.cooldown_frames;
        if armed {
            self.last_alert_frame = self.total_frames;
        }
        armed
    }

    /// Frames observed since construction.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }
}
