//! Frame-rate measurement over a rolling one-second window.

use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(1);

/// Counts `tick` calls per second on the caller's thread; no timer thread.
pub struct FpsCounter {
    window_started: Instant,
    frames_in_window: u32,
    current_fps: u32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self {
            window_started: Instant::now(),
            frames_in_window: 0,
            current_fps: 0,
        }
    }

    /// Record one processed frame.
    pub fn tick(&mut self) {
        self.frames_in_window += 1;
        let elapsed = self.window_started.elapsed();
        if elapsed >= WINDOW {
            self.current_fps = self.frames_in_window;
            self.frames_in_window = 0;
            self.window_started = Instant::now();
        }
    }

    /// Rate measured over the last completed window. Zero until the first
    /// window closes.
    pub fn current_fps(&self) -> u32 {
        self.current_fps
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}
