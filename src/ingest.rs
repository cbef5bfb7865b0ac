//! Frame acquisition.
//!
//! Real deployments front a camera; this build ships a synthetic source
//! that renders a moving subject over a dark scene, which is enough to
//! exercise the full pipeline end to end. Sources are polled by the main
//! loop; there is no push path.

use anyhow::{bail, Result};
use chrono::Local;
use image::{Rgb, RgbImage};
use log::info;
use rand::Rng;

use crate::frame::Frame;

/// Counters a source exposes for the periodic health log.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub source: String,
}

/// A pollable camera.
pub trait FrameSource: Send {
    /// Capture the next frame. Blocking is allowed; an error means the
    /// source is unusable and the caller should shut down.
    fn next_frame(&mut self) -> Result<Frame>;

    fn is_healthy(&self) -> bool {
        true
    }

    fn stats(&self) -> SourceStats;
}

/// Background luminance of the synthetic scene.
const SCENE_LEVEL: u8 = 16;

/// Luminance of the synthetic subject.
const SUBJECT_LEVEL: u8 = 230;

/// Per-pixel sensor noise amplitude. Kept well under the motion detector's
/// difference threshold so noise alone never reads as motion.
const NOISE_AMPLITUDE: i16 = 8;

const SUBJECT_SIZE: u32 = 20;

/// Synthetic camera behind a `stub://` URL.
///
/// Renders a bright square bouncing across a dark, lightly noisy scene at
/// the configured resolution.
pub struct SyntheticCamera {
    url: String,
    width: u32,
    height: u32,
    subject: (u32, u32),
    velocity: (i32, i32),
    frames_captured: u64,
}

impl SyntheticCamera {
    pub fn open(url: &str, width: u32, height: u32) -> Result<Self> {
        if !url.starts_with("stub://") {
            bail!(
                "unsupported camera url '{}'; this build only supports stub:// sources",
                url
            );
        }
        if width <= SUBJECT_SIZE || height <= SUBJECT_SIZE {
            bail!("camera resolution {}x{} is too small", width, height);
        }
        info!("synthetic camera open at {} ({}x{})", url, width, height);
        Ok(Self {
            url: url.to_string(),
            width,
            height,
            subject: (width / 4, height / 4),
            velocity: (3, 2),
            frames_captured: 0,
        })
    }

    fn advance_subject(&mut self) {
        let (mut x, mut y) = (self.subject.0 as i32, self.subject.1 as i32);
        let (mut vx, mut vy) = self.velocity;

        x += vx;
        y += vy;
        if x < 0 || x as u32 + SUBJECT_SIZE >= self.width {
            vx = -vx;
            x += 2 * vx;
        }
        if y < 0 || y as u32 + SUBJECT_SIZE >= self.height {
            vy = -vy;
            y += 2 * vy;
        }

        self.subject = (x.max(0) as u32, y.max(0) as u32);
        self.velocity = (vx, vy);
    }
}

impl FrameSource for SyntheticCamera {
    fn next_frame(&mut self) -> Result<Frame> {
        let mut rng = rand::thread_rng();
        let mut image = RgbImage::new(self.width, self.height);

        for pixel in image.pixels_mut() {
            let noise = rng.gen_range(-NOISE_AMPLITUDE..=NOISE_AMPLITUDE);
            let level = (SCENE_LEVEL as i16 + noise).clamp(0, 255) as u8;
            *pixel = Rgb([level, level, level]);
        }

        let (sx, sy) = self.subject;
        for y in sy..(sy + SUBJECT_SIZE).min(self.height) {
            for x in sx..(sx + SUBJECT_SIZE).min(self.width) {
                image.put_pixel(x, y, Rgb([SUBJECT_LEVEL, SUBJECT_LEVEL, SUBJECT_LEVEL]));
            }
        }

        self.advance_subject();
        self.frames_captured += 1;
        Ok(Frame::new(image, Local::now()))
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frames_captured,
            source: self.url.clone(),
        }
    }
}
