use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::detect::DetectorMode;

const DEFAULT_SAVE_ROOT: &str = "detected";
const DEFAULT_MODE: DetectorMode = DetectorMode::Motion;
const DEFAULT_COOLDOWN_FRAMES: u64 = 50;
const DEFAULT_MIN_BLOB_AREA: u64 = 200;
const DEFAULT_UPLOAD_WORKERS: usize = 3;
const DEFAULT_RETRY_BACKOFF_SECS: u64 = 1;
const DEFAULT_CAMERA_URL: &str = "stub://front_camera";
const DEFAULT_CAMERA_FPS: u32 = 10;
const DEFAULT_CAMERA_WIDTH: u32 = 320;
const DEFAULT_CAMERA_HEIGHT: u32 = 240;
const DEFAULT_PRIMARY_WINDOW: (u32, u32) = (60, 60);
const DEFAULT_SECONDARY_WINDOW: (u32, u32) = (25, 25);

#[derive(Debug, Deserialize, Default)]
struct SentrydConfigFile {
    save_root: Option<String>,
    detector: Option<DetectorConfigFile>,
    motion: Option<MotionConfigFile>,
    upload: Option<UploadConfigFile>,
    camera: Option<CameraConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    mode: Option<String>,
    cooldown_frames: Option<u64>,
    primary_window: Option<[u32; 2]>,
    secondary_window: Option<[u32; 2]>,
}

#[derive(Debug, Deserialize, Default)]
struct MotionConfigFile {
    min_blob_area: Option<u64>,
    baseline_refresh_frames: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct UploadConfigFile {
    workers: Option<usize>,
    retry_backoff_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    url: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct SentrydConfig {
    pub save_root: String,
    pub mode: DetectorMode,
    pub cooldown_frames: u64,
    pub primary_window: (u32, u32),
    pub secondary_window: (u32, u32),
    pub motion: MotionSettings,
    pub upload: UploadSettings,
    pub camera: CameraSettings,
}

#[derive(Debug, Clone)]
pub struct MotionSettings {
    pub min_blob_area: u64,
    /// `None` keeps the first baseline for the whole run.
    pub baseline_refresh_frames: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub workers: usize,
    pub retry_backoff: Duration,
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    pub url: String,
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
}

impl SentrydConfig {
    /// Load from `path` when given, falling back to the `SENTRY_CONFIG`
    /// environment variable, then to built-in defaults. Environment
    /// overrides are applied after the file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var("SENTRY_CONFIG").ok();
        let config_path = path
            .map(Path::to_path_buf)
            .or_else(|| env_path.map(Into::into));
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: SentrydConfigFile) -> Result<Self> {
        let save_root = file
            .save_root
            .unwrap_or_else(|| DEFAULT_SAVE_ROOT.to_string());
        let mode = match file.detector.as_ref().and_then(|d| d.mode.as_deref()) {
            Some(raw) => raw.parse()?,
            None => DEFAULT_MODE,
        };
        let cooldown_frames = file
            .detector
            .as_ref()
            .and_then(|d| d.cooldown_frames)
            .unwrap_or(DEFAULT_COOLDOWN_FRAMES);
        let primary_window = file
            .detector
            .as_ref()
            .and_then(|d| d.primary_window)
            .map(|[w, h]| (w, h))
            .unwrap_or(DEFAULT_PRIMARY_WINDOW);
        let secondary_window = file
            .detector
            .as_ref()
            .and_then(|d| d.secondary_window)
            .map(|[w, h]| (w, h))
            .unwrap_or(DEFAULT_SECONDARY_WINDOW);
        let motion = MotionSettings {
            min_blob_area: file
                .motion
                .as_ref()
                .and_then(|m| m.min_blob_area)
                .unwrap_or(DEFAULT_MIN_BLOB_AREA),
            baseline_refresh_frames: file.motion.as_ref().and_then(|m| m.baseline_refresh_frames),
        };
        let upload = UploadSettings {
            workers: file
                .upload
                .as_ref()
                .and_then(|u| u.workers)
                .unwrap_or(DEFAULT_UPLOAD_WORKERS),
            retry_backoff: Duration::from_secs(
                file.upload
                    .and_then(|u| u.retry_backoff_secs)
                    .unwrap_or(DEFAULT_RETRY_BACKOFF_SECS),
            ),
        };
        let camera = CameraSettings {
            url: file
                .camera
                .as_ref()
                .and_then(|c| c.url.clone())
                .unwrap_or_else(|| DEFAULT_CAMERA_URL.to_string()),
            target_fps: file
                .camera
                .as_ref()
                .and_then(|c| c.target_fps)
                .unwrap_or(DEFAULT_CAMERA_FPS),
            width: file
                .camera
                .as_ref()
                .and_then(|c| c.width)
                .unwrap_or(DEFAULT_CAMERA_WIDTH),
            height: file
                .camera
                .and_then(|c| c.height)
                .unwrap_or(DEFAULT_CAMERA_HEIGHT),
        };
        Ok(Self {
            save_root,
            mode,
            cooldown_frames,
            primary_window,
            secondary_window,
            motion,
            upload,
            camera,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(mode) = std::env::var("SENTRY_MODE") {
            if !mode.trim().is_empty() {
                self.mode = mode.trim().parse()?;
            }
        }
        if let Ok(url) = std::env::var("SENTRY_CAMERA_URL") {
            if !url.trim().is_empty() {
                self.camera.url = url;
            }
        }
        if let Ok(root) = std::env::var("SENTRY_SAVE_ROOT") {
            if !root.trim().is_empty() {
                self.save_root = root;
            }
        }
        if let Ok(cooldown) = std::env::var("SENTRY_COOLDOWN_FRAMES") {
            self.cooldown_frames = cooldown
                .parse()
                .map_err(|_| anyhow!("SENTRY_COOLDOWN_FRAMES must be an integer frame count"))?;
        }
        if let Ok(workers) = std::env::var("SENTRY_UPLOAD_WORKERS") {
            self.upload.workers = workers
                .parse()
                .map_err(|_| anyhow!("SENTRY_UPLOAD_WORKERS must be an integer"))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.save_root.trim().is_empty() {
            return Err(anyhow!("save_root must not be empty"));
        }
        if self.upload.workers == 0 {
            return Err(anyhow!("upload.workers must be at least 1"));
        }
        if self.motion.min_blob_area == 0 {
            return Err(anyhow!("motion.min_blob_area must be greater than zero"));
        }
        if self.primary_window.0 == 0
            || self.primary_window.1 == 0
            || self.secondary_window.0 == 0
            || self.secondary_window.1 == 0
        {
            return Err(anyhow!("detector windows must be non-zero"));
        }
        if self.camera.target_fps == 0 {
            return Err(anyhow!("camera.target_fps must be greater than zero"));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!("camera resolution must be non-zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<SentrydConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
