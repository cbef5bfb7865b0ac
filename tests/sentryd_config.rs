use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use sentry_cam::config::SentrydConfig;
use sentry_cam::detect::DetectorMode;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "SENTRY_CONFIG",
        "SENTRY_MODE",
        "SENTRY_CAMERA_URL",
        "SENTRY_SAVE_ROOT",
        "SENTRY_COOLDOWN_FRAMES",
        "SENTRY_UPLOAD_WORKERS",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "save_root": "captures",
        "detector": {
            "mode": "motion",
            "cooldown_frames": 75,
            "primary_window": [80, 80],
            "secondary_window": [30, 30]
        },
        "motion": {
            "min_blob_area": 300,
            "baseline_refresh_frames": 600
        },
        "upload": {
            "workers": 5,
            "retry_backoff_secs": 2
        },
        "camera": {
            "url": "stub://yard",
            "target_fps": 15,
            "width": 640,
            "height": 480
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("SENTRY_CONFIG", file.path());
    std::env::set_var("SENTRY_COOLDOWN_FRAMES", "100");
    std::env::set_var("SENTRY_UPLOAD_WORKERS", "2");

    let cfg = SentrydConfig::load(None).expect("load config");

    assert_eq!(cfg.save_root, "captures");
    assert_eq!(cfg.mode, DetectorMode::Motion);
    assert_eq!(cfg.cooldown_frames, 100);
    assert_eq!(cfg.primary_window, (80, 80));
    assert_eq!(cfg.secondary_window, (30, 30));
    assert_eq!(cfg.motion.min_blob_area, 300);
    assert_eq!(cfg.motion.baseline_refresh_frames, Some(600));
    assert_eq!(cfg.upload.workers, 2);
    assert_eq!(cfg.upload.retry_backoff, Duration::from_secs(2));
    assert_eq!(cfg.camera.url, "stub://yard");
    assert_eq!(cfg.camera.target_fps, 15);
    assert_eq!(cfg.camera.width, 640);
    assert_eq!(cfg.camera.height, 480);

    clear_env();
}

#[test]
fn defaults_apply_without_a_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = SentrydConfig::load(None).expect("load defaults");

    assert_eq!(cfg.save_root, "detected");
    assert_eq!(cfg.mode, DetectorMode::Motion);
    assert_eq!(cfg.cooldown_frames, 50);
    assert_eq!(cfg.motion.min_blob_area, 200);
    assert_eq!(cfg.motion.baseline_refresh_frames, None);
    assert_eq!(cfg.upload.workers, 3);
    assert_eq!(cfg.camera.url, "stub://front_camera");

    clear_env();
}

#[test]
fn invalid_mode_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("SENTRY_MODE", "thermal");
    let result = SentrydConfig::load(None);
    assert!(result.is_err());

    clear_env();
}

#[test]
fn zero_workers_fail_validation() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("SENTRY_UPLOAD_WORKERS", "0");
    let result = SentrydConfig::load(None);
    assert!(result.is_err());

    clear_env();
}
