//! Local capture archive.
//!
//! Detections land on disk under a date-partitioned tree rooted at the
//! configured save directory:
//!
//! ```text
//! detected/2026/8. August/24/2026-08-24 14:03:27.png
//! ```
//!
//! The month folder carries both the number and the name so the tree sorts
//! chronologically in a plain directory listing while staying readable.
//! The upload workers walk the same folder names on the remote side, so the
//! derivation helpers here are the single source of truth for the layout.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Local};
use image::RgbImage;

/// Folder name for a timestamp's year component.
pub fn year_folder(ts: &DateTime<Local>) -> String {
    ts.year().to_string()
}

/// Folder name for a timestamp's month component, e.g. `8. August`.
pub fn month_folder(ts: &DateTime<Local>) -> String {
    format!("{}. {}", ts.month(), ts.format("%B"))
}

/// Folder name for a timestamp's day component.
pub fn day_folder(ts: &DateTime<Local>) -> String {
    ts.day().to_string()
}

/// File name for a capture taken at `ts`, without any directory part.
pub fn capture_file_name(ts: &DateTime<Local>) -> String {
    format!("{}.png", ts.format("%Y-%m-%d %H:%M:%S"))
}

/// Date-partitioned PNG archive under a fixed root directory.
#[derive(Clone)]
pub struct DetectionStore {
    root: PathBuf,
}

impl DetectionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory a capture taken at `ts` belongs in.
    pub fn dir_for(&self, ts: &DateTime<Local>) -> PathBuf {
        self.root
            .join(year_folder(ts))
            .join(month_folder(ts))
            .join(day_folder(ts))
    }

    /// Full path of the capture file for `ts`.
    pub fn file_path_for(&self, ts: &DateTime<Local>) -> PathBuf {
        self.dir_for(ts).join(capture_file_name(ts))
    }

    /// Write `image` as a PNG at the derived path, creating any missing
    /// date directories. Returns the path written.
    pub fn save(&self, image: &RgbImage, ts: &DateTime<Local>) -> Result<PathBuf> {
        let dir = self.dir_for(ts);
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating capture directory {}", dir.display()))?;

        let path = self.file_path_for(ts);
        image
            .save(&path)
            .with_context(|| format!("writing capture {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn path_derivation_matches_the_archive_layout() {
        let store = DetectionStore::new("detected");
        let stamp = ts(2026, 8, 24, 14, 3, 27);

        assert_eq!(
            store.file_path_for(&stamp),
            PathBuf::from("detected/2026/8. August/24/2026-08-24 14:03:27.png")
        );
    }

    #[test]
    fn month_folder_is_number_dot_name() {
        assert_eq!(month_folder(&ts(2026, 1, 5, 0, 0, 0)), "1. January");
        assert_eq!(month_folder(&ts(2026, 12, 5, 0, 0, 0)), "12. December");
    }

    #[test]
    fn single_digit_components_are_not_zero_padded() {
        let store = DetectionStore::new("detected");
        let stamp = ts(2026, 3, 7, 1, 2, 3);
        // Directory components stay unpadded; the file name keeps the
        // fixed-width timestamp format.
        assert_eq!(
            store.dir_for(&stamp),
            PathBuf::from("detected/2026/3. March/7")
        );
        assert_eq!(capture_file_name(&stamp), "2026-03-07 01:02:03.png");
    }
}
