use chrono::{Local, TimeZone};
use image::{Rgb, RgbImage};
use tempfile::tempdir;

use sentry_cam::DetectionStore;

#[test]
fn saved_capture_lands_at_the_derived_path_and_reads_back() {
    let dir = tempdir().expect("temp dir");
    let store = DetectionStore::new(dir.path());
    let stamp = Local.with_ymd_and_hms(2026, 8, 24, 14, 3, 27).unwrap();

    let mut image = RgbImage::from_pixel(32, 24, Rgb([10, 20, 30]));
    image.put_pixel(5, 5, Rgb([200, 100, 50]));

    let written = store.save(&image, &stamp).expect("save capture");
    assert_eq!(written, store.file_path_for(&stamp));
    assert_eq!(
        written,
        dir.path()
            .join("2026")
            .join("8. August")
            .join("24")
            .join("2026-08-24 14:03:27.png")
    );

    let loaded = image::open(&written).expect("read capture").to_rgb8();
    assert_eq!(loaded.dimensions(), (32, 24));
    assert_eq!(*loaded.get_pixel(5, 5), Rgb([200, 100, 50]));
    assert_eq!(*loaded.get_pixel(0, 0), Rgb([10, 20, 30]));
}

#[test]
fn saves_on_the_same_day_share_one_directory() {
    let dir = tempdir().expect("temp dir");
    let store = DetectionStore::new(dir.path());
    let image = RgbImage::new(8, 8);

    let first = Local.with_ymd_and_hms(2026, 8, 24, 9, 0, 0).unwrap();
    let second = Local.with_ymd_and_hms(2026, 8, 24, 21, 30, 0).unwrap();
    store.save(&image, &first).expect("first save");
    store.save(&image, &second).expect("second save");

    let day_dir = store.dir_for(&first);
    assert_eq!(day_dir, store.dir_for(&second));
    let entries = std::fs::read_dir(&day_dir).expect("list day dir").count();
    assert_eq!(entries, 2);
}
