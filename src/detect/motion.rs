//! Baseline-difference motion detection.
//!
//! Needs no trained model: a grayscale, blurred baseline is captured from
//! the first processed frame, and every later frame is compared against it
//! pixel by pixel. Changed pixels are thresholded into a binary mask,
//! dilated so nearby blobs merge, and grouped into connected components.
//! Components whose changed-pixel count falls below a minimum area are
//! discarded as sensor noise.
//!
//! The baseline is never refreshed by default, so any persistent scene
//! change (including lighting drift) keeps alerting until the detector is
//! reset. An optional refresh interval re-captures the baseline every N
//! frames.

use image::{imageops, GrayImage, Luma, RgbImage};

use crate::detect::Region;

/// Gaussian blur applied before differencing.
const BLUR_SIGMA: f32 = 0.8;

/// Minimum per-pixel difference that counts as change.
const DIFF_THRESHOLD: u8 = 90;

/// Dilation passes used to merge nearby blobs.
const DILATE_PASSES: u32 = 2;

const FOREGROUND: Luma<u8> = Luma([255]);

pub struct MotionDetector {
    baseline: Option<GrayImage>,
    min_blob_area: u64,
    refresh_frames: Option<u32>,
    frames_since_baseline: u32,
}

impl MotionDetector {
    /// `min_blob_area` is the smallest changed-pixel count (px²) a blob must
    /// cover to count as motion. `refresh_frames` re-captures the baseline
    /// every N frames; `None` keeps the initial baseline for the whole run.
    pub fn new(min_blob_area: u64, refresh_frames: Option<u32>) -> Self {
        Self {
            baseline: None,
            min_blob_area,
            refresh_frames,
            frames_since_baseline: 0,
        }
    }

    /// Compare `image` against the baseline and return surviving motion
    /// regions. The first call (and any refresh) establishes the baseline
    /// and reports no motion.
    pub fn detect(&mut self, image: &RgbImage) -> Vec<Region> {
        let current = prepare(image);

        let refresh_due = self
            .refresh_frames
            .is_some_and(|n| self.frames_since_baseline >= n);
        let Some(baseline) = self.baseline.as_ref().filter(|_| !refresh_due) else {
            self.baseline = Some(current);
            self.frames_since_baseline = 0;
            return Vec::new();
        };
        self.frames_since_baseline += 1;

        let mask = threshold(&abs_diff(baseline, &current), DIFF_THRESHOLD);
        let mut merged = mask.clone();
        for _ in 0..DILATE_PASSES {
            merged = dilate(&merged);
        }

        blobs(&merged, &mask)
            .into_iter()
            .filter(|blob| blob.changed_pixels >= self.min_blob_area)
            .map(|blob| blob.bounds)
            .collect()
    }

    /// Drop the baseline; the next frame re-captures it.
    pub fn reset(&mut self) {
        self.baseline = None;
        self.frames_since_baseline = 0;
    }
}

fn prepare(image: &RgbImage) -> GrayImage {
    imageops::blur(&imageops::grayscale(image), BLUR_SIGMA)
}

fn abs_diff(a: &GrayImage, b: &GrayImage) -> GrayImage {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    let mut out = GrayImage::new(a.width(), a.height());
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let pa = a.get_pixel(x, y)[0];
        let pb = b.get_pixel(x, y)[0];
        *pixel = Luma([pa.abs_diff(pb)]);
    }
    out
}

fn threshold(image: &GrayImage, level: u8) -> GrayImage {
    let mut out = GrayImage::new(image.width(), image.height());
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        if image.get_pixel(x, y)[0] >= level {
            *pixel = FOREGROUND;
        }
    }
    out
}

/// One pass of 3x3 binary dilation.
fn dilate(mask: &GrayImage) -> GrayImage {
    let (w, h) = mask.dimensions();
    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            'neighborhood: for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    let nx = x as i64 + dx;
                    let ny = y as i64 + dy;
                    if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                        continue;
                    }
                    if mask.get_pixel(nx as u32, ny as u32)[0] != 0 {
                        out.put_pixel(x, y, FOREGROUND);
                        break 'neighborhood;
                    }
                }
            }
        }
    }
    out
}

struct Blob {
    bounds: Region,
    /// Count of pre-dilation changed pixels, so merging blobs for grouping
    /// does not inflate the area used by the noise filter.
    changed_pixels: u64,
}

/// Connected components (8-connectivity) over the merged mask, with the
/// bounding box and area taken from the underlying changed-pixel mask.
fn blobs(merged: &GrayImage, mask: &GrayImage) -> Vec<Blob> {
    let (w, h) = merged.dimensions();
    let mut visited = vec![false; (w as usize) * (h as usize)];
    let index = |x: u32, y: u32| (y as usize) * (w as usize) + x as usize;
    let mut out = Vec::new();

    for sy in 0..h {
        for sx in 0..w {
            if visited[index(sx, sy)] || merged.get_pixel(sx, sy)[0] == 0 {
                continue;
            }

            let mut stack = vec![(sx, sy)];
            visited[index(sx, sy)] = true;
            let mut bounds: Option<Region> = None;
            let mut changed_pixels = 0u64;

            while let Some((x, y)) = stack.pop() {
                if mask.get_pixel(x, y)[0] != 0 {
                    changed_pixels += 1;
                    bounds = Some(match bounds {
                        None => Region::new(x, y, x, y),
                        Some(b) => Region::new(
                            b.x1.min(x),
                            b.y1.min(y),
                            b.x2.max(x),
                            b.y2.max(y),
                        ),
                    });
                }
                for dy in -1i64..=1 {
                    for dx in -1i64..=1 {
                        let nx = x as i64 + dx;
                        let ny = y as i64 + dy;
                        if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                            continue;
                        }
                        let (nx, ny) = (nx as u32, ny as u32);
                        if !visited[index(nx, ny)] && merged.get_pixel(nx, ny)[0] != 0 {
                            visited[index(nx, ny)] = true;
                            stack.push((nx, ny));
                        }
                    }
                }
            }

            if let Some(bounds) = bounds {
                out.push(Blob {
                    bounds,
                    changed_pixels,
                });
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn flat_frame(w: u32, h: u32, level: u8) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([level, level, level]))
    }

    fn with_block(mut frame: RgbImage, x: u32, y: u32, w: u32, h: u32) -> RgbImage {
        for by in y..y + h {
            for bx in x..x + w {
                frame.put_pixel(bx, by, Rgb([255, 255, 255]));
            }
        }
        frame
    }

    #[test]
    fn identical_frame_yields_no_motion() {
        let frame = flat_frame(120, 120, 40);
        let mut detector = MotionDetector::new(200, None);

        // First call establishes the baseline.
        assert!(detector.detect(&frame).is_empty());
        // Identical frame against its own baseline: zero-difference mask.
        assert!(detector.detect(&frame).is_empty());
    }

    #[test]
    fn block_below_minimum_area_is_discarded() {
        let background = flat_frame(120, 120, 0);
        let mut detector = MotionDetector::new(200, None);
        detector.detect(&background);

        // 10x15 = 150 px² of change: under the 200 px² floor.
        let changed = with_block(flat_frame(120, 120, 0), 40, 40, 10, 15);
        assert!(detector.detect(&changed).is_empty());
    }

    #[test]
    fn block_above_minimum_area_is_reported() {
        let background = flat_frame(120, 120, 0);
        let mut detector = MotionDetector::new(200, None);
        detector.detect(&background);

        // 10x25 = 250 px² of change: over the floor.
        let changed = with_block(flat_frame(120, 120, 0), 40, 40, 10, 25);
        let regions = detector.detect(&changed);
        assert_eq!(regions.len(), 1);
        let region = regions[0];
        assert!(region.x1 >= 35 && region.x2 <= 55, "box x out of place: {region:?}");
        assert!(region.y1 >= 35 && region.y2 <= 70, "box y out of place: {region:?}");
    }

    #[test]
    fn nearby_blobs_merge_into_one_region() {
        let background = flat_frame(120, 120, 0);
        let mut detector = MotionDetector::new(200, None);
        detector.detect(&background);

        // Two 10x20 blocks two pixels apart: dilation bridges the gap.
        let mut changed = with_block(flat_frame(120, 120, 0), 40, 40, 10, 20);
        changed = with_block(changed, 52, 40, 10, 20);
        let regions = detector.detect(&changed);
        assert_eq!(regions.len(), 1);
        assert!(regions[0].width() >= 20);
    }

    #[test]
    fn refresh_interval_recaptures_the_baseline() {
        let background = flat_frame(120, 120, 0);
        let changed = with_block(flat_frame(120, 120, 0), 40, 40, 20, 20);
        let mut detector = MotionDetector::new(200, Some(2));

        detector.detect(&background); // baseline
        assert!(!detector.detect(&changed).is_empty());
        assert!(!detector.detect(&changed).is_empty());
        // Third comparison hits the refresh interval: the changed frame
        // becomes the new baseline and motion stops being reported.
        assert!(detector.detect(&changed).is_empty());
        assert!(detector.detect(&changed).is_empty());
    }

    #[test]
    fn reset_drops_the_baseline() {
        let background = flat_frame(120, 120, 0);
        let changed = with_block(flat_frame(120, 120, 0), 40, 40, 20, 20);
        let mut detector = MotionDetector::new(200, None);

        detector.detect(&background);
        assert!(!detector.detect(&changed).is_empty());

        detector.reset();
        // The changed frame is now the baseline itself.
        assert!(detector.detect(&changed).is_empty());
        assert!(detector.detect(&changed).is_empty());
    }
}
