//! Frame container and in-place annotation helpers.
//!
//! A `Frame` couples decoded pixels with the wall-clock instant they were
//! captured. Frames move by value through the pipeline: the stage currently
//! holding one owns it exclusively, draws on it in place, then hands it off.

use chrono::{DateTime, Local};
use image::{imageops, Rgb, RgbImage};

use crate::detect::Region;

/// Stroke width for detection overlays.
const BOX_STROKE: u32 = 2;

/// Overlay color for primary (proposal) regions.
pub const PRIMARY_COLOR: Rgb<u8> = Rgb([127, 255, 0]);

/// Overlay color for confirmed (secondary / motion) regions.
pub const CONFIRM_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// A single captured video frame.
#[derive(Clone)]
pub struct Frame {
    pub image: RgbImage,
    pub captured_at: DateTime<Local>,
}

impl Frame {
    pub fn new(image: RgbImage, captured_at: DateTime<Local>) -> Self {
        Self { image, captured_at }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Draw a rectangle outline over `region`, clamped to the image bounds.
pub fn draw_region(image: &mut RgbImage, region: &Region, color: Rgb<u8>) {
    let (w, h) = (image.width(), image.height());
    if w == 0 || h == 0 {
        return;
    }
    let x1 = region.x1.min(w - 1);
    let y1 = region.y1.min(h - 1);
    let x2 = region.x2.min(w - 1);
    let y2 = region.y2.min(h - 1);

    for t in 0..BOX_STROKE {
        // Horizontal edges.
        let top = y1.saturating_add(t).min(h - 1);
        let bottom = y2.saturating_sub(t).max(y1);
        for x in x1..=x2 {
            image.put_pixel(x, top, color);
            image.put_pixel(x, bottom, color);
        }
        // Vertical edges.
        let left = x1.saturating_add(t).min(w - 1);
        let right = x2.saturating_sub(t).max(x1);
        for y in y1..=y2 {
            image.put_pixel(left, y, color);
            image.put_pixel(right, y, color);
        }
    }
}

/// Copy the sub-image covered by `region` out of `image`.
///
/// Regions detected inside the returned crop are in crop-local coordinates
/// and must be translated back by the region's top-left corner.
pub fn crop_region(image: &RgbImage, region: &Region) -> RgbImage {
    let (w, h) = (image.width(), image.height());
    let x = region.x1.min(w);
    let y = region.y1.min(h);
    let cw = region.width().min(w - x);
    let ch = region.height().min(h - y);
    imageops::crop_imm(image, x, y, cw, ch).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(w: u32, h: u32) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([0, 0, 0]))
    }

    #[test]
    fn draw_region_marks_the_outline() {
        let mut image = blank(100, 100);
        let region = Region::new(10, 10, 50, 50);
        draw_region(&mut image, &region, PRIMARY_COLOR);

        assert_eq!(*image.get_pixel(10, 10), PRIMARY_COLOR);
        assert_eq!(*image.get_pixel(30, 10), PRIMARY_COLOR);
        assert_eq!(*image.get_pixel(50, 50), PRIMARY_COLOR);
        // Interior stays untouched.
        assert_eq!(*image.get_pixel(30, 30), Rgb([0, 0, 0]));
    }

    #[test]
    fn draw_region_clamps_out_of_bounds() {
        let mut image = blank(40, 40);
        let region = Region::new(30, 30, 200, 200);
        draw_region(&mut image, &region, CONFIRM_COLOR);
        assert_eq!(*image.get_pixel(39, 39), CONFIRM_COLOR);
    }

    #[test]
    fn crop_region_matches_dimensions() {
        let mut image = blank(100, 100);
        image.put_pixel(60, 60, Rgb([9, 9, 9]));
        let crop = crop_region(&image, &Region::new(50, 50, 150, 150));

        // Clamped to the frame edge.
        assert_eq!(crop.width(), 50);
        assert_eq!(crop.height(), 50);
        assert_eq!(*crop.get_pixel(10, 10), Rgb([9, 9, 9]));
    }
}
