/// Axis-aligned rectangle in frame pixel coordinates.
///
/// `(x1, y1)` is the top-left corner, `(x2, y2)` the bottom-right.
/// Detectors running on a cropped sub-frame report crop-local coordinates;
/// call [`Region::translated`] with the crop origin exactly once per nesting
/// level to map them back into the parent frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Region {
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        debug_assert!(x1 <= x2 && y1 <= y2, "region corners out of order");
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    /// Covered area in square pixels.
    pub fn area(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    /// Shift this region by a sub-frame origin, mapping crop-local
    /// coordinates into the parent frame.
    pub fn translated(&self, dx: u32, dy: u32) -> Region {
        Region {
            x1: self.x1 + dx,
            y1: self.y1 + dy,
            x2: self.x2 + dx,
            y2: self.y2 + dy,
        }
    }
}

/// Result of running a detector over one image.
///
/// `regions` is in the detector's insertion order; `confidences`, when
/// present, pairs with `regions` by index and has no other meaning.
#[derive(Clone, Debug, Default)]
pub struct DetectionResult {
    pub regions: Vec<Region>,
    pub confidences: Option<Vec<f32>>,
}

impl DetectionResult {
    pub fn from_regions(regions: Vec<Region>) -> Self {
        Self {
            regions,
            confidences: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_maps_crop_coordinates_into_the_parent_frame() {
        // A secondary hit at (10,10)-(40,40) inside a primary region whose
        // top-left corner sits at (50,50) lands at (60,60)-(90,90).
        let primary = Region::new(50, 50, 150, 150);
        let local = Region::new(10, 10, 40, 40);
        let mapped = local.translated(primary.x1, primary.y1);
        assert_eq!(mapped, Region::new(60, 60, 90, 90));
    }

    #[test]
    fn area_is_width_times_height() {
        assert_eq!(Region::new(0, 0, 10, 15).area(), 150);
        assert_eq!(Region::new(5, 5, 15, 30).area(), 250);
    }
}
