//! Person detector boundary.

use crate::geometry::BoundingBox;
use crate::Result;

/// Source of per-frame person bounding boxes.
pub trait Detector {
    /// Boxes found in the latest frame. `None` or an empty list means nobody was seen.
    fn detect(&mut self) -> Result<Option<Vec<BoundingBox>>>;
}

impl<T: Detector + ?Sized> Detector for &mut T {
    fn detect(&mut self) -> Result<Option<Vec<BoundingBox>>> {
        (**self).detect()
    }
}

impl<T: Detector + ?Sized> Detector for Box<T> {
    fn detect(&mut self) -> Result<Option<Vec<BoundingBox>>> {
        (**self).detect()
    }
}
