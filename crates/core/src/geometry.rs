//! Coordinate conversion and box normalization
//!
//! All annotation geometry lives in document space: unscaled page units with the
//! origin at the top-left of the page, X growing right and Y growing down.
//! Pointer input arrives in client (screen) space and is converted here.

use serde::{Deserialize, Serialize};

/// A point in document (unscaled) page space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PageCoordinate {
    pub x: f64,
    pub y: f64,
}

impl PageCoordinate {
    /// Create a new page coordinate
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - other`
    pub fn offset_from(&self, other: &PageCoordinate) -> PageCoordinate {
        PageCoordinate::new(self.x - other.x, self.y - other.y)
    }
}

/// Convert a client-space pointer position into document space.
///
/// `scale` comes from the zoom collaborator and is always positive.
pub fn to_document_space(
    client: PageCoordinate,
    container_origin: PageCoordinate,
    scale: f64,
) -> PageCoordinate {
    PageCoordinate::new(
        (client.x - container_origin.x) / scale,
        (client.y - container_origin.y) / scale,
    )
}

/// Axis-aligned box anchored at its top-left corner.
///
/// Extents may be negative while a drag is in progress; committed boxes are
/// always normalized.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Box spanning from `anchor` to `current`, possibly with negative extents
    pub fn from_corners(anchor: PageCoordinate, current: PageCoordinate) -> Self {
        Self::new(anchor.x, anchor.y, current.x - anchor.x, current.y - anchor.y)
    }

    pub fn origin(&self) -> PageCoordinate {
        PageCoordinate::new(self.x, self.y)
    }

    /// Bottom-right corner (only meaningful once normalized)
    pub fn far_corner(&self) -> PageCoordinate {
        PageCoordinate::new(self.x + self.width, self.y + self.height)
    }

    /// Same extents, top-left moved to `origin`
    pub fn translated_to(&self, origin: PageCoordinate) -> Self {
        Self::new(origin.x, origin.y, self.width, self.height)
    }

    pub fn is_normalized(&self) -> bool {
        self.width >= 0.0 && self.height >= 0.0
    }

    /// Flip negative extents so the box is anchored at its true top-left.
    pub fn normalized(&self) -> Self {
        let mut out = *self;
        if out.width < 0.0 {
            out.x += out.width;
            out.width = -out.width;
        }
        if out.height < 0.0 {
            out.y += out.height;
            out.height = -out.height;
        }
        out
    }

    /// Hit test with a tolerance band around the edges
    pub fn contains(&self, point: &PageCoordinate, tolerance: f64) -> bool {
        let b = self.normalized();
        point.x >= b.x - tolerance
            && point.x <= b.x + b.width + tolerance
            && point.y >= b.y - tolerance
            && point.y <= b.y + b.height + tolerance
    }
}

/// Free-function form of [`BoundingBox::normalized`]
pub fn normalize(bounds: BoundingBox) -> BoundingBox {
    bounds.normalized()
}
