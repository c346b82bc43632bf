//! Image records and the annotations attached to them.

use std::fmt;

use super::bbox::BBox;
use crate::palette::Color;

/// A unique identifier for a loaded image.
///
/// The surrounding application owns id assignment; the core only needs ids
/// to be stable for the session.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageId(pub u64);

impl ImageId {
    /// Creates a new ImageId.
    #[inline]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value.
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageId({})", self.0)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A loaded image and the annotations ingested for it.
///
/// The core reads `id`/`filename`/`width`/`height` and appends to
/// `annotations`; everything else about an image belongs to the caller.
#[derive(Clone, Debug)]
pub struct ImageRecord {
    /// Unique identifier for this image.
    pub id: ImageId,

    /// Filename as the image was loaded (may include a relative path).
    pub filename: String,

    /// Width of the image in pixels.
    pub width: u32,

    /// Height of the image in pixels.
    pub height: u32,

    /// Annotations attached by ingestion, in acceptance order.
    pub annotations: Vec<Annotation>,
}

impl ImageRecord {
    /// Creates a new image record with no annotations.
    pub fn new(id: impl Into<ImageId>, filename: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            filename: filename.into(),
            width,
            height,
            annotations: Vec::new(),
        }
    }
}

impl From<u64> for ImageId {
    fn from(id: u64) -> Self {
        ImageId::new(id)
    }
}

/// One normalized annotation: a labeled box on a specific image.
///
/// Created exclusively by ingestion; never mutated afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    /// Identifier unique within the owning image, synthesized per format.
    pub id: String,

    /// Class name for this annotation.
    pub label: String,

    /// Bounding box in absolute pixel units, top-left origin.
    pub bbox: BBox,

    /// Confidence in [0, 1]; formats without a confidence field report 1.0.
    pub confidence: f64,

    /// Display color derived from the label.
    pub color: Color,
}

impl Annotation {
    /// Creates a new annotation, clamping confidence into [0, 1].
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        bbox: BBox,
        confidence: f64,
        color: Color,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            bbox,
            confidence: confidence.clamp(0.0, 1.0),
            color,
        }
    }
}
