//! Bounding box types in canonical corner+size form.

/// An axis-aligned bounding box in absolute pixel units.
///
/// `(x, y)` is the top-left corner; `width` and `height` are the box
/// dimensions. This is the one shape every decoder normalizes into.
///
/// Note: this type does NOT enforce positive dimensions in the constructor,
/// allowing malformed boxes to be represented. This is intentional - the
/// orchestrator checks and reports degenerate boxes rather than panicking
/// during parsing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BBox {
    /// Creates a box from corner+size values.
    #[inline]
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a box from two corners, as used by Pascal VOC `bndbox`.
    #[inline]
    pub fn from_corners(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self::from_xywh(xmin, ymin, xmax - xmin, ymax - ymin)
    }

    /// Returns the maximum x coordinate.
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Returns the maximum y coordinate.
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Returns the area of the box.
    ///
    /// May be zero or negative if the box is malformed.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Returns true if all four values are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
    }

    /// Returns true if the box has no positive area.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Clamps a negative origin to the image edge, leaving the size alone.
    ///
    /// Normalized center-form boxes can land with their corner slightly
    /// outside the image after conversion.
    #[inline]
    pub fn clamp_origin(self) -> Self {
        Self {
            x: self.x.max(0.0),
            y: self.y.max(0.0),
            ..self
        }
    }
}

/// Box coordinates as a decoder produced them, before image matching.
///
/// Most formats carry absolute pixels, but YOLO lines are in normalized
/// center form and cannot be converted until the record has been matched to
/// an image with known dimensions. Keeping both shapes here lets decoding
/// stay a pure bytes-to-tuples transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoxGeometry {
    /// Already in absolute pixel corner+size form.
    Pixels(BBox),
    /// Normalized center form: all four values in [0, 1].
    NormalizedCenter { cx: f64, cy: f64, w: f64, h: f64 },
}

impl BoxGeometry {
    /// Resolves to an absolute pixel box against the matched image.
    pub fn resolve(&self, image_width: u32, image_height: u32) -> BBox {
        match *self {
            BoxGeometry::Pixels(bbox) => bbox,
            BoxGeometry::NormalizedCenter { cx, cy, w, h } => {
                let iw = f64::from(image_width);
                let ih = f64::from(image_height);
                BBox::from_xywh((cx - w / 2.0) * iw, (cy - h / 2.0) * ih, w * iw, h * ih)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners() {
        let bbox = BBox::from_corners(10.0, 20.0, 110.0, 170.0);
        assert_eq!(bbox, BBox::from_xywh(10.0, 20.0, 100.0, 150.0));
        assert_eq!(bbox.right(), 110.0);
        assert_eq!(bbox.bottom(), 170.0);
    }

    #[test]
    fn test_degenerate_boxes() {
        assert!(BBox::from_corners(50.0, 10.0, 50.0, 40.0).is_degenerate());
        assert!(BBox::from_xywh(0.0, 0.0, 10.0, -1.0).is_degenerate());
        assert!(!BBox::from_xywh(0.0, 0.0, 1.0, 1.0).is_degenerate());
    }

    #[test]
    fn test_is_finite() {
        assert!(BBox::from_xywh(0.0, 0.0, 1.0, 1.0).is_finite());
        assert!(!BBox::from_xywh(f64::NAN, 0.0, 1.0, 1.0).is_finite());
        assert!(!BBox::from_xywh(0.0, f64::INFINITY, 1.0, 1.0).is_finite());
    }

    #[test]
    fn test_clamp_origin() {
        let clamped = BBox::from_xywh(-3.0, -0.5, 20.0, 20.0).clamp_origin();
        assert_eq!(clamped.x, 0.0);
        assert_eq!(clamped.y, 0.0);
        assert_eq!(clamped.width, 20.0);
        assert_eq!(clamped.height, 20.0);
    }

    #[test]
    fn test_normalized_center_resolution() {
        // A centered half-size box on a 640x480 image.
        let geometry = BoxGeometry::NormalizedCenter {
            cx: 0.5,
            cy: 0.5,
            w: 0.5,
            h: 0.5,
        };
        let bbox = geometry.resolve(640, 480);
        assert!((bbox.x - 160.0).abs() < 1e-9);
        assert!((bbox.y - 120.0).abs() < 1e-9);
        assert!((bbox.width - 320.0).abs() < 1e-9);
        assert!((bbox.height - 240.0).abs() < 1e-9);
    }

    #[test]
    fn test_pixel_geometry_passthrough() {
        let bbox = BBox::from_xywh(10.0, 20.0, 30.0, 40.0);
        assert_eq!(BoxGeometry::Pixels(bbox).resolve(999, 999), bbox);
    }
}
