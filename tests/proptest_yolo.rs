//! Property tests for the YOLO coordinate round-trip.
//!
//! A box defined in absolute pixels, normalized to center form by the test
//! and fed through ingestion, must reproduce the original box within a
//! pixel.

use proptest::prelude::*;

use labelport::{ingest, AnnotationFormat, ClassRegistry, ImageRecord, SourceFile};

/// Pixel boxes that fit inside the given image with at least 1px of size.
fn arb_pixel_box(image_w: u32, image_h: u32) -> impl Strategy<Value = (f64, f64, f64, f64)> {
    let iw = image_w as f64;
    let ih = image_h as f64;
    (1.0..(iw / 2.0), 1.0..(ih / 2.0)).prop_flat_map(move |(w, h)| {
        (0.0..(iw - w), 0.0..(ih - h), Just(w), Just(h))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn yolo_round_trip_is_within_one_pixel(
        (x, y, w, h) in arb_pixel_box(640, 480),
        class_id in 0usize..5,
    ) {
        let (image_w, image_h) = (640.0_f64, 480.0_f64);
        let line = format!(
            "{} {:.9} {:.9} {:.9} {:.9}\n",
            class_id,
            (x + w / 2.0) / image_w,
            (y + h / 2.0) / image_h,
            w / image_w,
            h / image_h,
        );

        let mut images = vec![ImageRecord::new(1u64, "photo.jpg", 640, 480)];
        let mut registry = ClassRegistry::new();
        let files = [SourceFile::new("photo.txt", line.into_bytes())];

        let report = ingest(AnnotationFormat::Yolo, &files, &mut images, &mut registry);
        prop_assert_eq!(report.accepted, 1, "diagnostics: {:?}", report.diagnostics);

        let bbox = images[0].annotations[0].bbox;
        prop_assert!((bbox.x - x).abs() <= 1.0, "x: {} vs {}", bbox.x, x);
        prop_assert!((bbox.y - y).abs() <= 1.0, "y: {} vs {}", bbox.y, y);
        prop_assert!((bbox.width - w).abs() <= 1.0, "w: {} vs {}", bbox.width, w);
        prop_assert!((bbox.height - h).abs() <= 1.0, "h: {} vs {}", bbox.height, h);
    }

    #[test]
    fn accepted_boxes_always_have_positive_area(
        (x, y, w, h) in arb_pixel_box(1000, 1000),
    ) {
        let (image_w, image_h) = (1000.0_f64, 1000.0_f64);
        let line = format!(
            "0 {:.9} {:.9} {:.9} {:.9}\n",
            (x + w / 2.0) / image_w,
            (y + h / 2.0) / image_h,
            w / image_w,
            h / image_h,
        );

        let mut images = vec![ImageRecord::new(1u64, "photo.jpg", 1000, 1000)];
        let mut registry = ClassRegistry::new();
        let files = [SourceFile::new("photo.txt", line.into_bytes())];

        let report = ingest(AnnotationFormat::Yolo, &files, &mut images, &mut registry);
        prop_assert_eq!(report.accepted, 1);

        let bbox = images[0].annotations[0].bbox;
        prop_assert!(bbox.width > 0.0);
        prop_assert!(bbox.height > 0.0);
        prop_assert!(bbox.x >= 0.0);
        prop_assert!(bbox.y >= 0.0);
    }
}
