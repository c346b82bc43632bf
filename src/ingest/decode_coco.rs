//! COCO JSON decoder.
//!
//! One JSON document carries the whole batch: `categories` (id -> name),
//! `images` (id -> file_name) and `annotations` (image_id, category_id,
//! bbox as `[x, y, w, h]` in absolute pixels, optional `score`).
//!
//! The root document is parsed strictly - unparseable JSON or a non-object
//! root has no recoverable structure and aborts the batch. Individual
//! annotation records, by contrast, are deserialized one at a time so a
//! single malformed entry costs only itself. A missing `categories` array
//! is accepted; unknown category ids degrade to a synthetic `class_<id>`
//! label.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::{RawDetection, SourceFile, SourceKey};
use crate::ingest::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticContext};
use crate::model::{BBox, BoxGeometry};

// ============================================================================
// COCO Schema Types (internal to this module)
// ============================================================================

/// Top-level COCO document. All three arrays may be absent.
#[derive(Debug, Deserialize)]
struct CocoDocument {
    #[serde(default)]
    categories: Vec<CocoCategory>,

    #[serde(default)]
    images: Vec<CocoImage>,

    /// Kept as raw values so each record can fail deserialization on its own.
    #[serde(default)]
    annotations: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CocoCategory {
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct CocoImage {
    id: i64,
    file_name: String,
}

#[derive(Debug, Deserialize)]
struct CocoAnnotation {
    #[serde(default)]
    id: Option<i64>,

    image_id: i64,
    category_id: i64,

    /// COCO bbox format: [x, y, width, height] with (x, y) as top-left corner.
    bbox: [f64; 4],

    /// Score/confidence for detection results.
    #[serde(default)]
    score: Option<f64>,
}

// ============================================================================
// Decoding
// ============================================================================

/// Decodes a COCO JSON batch into raw detections.
///
/// Pre-flight guarantees exactly one file. A bad root document is the one
/// structural failure; everything else degrades per record.
pub(crate) fn decode(
    files: &[SourceFile],
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<RawDetection>, Diagnostic> {
    let Some(file) = files.first() else {
        return Err(Diagnostic::error(
            DiagnosticCode::EmptyBatch,
            "no files selected",
            DiagnosticContext::Batch,
        ));
    };

    let document: CocoDocument = serde_json::from_slice(file.bytes()).map_err(|source| {
        Diagnostic::error(
            DiagnosticCode::MalformedDocument,
            format!("invalid JSON: {}", source),
            DiagnosticContext::file(&file.name),
        )
    })?;

    let category_names: BTreeMap<i64, String> = document
        .categories
        .into_iter()
        .map(|category| (category.id, category.name))
        .collect();

    let image_names: BTreeMap<i64, String> = document
        .images
        .into_iter()
        .map(|image| (image.id, image.file_name))
        .collect();

    let mut detections = Vec::with_capacity(document.annotations.len());

    for (index, value) in document.annotations.into_iter().enumerate() {
        let annotation: CocoAnnotation = match serde_json::from_value(value) {
            Ok(annotation) => annotation,
            Err(source) => {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticCode::MalformedRecord,
                    format!("skipping malformed annotation: {}", source),
                    DiagnosticContext::record(&file.name, index),
                ));
                continue;
            }
        };

        let Some(source_filename) = image_names.get(&annotation.image_id) else {
            diagnostics.push(Diagnostic::warning(
                DiagnosticCode::UnknownImageRef,
                format!(
                    "annotation references image id {} absent from the images array",
                    annotation.image_id
                ),
                DiagnosticContext::record(&file.name, index),
            ));
            continue;
        };

        let label = category_names
            .get(&annotation.category_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{}", annotation.category_id));

        let [x, y, w, h] = annotation.bbox;
        let id = annotation
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| format!("coco_{}", index));

        detections.push(RawDetection {
            id,
            key: SourceKey::Filename(source_filename.clone()),
            label,
            geometry: BoxGeometry::Pixels(BBox::from_xywh(x, y, w, h)),
            confidence: annotation.score.unwrap_or(1.0),
            origin: DiagnosticContext::record(&file.name, index),
        });
    }

    Ok(detections)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_str(json: &str) -> (Vec<RawDetection>, Vec<Diagnostic>) {
        let files = [SourceFile::new("anns.json", json.as_bytes().to_vec())];
        let mut diagnostics = Vec::new();
        let detections = decode(&files, &mut diagnostics).expect("decode should succeed");
        (detections, diagnostics)
    }

    fn sample_coco_json() -> &'static str {
        r#"{
            "categories": [
                {"id": 1, "name": "person"}
            ],
            "images": [
                {"id": 1, "width": 640, "height": 480, "file_name": "image001.jpg"}
            ],
            "annotations": [
                {
                    "id": 11,
                    "image_id": 1,
                    "category_id": 1,
                    "bbox": [10.0, 20.0, 90.0, 60.0]
                }
            ]
        }"#
    }

    #[test]
    fn test_decode_basic() {
        let (detections, diagnostics) = decode_str(sample_coco_json());
        assert!(diagnostics.is_empty());
        assert_eq!(detections.len(), 1);

        let detection = &detections[0];
        assert_eq!(detection.id, "11");
        assert_eq!(detection.label, "person");
        assert_eq!(detection.key, SourceKey::Filename("image001.jpg".to_string()));
        assert_eq!(
            detection.geometry,
            BoxGeometry::Pixels(BBox::from_xywh(10.0, 20.0, 90.0, 60.0))
        );
        assert_eq!(detection.confidence, 1.0);
    }

    #[test]
    fn test_unknown_category_gets_synthetic_label() {
        let json = r#"{
            "images": [{"id": 1, "file_name": "a.jpg"}],
            "annotations": [
                {"id": 1, "image_id": 1, "category_id": 7, "bbox": [0, 0, 5, 5]}
            ]
        }"#;
        let (detections, _) = decode_str(json);
        assert_eq!(detections[0].label, "class_7");
    }

    #[test]
    fn test_score_maps_to_confidence() {
        let json = r#"{
            "images": [{"id": 1, "file_name": "a.jpg"}],
            "annotations": [
                {"id": 1, "image_id": 1, "category_id": 1, "bbox": [0, 0, 5, 5], "score": 0.42}
            ]
        }"#;
        let (detections, _) = decode_str(json);
        assert_eq!(detections[0].confidence, 0.42);
    }

    #[test]
    fn test_malformed_annotation_is_skipped_not_fatal() {
        let json = r#"{
            "images": [{"id": 1, "file_name": "a.jpg"}],
            "annotations": [
                {"id": 1, "image_id": 1, "category_id": 1, "bbox": "nope"},
                {"id": 2, "image_id": 1, "category_id": 1, "bbox": [0, 0, 5, 5]}
            ]
        }"#;
        let (detections, diagnostics) = decode_str(json);
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].id, "2");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticCode::MalformedRecord);
    }

    #[test]
    fn test_unknown_image_id_is_skipped() {
        let json = r#"{
            "images": [{"id": 1, "file_name": "a.jpg"}],
            "annotations": [
                {"id": 1, "image_id": 99, "category_id": 1, "bbox": [0, 0, 5, 5]}
            ]
        }"#;
        let (detections, diagnostics) = decode_str(json);
        assert!(detections.is_empty());
        assert_eq!(diagnostics[0].code, DiagnosticCode::UnknownImageRef);
    }

    #[test]
    fn test_bad_root_is_structural() {
        let files = [SourceFile::new("anns.json", b"not json at all".to_vec())];
        let mut diagnostics = Vec::new();
        let err = decode(&files, &mut diagnostics).unwrap_err();
        assert_eq!(err.code, DiagnosticCode::MalformedDocument);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_array_root_is_structural() {
        let files = [SourceFile::new("anns.json", b"[1, 2, 3]".to_vec())];
        let mut diagnostics = Vec::new();
        let err = decode(&files, &mut diagnostics).unwrap_err();
        assert_eq!(err.code, DiagnosticCode::MalformedDocument);
    }

    #[test]
    fn test_missing_categories_array_is_accepted() {
        let json = r#"{
            "images": [{"id": 1, "file_name": "a.jpg"}],
            "annotations": [
                {"id": 1, "image_id": 1, "category_id": 3, "bbox": [1, 2, 3, 4]}
            ]
        }"#;
        let (detections, diagnostics) = decode_str(json);
        assert!(diagnostics.is_empty());
        assert_eq!(detections[0].label, "class_3");
    }

    #[test]
    fn test_missing_annotation_id_is_synthesized() {
        let json = r#"{
            "images": [{"id": 1, "file_name": "a.jpg"}],
            "annotations": [
                {"image_id": 1, "category_id": 1, "bbox": [0, 0, 5, 5]}
            ]
        }"#;
        let (detections, _) = decode_str(json);
        assert_eq!(detections[0].id, "coco_0");
    }
}
