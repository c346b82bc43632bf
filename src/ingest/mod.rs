//! Annotation ingestion: decode, match, validate, attach.
//!
//! The entry point is [`ingest`]: given a declared format, a batch of
//! uploaded files and the already-loaded image collection, it normalizes
//! every well-formed record into an [`Annotation`](crate::model::Annotation)
//! on the matching image and reports everything it skipped.
//!
//! The pipeline is strictly staged. Decoders are pure transforms from bytes
//! to [`RawDetection`] tuples and never touch the image collection; image
//! matching, geometry resolution, degeneracy checks, registry updates and
//! attachment all happen here, sequentially, so a batch either runs to
//! completion or fails structurally with no partially-visible state beyond
//! the records already accepted.

pub mod diagnostics;

mod decode_coco;
mod decode_csv;
mod decode_voc;
mod decode_yolo;
mod matcher;
mod preflight;

use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::LabelportError;
use crate::model::{Annotation, BoxGeometry, ImageRecord};
use crate::palette::ClassRegistry;
use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticContext, IngestionReport};

/// The annotation export formats labelport understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnnotationFormat {
    /// COCO JSON: one document for the whole batch.
    Coco,
    /// YOLO text: one `.txt` per image, normalized center-form boxes.
    Yolo,
    /// Flat CSV: one file, alias-matched header columns, pixel boxes.
    Csv,
    /// Pascal VOC XML: one document per image, corner-form boxes.
    Pascal,
}

impl AnnotationFormat {
    /// All supported formats, in display order.
    pub const ALL: [AnnotationFormat; 4] = [
        AnnotationFormat::Coco,
        AnnotationFormat::Yolo,
        AnnotationFormat::Csv,
        AnnotationFormat::Pascal,
    ];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationFormat::Coco => "coco",
            AnnotationFormat::Yolo => "yolo",
            AnnotationFormat::Csv => "csv",
            AnnotationFormat::Pascal => "pascal",
        }
    }
}

impl fmt::Display for AnnotationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnotationFormat {
    type Err = LabelportError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "coco" | "coco-json" => Ok(AnnotationFormat::Coco),
            "yolo" => Ok(AnnotationFormat::Yolo),
            "csv" => Ok(AnnotationFormat::Csv),
            "pascal" | "pascal-voc" | "voc" => Ok(AnnotationFormat::Pascal),
            other => Err(LabelportError::UnsupportedFormat(format!(
                "'{}' (supported: coco, yolo, csv, pascal)",
                other
            ))),
        }
    }
}

/// One uploaded file: the name it was uploaded under plus its raw bytes.
#[derive(Clone, Debug)]
pub struct SourceFile {
    /// The declared original name (not a filesystem path).
    pub name: String,
    data: Vec<u8>,
}

impl SourceFile {
    /// Creates a source file from a name and raw contents.
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Reads a source file from disk, keeping only the final name component.
    pub fn from_path(path: &Path) -> Result<Self, LabelportError> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let data = fs::read(path).map_err(LabelportError::Io)?;
        Ok(Self { name, data })
    }

    /// Raw contents.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Contents as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    /// True if the name ends in `.{extension}`, case-insensitively.
    pub(crate) fn extension_is(&self, extension: &str) -> bool {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.eq_ignore_ascii_case(extension))
            .unwrap_or(false)
    }

    /// The name with its final extension stripped.
    pub(crate) fn stem(&self) -> &str {
        match self.name.rfind('.') {
            Some(dot) if dot > 0 => &self.name[..dot],
            _ => &self.name,
        }
    }
}

/// How a decoded record identifies its image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum SourceKey {
    /// A full filename, possibly path-prefixed.
    Filename(String),
    /// An extension-less base name (YOLO label files).
    Stem(String),
}

impl SourceKey {
    pub(crate) fn as_str(&self) -> &str {
        match self {
            SourceKey::Filename(name) | SourceKey::Stem(name) => name,
        }
    }
}

/// The common interchange shape every decoder produces, before matching.
#[derive(Clone, Debug)]
pub(crate) struct RawDetection {
    /// Annotation id, unique within the record's source file.
    pub id: String,
    /// How to find the target image.
    pub key: SourceKey,
    /// Class name (possibly synthetic, e.g. `class_7`).
    pub label: String,
    /// Box coordinates, pixel or normalized-center form.
    pub geometry: BoxGeometry,
    /// Confidence as stated by the source; 1.0 where the format has none.
    pub confidence: f64,
    /// Where the record came from, for diagnostics raised after decode.
    pub origin: DiagnosticContext,
}

/// Ingests one batch of annotation files against the loaded images.
///
/// Runs pre-flight validation, decodes with the format's decoder, then for
/// each decoded record: resolves the target image (skip with a diagnostic if
/// unmatched), resolves and clamps the box, drops degenerate boxes, assigns
/// the class color, and appends the resulting annotation to the image.
///
/// Never panics and never aborts on a per-record failure; structural
/// failures (bad JSON root, missing CSV column, wrong batch shape) return a
/// report with zero accepted records and a single error diagnostic.
/// Ingestion is not idempotent: running the same batch twice appends
/// duplicate annotations.
pub fn ingest(
    format: AnnotationFormat,
    files: &[SourceFile],
    images: &mut [ImageRecord],
    registry: &mut ClassRegistry,
) -> IngestionReport {
    if let Err(diagnostic) = preflight::check(format, files) {
        return IngestionReport::structural(diagnostic);
    }

    let mut diagnostics = Vec::new();
    let decoded = match format {
        AnnotationFormat::Coco => decode_coco::decode(files, &mut diagnostics),
        AnnotationFormat::Yolo => decode_yolo::decode(files, &mut diagnostics),
        AnnotationFormat::Csv => decode_csv::decode(files, &mut diagnostics),
        AnnotationFormat::Pascal => decode_voc::decode(files, &mut diagnostics),
    };

    let detections = match decoded {
        Ok(detections) => detections,
        Err(diagnostic) => return IngestionReport::structural(diagnostic),
    };

    let mut accepted = 0usize;

    for detection in detections {
        let Some(index) = matcher::resolve(&detection.key, images) else {
            log::warn!(
                "no loaded image matches '{}' ({})",
                detection.key.as_str(),
                detection.origin
            );
            diagnostics.push(Diagnostic::warning(
                DiagnosticCode::UnmatchedFilename,
                format!("no loaded image matches '{}'", detection.key.as_str()),
                detection.origin,
            ));
            continue;
        };

        let image = &mut images[index];
        let bbox = detection
            .geometry
            .resolve(image.width, image.height)
            .clamp_origin();

        if !bbox.is_finite() || bbox.is_degenerate() {
            diagnostics.push(Diagnostic::warning(
                DiagnosticCode::DegenerateBox,
                format!(
                    "box {}x{} at ({}, {}) has no positive area",
                    bbox.width, bbox.height, bbox.x, bbox.y
                ),
                detection.origin,
            ));
            continue;
        }

        let color = registry.assign_color(&detection.label);
        image.annotations.push(Annotation::new(
            detection.id,
            detection.label,
            bbox,
            detection.confidence,
            color,
        ));
        accepted += 1;
    }

    if accepted == 0 {
        if let Some(message) = nothing_accepted_message(format) {
            diagnostics.push(Diagnostic::error(
                DiagnosticCode::NothingAccepted,
                message,
                DiagnosticContext::Batch,
            ));
        }
    }

    IngestionReport {
        accepted,
        diagnostics,
    }
}

/// Guidance for batches where files were present but nothing survived.
///
/// YOLO/CSV/Pascal distinguish "wrong format selected" from "format correct
/// but sparse" this way. COCO returns `None`: a well-formed document
/// describing a disjoint image set is an empty success.
fn nothing_accepted_message(format: AnnotationFormat) -> Option<&'static str> {
    match format {
        AnnotationFormat::Yolo => Some(
            "no YOLO annotations were accepted: check that label lines are \
             'class_id center_x center_y width height' with coordinates in [0, 1] \
             and that label file names match loaded images",
        ),
        AnnotationFormat::Csv => Some(
            "no CSV annotations were accepted: check that filenames in the file \
             match loaded images",
        ),
        AnnotationFormat::Pascal => Some(
            "no Pascal VOC annotations were accepted: check that the XML files are \
             valid and their <filename> elements match loaded images",
        ),
        AnnotationFormat::Coco => None,
    }
}
