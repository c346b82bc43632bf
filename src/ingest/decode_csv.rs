//! Flat CSV decoder.
//!
//! A single file, header row first. The six required columns are located by
//! case-insensitive alias matching rather than fixed names, so exports from
//! different tools (`filename` vs `image_path`, `class` vs `label`, `x` vs
//! `left`, ...) all resolve without reconfiguration. Coordinates are already
//! absolute pixels.

use super::{RawDetection, SourceFile, SourceKey};
use crate::ingest::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticContext};
use crate::model::{BBox, BoxGeometry};

/// Resolved positions of the six required columns.
#[derive(Debug, PartialEq)]
struct ColumnMap {
    filename: usize,
    class: usize,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
}

impl ColumnMap {
    /// Locates each required column in the (lowercased, trimmed) header.
    ///
    /// Returns the alias list of the first missing column on failure.
    fn locate(headers: &[String]) -> Result<Self, &'static str> {
        let find = |predicate: &dyn Fn(&str) -> bool| {
            headers.iter().position(|header| predicate(header))
        };

        let filename = find(&|h| h.contains("filename") || h.contains("file") || h.contains("image"))
            .ok_or("filename/file/image")?;
        let class = find(&|h| h.contains("class") || h.contains("label") || h.contains("category"))
            .ok_or("class/label/category")?;
        let x = find(&|h| h == "x" || h == "x1" || h == "left").ok_or("x/x1/left")?;
        let y = find(&|h| h == "y" || h == "y1" || h == "top").ok_or("y/y1/top")?;
        let width = find(&|h| h.contains("width") || h == "w").ok_or("width/w")?;
        let height = find(&|h| h.contains("height") || h == "h").ok_or("height/h")?;

        Ok(Self {
            filename,
            class,
            x,
            y,
            width,
            height,
        })
    }

    fn max_index(&self) -> usize {
        [self.filename, self.class, self.x, self.y, self.width, self.height]
            .into_iter()
            .max()
            .unwrap_or(0)
    }
}

/// Decodes a CSV batch into raw detections.
///
/// A missing required column is structural and aborts before any row is
/// processed; individual bad rows are diagnostics.
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

    let text = file.text();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| {
            Diagnostic::error(
                DiagnosticCode::MalformedDocument,
                format!("could not read header row: {}", source),
                DiagnosticContext::file(&file.name),
            )
        })?
        .iter()
        .map(|header| header.trim().to_ascii_lowercase())
        .collect();

    let columns = ColumnMap::locate(&headers).map_err(|aliases| {
        Diagnostic::error(
            DiagnosticCode::MissingColumn,
            format!("CSV must have a {} column", aliases),
            DiagnosticContext::file(&file.name),
        )
    })?;

    let mut detections = Vec::new();

    for (row_index, result) in reader.records().enumerate() {
        // Header occupies line 1; data rows start at line 2.
        let line_number = row_index + 2;
        let context = DiagnosticContext::record(&file.name, line_number);

        let record = match result {
            Ok(record) => record,
            Err(source) => {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticCode::MalformedRecord,
                    format!("unreadable row: {}", source),
                    context,
                ));
                continue;
            }
        };

        if record.len() <= columns.max_index() {
            diagnostics.push(Diagnostic::warning(
                DiagnosticCode::MalformedRecord,
                format!(
                    "insufficient columns: expected at least {}, found {}",
                    columns.max_index() + 1,
                    record.len()
                ),
                context,
            ));
            continue;
        }

        let filename = record.get(columns.filename).unwrap_or_default();
        let class_name = record.get(columns.class).unwrap_or_default();
        if filename.is_empty() || class_name.is_empty() {
            diagnostics.push(Diagnostic::warning(
                DiagnosticCode::MalformedRecord,
                "missing filename or class",
                context,
            ));
            continue;
        }

        let coordinates = [
            ("x", columns.x),
            ("y", columns.y),
            ("width", columns.width),
            ("height", columns.height),
        ]
        .map(|(name, index)| {
            let raw = record.get(index).unwrap_or_default();
            (name, raw, raw.parse::<f64>())
        });

        if let Some((name, raw, _)) = coordinates
            .iter()
            .find(|(_, _, parsed)| parsed.is_err())
        {
            diagnostics.push(Diagnostic::warning(
                DiagnosticCode::MalformedRecord,
                format!("non-numeric {} value '{}'", name, raw),
                context,
            ));
            continue;
        }

        let [x, y, width, height] = coordinates.map(|(_, _, parsed)| {
            // Checked just above; rows with a parse failure never reach here.
            parsed.unwrap_or_default()
        });

        detections.push(RawDetection {
            id: format!("csv_{}", row_index + 1),
            key: SourceKey::Filename(filename.to_string()),
            label: class_name.to_string(),
            geometry: BoxGeometry::Pixels(BBox::from_xywh(x, y, width, height)),
            confidence: 1.0,
            origin: context,
        });
    }

    Ok(detections)
}
