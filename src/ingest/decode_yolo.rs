//! YOLO per-image text decoder.
//!
//! Each `.txt` file is named after the image it annotates (extension
//! swapped), with one detection per line:
//!
//! ```text
//! class_id center_x center_y width height [confidence]
//! ```
//!
//! All four coordinates are normalized to [0, 1]; conversion to absolute
//! pixels needs the matched image's dimensions, so decoded lines carry
//! normalized center geometry and the orchestrator resolves them after
//! matching. Class names come from an optional class-map file in the batch:
//! `data.yaml` (Ultralytics style, `names:` as a sequence or index mapping)
//! or one of the reserved plain-text names, one class per line.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::{RawDetection, SourceFile, SourceKey};
use crate::ingest::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticContext};
use crate::model::BoxGeometry;

/// Reserved class-map file names, matched case-insensitively.
const CLASS_FILE_NAMES: [&str; 3] = ["classes.txt", "class_names.txt", "names.txt"];
const DATA_YAML_NAME: &str = "data.yaml";
const LABEL_EXTENSION: &str = "txt";

/// Ordered class names; line index (or mapping key) is the class id.
#[derive(Debug, Default)]
struct ClassMap {
    names: Vec<String>,
}

impl ClassMap {
    /// Class ids beyond the map (or with no map at all) degrade to a
    /// synthetic label.
    fn label_for(&self, class_id: usize) -> String {
        self.names
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{}", class_id))
    }
}

#[derive(Debug, Deserialize)]
struct DataYaml {
    names: DataYamlNames,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DataYamlNames {
    Sequence(Vec<String>),
    Mapping(BTreeMap<usize, String>),
}

/// Decodes a YOLO batch into raw detections.
///
/// Per-line failures are diagnostics, never fatal; the orchestrator raises
/// the batch-level empty-result error if nothing survives.
pub(crate) fn decode(
    files: &[SourceFile],
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<RawDetection>, Diagnostic> {
    let class_map = read_class_map(files, diagnostics);

    let mut detections = Vec::new();

    for file in files {
        if is_class_map_file(&file.name) || !file.extension_is(LABEL_EXTENSION) {
            continue;
        }

        let text = file.text();
        if text.trim().is_empty() {
            log::debug!("skipping empty label file '{}'", file.name);
            continue;
        }

        let stem = file.stem().to_string();

        for (line_index, line) in text.lines().enumerate() {
            let line_number = line_index + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match parse_label_line(trimmed) {
                Ok(row) => detections.push(RawDetection {
                    id: format!("{}_{}", stem, line_index),
                    key: SourceKey::Stem(stem.clone()),
                    label: class_map.label_for(row.class_id),
                    geometry: BoxGeometry::NormalizedCenter {
                        cx: row.cx,
                        cy: row.cy,
                        w: row.w,
                        h: row.h,
                    },
                    confidence: row.confidence,
                    origin: DiagnosticContext::record(&file.name, line_number),
                }),
                Err(reason) => {
                    log::warn!("{}:{}: {}", file.name, line_number, reason.message);
                    diagnostics.push(Diagnostic::warning(
                        reason.code,
                        format!("{}; raw line: '{}'", reason.message, trimmed),
                        DiagnosticContext::record(&file.name, line_number),
                    ));
                }
            }
        }
    }

    Ok(detections)
}

#[derive(Debug, PartialEq)]
struct LabelRow {
    class_id: usize,
    cx: f64,
    cy: f64,
    w: f64,
    h: f64,
    confidence: f64,
}

#[derive(Debug)]
struct LineError {
    code: DiagnosticCode,
    message: String,
}

impl LineError {
    fn malformed(message: impl Into<String>) -> Self {
        Self {
            code: DiagnosticCode::MalformedRecord,
            message: message.into(),
        }
    }
}

fn parse_label_line(line: &str) -> Result<LabelRow, LineError> {
    // Take at most 6 tokens so pathological inputs do not allocate unbounded memory.
    let tokens: Vec<&str> = line.split_whitespace().take(6).collect();

    if tokens.len() < 5 {
        return Err(LineError::malformed(format!(
            "expected at least 5 fields, found {}",
            tokens.len()
        )));
    }

    let class_id = tokens[0].parse::<usize>().map_err(|_| {
        LineError::malformed(format!(
            "invalid class_id '{}'; expected non-negative integer",
            tokens[0]
        ))
    })?;

    let cx = parse_f64_token(tokens[1], "center_x")?;
    let cy = parse_f64_token(tokens[2], "center_y")?;
    let w = parse_f64_token(tokens[3], "width")?;
    let h = parse_f64_token(tokens[4], "height")?;

    for (name, value) in [("center_x", cx), ("center_y", cy), ("width", w), ("height", h)] {
        if !(0.0..=1.0).contains(&value) {
            return Err(LineError {
                code: DiagnosticCode::CoordinateOutOfRange,
                message: format!("{} {} is outside the normalized range [0, 1]", name, value),
            });
        }
    }

    let confidence = match tokens.get(5) {
        Some(raw) => parse_f64_token(raw, "confidence")?,
        None => 1.0,
    };

    Ok(LabelRow {
        class_id,
        cx,
        cy,
        w,
        h,
        confidence,
    })
}

fn parse_f64_token(raw: &str, field_name: &str) -> Result<f64, LineError> {
    raw.parse::<f64>().map_err(|_| {
        LineError::malformed(format!(
            "invalid {} '{}'; expected floating-point number",
            field_name, raw
        ))
    })
}

fn is_class_map_file(name: &str) -> bool {
    CLASS_FILE_NAMES
        .iter()
        .any(|reserved| name.eq_ignore_ascii_case(reserved))
        || name.eq_ignore_ascii_case(DATA_YAML_NAME)
}

/// Finds and parses the batch's class map, if any.
///
/// `data.yaml` wins over the reserved plain-text names when both are
/// present. A class map that fails to parse degrades to synthetic labels
/// with a warning rather than failing the batch.
fn read_class_map(files: &[SourceFile], diagnostics: &mut Vec<Diagnostic>) -> ClassMap {
    if let Some(file) = files
        .iter()
        .find(|file| file.name.eq_ignore_ascii_case(DATA_YAML_NAME))
    {
        match serde_yaml::from_str::<DataYaml>(&file.text()) {
            Ok(parsed) => {
                let names = yaml_names(parsed.names);
                log::debug!("found {} class name(s) in '{}'", names.len(), file.name);
                return ClassMap { names };
            }
            Err(source) => {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticCode::MalformedDocument,
                    format!("could not parse class map: {}", source),
                    DiagnosticContext::file(&file.name),
                ));
                return ClassMap::default();
            }
        }
    }

    if let Some(file) = files.iter().find(|file| {
        CLASS_FILE_NAMES
            .iter()
            .any(|reserved| file.name.eq_ignore_ascii_case(reserved))
    }) {
        let names: Vec<String> = file
            .text()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        log::debug!("found {} class name(s) in '{}'", names.len(), file.name);
        return ClassMap { names };
    }

    ClassMap::default()
}

fn yaml_names(names: DataYamlNames) -> Vec<String> {
    match names {
        DataYamlNames::Sequence(names) => names,
        DataYamlNames::Mapping(mapping) => {
            let Some(max_index) = mapping.keys().max().copied() else {
                return Vec::new();
            };
            let mut names = vec![String::new(); max_index + 1];
            for (index, name) in mapping {
                names[index] = name;
            }
            for (index, name) in names.iter_mut().enumerate() {
                if name.trim().is_empty() {
                    *name = format!("class_{}", index);
                }
            }
            names
        }
    }
}
