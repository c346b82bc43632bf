//! Pascal VOC XML decoder.
//!
//! One XML document per image: a `<filename>` element names the image, and
//! each `<object>` carries a class `<name>` and a `<bndbox>` with
//! `xmin`/`ymin`/`xmax`/`ymax` corners. Corners convert to corner+size form.
//!
//! A file that fails to parse as XML (or names no image) is skipped with a
//! diagnostic rather than failing the batch; the other files still decode.

use roxmltree::Node;

use super::{RawDetection, SourceFile, SourceKey};
use crate::ingest::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticContext};
use crate::model::{BBox, BoxGeometry};

const VOC_XML_EXTENSION: &str = "xml";

/// Decodes a Pascal VOC batch into raw detections.
pub(crate) fn decode(
    files: &[SourceFile],
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<RawDetection>, Diagnostic> {
    let mut detections = Vec::new();

    for file in files {
        if !file.extension_is(VOC_XML_EXTENSION) {
            continue;
        }

        let text = file.text();
        let document = match roxmltree::Document::parse(&text) {
            Ok(document) => document,
            Err(source) => {
                log::warn!("skipping '{}': XML parse error: {}", file.name, source);
                diagnostics.push(Diagnostic::warning(
                    DiagnosticCode::MalformedDocument,
                    format!("skipping file: XML parse error: {}", source),
                    DiagnosticContext::file(&file.name),
                ));
                continue;
            }
        };

        let Some(filename) = document
            .descendants()
            .find(|node| node.has_tag_name("filename"))
            .and_then(|node| node.text())
            .map(str::trim)
            .filter(|text| !text.is_empty())
        else {
            diagnostics.push(Diagnostic::warning(
                DiagnosticCode::MalformedRecord,
                "skipping file: no <filename> element",
                DiagnosticContext::file(&file.name),
            ));
            continue;
        };

        let objects = document
            .descendants()
            .filter(|node| node.has_tag_name("object"));

        for (object_index, object) in objects.enumerate() {
            let context = DiagnosticContext::record(&file.name, object_index);

            let Some(class_name) = optional_child_text(object, "name") else {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticCode::MalformedRecord,
                    "object has no <name> element",
                    context,
                ));
                continue;
            };

            let Some(bndbox) = child_element(object, "bndbox") else {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticCode::MalformedRecord,
                    "object has no <bndbox> element",
                    context,
                ));
                continue;
            };

            let corners = ["xmin", "ymin", "xmax", "ymax"]
                .map(|tag| (tag, parse_corner(bndbox, tag)));
            if let Some((tag, _)) = corners.iter().find(|(_, value)| value.is_none()) {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticCode::MalformedRecord,
                    format!("missing or invalid <{}> in <bndbox>", tag),
                    context,
                ));
                continue;
            }
            let [xmin, ymin, xmax, ymax] =
                corners.map(|(_, value)| value.unwrap_or_default());

            if xmin >= xmax || ymin >= ymax {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticCode::DegenerateBox,
                    format!(
                        "degenerate box: xmin={}, ymin={}, xmax={}, ymax={}",
                        xmin, ymin, xmax, ymax
                    ),
                    context,
                ));
                continue;
            }

            detections.push(RawDetection {
                id: format!("pascal_{}_{}", file.name, object_index),
                key: SourceKey::Filename(filename.to_string()),
                label: class_name,
                geometry: BoxGeometry::Pixels(BBox::from_corners(xmin, ymin, xmax, ymax)),
                confidence: 1.0,
                origin: context,
            });
        }
    }

    Ok(detections)
}

fn parse_corner(bndbox: Node<'_, '_>, tag: &str) -> Option<f64> {
    optional_child_text(bndbox, tag)?.parse::<f64>().ok()
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == tag)
}

fn optional_child_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    child_element(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToOwned::to_owned)
}
