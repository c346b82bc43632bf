//! Fuzzy matching of annotation filenames to loaded images.
//!
//! Annotation exports rarely agree with the loaded images on the exact
//! spelling of a filename: COCO files often carry path prefixes, tools strip
//! or swap extensions, and YOLO identifies images by the label file's base
//! name alone. Matching runs an ordered chain of rules and stops at the
//! first hit; rule priority outranks image order, so an exact match anywhere
//! in the collection always beats a suffix match on an earlier image.

use super::SourceKey;
use crate::model::ImageRecord;

/// A single matching rule: does `image` (the loaded image's name, possibly
/// extension-stripped) correspond to `source` (the annotation's stated name)?
type MatchRule = fn(image: &str, source: &str) -> bool;

/// The rule chain, in priority order. The order is a deliberate tie-break.
const MATCH_RULES: [MatchRule; 3] = [exact, image_is_suffix, source_is_suffix];

fn exact(image: &str, source: &str) -> bool {
    image == source
}

/// Handles path-prefixed source names, e.g. `some/path/photo.jpg`.
fn image_is_suffix(image: &str, source: &str) -> bool {
    !image.is_empty() && source.ends_with(image)
}

/// Handles extension/prefix mismatches on the source side.
fn source_is_suffix(image: &str, source: &str) -> bool {
    !source.is_empty() && image.ends_with(source)
}

/// Resolves a source key to the index of a loaded image, or `None`.
///
/// An unmatched record is not an error; the orchestrator records a
/// diagnostic and drops it.
pub(crate) fn resolve(key: &SourceKey, images: &[ImageRecord]) -> Option<usize> {
    let source = key.as_str();
    if source.is_empty() {
        return None;
    }

    for rule in MATCH_RULES {
        for (index, image) in images.iter().enumerate() {
            let candidate = match key {
                SourceKey::Filename(_) => image.filename.as_str(),
                SourceKey::Stem(_) => stem_of(&image.filename),
            };
            if rule(candidate, source) {
                return Some(index);
            }
        }
    }

    None
}

/// Strips the final extension, leaving the rest of the name untouched.
fn stem_of(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(dot) if dot > 0 => &filename[..dot],
        _ => filename,
    }
}
