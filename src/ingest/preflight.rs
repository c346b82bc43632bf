//! Pre-flight checks run before any decode attempt.
//!
//! Each format has cheap structural expectations on the uploaded batch
//! (file count, extensions). Failing here yields a single pass/fail verdict
//! with a human-readable reason and spares the decoders from guessing what
//! a mis-selected batch was supposed to be.

use super::{AnnotationFormat, SourceFile};
use crate::ingest::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticContext};

/// Validates the batch shape for `format`.
pub(crate) fn check(format: AnnotationFormat, files: &[SourceFile]) -> Result<(), Diagnostic> {
    if files.is_empty() {
        return Err(Diagnostic::error(
            DiagnosticCode::EmptyBatch,
            "no files selected",
            DiagnosticContext::Batch,
        ));
    }

    match format {
        AnnotationFormat::Coco => single_file_with_extension(files, "json", "COCO"),
        AnnotationFormat::Csv => single_file_with_extension(files, "csv", "CSV"),
        AnnotationFormat::Yolo => any_file_with_extension(files, "txt", "YOLO"),
        AnnotationFormat::Pascal => any_file_with_extension(files, "xml", "Pascal VOC"),
    }
}

/// Formats that take a single document: exactly one file, right extension.
fn single_file_with_extension(
    files: &[SourceFile],
    extension: &str,
    format_name: &str,
) -> Result<(), Diagnostic> {
    if files.len() != 1 {
        return Err(Diagnostic::error(
            DiagnosticCode::WrongFileCount,
            format!(
                "{} format requires exactly one .{} file, got {}",
                format_name,
                extension,
                files.len()
            ),
            DiagnosticContext::Batch,
        ));
    }

    let file = &files[0];
    if !file.extension_is(extension) {
        return Err(Diagnostic::error(
            DiagnosticCode::WrongExtension,
            format!("{} file must have a .{} extension", format_name, extension),
            DiagnosticContext::file(&file.name),
        ));
    }

    Ok(())
}

/// Formats that take a file-per-image batch: at least one right-extension
/// file must be present (stray extras are ignored by the decoder).
fn any_file_with_extension(
    files: &[SourceFile],
    extension: &str,
    format_name: &str,
) -> Result<(), Diagnostic> {
    if files.iter().any(|file| file.extension_is(extension)) {
        Ok(())
    } else {
        Err(Diagnostic::error(
            DiagnosticCode::WrongExtension,
            format!("{} format requires .{} files", format_name, extension),
            DiagnosticContext::Batch,
        ))
    }
}
