use std::path::PathBuf;
use thiserror::Error;

use crate::ingest::diagnostics::IngestionReport;

/// The main error type for labelport operations.
#[derive(Debug, Error)]
pub enum LabelportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid image directory {path}: {message}")]
    ImageDirInvalid { path: PathBuf, message: String },

    #[error("Failed to read dimensions of {path}: {source}")]
    ImageDimensionRead {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("Ingestion failed with {error_count} error(s) and {warning_count} warning(s)")]
    IngestFailed {
        accepted: usize,
        error_count: usize,
        warning_count: usize,
        report: IngestionReport,
    },
}
