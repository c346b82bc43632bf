//! Structured diagnostics for ingestion.
//!
//! Every skipped record and every batch-level failure is recorded here with
//! enough context (source file, record index, offending value) that a user
//! can see why an input was rejected without re-deriving it from scratch.

use std::fmt;

/// The result of one ingestion call.
///
/// Carries the number of annotations actually attached to images plus every
/// diagnostic raised along the way. Ephemeral: produced per call, never
/// persisted.
#[derive(Clone, Debug, Default)]
pub struct IngestionReport {
    /// Number of annotations accepted and attached to images.
    pub accepted: usize,

    /// All diagnostics raised during the call, in processing order.
    pub diagnostics: Vec<Diagnostic>,
}

impl IngestionReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the report for a batch that failed structurally: zero
    /// accepted records and exactly one error diagnostic.
    pub(crate) fn structural(diagnostic: Diagnostic) -> Self {
        Self {
            accepted: 0,
            diagnostics: vec![diagnostic],
        }
    }

    /// Adds a diagnostic to the report.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Returns the number of error-severity diagnostics.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// Returns the number of warning-severity diagnostics.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// Returns true if there are no error-severity diagnostics.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// Returns true if there are no diagnostics at all.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl fmt::Display for IngestionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Accepted {} annotation(s)", self.accepted)?;

        if self.diagnostics.is_empty() {
            return Ok(());
        }

        writeln!(
            f,
            "{} error(s), {} warning(s):",
            self.error_count(),
            self.warning_count()
        )?;
        for diagnostic in &self.diagnostics {
            writeln!(f, "  {}", diagnostic)?;
        }

        Ok(())
    }
}

/// A single diagnostic: why a record was skipped or a batch failed.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// The severity of the diagnostic.
    pub severity: Severity,

    /// A stable code for the diagnostic type.
    pub code: DiagnosticCode,

    /// A human-readable description.
    pub message: String,

    /// Where in the input the diagnostic arose.
    pub context: DiagnosticContext,
}

impl Diagnostic {
    /// Creates a new diagnostic.
    pub fn new(
        severity: Severity,
        code: DiagnosticCode,
        message: impl Into<String>,
        context: DiagnosticContext,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            context,
        }
    }

    /// Creates a new error-severity diagnostic.
    pub fn error(
        code: DiagnosticCode,
        message: impl Into<String>,
        context: DiagnosticContext,
    ) -> Self {
        Self::new(Severity::Error, code, message, context)
    }

    /// Creates a new warning-severity diagnostic.
    pub fn warning(
        code: DiagnosticCode,
        message: impl Into<String>,
        context: DiagnosticContext,
    ) -> Self {
        Self::new(Severity::Warning, code, message, context)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        write!(
            f,
            "[{}] {:?} in {}: {}",
            severity, self.code, self.context, self.message
        )
    }
}

/// The severity of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// A record was skipped; the batch continued.
    Warning,
    /// The batch failed, either structurally or by accepting nothing.
    Error,
}

/// A stable code identifying the type of diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    // Pre-flight issues
    /// The batch contained no files at all.
    EmptyBatch,
    /// The format expects a different number of files.
    WrongFileCount,
    /// No file in the batch has the extension the format expects.
    WrongExtension,

    // Structural decode issues
    /// A document had no recoverable structure (bad JSON root, broken XML).
    MalformedDocument,
    /// A required CSV column could not be located in the header row.
    MissingColumn,

    // Per-record issues
    /// A record could not be parsed (short line, non-numeric field, ...).
    MalformedRecord,
    /// A normalized coordinate fell outside [0, 1].
    CoordinateOutOfRange,
    /// A box had no positive area.
    DegenerateBox,
    /// An annotation referenced an image id absent from its own document.
    UnknownImageRef,
    /// No loaded image matched the record's stated filename.
    UnmatchedFilename,

    // Batch-level issues
    /// Every record in the batch was rejected or unmatched.
    NothingAccepted,
}

/// Where in the input a diagnostic arose.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticContext {
    /// The batch as a whole.
    Batch,
    /// A specific uploaded file.
    File { name: String },
    /// A specific record (line, row, or object index) within a file.
    Record { file: String, index: usize },
}

impl DiagnosticContext {
    /// Context for a named file.
    pub fn file(name: impl Into<String>) -> Self {
        DiagnosticContext::File { name: name.into() }
    }

    /// Context for a record within a named file.
    ///
    /// `index` is 1-based for line-oriented formats and 0-based where the
    /// source format has no line numbering of its own.
    pub fn record(file: impl Into<String>, index: usize) -> Self {
        DiagnosticContext::Record {
            file: file.into(),
            index,
        }
    }
}

impl fmt::Display for DiagnosticContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticContext::Batch => write!(f, "batch"),
            DiagnosticContext::File { name } => write!(f, "'{}'", name),
            DiagnosticContext::Record { file, index } => write!(f, "'{}' record {}", file, index),
        }
    }
}
