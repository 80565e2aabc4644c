//! Error types for the corte pipeline.
//!
//! Provides [`CorteError`], the single error taxonomy shared by every layer:
//! document parsing, splitting, stamping, report composition, bulk export and
//! the storage collaborator. Per-page failures during a batch import are not
//! returned through this type; they are collected as log entries instead.

use std::fmt;

/// Fatal error types for the corte pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum CorteError {
    /// The bytes do not parse as a PDF document (or the document is unusable).
    InvalidDocument(String),
    /// A page index beyond the document's page count was requested.
    PageIndexOutOfRange {
        /// The requested 0-based index.
        index: usize,
        /// The number of pages in the document.
        page_count: usize,
    },
    /// A cut ratio outside the open interval (0, 1).
    InvalidCutRatio(f64),
    /// The page layout cannot be split into two single-order halves.
    UnsupportedLayout {
        /// 0-based page index.
        page: usize,
        /// Why the page was rejected.
        reason: String,
    },
    /// The letterhead template could not be fetched as a PDF.
    TemplateUnavailable(String),
    /// A report was requested with no selected fields.
    NoFieldsSelected,
    /// A bulk operation was requested with no included records.
    NoRecordsIncluded,
    /// A record id that does not exist in the import session.
    UnknownRecord(usize),
    /// Failure reported by the storage collaborator, message preserved.
    Storage(String),
    /// Local filesystem I/O failure.
    Io(String),
    /// Failure while writing an archive.
    Archive(String),
    /// Invalid configuration value.
    Config(String),
}

impl fmt::Display for CorteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorteError::InvalidDocument(msg) => write!(f, "invalid document: {msg}"),
            CorteError::PageIndexOutOfRange { index, page_count } => write!(
                f,
                "page index {index} out of range (document has {page_count} pages)"
            ),
            CorteError::InvalidCutRatio(ratio) => {
                write!(f, "cut ratio must be strictly between 0 and 1, got {ratio}")
            }
            CorteError::UnsupportedLayout { page, reason } => {
                write!(f, "unsupported layout on page {}: {reason}", page + 1)
            }
            CorteError::TemplateUnavailable(msg) => write!(f, "template unavailable: {msg}"),
            CorteError::NoFieldsSelected => write!(f, "no report fields selected"),
            CorteError::NoRecordsIncluded => write!(f, "no records included in the batch"),
            CorteError::UnknownRecord(id) => write!(f, "unknown record id {id}"),
            CorteError::Storage(msg) => write!(f, "storage error: {msg}"),
            CorteError::Io(msg) => write!(f, "I/O error: {msg}"),
            CorteError::Archive(msg) => write!(f, "archive error: {msg}"),
            CorteError::Config(msg) => write!(f, "configuration error: {msg}"),
        }
    }
}

impl std::error::Error for CorteError {}

impl From<std::io::Error> for CorteError {
    fn from(err: std::io::Error) -> Self {
        CorteError::Io(err.to_string())
    }
}
