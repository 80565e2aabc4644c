//! Error types for the PDF layer.
//!
//! Uses [`thiserror`] for ergonomic error derivation. Provides [`BackendError`]
//! that wraps lopdf, image and rasterizer failures and converts them to
//! [`CorteError`].

use corte_core::CorteError;
use thiserror::Error;

/// Error type for PDF reading, rendering and writing.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The bytes could not be parsed or an object could not be resolved.
    #[error("PDF parse error: {0}")]
    Parse(String),

    /// Error reading or writing PDF data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An embedded image could not be decoded.
    #[error("image error: {0}")]
    Image(String),

    /// The rasterizer could not allocate or draw.
    #[error("render error: {0}")]
    Render(String),

    /// A core library error.
    #[error(transparent)]
    Core(#[from] CorteError),
}

impl From<lopdf::Error> for BackendError {
    fn from(err: lopdf::Error) -> Self {
        BackendError::Parse(err.to_string())
    }
}

impl From<image::ImageError> for BackendError {
    fn from(err: image::ImageError) -> Self {
        BackendError::Image(err.to_string())
    }
}

impl From<BackendError> for CorteError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Parse(msg) => CorteError::InvalidDocument(msg),
            BackendError::Io(e) => CorteError::Io(e.to_string()),
            BackendError::Image(msg) => CorteError::InvalidDocument(format!("image: {msg}")),
            BackendError::Render(msg) => CorteError::InvalidDocument(format!("render: {msg}")),
            BackendError::Core(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let err = BackendError::Parse("invalid xref table".to_string());
        assert_eq!(err.to_string(), "PDF parse error: invalid xref table");
    }

    #[test]
    fn parse_becomes_invalid_document() {
        let err: CorteError = BackendError::Parse("bad".to_string()).into();
        assert_eq!(err, CorteError::InvalidDocument("bad".to_string()));
    }

    #[test]
    fn io_from_std() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: BackendError = io.into();
        assert!(matches!(err, BackendError::Io(_)));
        let core: CorteError = err.into();
        assert!(matches!(core, CorteError::Io(_)));
    }

    #[test]
    fn core_passthrough() {
        let original = CorteError::PageIndexOutOfRange {
            index: 3,
            page_count: 1,
        };
        let err: CorteError = BackendError::Core(original.clone()).into();
        assert_eq!(err, original);
    }

    #[test]
    fn lopdf_error_is_parse() {
        let lopdf_err = lopdf::Document::load_mem(b"not a pdf").unwrap_err();
        let err: BackendError = lopdf_err.into();
        assert!(matches!(err, BackendError::Parse(_)));
    }
}
