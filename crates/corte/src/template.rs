//! Letterhead template lookup.

use std::path::PathBuf;

use corte_core::CorteError;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Where the report letterhead comes from.
pub trait TemplateSource {
    /// The template's bytes and content type.
    fn fetch(&self) -> Result<(Vec<u8>, String), CorteError>;
}

/// Fetch the template and insist on a PDF.
pub fn load_template(source: &dyn TemplateSource) -> Result<Vec<u8>, CorteError> {
    let (bytes, content_type) = source
        .fetch()
        .map_err(|e| CorteError::TemplateUnavailable(e.to_string()))?;
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if essence != PDF_CONTENT_TYPE {
        return Err(CorteError::TemplateUnavailable(format!(
            "expected {PDF_CONTENT_TYPE}, got {content_type:?}"
        )));
    }
    Ok(bytes)
}

/// Content type by signature: PDF or opaque bytes.
pub fn sniff_content_type(bytes: &[u8]) -> &'static str {
    let start = bytes.len().min(1024);
    if bytes[..start].windows(5).any(|w| w == b"%PDF-") {
        PDF_CONTENT_TYPE
    } else {
        "application/octet-stream"
    }
}

/// Template read from a file.
#[derive(Debug, Clone)]
pub struct FsTemplateSource {
    path: PathBuf,
}

impl FsTemplateSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TemplateSource for FsTemplateSource {
    fn fetch(&self) -> Result<(Vec<u8>, String), CorteError> {
        let bytes = std::fs::read(&self.path)
            .map_err(|e| CorteError::Io(format!("{}: {e}", self.path.display())))?;
        let content_type = sniff_content_type(&bytes).to_string();
        Ok((bytes, content_type))
    }
}

/// Template already in memory with a declared content type.
#[derive(Debug, Clone)]
pub struct StaticTemplate {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl TemplateSource for StaticTemplate {
    fn fetch(&self) -> Result<(Vec<u8>, String), CorteError> {
        Ok((self.bytes.clone(), self.content_type.clone()))
    }
}
