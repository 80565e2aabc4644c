//! Batch import: split every page of every input into two single-order
//! documents, then review, rename and export them.

use std::fmt;
use std::io::{Cursor, Seek, Write};
use std::path::{Path, PathBuf};

use corte_core::record::apply;
use corte_core::{
    CorteError, ExtractOptions, ExtractedFields, FieldExtractor, FieldId, FilenamePolicy, Half,
    HalfPageRecord, RecordPatch, split_halves,
};
use corte_pdf::{PdfDocument, encode_png, package_raster, render_document_page};
use serde::Serialize;
use tracing::{debug, info, warn};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::config::ImportConfig;

/// One input document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file, naming it after its final path component.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, CorteError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| CorteError::Io(format!("{}: {e}", path.display())))?;
        Ok(Self::new(source_name(path), bytes))
    }
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        })
    }
}

/// A visible note about one input or page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportLogEntry {
    pub source: String,
    /// 0-based page index, absent for whole-file entries.
    pub page: Option<usize>,
    pub level: LogLevel,
    pub message: String,
}

impl fmt::Display for ImportLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.page {
            Some(page) => write!(
                f,
                "[{}] {} p{}: {}",
                self.level,
                self.source,
                page + 1,
                self.message
            ),
            None => write!(f, "[{}] {}: {}", self.level, self.source, self.message),
        }
    }
}

/// The records and log of one import, with the edits applied to them.
#[derive(Debug, Clone)]
pub struct ImportSession {
    records: Vec<HalfPageRecord>,
    log: Vec<ImportLogEntry>,
    policy: FilenamePolicy,
}

/// Run the splitter over every page of every file, in input order.
///
/// Failures on one file or page are logged and skipped. Only an invalid
/// configuration is returned as an error.
pub fn import_batch(files: &[SourceFile], config: &ImportConfig) -> Result<ImportSession, CorteError> {
    config.validate()?;
    let mut session = ImportSession::empty(config);
    let mut pages = 0usize;
    for file in files {
        pages += session.import_file(file, config);
    }
    session.log_summary(files.len(), pages);
    Ok(session)
}

/// [`import_batch`] over files on disk, read one at a time.
///
/// A path that cannot be read becomes an error entry in the log, named
/// after its final component, and the batch moves on.
pub fn import_paths<P: AsRef<Path>>(
    paths: &[P],
    config: &ImportConfig,
) -> Result<ImportSession, CorteError> {
    config.validate()?;
    let mut session = ImportSession::empty(config);
    let mut pages = 0usize;
    for path in paths {
        let path = path.as_ref();
        match SourceFile::read(path) {
            Ok(file) => pages += session.import_file(&file, config),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping unreadable path");
                session.note(&source_name(path), None, LogLevel::Error, err.to_string());
            }
        }
    }
    session.log_summary(paths.len(), pages);
    Ok(session)
}

impl ImportSession {
    fn empty(config: &ImportConfig) -> Self {
        Self {
            records: Vec::new(),
            log: Vec::new(),
            policy: config.filename_policy,
        }
    }

    fn log_summary(&self, files: usize, pages: usize) {
        let failures = self
            .log
            .iter()
            .filter(|e| e.level == LogLevel::Error)
            .count();
        info!(
            files,
            pages,
            records = self.records.len(),
            failures,
            "import finished"
        );
    }

    fn note(&mut self, source: &str, page: Option<usize>, level: LogLevel, message: String) {
        self.log.push(ImportLogEntry {
            source: source.to_string(),
            page,
            level,
            message,
        });
    }

    /// Import one file, returning the number of pages split.
    fn import_file(&mut self, file: &SourceFile, config: &ImportConfig) -> usize {
        let doc = match PdfDocument::open(&file.bytes) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(source = %file.name, error = %err, "skipping unreadable file");
                self.note(&file.name, None, LogLevel::Error, CorteError::from(err).to_string());
                return 0;
            }
        };
        let page_count = doc.page_count();
        if page_count == 0 {
            warn!(source = %file.name, "skipping file without pages");
            self.note(&file.name, None, LogLevel::Error, "document has no pages".to_string());
            return 0;
        }

        let mut split = 0;
        for index in 0..page_count {
            match split_page(&doc, index, config) {
                Ok(halves) => {
                    for part in halves {
                        let mut record = HalfPageRecord {
                            id: self.records.len(),
                            source_name: file.name.clone(),
                            page_index: index,
                            half: part.half,
                            width: part.width,
                            height: part.height,
                            preview_png: part.preview,
                            document_bytes: part.document,
                            fields: part.fields,
                            prefix: config.filename_prefix.clone(),
                            filename: String::new(),
                            filename_overridden: false,
                            include: true,
                        };
                        record.filename = record.derived_filename();
                        self.records.push(record);
                    }
                    split += 1;
                }
                Err(err) => {
                    warn!(source = %file.name, page = index, error = %err, "skipping page");
                    self.note(&file.name, Some(index), LogLevel::Error, err.to_string());
                }
            }
        }
        self.note(
            &file.name,
            None,
            LogLevel::Info,
            format!("{split} of {page_count} pages split"),
        );
        split
    }

    pub fn records(&self) -> &[HalfPageRecord] {
        &self.records
    }

    pub fn log(&self) -> &[ImportLogEntry] {
        &self.log
    }

    pub fn policy(&self) -> FilenamePolicy {
        self.policy
    }

    pub fn record(&self, id: usize) -> Result<&HalfPageRecord, CorteError> {
        self.records.get(id).ok_or(CorteError::UnknownRecord(id))
    }

    /// Apply an edit to one record.
    pub fn apply(&mut self, id: usize, patch: &RecordPatch) -> Result<&HalfPageRecord, CorteError> {
        let policy = self.policy;
        let slot = self
            .records
            .get_mut(id)
            .ok_or(CorteError::UnknownRecord(id))?;
        *slot = apply(slot, patch, policy);
        Ok(slot)
    }

    /// Replace a field from user input; input without digits clears it.
    pub fn update_field(
        &mut self,
        id: usize,
        field: FieldId,
        value: &str,
    ) -> Result<&HalfPageRecord, CorteError> {
        self.apply(
            id,
            &RecordPatch::SetField {
                field,
                value: value.to_string(),
            },
        )
    }

    pub fn toggle_include(&mut self, id: usize) -> Result<&HalfPageRecord, CorteError> {
        self.apply(id, &RecordPatch::ToggleInclude)
    }

    /// Rename a record's output file; the name is sanitized.
    pub fn edit_filename(&mut self, id: usize, name: &str) -> Result<&HalfPageRecord, CorteError> {
        self.apply(id, &RecordPatch::RenameFile(name.to_string()))
    }

    pub fn included(&self) -> impl Iterator<Item = &HalfPageRecord> {
        self.records.iter().filter(|r| r.include)
    }

    /// Final, de-duplicated output names of the included records.
    pub fn planned_outputs(&self) -> Result<Vec<(String, &HalfPageRecord)>, CorteError> {
        let included: Vec<&HalfPageRecord> = self.included().collect();
        if included.is_empty() {
            return Err(CorteError::NoRecordsIncluded);
        }
        let names: Vec<&str> = included.iter().map(|r| r.filename.as_str()).collect();
        Ok(corte_core::dedupe_filenames(&names)
            .into_iter()
            .zip(included)
            .collect())
    }

    /// Write every included record into `dir`, returning the written paths.
    pub fn save_to_folder(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, CorteError> {
        let dir = dir.as_ref();
        let outputs = self.planned_outputs()?;
        std::fs::create_dir_all(dir)
            .map_err(|e| CorteError::Io(format!("{}: {e}", dir.display())))?;
        let mut written = Vec::with_capacity(outputs.len());
        for (name, record) in outputs {
            let path = dir.join(&name);
            std::fs::write(&path, &record.document_bytes)
                .map_err(|e| CorteError::Io(format!("{}: {e}", path.display())))?;
            debug!(path = %path.display(), "saved record");
            written.push(path);
        }
        info!(dir = %dir.display(), files = written.len(), "saved records to folder");
        Ok(written)
    }

    /// Package every included record into one zip archive.
    pub fn download_archive(&self) -> Result<Vec<u8>, CorteError> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_archive(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Write the zip archive of included records to `writer`.
    pub fn write_archive<W: Write + Seek>(&self, writer: W) -> Result<usize, CorteError> {
        let outputs = self.planned_outputs()?;
        let archive_err = |e: zip::result::ZipError| CorteError::Archive(e.to_string());
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(writer);
        for (name, record) in &outputs {
            zip.start_file(name.as_str(), options).map_err(archive_err)?;
            zip.write_all(&record.document_bytes)
                .map_err(|e| CorteError::Archive(e.to_string()))?;
        }
        zip.finish().map_err(archive_err)?;
        info!(files = outputs.len(), "archive written");
        Ok(outputs.len())
    }
}

/// One packaged half of a page.
struct SplitHalf {
    half: Half,
    width: u32,
    height: u32,
    document: Vec<u8>,
    preview: Vec<u8>,
    fields: ExtractedFields,
}

/// Render, split, extract and package one page.
///
/// Both halves are produced or neither is.
fn split_page(
    doc: &PdfDocument,
    index: usize,
    config: &ImportConfig,
) -> Result<Vec<SplitHalf>, CorteError> {
    let raster = render_document_page(doc, index, config.render_scale)?;
    if raster.width > raster.height {
        return Err(CorteError::UnsupportedLayout {
            page: index,
            reason: format!("landscape page ({}x{} px)", raster.width, raster.height),
        });
    }
    let (top, bottom) = split_halves(&raster, config.cut_ratio()?)?;
    drop(raster);

    let options: ExtractOptions = config.extract_options();
    let extractor = FieldExtractor::builtin();
    let mut out = Vec::with_capacity(2);
    for (half, part) in [(Half::Top, top), (Half::Bottom, bottom)] {
        let extraction = extractor.extract_runs(&part.runs, &options);
        if extraction.ambiguous.contains(&FieldId::Order) {
            return Err(CorteError::UnsupportedLayout {
                page: index,
                reason: format!("more than one order number in the {} half", half_name(half)),
            });
        }
        let preview = if config.previews {
            encode_png(&part)?
        } else {
            Vec::new()
        };
        out.push(SplitHalf {
            half,
            width: part.width,
            height: part.height,
            document: package_raster(&part)?,
            preview,
            fields: extraction.fields,
        });
    }
    Ok(out)
}

fn half_name(half: Half) -> &'static str {
    match half {
        Half::Top => "top",
        Half::Bottom => "bottom",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(names: &[&str]) -> ImportSession {
        let records = names
            .iter()
            .enumerate()
            .map(|(id, name)| HalfPageRecord {
                id,
                source_name: "lote.pdf".to_string(),
                page_index: id / 2,
                half: if id % 2 == 0 { Half::Top } else { Half::Bottom },
                width: 10,
                height: 10,
                preview_png: Vec::new(),
                document_bytes: format!("%PDF-{id}").into_bytes(),
                fields: Default::default(),
                prefix: None,
                filename: name.to_string(),
                filename_overridden: false,
                include: true,
            })
            .collect();
        ImportSession {
            records,
            log: Vec::new(),
            policy: FilenamePolicy::PreserveManual,
        }
    }

    #[test]
    fn planned_outputs_dedupe_case_insensitively() {
        let session = session_with(&["a.pdf", "A.pdf", "b.pdf", "a.pdf"]);
        let names: Vec<String> = session
            .planned_outputs()
            .unwrap()
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(names, ["a.pdf", "A_1.pdf", "b.pdf", "a_2.pdf"]);
    }

    #[test]
    fn excluded_records_are_skipped() {
        let mut session = session_with(&["a.pdf", "a.pdf"]);
        session.toggle_include(0).unwrap();
        let outputs = session.planned_outputs().unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].0, "a.pdf");
        assert_eq!(outputs[0].1.id, 1);
    }

    #[test]
    fn nothing_included_is_an_error() {
        let mut session = session_with(&["a.pdf"]);
        session.toggle_include(0).unwrap();
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            session.save_to_folder(dir.path()).unwrap_err(),
            CorteError::NoRecordsIncluded
        );
        assert_eq!(
            session.download_archive().unwrap_err(),
            CorteError::NoRecordsIncluded
        );
    }

    #[test]
    fn unknown_record_id() {
        let mut session = session_with(&["a.pdf"]);
        assert_eq!(
            session.toggle_include(7).unwrap_err(),
            CorteError::UnknownRecord(7)
        );
    }

    #[test]
    fn save_writes_deduplicated_files() {
        let session = session_with(&["x.pdf", "x.pdf"]);
        let dir = tempfile::tempdir().unwrap();
        let paths = session.save_to_folder(dir.path().join("out")).unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(std::fs::read(&paths[1]).unwrap(), b"%PDF-1");
        assert!(paths[1].ends_with("x_1.pdf"));
    }

    #[test]
    fn field_edit_rederives_until_manual_rename() {
        let mut session = session_with(&["LIG_X_OS_X_p1_T.pdf"]);
        let record = session.update_field(0, FieldId::Connection, "08.561").unwrap();
        assert_eq!(record.filename, "LIG_08561_OS_X_p1_T.pdf");
        session.edit_filename(0, "rua das flores").unwrap();
        let record = session.update_field(0, FieldId::Connection, "1").unwrap();
        assert_eq!(record.filename, "rua das flores.pdf");
    }

    #[test]
    fn log_entry_display() {
        let entry = ImportLogEntry {
            source: "lote.pdf".to_string(),
            page: Some(2),
            level: LogLevel::Error,
            message: "boom".to_string(),
        };
        assert_eq!(entry.to_string(), "[error] lote.pdf p3: boom");
    }
}
