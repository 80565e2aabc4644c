//! corte: split, rename, stamp and report on water-utility cutoff and
//! reconnection order PDFs.
//!
//! This is the public API facade. It re-exports types from corte-core and
//! uses corte-pdf for everything that reads or writes PDF bytes.
//!
//! # Architecture
//!
//! - **corte-core**: backend-independent types and algorithms
//! - **corte-pdf**: raster engine, packager, stamper and report drawing
//! - **corte** (this crate): batch import sessions, storage, configuration
//!   and order-level report and stamp helpers
//!
//! # Example
//!
//! ```no_run
//! use corte::{CorteConfig, SourceFile, import_batch};
//!
//! let config = CorteConfig::default();
//! let files = vec![SourceFile::read("lote.pdf")?];
//! let session = import_batch(&files, &config.import)?;
//! for record in session.records() {
//!     println!("{}", record.filename);
//! }
//! session.save_to_folder("saida")?;
//! # Ok::<(), corte::CorteError>(())
//! ```

pub mod config;
pub mod import;
pub mod order_info;
pub mod report;
pub mod store;
pub mod template;

pub use config::{CorteConfig, ImportConfig};
pub use corte_core;
pub use corte_core::{
    CorteError, CutRatio, ExtractedFields, FieldId, FilenamePolicy, Half, HalfPageRecord,
    InformationLine, LayoutMode, Placeholders, RecordPatch, ReportFieldSelection, StampStyle,
    TextRun,
};
pub use corte_pdf;
pub use corte_pdf::{StampRequest, package_as_single_page_pdf, render_page, stamp};
pub use import::{
    ImportLogEntry, ImportSession, LogLevel, SourceFile, import_batch, import_paths,
};
pub use order_info::{OrderField, OrderInfo};
pub use report::{compose_order_report, order_field_selection, order_fields};
pub use store::{
    DocumentStore, FsDocumentStore, MemoryStore, OrderDocument, order_document_path,
    stamp_stored_order,
};
pub use template::{FsTemplateSource, StaticTemplate, TemplateSource};
