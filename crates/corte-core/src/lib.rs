//! corte-core: Backend-independent data types and algorithms.
//!
//! This crate provides the pipeline's foundational types (geometry, text runs,
//! rendered pages, half-page records) and the algorithms that do not touch
//! PDF bytes: the half-page splitter, the identifier extractor table, filename
//! derivation, word wrapping, and the stamp and report layouts.

pub mod error;
pub mod fields;
pub mod geometry;
pub mod naming;
pub mod placeholder;
pub mod raster;
pub mod record;
pub mod stamp_layout;
pub mod table;
pub mod text;
pub mod wrap;

pub use error::CorteError;
pub use fields::{
    DEFAULT_RULES, ExtractOptions, ExtractedFields, Extraction, FieldExtractor, FieldId,
    FieldRule, FieldValue, RegistrationFallback, ValueShape, extract_fields,
};
pub use geometry::{BBox, Ctm, Point};
pub use naming::{dedupe_filenames, derive_filename, sanitize_filename};
pub use placeholder::Placeholders;
pub use raster::{CutRatio, Half, RasterPage, split_halves};
pub use record::{FilenamePolicy, HalfPageRecord, RecordPatch};
pub use stamp_layout::{
    Color, InformationLine, LayoutMode, PlacedLine, Segment, StampLayout, StampStyle,
    layout_stamp,
};
pub use table::{
    Alignment, FieldDefinition, FieldKind, PlacedCell, PlacedRow, PlacedText, ReportContent,
    ReportFieldSelection, ReportLayout, ReportPage, ReportStyle, TableColumn, column_widths,
    layout_report,
};
pub use text::{TextRun, group_lines, runs_to_text};
pub use wrap::{FixedAdvance, TextMeasure, WrapFont, wrap_text};
