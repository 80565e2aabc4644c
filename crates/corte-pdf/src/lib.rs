//! corte-pdf: lopdf-backed document layer for the corte pipeline.
//!
//! This crate turns PDF bytes into what the core algorithms consume and
//! writes their results back as PDF:
//!
//! - the raster engine ([`render_page`]): a content-stream interpreter
//!   feeding a tiny-skia rasterizer (glyphs through fontdue) and a
//!   positioned text-run collector,
//! - the image-to-PDF packager ([`package_as_single_page_pdf`]),
//! - the document stamper ([`stamp`]) and the report composer
//!   ([`compose_report`]), both drawing through an [`OverlayCanvas`].
//!
//! It depends on corte-core for shared data types.

pub mod canvas;
pub mod cmap;
pub mod document;
pub mod encoding;
pub mod error;
pub mod font;
pub mod font_program;
pub mod handler;
pub mod interpreter;
pub mod packager;
pub mod page_geometry;
pub mod rasterize;
pub mod render;
pub mod report;
pub mod standard_fonts;
pub mod stamper;
pub mod text_runs;

pub use canvas::{OverlayCanvas, append_overlay};
pub use corte_core;
pub use document::{PageRef, PdfDocument};
pub use error::BackendError;
pub use font_program::FontProgram;
pub use handler::{ContentHandler, GlyphEvent, ImageEvent, PathEvent, TextEvent};
pub use interpreter::{interpret_content, interpret_page};
pub use packager::{package_as_single_page_pdf, package_raster};
pub use page_geometry::PageGeometry;
pub use render::{
    DEFAULT_SCALE, encode_png, extract_document_runs, page_count, render_document_page,
    render_page,
};
pub use report::compose_report;
pub use standard_fonts::HelveticaMetrics;
pub use stamper::{StampRequest, stamp};
pub use text_runs::TextRunCollector;
