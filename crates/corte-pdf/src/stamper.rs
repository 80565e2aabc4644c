//! Document stamper: draws an information block onto a stored order's
//! first page.

use corte_core::{
    CorteError, InformationLine, LayoutMode, StampLayout, StampStyle, layout_stamp,
};
use tracing::debug;

use crate::canvas::{OverlayCanvas, append_overlay};
use crate::document::PdfDocument;
use crate::error::BackendError;
use crate::standard_fonts::HelveticaMetrics;

/// What to stamp and how.
#[derive(Debug, Clone, PartialEq)]
pub struct StampRequest {
    /// Bold title row, drawn in card mode only.
    pub title: Option<String>,
    pub lines: Vec<InformationLine>,
    pub mode: LayoutMode,
    pub style: StampStyle,
}

impl StampRequest {
    pub fn new(lines: Vec<InformationLine>, mode: LayoutMode) -> Self {
        Self {
            title: None,
            lines,
            mode,
            style: StampStyle::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_style(mut self, style: StampStyle) -> Self {
        self.style = style;
        self
    }
}

/// Stamp the request onto the first page of `bytes`.
///
/// The same request on the same input always produces the same bytes.
pub fn stamp(bytes: &[u8], request: &StampRequest) -> Result<Vec<u8>, CorteError> {
    let mut doc = PdfDocument::open(bytes)?;
    if doc.page_count() == 0 {
        return Err(CorteError::InvalidDocument("document has no pages".to_string()));
    }
    let page = doc.page(0)?;
    let geometry = doc.geometry(page)?;
    let layout = layout_stamp(
        request.title.as_deref(),
        &request.lines,
        request.mode,
        &request.style,
        &HelveticaMetrics,
        geometry.width(),
        geometry.height(),
    );
    debug!(
        lines = layout.lines.len(),
        truncated = layout.truncated,
        "stamp layout"
    );

    let mut canvas = OverlayCanvas::new(&geometry)?;
    draw_stamp(&mut canvas, &layout, &request.style);
    append_overlay(doc.inner_mut(), page.object_id, canvas.finish()?)?;
    Ok(save(doc)?)
}

fn draw_stamp(canvas: &mut OverlayCanvas, layout: &StampLayout, style: &StampStyle) {
    if layout.mode == LayoutMode::BorderedCard {
        canvas.card(layout.block, style.fill_color, style.border_color, style.border_width);
    }
    let shadow = style.text_color.darken(style.shadow_darkness);
    for line in &layout.lines {
        for segment in &line.segments {
            canvas.text(
                segment.x + style.shadow_offset,
                line.baseline + style.shadow_offset,
                line.font_size,
                segment.bold,
                shadow,
                &segment.text,
            );
            canvas.text(
                segment.x,
                line.baseline,
                line.font_size,
                segment.bold,
                style.text_color,
                &segment.text,
            );
        }
    }
}

pub(crate) fn save(doc: PdfDocument) -> Result<Vec<u8>, BackendError> {
    let mut doc = doc.into_inner();
    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}
