//! Tabular report drawing onto a letterhead template.
//!
//! The template's first page is duplicated once per planned report page;
//! the grid for each page is drawn over its copy.

use corte_core::{
    CorteError, PlacedRow, PlacedText, ReportContent, ReportPage, ReportStyle, layout_report,
};
use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::canvas::{OverlayCanvas, append_overlay};
use crate::document::{PdfDocument, resolve_inherited};
use crate::error::BackendError;
use crate::page_geometry::PageGeometry;
use crate::standard_fonts::HelveticaMetrics;
use crate::stamper::save;

/// Page-level keys a copy must carry even when the template inherits them.
const INHERITED_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Compose a report over the first page of `template`.
///
/// Returns a document with one page per planned report page. Pages of the
/// template after the first are not carried over.
pub fn compose_report(
    template: &[u8],
    content: &ReportContent<'_>,
    style: &ReportStyle,
) -> Result<Vec<u8>, CorteError> {
    let mut doc = PdfDocument::open(template)?;
    if doc.page_count() == 0 {
        return Err(CorteError::TemplateUnavailable(
            "template has no pages".to_string(),
        ));
    }
    let first = doc.page(0)?;
    let geometry = doc.geometry(first)?;
    let layout = layout_report(
        content,
        style,
        &HelveticaMetrics,
        geometry.width(),
        geometry.height(),
    );
    debug!(
        rows = content.rows.len(),
        pages = layout.pages.len(),
        "report layout"
    );

    let page_ids = duplicate_first_page(doc.inner_mut(), first.object_id, layout.pages.len())?;
    for (page, page_id) in layout.pages.iter().zip(page_ids) {
        let overlay = draw_page(page, style, &geometry)?;
        append_overlay(doc.inner_mut(), page_id, overlay)?;
    }
    Ok(save(doc)?)
}

fn draw_page(
    page: &ReportPage,
    style: &ReportStyle,
    geometry: &PageGeometry,
) -> Result<Vec<u8>, BackendError> {
    let mut canvas = OverlayCanvas::new(geometry)?;
    for heading in page.title.iter().chain(page.subtitle.iter()) {
        draw_text(&mut canvas, heading, style);
    }
    draw_row(&mut canvas, &page.header, style, true);
    for row in &page.rows {
        draw_row(&mut canvas, row, style, false);
    }
    canvas.finish()
}

fn draw_row(canvas: &mut OverlayCanvas, row: &PlacedRow, style: &ReportStyle, header: bool) {
    for cell in &row.cells {
        if header {
            canvas.card(cell.bbox, style.header_fill, style.border_color, style.border_width);
        } else if style.border_width > 0.0 {
            canvas.stroke_rect(cell.bbox, style.border_color, style.border_width);
        }
        for line in &cell.lines {
            draw_text(canvas, line, style);
        }
    }
}

fn draw_text(canvas: &mut OverlayCanvas, text: &PlacedText, style: &ReportStyle) {
    canvas.text(
        text.x,
        text.baseline,
        text.font_size,
        text.bold,
        style.text_color,
        &text.text,
    );
}

/// Replace the page tree with `count` copies of the template's first page.
///
/// Copies share the template's content streams. Objects only reachable from
/// the dropped pages are pruned.
fn duplicate_first_page(
    doc: &mut Document,
    first: ObjectId,
    count: usize,
) -> Result<Vec<ObjectId>, BackendError> {
    let pages_id = doc
        .catalog()
        .and_then(|c| c.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|e| BackendError::Parse(format!("missing page tree root: {e}")))?;

    let mut template = doc
        .get_object(first)
        .and_then(Object::as_dict)
        .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?
        .clone();
    for key in INHERITED_KEYS {
        if template.has(key) {
            continue;
        }
        if let Some(value) = resolve_inherited(doc, first, key)? {
            template.set(key, value.clone());
        }
    }
    template.set("Parent", Object::Reference(pages_id));
    // Annotations belong to one page object; copies would alias them.
    template.remove(b"Annots");

    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let copy = Object::Dictionary(template.clone());
        let id = if i == 0 {
            doc.objects.insert(first, copy);
            first
        } else {
            doc.add_object(copy)
        };
        ids.push(id);
    }

    let kids: Vec<Object> = ids.iter().map(|&id| Object::Reference(id)).collect();
    let root = doc
        .get_object_mut(pages_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| BackendError::Parse(format!("invalid page tree root: {e}")))?;
    root.set("Kids", Object::Array(kids));
    root.set("Count", Object::Integer(count as i64));
    doc.prune_objects();
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{extract_document_runs, page_count};
    use corte_core::Alignment;
    use lopdf::{Stream, dictionary};

    /// Letterhead with a name in the top band; `extra_pages` blank pages
    /// follow the first.
    fn letterhead(extra_pages: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font", "Subtype" => "Type1", "BaseFont" => "Helvetica",
        });
        let head = doc.add_object(Stream::new(
            dictionary! {},
            b"BT /F1 16 Tf 40 800 Td (CAERN) Tj ET".to_vec(),
        ));
        let mut kids = vec![
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => head,
            })
            .into(),
        ];
        for _ in 0..extra_pages {
            kids.push(
                doc.add_object(dictionary! { "Type" => "Page", "Parent" => pages_id })
                    .into(),
            );
        }
        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    fn compose(rows: &[Vec<String>]) -> Vec<u8> {
        let headers = vec!["OS".to_string(), "Status".to_string()];
        let content = ReportContent {
            title: "Relatório de Ordens",
            subtitle: "01/01/2026 a 31/01/2026",
            headers: &headers,
            alignments: &[Alignment::Right, Alignment::Left],
            nominal_widths: &[100.0, 200.0],
            rows,
        };
        compose_report(&letterhead(1), &content, &ReportStyle::default()).unwrap()
    }

    fn rows(n: usize) -> Vec<Vec<String>> {
        (0..n)
            .map(|i| vec![format!("{}", 1000 + i), "pendente".to_string()])
            .collect()
    }

    #[test]
    fn single_page_report() {
        let pdf = compose(&rows(3));
        assert_eq!(page_count(&pdf).unwrap(), 1);
        let doc = PdfDocument::open(&pdf).unwrap();
        let runs = extract_document_runs(&doc, 0, 1.0).unwrap();
        let texts: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
        assert!(texts.contains(&"CAERN"));
        assert!(texts.contains(&"Status"));
        assert!(texts.contains(&"1002"));
    }

    #[test]
    fn long_report_paginates_with_headings() {
        let pdf = compose(&rows(120));
        let pages = page_count(&pdf).unwrap();
        assert!(pages > 1);
        let doc = PdfDocument::open(&pdf).unwrap();
        let mut seen = 0;
        for i in 0..pages {
            let runs = extract_document_runs(&doc, i, 1.0).unwrap();
            assert!(runs.iter().any(|r| r.text == "CAERN"), "letterhead on page {i}");
            assert!(runs.iter().any(|r| r.text == "Status"), "header on page {i}");
            let title = runs.iter().find(|r| r.text == "Relatório de Ordens");
            assert!(title.is_some(), "title on page {i}");
            seen += runs.iter().filter(|r| r.text.starts_with('1')).count();
        }
        assert_eq!(seen, 120);
    }

    #[test]
    fn empty_report_still_has_header() {
        let pdf = compose(&[]);
        assert_eq!(page_count(&pdf).unwrap(), 1);
    }

    #[test]
    fn garbage_template_is_rejected() {
        let headers: Vec<String> = Vec::new();
        let content = ReportContent {
            title: "",
            subtitle: "",
            headers: &headers,
            alignments: &[],
            nominal_widths: &[],
            rows: &[],
        };
        assert!(compose_report(b"<html>", &content, &ReportStyle::default()).is_err());
    }
}
