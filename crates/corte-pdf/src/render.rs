//! The raster engine: one page in, pixels and positioned text runs out.

use corte_core::{CorteError, RasterPage, TextRun};
use tiny_skia::{IntSize, Pixmap};
use tracing::debug;

use crate::document::PdfDocument;
use crate::error::BackendError;
use crate::handler::{ContentHandler, GlyphEvent, ImageEvent, PathEvent, TextEvent};
use crate::interpreter::interpret_page;
use crate::rasterize::Rasterizer;
use crate::text_runs::TextRunCollector;

/// Pixels per point used when the caller does not choose a scale.
pub const DEFAULT_SCALE: f64 = 2.0;

/// Paints and collects text in a single interpretation pass.
struct PageHandler<'doc> {
    raster: Rasterizer<'doc>,
    text: TextRunCollector,
}

impl ContentHandler for PageHandler<'_> {
    fn on_text(&mut self, event: TextEvent) {
        self.text.on_text(event);
    }

    fn on_glyph(&mut self, event: GlyphEvent<'_>) {
        self.raster.on_glyph(event);
    }

    fn on_path_painted(&mut self, event: PathEvent) {
        self.raster.on_path_painted(event);
    }

    fn on_image(&mut self, event: ImageEvent<'_>) {
        self.raster.on_image(event);
    }
}

fn check_scale(scale: f64) -> Result<(), BackendError> {
    if scale.is_finite() && scale > 0.0 {
        Ok(())
    } else {
        Err(BackendError::Render(format!("invalid render scale {scale}")))
    }
}

/// Render page `index` of an open document.
pub fn render_document_page(
    doc: &PdfDocument,
    index: usize,
    scale: f64,
) -> Result<RasterPage, BackendError> {
    check_scale(scale)?;
    let page = doc.page(index)?;
    let geometry = doc.geometry(page)?;
    let mut handler = PageHandler {
        raster: Rasterizer::new(doc.inner(), &geometry, scale)?,
        text: TextRunCollector::new(&geometry, scale),
    };
    interpret_page(doc, page, &mut handler)?;

    let (width, height) = (handler.raster.width(), handler.raster.height());
    let runs = handler.text.into_runs();
    debug!(page = index, width, height, runs = runs.len(), "rendered page");
    Ok(RasterPage::new(width, height, handler.raster.into_pixels(), runs)?)
}

/// Positioned text runs of a page without painting it.
pub fn extract_document_runs(
    doc: &PdfDocument,
    index: usize,
    scale: f64,
) -> Result<Vec<TextRun>, BackendError> {
    check_scale(scale)?;
    let page = doc.page(index)?;
    let geometry = doc.geometry(page)?;
    let mut collector = TextRunCollector::new(&geometry, scale);
    interpret_page(doc, page, &mut collector)?;
    Ok(collector.into_runs())
}

/// Render one page of a document given as bytes.
///
/// Fails with `InvalidDocument` when the bytes do not parse and
/// `PageIndexOutOfRange` when `index` is past the last page.
pub fn render_page(bytes: &[u8], index: usize, scale: f64) -> Result<RasterPage, CorteError> {
    let doc = PdfDocument::open(bytes)?;
    Ok(render_document_page(&doc, index, scale)?)
}

/// Number of pages in a document given as bytes.
pub fn page_count(bytes: &[u8]) -> Result<usize, CorteError> {
    Ok(PdfDocument::open(bytes)?.page_count())
}

/// Encode a rendered page (or half) as PNG.
pub fn encode_png(page: &RasterPage) -> Result<Vec<u8>, CorteError> {
    let size = IntSize::from_wh(page.width, page.height)
        .ok_or_else(|| CorteError::InvalidDocument("empty raster".to_string()))?;
    let pixmap = Pixmap::from_vec(page.pixels.clone(), size).ok_or_else(|| {
        CorteError::InvalidDocument("raster buffer does not match its size".to_string())
    })?;
    pixmap
        .encode_png()
        .map_err(|e| BackendError::Render(format!("PNG encoding failed: {e}")).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Document, Object, Stream, dictionary};

    fn one_page(content: &[u8], media: [i64; 4]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font", "Subtype" => "Type1", "BaseFont" => "Helvetica",
        });
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media.iter().map(|&v| Object::Integer(v)).collect::<Vec<_>>(),
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn renders_size_and_runs() {
        let pdf = one_page(b"BT /F1 10 Tf 20 150 Td (OS 123) Tj ET 0 0 50 50 re f", [0, 0, 100, 200]);
        let page = render_page(&pdf, 0, 2.0).unwrap();
        assert_eq!((page.width, page.height), (200, 400));
        assert_eq!(page.runs.len(), 1);
        assert_eq!(page.runs[0].text, "OS 123");
        assert_eq!(page.runs[0].y, 100.0);
        // Filled square in the bottom-left corner.
        assert_eq!(page.pixel(10, 390), Some([0, 0, 0, 255]));
        assert_eq!(page.pixel(190, 10), Some([255, 255, 255, 255]));
    }

    #[test]
    fn text_is_painted_where_its_run_sits() {
        let pdf = one_page(b"BT /F1 20 Tf 10 150 Td (LIGACAO) Tj ET", [0, 0, 200, 200]);
        let page = render_page(&pdf, 0, 1.0).unwrap();
        let run = &page.runs[0];
        assert_eq!(run.y, 50.0);
        let inked = |y0: u32, y1: u32| {
            (y0..y1)
                .flat_map(|y| (0..page.width).map(move |x| (x, y)))
                .filter(|&(x, y)| page.pixel(x, y).is_some_and(|p| p[0] < 128))
                .count()
        };
        // Ink between the cap height and the baseline, none elsewhere.
        assert!(inked(36, 50) > 50);
        assert_eq!(inked(0, 30), 0);
        assert_eq!(inked(55, 200), 0);
    }

    #[test]
    fn invisible_text_layer_is_not_painted() {
        let pdf = one_page(b"BT /F1 20 Tf 3 Tr 10 150 Td (LIGACAO) Tj ET", [0, 0, 200, 200]);
        let page = render_page(&pdf, 0, 1.0).unwrap();
        assert_eq!(page.runs[0].text, "LIGACAO");
        assert!(page.pixels.iter().all(|&b| b == 255));
    }

    #[test]
    fn garbage_is_invalid_document() {
        assert!(matches!(
            render_page(b"%PDF-1.4 broken", 0, 2.0),
            Err(CorteError::InvalidDocument(_))
        ));
    }

    #[test]
    fn out_of_range_page() {
        let pdf = one_page(b"", [0, 0, 10, 10]);
        assert_eq!(
            render_page(&pdf, 1, 1.0).unwrap_err(),
            CorteError::PageIndexOutOfRange {
                index: 1,
                page_count: 1
            }
        );
        assert_eq!(page_count(&pdf).unwrap(), 1);
    }

    #[test]
    fn bad_scale_is_rejected() {
        let pdf = one_page(b"", [0, 0, 10, 10]);
        assert!(render_page(&pdf, 0, 0.0).is_err());
        assert!(render_page(&pdf, 0, f64::NAN).is_err());
    }

    #[test]
    fn runs_without_painting() {
        let pdf = one_page(b"BT /F1 10 Tf 5 5 Td (x) Tj ET", [0, 0, 10, 10]);
        let doc = PdfDocument::open(&pdf).unwrap();
        let runs = extract_document_runs(&doc, 0, 1.0).unwrap();
        assert_eq!(runs[0].y, 5.0);
    }

    #[test]
    fn png_has_signature() {
        let page = RasterPage::blank(3, 2);
        let png = encode_png(&page).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
