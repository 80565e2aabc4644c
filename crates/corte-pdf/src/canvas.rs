//! Drawing overlays onto existing pages.
//!
//! An [`OverlayCanvas`] records drawing operations in top-left display
//! coordinates (points, `y` down). [`append_overlay`] isolates the page's
//! existing content in `q`/`Q`, registers the standard Helvetica faces, and
//! appends the overlay as a new content stream whose first operator maps
//! display coordinates back to the page's native space, so rotated and
//! cropped pages are drawn upright.

use corte_core::{BBox, Color};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};

use crate::document::{resolve_inherited, resolve_ref};
use crate::encoding::win_ansi_encode_str;
use crate::error::BackendError;
use crate::page_geometry::PageGeometry;

/// Resource name of the regular overlay face.
pub const REGULAR_FONT: &str = "CorteHelv";
/// Resource name of the bold overlay face.
pub const BOLD_FONT: &str = "CorteHelvB";

/// Recorded overlay drawing for one page.
#[derive(Debug, Clone)]
pub struct OverlayCanvas {
    ops: Vec<Operation>,
}

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

fn color_operands(c: Color) -> Vec<Object> {
    vec![real(c.r), real(c.g), real(c.b)]
}

impl OverlayCanvas {
    /// Start an overlay for a page with the given geometry.
    pub fn new(geometry: &PageGeometry) -> Result<Self, BackendError> {
        let to_native = geometry
            .display_ctm()
            .inverse()
            .ok_or_else(|| BackendError::Render("page has a degenerate box".to_string()))?;
        let m = to_native.to_array();
        Ok(Self {
            ops: vec![
                Operation::new("q", vec![]),
                Operation::new("cm", m.iter().map(|&v| real(v)).collect()),
            ],
        })
    }

    pub fn fill_rect(&mut self, bbox: BBox, color: Color) {
        self.ops.push(Operation::new("rg", color_operands(color)));
        self.push_rect(bbox);
        self.ops.push(Operation::new("f", vec![]));
    }

    pub fn stroke_rect(&mut self, bbox: BBox, color: Color, width: f64) {
        self.ops.push(Operation::new("RG", color_operands(color)));
        self.ops.push(Operation::new("w", vec![real(width)]));
        self.push_rect(bbox);
        self.ops.push(Operation::new("S", vec![]));
    }

    /// Filled rectangle with a border; a zero `width` skips the border.
    pub fn card(&mut self, bbox: BBox, fill: Color, border: Color, width: f64) {
        if width > 0.0 {
            self.ops.push(Operation::new("rg", color_operands(fill)));
            self.ops.push(Operation::new("RG", color_operands(border)));
            self.ops.push(Operation::new("w", vec![real(width)]));
            self.push_rect(bbox);
            self.ops.push(Operation::new("B", vec![]));
        } else {
            self.fill_rect(bbox, fill);
        }
    }

    /// Draw `text` with its baseline starting at `(x, baseline)`.
    pub fn text(&mut self, x: f64, baseline: f64, size: f64, bold: bool, color: Color, text: &str) {
        if text.is_empty() {
            return;
        }
        let font = if bold { BOLD_FONT } else { REGULAR_FONT };
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new("rg", color_operands(color)));
        self.ops.push(Operation::new(
            "Tf",
            vec![Object::Name(font.as_bytes().to_vec()), real(size)],
        ));
        // The canvas space is y-down; flip glyphs back upright.
        self.ops.push(Operation::new(
            "Tm",
            vec![real(1.0), real(0.0), real(0.0), real(-1.0), real(x), real(baseline)],
        ));
        self.ops.push(Operation::new(
            "Tj",
            vec![Object::String(win_ansi_encode_str(text), StringFormat::Literal)],
        ));
        self.ops.push(Operation::new("ET", vec![]));
    }

    fn push_rect(&mut self, bbox: BBox) {
        self.ops.push(Operation::new(
            "re",
            vec![real(bbox.x0), real(bbox.top), real(bbox.width()), real(bbox.height())],
        ));
    }

    /// Close the overlay and encode it.
    pub fn finish(mut self) -> Result<Vec<u8>, BackendError> {
        self.ops.push(Operation::new("Q", vec![]));
        Ok(Content {
            operations: self.ops,
        }
        .encode()?)
    }
}

/// Append an encoded overlay to a page, keeping the original content
/// isolated and registering the overlay fonts.
pub fn append_overlay(
    doc: &mut Document,
    page_id: ObjectId,
    overlay: Vec<u8>,
) -> Result<(), BackendError> {
    let resources = overlay_resources(doc, page_id)?;

    let existing: Vec<Object> = {
        let page = doc
            .get_object(page_id)
            .and_then(Object::as_dict)
            .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?;
        match page.get(b"Contents") {
            Ok(Object::Array(items)) => items.clone(),
            Ok(Object::Reference(id)) => match doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Stream(_)) => {
                return Err(BackendError::Parse("inline /Contents stream".to_string()));
            }
            _ => Vec::new(),
        }
    };

    let mut contents = Vec::with_capacity(existing.len() + 3);
    if !existing.is_empty() {
        let open = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let close = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
        contents.push(Object::Reference(open));
        contents.extend(existing);
        contents.push(Object::Reference(close));
    }
    let mut overlay_stream = Stream::new(Dictionary::new(), overlay);
    overlay_stream.compress()?;
    contents.push(Object::Reference(doc.add_object(overlay_stream)));

    let page = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?;
    page.set("Contents", Object::Array(contents));
    page.set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// A copy of the page's effective resources with the overlay fonts added.
///
/// The copy is written onto the page itself so resources shared with
/// other pages are left untouched.
fn overlay_resources(doc: &mut Document, page_id: ObjectId) -> Result<Dictionary, BackendError> {
    let mut resources = match resolve_inherited(doc, page_id, b"Resources")? {
        Some(obj) => resolve_ref(doc, obj).as_dict().cloned().unwrap_or_default(),
        None => Dictionary::new(),
    };
    let mut fonts = match resources.get(b"Font") {
        Ok(obj) => resolve_ref(doc, obj).as_dict().cloned().unwrap_or_default(),
        Err(_) => Dictionary::new(),
    };
    for (name, base) in [(REGULAR_FONT, "Helvetica"), (BOLD_FONT, "Helvetica-Bold")] {
        let id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => base,
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(name, Object::Reference(id));
    }
    resources.set("Font", Object::Dictionary(fonts));
    Ok(resources)
}
