//! lopdf-backed document access: pages, inherited attributes, boxes,
//! resources and content streams.

use std::sync::LazyLock;

use corte_core::{BBox, CorteError};
use lopdf::{Dictionary, Object, ObjectId, Stream};

use crate::error::BackendError;
use crate::page_geometry::PageGeometry;

/// A parsed PDF document backed by lopdf.
pub struct PdfDocument {
    inner: lopdf::Document,
    /// Page ObjectIds in page order.
    page_ids: Vec<ObjectId>,
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("page_count", &self.page_ids.len())
            .finish_non_exhaustive()
    }
}

/// A reference to a single page within a [`PdfDocument`].
#[derive(Debug, Clone, Copy)]
pub struct PageRef {
    pub object_id: ObjectId,
    /// The 0-based page index.
    pub index: usize,
}

impl PdfDocument {
    /// Parse a document from memory.
    ///
    /// Encrypted documents are rejected: the pipeline has no password input.
    pub fn open(bytes: &[u8]) -> Result<Self, BackendError> {
        let inner = lopdf::Document::load_mem(bytes)
            .map_err(|e| BackendError::Parse(format!("failed to parse PDF: {e}")))?;
        if inner.is_encrypted() {
            return Err(BackendError::Parse("document is encrypted".to_string()));
        }
        Ok(Self::from_lopdf(inner))
    }

    /// Wrap an already loaded lopdf document.
    pub fn from_lopdf(inner: lopdf::Document) -> Self {
        // get_pages returns a BTreeMap keyed by 1-based page number
        let page_ids = inner.get_pages().values().copied().collect();
        Self { inner, page_ids }
    }

    pub fn inner(&self) -> &lopdf::Document {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut lopdf::Document {
        &mut self.inner
    }

    pub fn into_inner(self) -> lopdf::Document {
        self.inner
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Look up a page by 0-based index.
    pub fn page(&self, index: usize) -> Result<PageRef, CorteError> {
        self.page_ids
            .get(index)
            .map(|&object_id| PageRef { object_id, index })
            .ok_or(CorteError::PageIndexOutOfRange {
                index,
                page_count: self.page_ids.len(),
            })
    }

    /// The page's MediaBox (inherited), as raw PDF coordinates.
    pub fn media_box(&self, page: PageRef) -> Result<BBox, BackendError> {
        let obj = resolve_inherited(&self.inner, page.object_id, b"MediaBox")?
            .ok_or_else(|| BackendError::Parse("MediaBox not found on page or ancestors".into()))?;
        let array = resolve_ref(&self.inner, obj)
            .as_array()
            .map_err(|e| BackendError::Parse(format!("MediaBox is not an array: {e}")))?;
        bbox_from_array(&self.inner, array)
    }

    /// The page's CropBox, if it has a valid one.
    pub fn crop_box(&self, page: PageRef) -> Result<Option<BBox>, BackendError> {
        match resolve_inherited(&self.inner, page.object_id, b"CropBox")? {
            Some(obj) => match resolve_ref(&self.inner, obj).as_array() {
                Ok(array) => Ok(bbox_from_array(&self.inner, array).ok()),
                Err(_) => Ok(None),
            },
            None => Ok(None),
        }
    }

    /// The page's `/Rotate` value (inherited), defaulting to 0.
    pub fn rotation(&self, page: PageRef) -> Result<i32, BackendError> {
        match resolve_inherited(&self.inner, page.object_id, b"Rotate")? {
            Some(obj) => match resolve_ref(&self.inner, obj) {
                Object::Integer(i) => Ok(*i as i32),
                Object::Real(r) => Ok(*r as i32),
                _ => Ok(0),
            },
            None => Ok(0),
        }
    }

    /// Geometry for mapping native page space into top-left display space.
    pub fn geometry(&self, page: PageRef) -> Result<PageGeometry, BackendError> {
        let media = normalize_box(self.media_box(page)?);
        let crop = self.crop_box(page)?.map(normalize_box);
        Ok(PageGeometry::new(media, crop, self.rotation(page)?))
    }

    /// The page's resources dictionary (inherited), or an empty one.
    pub fn resources(&self, page: PageRef) -> Result<&Dictionary, BackendError> {
        static EMPTY: LazyLock<Dictionary> = LazyLock::new(Dictionary::new);
        match resolve_inherited(&self.inner, page.object_id, b"Resources")? {
            Some(obj) => resolve_ref(&self.inner, obj)
                .as_dict()
                .map_err(|_| BackendError::Parse("/Resources is not a dictionary".to_string())),
            None => Ok(&EMPTY),
        }
    }

    /// The page's content program. Several `/Contents` streams are joined
    /// with a newline so tokens never fuse across the seam.
    pub fn content_bytes(&self, page: PageRef) -> Result<Vec<u8>, BackendError> {
        let Ok(contents) = self.page_dict(page)?.get(b"Contents") else {
            return Ok(Vec::new());
        };
        let parts: Vec<&Stream> = match resolve_ref(&self.inner, contents) {
            Object::Stream(stream) => vec![stream],
            Object::Array(items) => items
                .iter()
                .map(|item| {
                    resolve_ref(&self.inner, item)
                        .as_stream()
                        .map_err(|_| BackendError::Parse("page /Contents lists a non-stream".into()))
                })
                .collect::<Result<_, _>>()?,
            _ => {
                return Err(BackendError::Parse(
                    "page /Contents is neither a stream nor an array".into(),
                ));
            }
        };

        let mut program = Vec::new();
        for (i, stream) in parts.into_iter().enumerate() {
            if i > 0 {
                program.push(b'\n');
            }
            program.extend(decode_stream(stream)?);
        }
        Ok(program)
    }

    pub fn page_dict(&self, page: PageRef) -> Result<&Dictionary, BackendError> {
        page_node(&self.inner, page.object_id)
    }
}

/// Page-tree depth beyond which `/Parent` chains are treated as cyclic.
const MAX_TREE_DEPTH: usize = 64;

fn page_node(doc: &lopdf::Document, id: ObjectId) -> Result<&Dictionary, BackendError> {
    doc.get_dictionary(id)
        .map_err(|e| BackendError::Parse(format!("page tree node {} {}: {e}", id.0, id.1)))
}

/// `key` from the page itself or the nearest ancestor that sets it.
pub(crate) fn resolve_inherited<'a>(
    doc: &'a lopdf::Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>, BackendError> {
    let mut node = page_node(doc, page_id)?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Ok(Some(value));
        }
        let Ok(parent) = node.get(b"Parent").and_then(Object::as_reference) else {
            return Ok(None);
        };
        node = page_node(doc, parent)?;
    }
    Ok(None)
}

/// Follow an indirect reference, returning the object itself otherwise.
pub(crate) fn resolve_ref<'a>(doc: &'a lopdf::Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Convert a lopdf numeric object (Integer or Real) to f64.
pub(crate) fn object_to_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(*f as f64),
        _ => None,
    }
}

/// Decode a stream, decompressing if it carries a filter.
pub(crate) fn decode_stream(stream: &Stream) -> Result<Vec<u8>, BackendError> {
    if stream.dict.get(b"Filter").is_ok() {
        stream
            .decompressed_content()
            .map_err(|e| BackendError::Parse(format!("failed to decompress stream: {e}")))
    } else {
        Ok(stream.content.clone())
    }
}

fn bbox_from_array(doc: &lopdf::Document, array: &[Object]) -> Result<BBox, BackendError> {
    if array.len() != 4 {
        return Err(BackendError::Parse(format!(
            "expected 4-element array for box, got {}",
            array.len()
        )));
    }
    let mut values = [0.0; 4];
    for (slot, obj) in values.iter_mut().zip(array) {
        *slot = object_to_f64(resolve_ref(doc, obj))
            .ok_or_else(|| BackendError::Parse(format!("expected number, got {obj:?}")))?;
    }
    Ok(BBox::new(values[0], values[1], values[2], values[3]))
}

/// Order box corners so that `x0 <= x1` and `top <= bottom`.
fn normalize_box(b: BBox) -> BBox {
    BBox::new(b.x0.min(b.x1), b.top.min(b.bottom), b.x0.max(b.x1), b.top.max(b.bottom))
}
