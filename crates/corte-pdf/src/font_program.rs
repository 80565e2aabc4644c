//! Outline fonts used to paint glyphs.
//!
//! Embedded TrueType (`/FontFile2`) and OpenType (`/FontFile3` with
//! `/Subtype /OpenType`) programs are parsed with fontdue. Type 1 and bare
//! CFF programs, and fonts with nothing embedded (the standard 14 in
//! particular), paint with a bundled DejaVu Sans face.

use std::sync::{Arc, LazyLock};

use fontdue::{Font, FontSettings};
use lopdf::{Dictionary, Document, Object};
use tracing::debug;

use crate::document::{decode_stream, resolve_ref};

static DEJAVU_SANS: &[u8] = include_bytes!("../fonts/DejaVuSans.ttf");
static DEJAVU_SANS_BOLD: &[u8] = include_bytes!("../fonts/DejaVuSans-Bold.ttf");

static FALLBACK_REGULAR: LazyLock<Option<FontProgram>> =
    LazyLock::new(|| FontProgram::parse(DEJAVU_SANS));
static FALLBACK_BOLD: LazyLock<Option<FontProgram>> =
    LazyLock::new(|| FontProgram::parse(DEJAVU_SANS_BOLD));

/// A parsed outline font, cheap to clone.
#[derive(Clone)]
pub struct FontProgram(Arc<Font>);

impl std::fmt::Debug for FontProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FontProgram")
            .field(&self.0.glyph_count())
            .finish()
    }
}

/// Coverage bitmap of one glyph at a pixel size.
///
/// `left` and `bottom` place the bitmap relative to the glyph origin, in
/// pixels, with `bottom` measured upward from the baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphBitmap {
    pub left: i32,
    pub bottom: i32,
    pub width: usize,
    pub height: usize,
    /// Row-major coverage, top row first.
    pub coverage: Vec<u8>,
}

impl FontProgram {
    /// Parse TrueType or OpenType data. `None` when fontdue rejects it.
    pub fn parse(data: &[u8]) -> Option<Self> {
        match Font::from_bytes(data, FontSettings::default()) {
            Ok(font) => Some(Self(Arc::new(font))),
            Err(err) => {
                debug!(error = err, "font program rejected");
                None
            }
        }
    }

    /// The bundled face standing in for fonts without a usable program.
    pub fn fallback(bold: bool) -> Option<&'static FontProgram> {
        if bold {
            FALLBACK_BOLD.as_ref()
        } else {
            FALLBACK_REGULAR.as_ref()
        }
    }

    pub fn glyph_count(&self) -> u16 {
        self.0.glyph_count()
    }

    /// Glyph index for a character through the font's cmap; 0 is `.notdef`.
    pub fn glyph_for_char(&self, c: char) -> Option<u16> {
        match self.0.lookup_glyph_index(c) {
            0 => None,
            index => Some(index),
        }
    }

    /// Whether `index` names a real glyph of this font.
    pub fn has_glyph(&self, index: u16) -> bool {
        index != 0 && index < self.0.glyph_count()
    }

    pub fn rasterize(&self, index: u16, px: f32) -> GlyphBitmap {
        let (metrics, coverage) = self.0.rasterize_indexed(index, px);
        GlyphBitmap {
            left: metrics.xmin,
            bottom: metrics.ymin,
            width: metrics.width,
            height: metrics.height,
            coverage,
        }
    }
}

/// The embedded program named by a font descriptor, if fontdue can read it.
pub(crate) fn embedded_program(doc: &Document, descriptor: &Dictionary) -> Option<FontProgram> {
    if let Some(stream) = descriptor
        .get(b"FontFile2")
        .ok()
        .and_then(|o| resolve_ref(doc, o).as_stream().ok())
    {
        return decode_stream(stream).ok().and_then(|data| FontProgram::parse(&data));
    }
    let stream = descriptor
        .get(b"FontFile3")
        .ok()
        .and_then(|o| resolve_ref(doc, o).as_stream().ok())?;
    match stream.dict.get(b"Subtype").and_then(Object::as_name) {
        Ok(b"OpenType") => decode_stream(stream).ok().and_then(|data| FontProgram::parse(&data)),
        _ => {
            debug!("bare CFF program, painting with the fallback face");
            None
        }
    }
}

/// `/CIDToGIDMap` of a CIDFontType2 descendant. `None` means identity.
pub(crate) fn cid_to_gid_map(doc: &Document, descendant: &Dictionary) -> Option<Vec<u16>> {
    let stream = descendant
        .get(b"CIDToGIDMap")
        .ok()
        .and_then(|o| resolve_ref(doc, o).as_stream().ok())?;
    let data = decode_stream(stream).ok()?;
    Some(
        data.chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect(),
    )
}
