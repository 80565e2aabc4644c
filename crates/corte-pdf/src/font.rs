//! Font dictionaries reduced to what extraction and painting need: how to
//! split a show string into character codes, what text each code stands
//! for, how far each glyph advances, and which outline draws it.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object};
use tracing::debug;

use crate::cmap::ToUnicodeMap;
use crate::document::{decode_stream, object_to_f64, resolve_ref};
use crate::encoding::{glyph_name_to_char, win_ansi_decode};
use crate::font_program::{FontProgram, cid_to_gid_map, embedded_program};
use crate::standard_fonts::{helvetica_width, is_helvetica};

/// Glyph advance used when a font declares no widths at all.
const FALLBACK_WIDTH: f64 = 500.0;

/// One decoded glyph of a show string.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub code: u32,
    /// Unicode text for the code; empty when the font gives no mapping.
    pub text: String,
    /// Advance in 1/1000 text-space units.
    pub width: f64,
    /// Single-byte code 32, which receives word spacing.
    pub is_space: bool,
}

#[derive(Debug, Clone)]
enum Widths {
    Simple {
        first_char: u32,
        widths: Vec<f64>,
        missing: f64,
    },
    Cid {
        default: f64,
        widths: HashMap<u32, f64>,
    },
    Helvetica {
        bold: bool,
    },
    Uniform(f64),
}

/// A font resource prepared for decoding show strings.
#[derive(Debug, Clone)]
pub struct LoadedFont {
    pub base_font: String,
    to_unicode: Option<ToUnicodeMap>,
    differences: HashMap<u8, char>,
    two_byte: bool,
    widths: Widths,
    program: Option<FontProgram>,
    /// CID → glyph index for embedded CID fonts; `None` is identity.
    cid_to_gid: Option<Vec<u16>>,
    bold: bool,
}

impl LoadedFont {
    /// Read a font dictionary. Missing or malformed entries fall back to
    /// WinAnsi decoding and default widths rather than failing.
    pub fn from_dict(doc: &Document, dict: &Dictionary) -> Self {
        let base_font = dict
            .get(b"BaseFont")
            .ok()
            .and_then(|o| resolve_ref(doc, o).as_name().ok())
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .unwrap_or_default();
        let subtype = dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .unwrap_or(b"");

        let to_unicode = dict
            .get(b"ToUnicode")
            .ok()
            .and_then(|o| resolve_ref(doc, o).as_stream().ok())
            .and_then(|s| decode_stream(s).ok())
            .map(|data| ToUnicodeMap::parse(&data));

        if subtype == b"Type0" {
            let two_byte = to_unicode
                .as_ref()
                .and_then(ToUnicodeMap::code_bytes)
                .is_none_or(|n| n >= 2);
            let descendant = descendant_font(doc, dict);
            let descriptor = descendant.and_then(|d| font_descriptor(doc, d));
            return Self {
                bold: is_bold(&base_font, descriptor),
                program: descriptor.and_then(|fd| embedded_program(doc, fd)),
                cid_to_gid: descendant.and_then(|d| cid_to_gid_map(doc, d)),
                base_font,
                to_unicode,
                differences: HashMap::new(),
                two_byte,
                widths: cid_widths(doc, descendant),
            };
        }

        let descriptor = font_descriptor(doc, dict);
        Self {
            differences: differences(doc, dict),
            widths: simple_widths(doc, dict, &base_font),
            bold: is_bold(&base_font, descriptor),
            program: descriptor.and_then(|fd| embedded_program(doc, fd)),
            cid_to_gid: None,
            base_font,
            to_unicode,
            two_byte: false,
        }
    }

    /// Fallback font for a `Tf` naming a resource that does not exist.
    pub fn missing(name: &str) -> Self {
        debug!(font = name, "font resource missing, decoding as WinAnsi");
        Self {
            base_font: name.to_string(),
            to_unicode: None,
            differences: HashMap::new(),
            two_byte: false,
            widths: Widths::Helvetica { bold: false },
            program: None,
            cid_to_gid: None,
            bold: false,
        }
    }

    /// The outline that paints `glyph`: the embedded program when it has
    /// the glyph, otherwise the bundled face looked up by Unicode text.
    pub fn outline(&self, glyph: &Glyph) -> Option<(&FontProgram, u16)> {
        if let Some(program) = &self.program {
            let index = if self.two_byte {
                self.gid_for_cid(glyph.code)
            } else {
                glyph
                    .text
                    .chars()
                    .next()
                    .and_then(|c| program.glyph_for_char(c))
                    // Symbolic TrueType subsets map codes into U+F0xx.
                    .or_else(|| {
                        char::from_u32(0xF000 | glyph.code).and_then(|c| program.glyph_for_char(c))
                    })
            };
            if let Some(index) = index.filter(|&i| program.has_glyph(i)) {
                return Some((program, index));
            }
        }
        let c = glyph.text.chars().next()?;
        let face = FontProgram::fallback(self.bold)?;
        face.glyph_for_char(c).map(|index| (face, index))
    }

    fn gid_for_cid(&self, cid: u32) -> Option<u16> {
        match &self.cid_to_gid {
            Some(map) => map.get(cid as usize).copied(),
            None => u16::try_from(cid).ok(),
        }
    }

    pub fn is_two_byte(&self) -> bool {
        self.two_byte
    }

    /// Split a show string into glyphs.
    pub fn decode(&self, bytes: &[u8]) -> Vec<Glyph> {
        if self.two_byte {
            bytes
                .chunks(2)
                .map(|pair| {
                    let code = pair.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
                    Glyph {
                        code,
                        text: self.text_for(code),
                        width: self.width_of(code),
                        is_space: false,
                    }
                })
                .collect()
        } else {
            bytes
                .iter()
                .map(|&b| {
                    let code = b as u32;
                    Glyph {
                        code,
                        text: self.text_for(code),
                        width: self.width_of(code),
                        is_space: b == b' ',
                    }
                })
                .collect()
        }
    }

    fn text_for(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.as_ref().and_then(|m| m.lookup(code)) {
            return text.to_string();
        }
        if self.two_byte {
            return String::new();
        }
        let byte = code as u8;
        self.differences
            .get(&byte)
            .copied()
            .or_else(|| win_ansi_decode(byte))
            .map(String::from)
            .unwrap_or_default()
    }

    fn width_of(&self, code: u32) -> f64 {
        match &self.widths {
            Widths::Simple {
                first_char,
                widths,
                missing,
            } => code
                .checked_sub(*first_char)
                .and_then(|i| widths.get(i as usize))
                .copied()
                .unwrap_or(*missing),
            Widths::Cid { default, widths } => widths.get(&code).copied().unwrap_or(*default),
            Widths::Helvetica { bold } => match helvetica_width(code as u8, *bold) {
                0 => FALLBACK_WIDTH,
                w => w as f64,
            },
            Widths::Uniform(w) => *w,
        }
    }
}

fn simple_widths(doc: &Document, dict: &Dictionary, base_font: &str) -> Widths {
    let widths: Option<Vec<f64>> = dict
        .get(b"Widths")
        .ok()
        .and_then(|o| resolve_ref(doc, o).as_array().ok())
        .map(|arr| {
            arr.iter()
                .map(|o| object_to_f64(resolve_ref(doc, o)).unwrap_or(0.0))
                .collect()
        });
    if let Some(widths) = widths {
        let first_char = dict
            .get(b"FirstChar")
            .ok()
            .and_then(|o| object_to_f64(resolve_ref(doc, o)))
            .unwrap_or(0.0) as u32;
        let missing = font_descriptor(doc, dict)
            .and_then(|fd| fd.get(b"MissingWidth").ok())
            .and_then(object_to_f64)
            .unwrap_or(0.0);
        return Widths::Simple {
            first_char,
            widths,
            missing,
        };
    }
    let stripped = strip_subset_prefix(base_font);
    if stripped.starts_with("Courier") {
        return Widths::Uniform(600.0);
    }
    Widths::Helvetica {
        bold: is_helvetica(stripped).unwrap_or(stripped.contains("Bold")),
    }
}

fn descendant_font<'a>(doc: &'a Document, dict: &'a Dictionary) -> Option<&'a Dictionary> {
    dict.get(b"DescendantFonts")
        .ok()
        .and_then(|o| resolve_ref(doc, o).as_array().ok())
        .and_then(|arr| arr.first())
        .and_then(|o| resolve_ref(doc, o).as_dict().ok())
}

fn font_descriptor<'a>(doc: &'a Document, dict: &'a Dictionary) -> Option<&'a Dictionary> {
    dict.get(b"FontDescriptor")
        .ok()
        .and_then(|o| resolve_ref(doc, o).as_dict().ok())
}

/// Bold by name, or by a descriptor weight of 600 and up.
fn is_bold(base_font: &str, descriptor: Option<&Dictionary>) -> bool {
    let name = strip_subset_prefix(base_font);
    if ["Bold", "Black", "Heavy", "Semibold"].iter().any(|w| name.contains(w)) {
        return true;
    }
    descriptor
        .and_then(|fd| fd.get(b"FontWeight").ok())
        .and_then(object_to_f64)
        .is_some_and(|w| w >= 600.0)
}

/// Parse `/DW` and `/W` from the descendant CID font.
fn cid_widths(doc: &Document, descendant: Option<&Dictionary>) -> Widths {
    let Some(descendant) = descendant else {
        return Widths::Uniform(1000.0);
    };
    let default = descendant
        .get(b"DW")
        .ok()
        .and_then(|o| object_to_f64(resolve_ref(doc, o)))
        .unwrap_or(1000.0);
    let mut widths = HashMap::new();
    if let Some(w) = descendant
        .get(b"W")
        .ok()
        .and_then(|o| resolve_ref(doc, o).as_array().ok())
    {
        let mut i = 0;
        while i < w.len() {
            let Some(first) = object_to_f64(resolve_ref(doc, &w[i])) else {
                break;
            };
            match w.get(i + 1).map(|o| resolve_ref(doc, o)) {
                // c [w1 w2 ...]
                Some(Object::Array(list)) => {
                    for (k, o) in list.iter().enumerate() {
                        if let Some(v) = object_to_f64(resolve_ref(doc, o)) {
                            widths.insert(first as u32 + k as u32, v);
                        }
                    }
                    i += 2;
                }
                // c_first c_last w
                Some(last) => {
                    let last = object_to_f64(last).unwrap_or(first);
                    let v = w
                        .get(i + 2)
                        .and_then(|o| object_to_f64(resolve_ref(doc, o)))
                        .unwrap_or(default);
                    // Guard against absurd ranges in broken files.
                    let span = (last - first).clamp(0.0, 65535.0) as u32;
                    for code in first as u32..=first as u32 + span {
                        widths.insert(code, v);
                    }
                    i += 3;
                }
                None => break,
            }
        }
    }
    Widths::Cid { default, widths }
}

/// `/Encoding << /Differences [...] >>` as a code → char table.
fn differences(doc: &Document, dict: &Dictionary) -> HashMap<u8, char> {
    let mut table = HashMap::new();
    let Some(diffs) = dict
        .get(b"Encoding")
        .ok()
        .and_then(|o| resolve_ref(doc, o).as_dict().ok())
        .and_then(|enc| enc.get(b"Differences").ok())
        .and_then(|o| resolve_ref(doc, o).as_array().ok())
    else {
        return table;
    };
    let mut code: u32 = 0;
    for item in diffs {
        match item {
            Object::Integer(n) => code = (*n).clamp(0, 255) as u32,
            Object::Name(name) => {
                if let Some(ch) = glyph_name_to_char(&String::from_utf8_lossy(name)) {
                    if code <= 255 {
                        table.insert(code as u8, ch);
                    }
                }
                code += 1;
            }
            _ => {}
        }
    }
    table
}

/// Drop a `ABCDEF+` subset tag from a font name.
fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.chars().all(|c| c.is_ascii_uppercase()) => rest,
        _ => name,
    }
}
