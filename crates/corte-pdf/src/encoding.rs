//! WinAnsi (Windows-1252) single-byte encoding and glyph-name lookup.
//!
//! Used in both directions: decoding simple-font show strings into text
//! runs, and encoding overlay text for the standard Helvetica faces the
//! stamper and report composer register with `/WinAnsiEncoding`.

/// Characters at 0x80–0x9F, where Windows-1252 departs from Latin-1.
/// `None` marks codes left undefined.
const WIN_ANSI_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'), // 0x80 euro
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'), // 0x85 ellipsis
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None, // 0x90
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'), // 0x97 em dash
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

/// Decode one WinAnsi code.
pub fn win_ansi_decode(code: u8) -> Option<char> {
    match code {
        0x20..=0x7E => Some(code as char),
        0x80..=0x9F => WIN_ANSI_HIGH[(code - 0x80) as usize],
        // PDF's WinAnsi maps 0xA0 to space and 0xAD to hyphen.
        0xA0 => Some(' '),
        0xAD => Some('-'),
        0xA1..=0xFF => Some(code as char),
        b'\t' | b'\n' | b'\r' => Some(' '),
        _ => None,
    }
}

/// Encode one character, or `None` when WinAnsi has no code for it.
pub fn win_ansi_encode(ch: char) -> Option<u8> {
    let cp = ch as u32;
    match cp {
        0x20..=0x7E | 0xA1..=0xFF => Some(cp as u8),
        _ => WIN_ANSI_HIGH
            .iter()
            .position(|c| *c == Some(ch))
            .map(|i| 0x80 + i as u8),
    }
}

/// Encode a string for a WinAnsi font. Unencodable characters become `?`.
pub fn win_ansi_encode_str(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            '\u{00A0}' => b' ',
            _ => win_ansi_encode(ch).unwrap_or(b'?'),
        })
        .collect()
}

/// Map an Adobe glyph name (from an `/Encoding /Differences` array) to a
/// character. Covers `uniXXXX`, single-letter names and the Latin names
/// common in Portuguese-language documents.
pub fn glyph_name_to_char(name: &str) -> Option<char> {
    if let Some(hex) = name.strip_prefix("uni") {
        if hex.len() == 4 {
            if let Ok(code) = u32::from_str_radix(hex, 16) {
                return char::from_u32(code);
            }
        }
    }
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphabetic() {
            return Some(c);
        }
    }
    GLYPH_NAMES
        .binary_search_by_key(&name, |&(n, _)| n)
        .ok()
        .map(|i| GLYPH_NAMES[i].1)
}

/// Sorted for binary search.
static GLYPH_NAMES: &[(&str, char)] = &[
    ("Aacute", 'Á'),
    ("Acircumflex", 'Â'),
    ("Agrave", 'À'),
    ("Atilde", 'Ã'),
    ("Ccedilla", 'Ç'),
    ("Eacute", 'É'),
    ("Ecircumflex", 'Ê'),
    ("Iacute", 'Í'),
    ("Oacute", 'Ó'),
    ("Ocircumflex", 'Ô'),
    ("Otilde", 'Õ'),
    ("Uacute", 'Ú'),
    ("Udieresis", 'Ü'),
    ("aacute", 'á'),
    ("acircumflex", 'â'),
    ("agrave", 'à'),
    ("ampersand", '&'),
    ("atilde", 'ã'),
    ("ccedilla", 'ç'),
    ("colon", ':'),
    ("comma", ','),
    ("degree", '°'),
    ("eacute", 'é'),
    ("ecircumflex", 'ê'),
    ("eight", '8'),
    ("ellipsis", '…'),
    ("emdash", '—'),
    ("endash", '–'),
    ("five", '5'),
    ("four", '4'),
    ("hyphen", '-'),
    ("iacute", 'í'),
    ("nine", '9'),
    ("numbersign", '#'),
    ("oacute", 'ó'),
    ("ocircumflex", 'ô'),
    ("one", '1'),
    ("ordmasculine", 'º'),
    ("otilde", 'õ'),
    ("parenleft", '('),
    ("parenright", ')'),
    ("period", '.'),
    ("seven", '7'),
    ("six", '6'),
    ("slash", '/'),
    ("space", ' '),
    ("three", '3'),
    ("two", '2'),
    ("uacute", 'ú'),
    ("udieresis", 'ü'),
    ("underscore", '_'),
    ("zero", '0'),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_and_latin1_pass_through() {
        assert_eq!(win_ansi_decode(b'A'), Some('A'));
        assert_eq!(win_ansi_decode(0xC7), Some('Ç'));
        assert_eq!(win_ansi_decode(0xE3), Some('ã'));
        assert_eq!(win_ansi_decode(0x81), None);
    }

    #[test]
    fn high_range_round_trips() {
        assert_eq!(win_ansi_encode('…'), Some(0x85));
        assert_eq!(win_ansi_encode('—'), Some(0x97));
        assert_eq!(win_ansi_decode(0x85), Some('…'));
        assert_eq!(win_ansi_decode(0x97), Some('—'));
    }

    #[test]
    fn encode_str_replaces_unknown() {
        assert_eq!(win_ansi_encode_str("LIGAÇÃO"), b"LIGA\xC7\xC3O".to_vec());
        assert_eq!(win_ansi_encode_str("水"), b"?".to_vec());
    }

    #[test]
    fn glyph_names_resolve() {
        assert_eq!(glyph_name_to_char("Ccedilla"), Some('Ç'));
        assert_eq!(glyph_name_to_char("uni00E7"), Some('ç'));
        assert_eq!(glyph_name_to_char("Q"), Some('Q'));
        assert_eq!(glyph_name_to_char("seven"), Some('7'));
        assert_eq!(glyph_name_to_char("g123"), None);
    }

    #[test]
    fn glyph_table_is_sorted() {
        assert!(GLYPH_NAMES.windows(2).all(|w| w[0].0 < w[1].0));
    }
}
