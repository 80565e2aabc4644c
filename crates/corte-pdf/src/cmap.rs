//! ToUnicode CMap parsing.
//!
//! Reads the `bfchar` and `bfrange` sections of a `/ToUnicode` stream into a
//! code → text table, and the `codespacerange` section to learn how many
//! bytes a character code occupies.

use std::collections::HashMap;

/// Code → Unicode mapping parsed from a `/ToUnicode` stream.
#[derive(Debug, Clone, Default)]
pub struct ToUnicodeMap {
    mappings: HashMap<u32, String>,
    /// Byte width of a character code (1 or 2), from `codespacerange`.
    code_bytes: Option<usize>,
}

#[derive(Debug, PartialEq)]
enum Token<'a> {
    Hex(Vec<u8>),
    Open,
    Close,
    Word(&'a str),
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    None,
    CodeSpace,
    BfChar,
    BfRange,
}

impl ToUnicodeMap {
    /// Parse CMap program text. Malformed entries are skipped.
    pub fn parse(data: &[u8]) -> Self {
        let text = String::from_utf8_lossy(data);
        let tokens = tokenize(&text);
        let mut map = ToUnicodeMap::default();
        let mut section = Section::None;
        let mut i = 0;

        while i < tokens.len() {
            match &tokens[i] {
                Token::Word("begincodespacerange") => section = Section::CodeSpace,
                Token::Word("beginbfchar") => section = Section::BfChar,
                Token::Word("beginbfrange") => section = Section::BfRange,
                Token::Word(w) if w.starts_with("end") => section = Section::None,
                Token::Hex(low) => match section {
                    Section::CodeSpace => {
                        map.code_bytes = Some(map.code_bytes.unwrap_or(0).max(low.len()));
                        i += 1;
                    }
                    Section::BfChar => {
                        if let Some(Token::Hex(dst)) = tokens.get(i + 1) {
                            map.mappings.insert(code_of(low), utf16be(dst));
                            i += 1;
                        }
                    }
                    Section::BfRange => {
                        i += map.parse_range(low, &tokens[i + 1..]);
                    }
                    Section::None => {}
                },
                _ => {}
            }
            i += 1;
        }
        map
    }

    /// Handle `<lo> <hi> <dst>` or `<lo> <hi> [<d0> <d1> ...]`.
    /// Returns the number of tokens consumed after `<lo>`.
    fn parse_range(&mut self, low: &[u8], rest: &[Token<'_>]) -> usize {
        let Some(Token::Hex(high)) = rest.first() else {
            return 0;
        };
        let (lo, hi) = (code_of(low), code_of(high));
        if hi < lo || hi - lo > 0xFFFF {
            return 1;
        }
        match rest.get(1) {
            Some(Token::Hex(dst)) => {
                let base = utf16be(dst);
                let mut units: Vec<char> = base.chars().collect();
                for code in lo..=hi {
                    self.mappings.insert(code, units.iter().collect());
                    // Increment the last character for each subsequent code.
                    if let Some(last) = units.last_mut() {
                        *last = char::from_u32(*last as u32 + 1).unwrap_or('\u{FFFD}');
                    }
                }
                2
            }
            Some(Token::Open) => {
                let mut consumed = 2;
                let mut code = lo;
                for token in &rest[2..] {
                    consumed += 1;
                    match token {
                        Token::Hex(dst) => {
                            if code <= hi {
                                self.mappings.insert(code, utf16be(dst));
                            }
                            code += 1;
                        }
                        _ => break,
                    }
                }
                consumed
            }
            _ => 1,
        }
    }

    pub fn lookup(&self, code: u32) -> Option<&str> {
        self.mappings.get(&code).map(String::as_str)
    }

    /// Declared character code width, if the CMap has a codespace range.
    pub fn code_bytes(&self) -> Option<usize> {
        self.code_bytes
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

/// Decode UTF-16BE bytes; a lone byte is treated as a Latin-1 code point.
fn utf16be(bytes: &[u8]) -> String {
    if bytes.len() == 1 {
        return (bytes[0] as char).to_string();
    }
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|c| match c {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [b] => *b as u16,
            _ => 0xFFFD,
        })
        .collect();
    String::from_utf16_lossy(&units)
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        match bytes[pos] {
            b'%' => {
                while pos < bytes.len() && bytes[pos] != b'\n' && bytes[pos] != b'\r' {
                    pos += 1;
                }
            }
            b'<' if bytes.get(pos + 1) == Some(&b'<') => pos += 2,
            b'>' if bytes.get(pos + 1) == Some(&b'>') => pos += 2,
            b'<' => {
                let start = pos + 1;
                let end = text[start..].find('>').map_or(bytes.len(), |e| start + e);
                tokens.push(Token::Hex(hex_bytes(&text[start..end])));
                pos = end + 1;
            }
            b'[' => {
                tokens.push(Token::Open);
                pos += 1;
            }
            b']' => {
                tokens.push(Token::Close);
                pos += 1;
            }
            b if b.is_ascii_whitespace() => pos += 1,
            _ => {
                let start = pos;
                while pos < bytes.len()
                    && !bytes[pos].is_ascii_whitespace()
                    && !matches!(bytes[pos], b'<' | b'>' | b'[' | b']' | b'%')
                {
                    pos += 1;
                }
                if pos == start {
                    pos += 1;
                } else {
                    tokens.push(Token::Word(&text[start..pos]));
                }
            }
        }
    }
    tokens
}

fn hex_bytes(hex: &str) -> Vec<u8> {
    let digits: Vec<u8> = hex
        .bytes()
        .filter_map(|b| (b as char).to_digit(16).map(|d| d as u8))
        .collect();
    digits
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => (hi << 4) | lo,
            [hi] => hi << 4,
            _ => 0,
        })
        .collect()
}
