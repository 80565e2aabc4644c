//! Filename derivation, sanitizing and de-duplication for half-page records.

use std::collections::HashSet;

use crate::raster::Half;

/// Placeholder segment used when an identifier is absent.
pub const MISSING_SEGMENT: &str = "X";

/// Maximum number of characters kept in a filename stem.
pub const MAX_STEM_CHARS: usize = 120;

/// Stem used when sanitizing leaves nothing behind.
pub const FALLBACK_STEM: &str = "documento";

const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Derive the suggested filename of a half-page record.
///
/// Format: `[PREFIX_]LIG_{connection|X}_OS_{order|X}_p{n}_{T|B}.pdf` where `n`
/// is the 1-based page number.
pub fn derive_filename(
    prefix: Option<&str>,
    connection: Option<&str>,
    order: Option<&str>,
    half: Half,
    page_index: usize,
) -> String {
    let connection = connection.filter(|s| !s.is_empty()).unwrap_or(MISSING_SEGMENT);
    let order = order.filter(|s| !s.is_empty()).unwrap_or(MISSING_SEGMENT);
    let body = format!(
        "LIG_{connection}_OS_{order}_p{}_{}",
        page_index + 1,
        half.tag()
    );
    let stem = match prefix.map(clean_stem).filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{prefix}_{body}"),
        None => body,
    };
    sanitize_filename(&stem)
}

/// Make a user-supplied name safe to write on any common filesystem.
///
/// Removes illegal and control characters, collapses whitespace, trims
/// surrounding spaces and dots, caps the stem length, escapes reserved device
/// names and forces a lowercase `.pdf` extension.
pub fn sanitize_filename(name: &str) -> String {
    let mut stem = collapse(name);
    if stem.to_ascii_lowercase().ends_with(".pdf") {
        stem.truncate(stem.len() - 4);
    }
    stem = trim_stem(&stem).to_string();
    if stem.chars().count() > MAX_STEM_CHARS {
        stem = stem.chars().take(MAX_STEM_CHARS).collect();
        stem = trim_stem(&stem).to_string();
    }
    if stem.is_empty() {
        stem = FALLBACK_STEM.to_string();
    }
    if is_reserved(&stem) {
        stem.insert(0, '_');
    }
    format!("{stem}.pdf")
}

fn clean_stem(name: &str) -> String {
    trim_stem(&collapse(name)).to_string()
}

fn collapse(name: &str) -> String {
    let filtered: String = name
        .chars()
        .filter(|c| !ILLEGAL_CHARS.contains(c))
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| !c.is_control())
        .collect();
    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn trim_stem(stem: &str) -> &str {
    stem.trim_matches(|c: char| c == ' ' || c == '.')
}

fn is_reserved(stem: &str) -> bool {
    let base = stem.split('.').next().unwrap_or(stem).trim_end();
    RESERVED_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(base))
}

fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], &name[pos..]),
        _ => (name, ""),
    }
}

/// De-duplicate names case-insensitively, preserving order.
///
/// The second occurrence of `name.ext` becomes `name_1.ext`, the third
/// `name_2.ext`, skipping any candidate already taken, including names
/// produced by earlier suffixing.
pub fn dedupe_filenames<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let name = name.as_ref();
        let unique = if taken.contains(&name.to_lowercase()) {
            let (stem, ext) = split_extension(name);
            let mut n = 1usize;
            loop {
                let candidate = format!("{stem}_{n}{ext}");
                if !taken.contains(&candidate.to_lowercase()) {
                    break candidate;
                }
                n += 1;
            }
        } else {
            name.to_string()
        };
        taken.insert(unique.to_lowercase());
        out.push(unique);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_with_all_fields() {
        assert_eq!(
            derive_filename(None, Some("08561"), Some("254651"), Half::Top, 0),
            "LIG_08561_OS_254651_p1_T.pdf"
        );
    }

    #[test]
    fn derive_missing_fields_use_x() {
        assert_eq!(
            derive_filename(None, Some("08561"), None, Half::Top, 0),
            "LIG_08561_OS_X_p1_T.pdf"
        );
        assert_eq!(
            derive_filename(None, None, Some("254651"), Half::Bottom, 0),
            "LIG_X_OS_254651_p1_B.pdf"
        );
    }

    #[test]
    fn derive_uses_one_based_page_number() {
        assert_eq!(
            derive_filename(None, None, None, Half::Bottom, 9),
            "LIG_X_OS_X_p10_B.pdf"
        );
    }

    #[test]
    fn derive_with_prefix() {
        assert_eq!(
            derive_filename(Some("CORTE"), Some("1"), Some("2"), Half::Top, 2),
            "CORTE_LIG_1_OS_2_p3_T.pdf"
        );
    }

    #[test]
    fn derive_sanitizes_prefix() {
        assert_eq!(
            derive_filename(Some(" lote/03: "), Some("1"), None, Half::Top, 0),
            "lote03_LIG_1_OS_X_p1_T.pdf"
        );
        assert_eq!(
            derive_filename(Some("..."), Some("1"), None, Half::Top, 0),
            "LIG_1_OS_X_p1_T.pdf"
        );
    }

    #[test]
    fn sanitize_strips_illegal_characters() {
        assert_eq!(sanitize_filename("a<b>c:d\"e/f\\g|h?i*j"), "abcdefghij.pdf");
    }

    #[test]
    fn sanitize_collapses_whitespace_and_trims() {
        assert_eq!(sanitize_filename("  ordem   de\tcorte  "), "ordem de corte.pdf");
        assert_eq!(sanitize_filename("..name.."), "name.pdf");
    }

    #[test]
    fn sanitize_removes_control_characters() {
        assert_eq!(sanitize_filename("ab\u{0}\u{7}c"), "abc.pdf");
    }

    #[test]
    fn sanitize_normalizes_extension() {
        assert_eq!(sanitize_filename("Report.PDF"), "Report.pdf");
        assert_eq!(sanitize_filename("notes.txt"), "notes.txt.pdf");
    }

    #[test]
    fn sanitize_caps_length() {
        let long = "a".repeat(300);
        let out = sanitize_filename(&long);
        assert_eq!(out.len(), MAX_STEM_CHARS + 4);
    }

    #[test]
    fn sanitize_escapes_reserved_names() {
        assert_eq!(sanitize_filename("con"), "_con.pdf");
        assert_eq!(sanitize_filename("LPT1.pdf"), "_LPT1.pdf");
        assert_eq!(sanitize_filename("console"), "console.pdf");
    }

    #[test]
    fn sanitize_empty_falls_back() {
        assert_eq!(sanitize_filename(""), "documento.pdf");
        assert_eq!(sanitize_filename("???"), "documento.pdf");
        assert_eq!(sanitize_filename(".pdf"), "documento.pdf");
    }

    #[test]
    fn sanitize_keeps_accents() {
        assert_eq!(sanitize_filename("religação"), "religação.pdf");
    }

    #[test]
    fn dedupe_appends_suffixes() {
        let names = ["a.pdf", "a.pdf", "a.pdf", "b.pdf"];
        assert_eq!(
            dedupe_filenames(&names),
            vec!["a.pdf", "a_1.pdf", "a_2.pdf", "b.pdf"]
        );
    }

    #[test]
    fn dedupe_is_case_insensitive() {
        let names = ["A.pdf", "a.PDF"];
        assert_eq!(dedupe_filenames(&names), vec!["A.pdf", "a_1.PDF"]);
    }

    #[test]
    fn dedupe_avoids_generated_names() {
        let names = ["a.pdf", "a.pdf", "a_1.pdf"];
        assert_eq!(
            dedupe_filenames(&names),
            vec!["a.pdf", "a_1.pdf", "a_1_1.pdf"]
        );
    }

    #[test]
    fn dedupe_without_extension() {
        let names = ["readme", "readme"];
        assert_eq!(dedupe_filenames(&names), vec!["readme", "readme_1"]);
    }
}
