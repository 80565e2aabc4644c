//! Greedy word wrapping against a measured font.

/// Horizontal text measurement for a font family.
pub trait TextMeasure {
    /// Advance width of `text` at `size`, in the same unit as `size`.
    fn width(&self, text: &str, size: f64, bold: bool) -> f64;
}

/// Measurement where every character advances by a fixed fraction of the size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedAdvance {
    /// Advance per character, in ems.
    pub em: f64,
}

impl TextMeasure for FixedAdvance {
    fn width(&self, text: &str, size: f64, _bold: bool) -> f64 {
        text.chars().count() as f64 * self.em * size
    }
}

/// Marker appended to a truncated line.
pub const ELLIPSIS: &str = "…";

/// Font selection for wrapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WrapFont {
    pub size: f64,
    pub bold: bool,
}

impl WrapFont {
    pub fn regular(size: f64) -> Self {
        Self { size, bold: false }
    }

    pub fn bold(size: f64) -> Self {
        Self { size, bold: true }
    }
}

/// Wrap `text` into lines no wider than `max_width`.
pub fn wrap_text(text: &str, measure: &dyn TextMeasure, font: WrapFont, max_width: f64) -> Vec<String> {
    wrap_text_indented(text, measure, font, max_width, max_width)
}

/// Wrap with a different width for the first line.
///
/// Words are appended greedily while the line fits. A word wider than the
/// line on its own is split character by character, each piece but the last
/// ending in a hyphen. Explicit newlines start a new line. Empty input gives
/// no lines.
pub fn wrap_text_indented(
    text: &str,
    measure: &dyn TextMeasure,
    font: WrapFont,
    first_width: f64,
    rest_width: f64,
) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let limit = |lines: &Vec<String>| if lines.is_empty() { first_width } else { rest_width };
    let fits = |s: &str, max: f64| measure.width(s, font.size, font.bold) <= max + 1e-9;

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if !current.is_empty() {
                let candidate = format!("{current} {word}");
                if fits(&candidate, limit(&lines)) {
                    current = candidate;
                    continue;
                }
                lines.push(std::mem::take(&mut current));
            }
            if fits(word, limit(&lines)) {
                current = word.to_string();
                continue;
            }
            // Force-split an overlong word.
            let mut piece = String::new();
            for ch in word.chars() {
                let mut probe = piece.clone();
                probe.push(ch);
                probe.push('-');
                if !piece.is_empty() && !fits(&probe, limit(&lines)) {
                    piece.push('-');
                    lines.push(std::mem::take(&mut piece));
                }
                piece.push(ch);
            }
            current = piece;
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// Shorten `line` until it plus the ellipsis fits in `max_width`, then append the ellipsis.
pub fn truncate_with_ellipsis(line: &str, measure: &dyn TextMeasure, font: WrapFont, max_width: f64) -> String {
    let mut chars: Vec<char> = line.trim_end().chars().collect();
    loop {
        let base: String = chars.iter().collect();
        let candidate = format!("{}{ELLIPSIS}", base.trim_end());
        if chars.is_empty() || measure.width(&candidate, font.size, font.bold) <= max_width + 1e-9 {
            return candidate;
        }
        chars.pop();
    }
}

/// Keep at most `keep` lines; when lines are dropped the last kept line gets an ellipsis.
///
/// Returns `true` when truncation happened.
pub fn truncate_lines(
    lines: &mut Vec<String>,
    keep: usize,
    measure: &dyn TextMeasure,
    font: WrapFont,
    max_width: f64,
) -> bool {
    if lines.len() <= keep {
        return false;
    }
    lines.truncate(keep);
    if let Some(last) = lines.last_mut() {
        *last = truncate_with_ellipsis(last, measure, font, max_width);
    }
    true
}
