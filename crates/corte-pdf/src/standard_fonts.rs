//! Helvetica metrics for the overlay fonts and as a width fallback.
//!
//! Advance widths are Adobe AFM values in 1/1000 em, indexed by WinAnsi
//! code starting at 0x20. The stamper and report composer draw with the
//! non-embedded standard Helvetica faces, so layout measures text with the
//! same numbers a viewer uses to place glyphs.

use corte_core::TextMeasure;

use crate::encoding::win_ansi_encode;

const FIRST_CODE: usize = 0x20;

#[rustfmt::skip]
static HELVETICA: [u16; 224] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 0x20
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0x30
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 0x40
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 0x50
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 0x60
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, 0,   // 0x70
    556, 0, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0,   // 0x80
    0, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 0, 500, 667,  // 0x90
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333, // 0xA0
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611, // 0xB0
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, // 0xC0
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, // 0xD0
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278, // 0xE0
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500, // 0xF0
];

#[rustfmt::skip]
static HELVETICA_BOLD: [u16; 224] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // 0x20
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 0x30
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // 0x40
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 0x50
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // 0x60
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, 0,   // 0x70
    556, 0, 278, 556, 500, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0,   // 0x80
    0, 278, 278, 500, 500, 350, 556, 1000, 333, 1000, 556, 333, 944, 0, 500, 667,  // 0x90
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333, // 0xA0
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611, // 0xB0
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, // 0xC0
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, // 0xD0
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278, // 0xE0
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556, // 0xF0
];

/// Advance width of a WinAnsi code in 1/1000 em.
pub fn helvetica_width(code: u8, bold: bool) -> u16 {
    let table = if bold { &HELVETICA_BOLD } else { &HELVETICA };
    (code as usize)
        .checked_sub(FIRST_CODE)
        .and_then(|i| table.get(i))
        .copied()
        .unwrap_or(0)
}

/// Whether a `/BaseFont` name is one of the Helvetica family faces.
pub fn is_helvetica(base_font: &str) -> Option<bool> {
    match base_font {
        "Helvetica" | "Helvetica-Oblique" | "Arial" | "ArialMT" => Some(false),
        "Helvetica-Bold" | "Helvetica-BoldOblique" | "Arial-Bold" | "Arial-BoldMT" => Some(true),
        _ => None,
    }
}

/// [`TextMeasure`] backed by the Helvetica width tables.
///
/// Characters without a WinAnsi code are measured as `?`, which is what
/// the overlay writer substitutes for them.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelveticaMetrics;

impl TextMeasure for HelveticaMetrics {
    fn width(&self, text: &str, size: f64, bold: bool) -> f64 {
        let units: u32 = text
            .chars()
            .map(|ch| {
                let code = win_ansi_encode(ch).unwrap_or(b'?');
                helvetica_width(code, bold) as u32
            })
            .sum();
        units as f64 * size / 1000.0
    }
}
