//! Rendered pages and the half-page splitter.
//!
//! A [`RasterPage`] is an RGBA pixel buffer plus the positioned text runs of
//! the page's embedded text layer. [`split_halves`] crops it into a top and a
//! bottom page at a [`CutRatio`] and assigns each run to the half that
//! contains its baseline.

use crate::error::CorteError;
use crate::text::TextRun;

/// Bytes per pixel of every buffer in this crate (RGBA, 8 bits per channel).
pub const BYTES_PER_PIXEL: usize = 4;

/// A rendered page: pixels plus positioned text runs.
///
/// Pixel rows are stored top to bottom. Run coordinates share the pixel
/// coordinate space.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterPage {
    pub width: u32,
    pub height: u32,
    /// RGBA8 pixels, `width * height * 4` bytes, row-major from the top row.
    pub pixels: Vec<u8>,
    pub runs: Vec<TextRun>,
}

impl RasterPage {
    /// Create a page, validating the buffer length.
    pub fn new(
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        runs: Vec<TextRun>,
    ) -> Result<Self, CorteError> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if pixels.len() != expected {
            return Err(CorteError::InvalidDocument(format!(
                "pixel buffer has {} bytes, expected {expected} for {width}x{height}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
            runs,
        })
    }

    /// A blank (white) page with no text.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![255; width as usize * height as usize * BYTES_PER_PIXEL],
            runs: Vec::new(),
        }
    }

    /// RGBA value of the pixel at `(x, y)`, if inside the page.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let px = self.pixels.get(offset..offset + BYTES_PER_PIXEL)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    fn row_stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }
}

/// Which half of a split page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum Half {
    Top,
    Bottom,
}

impl Half {
    /// One-letter tag used in generated filenames.
    pub fn tag(&self) -> char {
        match self {
            Half::Top => 'T',
            Half::Bottom => 'B',
        }
    }
}

/// Fraction of the page height assigned to the top half.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "f64", into = "f64"))]
pub struct CutRatio(f64);

impl CutRatio {
    /// Lower bound of the interactive adjustment range.
    pub const SLIDER_MIN: f64 = 0.35;
    /// Upper bound of the interactive adjustment range.
    pub const SLIDER_MAX: f64 = 0.65;

    /// Create a cut ratio; must lie strictly between 0 and 1.
    pub fn new(ratio: f64) -> Result<Self, CorteError> {
        if ratio.is_finite() && ratio > 0.0 && ratio < 1.0 {
            Ok(Self(ratio))
        } else {
            Err(CorteError::InvalidCutRatio(ratio))
        }
    }

    /// Create a cut ratio clamped to the interactive slider range.
    pub fn from_slider(ratio: f64) -> Self {
        let ratio = if ratio.is_finite() { ratio } else { 0.5 };
        Self(ratio.clamp(Self::SLIDER_MIN, Self::SLIDER_MAX))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Pixel row where the bottom half starts, for a page of `height` pixels.
    ///
    /// Always leaves at least one row in each half when `height >= 2`.
    pub fn split_row(&self, height: u32) -> u32 {
        let row = (height as f64 * self.0).round() as u32;
        row.clamp(1, height.saturating_sub(1).max(1))
    }
}

impl Default for CutRatio {
    fn default() -> Self {
        Self(0.5)
    }
}

impl TryFrom<f64> for CutRatio {
    type Error = CorteError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CutRatio> for f64 {
    fn from(ratio: CutRatio) -> f64 {
        ratio.0
    }
}

/// Whether a run with baseline `y` belongs to the top half split at `midpoint`.
///
/// The boundary is inclusive to the top half.
pub fn belongs_to_top(y: f64, midpoint: f64) -> bool {
    y <= midpoint
}

/// Split a page into top and bottom halves.
///
/// Pixels are cropped, never resampled. The midpoint is the first pixel row
/// of the bottom half; runs with a baseline at or above it go to the top half,
/// the rest go to the bottom half with their `y` rebased to the crop origin.
pub fn split_halves(
    page: &RasterPage,
    ratio: CutRatio,
) -> Result<(RasterPage, RasterPage), CorteError> {
    if page.height < 2 || page.width == 0 {
        return Err(CorteError::InvalidDocument(format!(
            "page of {}x{} pixels cannot be split",
            page.width, page.height
        )));
    }
    let expected = page.height as usize * page.row_stride();
    if page.pixels.len() != expected {
        return Err(CorteError::InvalidDocument(format!(
            "pixel buffer has {} bytes, expected {expected} for {}x{}",
            page.pixels.len(),
            page.width,
            page.height
        )));
    }
    let split = ratio.split_row(page.height);
    let midpoint = split as f64;
    let (top_pixels, bottom_pixels) = page.pixels.split_at(split as usize * page.row_stride());

    let (top_runs, bottom_runs): (Vec<TextRun>, Vec<TextRun>) = page
        .runs
        .iter()
        .cloned()
        .partition(|run| belongs_to_top(run.y, midpoint));
    let bottom_runs = bottom_runs.iter().map(|run| run.shifted(-midpoint)).collect();

    let top = RasterPage {
        width: page.width,
        height: split,
        pixels: top_pixels.to_vec(),
        runs: top_runs,
    };
    let bottom = RasterPage {
        width: page.width,
        height: page.height - split,
        pixels: bottom_pixels.to_vec(),
        runs: bottom_runs,
    };
    Ok((top, bottom))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn striped_page(width: u32, height: u32) -> RasterPage {
        // Each row is filled with its own row index in the red channel.
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for _ in 0..width {
                pixels.extend_from_slice(&[(y % 256) as u8, 0, 0, 255]);
            }
        }
        RasterPage::new(width, height, pixels, Vec::new()).unwrap()
    }

    #[test]
    fn new_rejects_wrong_buffer_length() {
        let err = RasterPage::new(2, 2, vec![0; 15], Vec::new()).unwrap_err();
        assert!(matches!(err, CorteError::InvalidDocument(_)));
    }

    #[test]
    fn split_rejects_mismatched_buffer() {
        let mut page = striped_page(4, 10);
        page.pixels.truncate(12);
        let err = split_halves(&page, CutRatio::default()).unwrap_err();
        assert!(matches!(err, CorteError::InvalidDocument(_)));

        let oversized = RasterPage {
            width: 4,
            height: 10,
            pixels: vec![255; 4 * 10 * 4 + 1],
            runs: Vec::new(),
        };
        assert!(split_halves(&oversized, CutRatio::default()).is_err());
    }

    #[test]
    fn cut_ratio_rejects_bounds() {
        assert!(CutRatio::new(0.0).is_err());
        assert!(CutRatio::new(1.0).is_err());
        assert!(CutRatio::new(f64::NAN).is_err());
        assert!(CutRatio::new(0.42).is_ok());
    }

    #[test]
    fn slider_clamps() {
        assert_eq!(CutRatio::from_slider(0.1).value(), CutRatio::SLIDER_MIN);
        assert_eq!(CutRatio::from_slider(0.9).value(), CutRatio::SLIDER_MAX);
        assert_eq!(CutRatio::from_slider(0.5).value(), 0.5);
    }

    #[test]
    fn split_default_halves_evenly() {
        let page = striped_page(3, 10);
        let (top, bottom) = split_halves(&page, CutRatio::default()).unwrap();
        assert_eq!(top.height, 5);
        assert_eq!(bottom.height, 5);
        assert_eq!(top.width, 3);
        assert_eq!(bottom.width, 3);
    }

    #[test]
    fn split_is_a_crop() {
        let page = striped_page(2, 10);
        let (top, bottom) = split_halves(&page, CutRatio::new(0.3).unwrap()).unwrap();
        assert_eq!(top.height, 3);
        assert_eq!(top.pixel(0, 2).unwrap()[0], 2);
        assert_eq!(bottom.pixel(1, 0).unwrap()[0], 3);
        assert_eq!(bottom.pixel(1, 6).unwrap()[0], 9);
    }

    #[test]
    fn run_exactly_at_midpoint_goes_to_top() {
        let mut page = RasterPage::blank(10, 100);
        page.runs = vec![
            TextRun::new("mid", 0.0, 50.0),
            TextRun::new("below", 0.0, 50.5),
        ];
        let (top, bottom) = split_halves(&page, CutRatio::default()).unwrap();
        assert_eq!(top.runs.len(), 1);
        assert_eq!(top.runs[0].text, "mid");
        assert_eq!(bottom.runs.len(), 1);
        assert_eq!(bottom.runs[0].text, "below");
        assert_eq!(bottom.runs[0].y, 0.5);
    }

    #[test]
    fn runs_near_top_of_page_stay_in_top_half() {
        // y grows downward: a small y is near the top edge.
        let mut page = RasterPage::blank(10, 100);
        page.runs = vec![TextRun::new("header", 0.0, 5.0), TextRun::new("footer", 0.0, 95.0)];
        let (top, bottom) = split_halves(&page, CutRatio::default()).unwrap();
        assert_eq!(top.runs[0].text, "header");
        assert_eq!(bottom.runs[0].text, "footer");
    }

    #[test]
    fn tiny_page_cannot_be_split() {
        let page = RasterPage::blank(4, 1);
        assert!(split_halves(&page, CutRatio::default()).is_err());
    }

    #[test]
    fn half_tags() {
        assert_eq!(Half::Top.tag(), 'T');
        assert_eq!(Half::Bottom.tag(), 'B');
    }
}
