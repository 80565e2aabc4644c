//! Layout of the information block stamped onto an order document.
//!
//! All positions are in top-left page space (points, `y` grows downward).
//! The drawing layer converts them to PDF user space.

use crate::geometry::BBox;
use crate::wrap::{TextMeasure, WrapFont, truncate_with_ellipsis, wrap_text, wrap_text_indented};

/// An RGB color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(v: f64) -> Self {
        Self::rgb(v, v, v)
    }

    /// Multiply every component by `factor`, clamped to the valid range.
    pub fn darken(&self, factor: f64) -> Color {
        let f = factor.clamp(0.0, 1.0);
        Color::rgb(self.r * f, self.g * f, self.b * f)
    }
}

/// One line of the information block.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InformationLine {
    /// A bold label followed by a regular value.
    LabelValue { label: String, value: String },
    /// A free-text line.
    Plain(String),
}

impl InformationLine {
    pub fn label_value(label: impl Into<String>, value: impl Into<String>) -> Self {
        InformationLine::LabelValue {
            label: label.into(),
            value: value.into(),
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        InformationLine::Plain(text.into())
    }
}

/// How the block is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum LayoutMode {
    /// Lines centered on the page, no background.
    CenteredBlock,
    /// A filled, bordered card with a bold title row.
    #[default]
    BorderedCard,
}

/// Visual parameters of the stamp.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StampStyle {
    pub font_size: f64,
    pub title_font_size: f64,
    /// Line height as a multiple of the font size.
    pub line_spacing: f64,
    /// Inner padding between the card border and the text.
    pub padding: f64,
    /// Minimum distance between the block and the page edges.
    pub margin: f64,
    /// Upper bound on the block width.
    pub max_width: f64,
    pub border_width: f64,
    pub text_color: Color,
    pub fill_color: Color,
    pub border_color: Color,
    /// Offset of the shadow copy of each text line.
    pub shadow_offset: f64,
    /// Shadow shade as a fraction of the text color.
    pub shadow_darkness: f64,
}

impl Default for StampStyle {
    fn default() -> Self {
        Self {
            font_size: 10.0,
            title_font_size: 12.0,
            line_spacing: 1.3,
            padding: 10.0,
            margin: 24.0,
            max_width: 420.0,
            border_width: 1.0,
            text_color: Color::rgb(0.1, 0.15, 0.4),
            fill_color: Color::rgb(0.97, 0.97, 1.0),
            border_color: Color::rgb(0.2, 0.25, 0.5),
            shadow_offset: 1.0,
            shadow_darkness: 0.4,
        }
    }
}

/// A piece of a placed line drawn in one font.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub bold: bool,
    /// Left edge of the segment.
    pub x: f64,
}

/// A line positioned on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub segments: Vec<Segment>,
    /// Baseline position from the top of the page.
    pub baseline: f64,
    pub font_size: f64,
}

/// Result of laying out a stamp.
#[derive(Debug, Clone, PartialEq)]
pub struct StampLayout {
    pub mode: LayoutMode,
    /// The card rectangle (for the centered mode, the text's bounding area).
    pub block: BBox,
    pub lines: Vec<PlacedLine>,
    /// Whether content was cut to fit the page height.
    pub truncated: bool,
}

struct Row {
    /// (text, bold) pieces of the row.
    pieces: Vec<(String, bool)>,
    size: f64,
    is_title: bool,
}

/// Lay out the information block on a page of the given size.
///
/// Lines are wrapped to the block's interior width. When the block would be
/// taller than the page allows, rows are dropped from the end and the last
/// kept row ends with an ellipsis.
pub fn layout_stamp(
    title: Option<&str>,
    lines: &[InformationLine],
    mode: LayoutMode,
    style: &StampStyle,
    measure: &dyn TextMeasure,
    page_width: f64,
    page_height: f64,
) -> StampLayout {
    let block_max = style.max_width.min(page_width - 2.0 * style.margin).max(1.0);
    let interior = (block_max - 2.0 * style.padding).max(1.0);
    let body = WrapFont::regular(style.font_size);

    let mut rows: Vec<Row> = Vec::new();
    if let (LayoutMode::BorderedCard, Some(title)) = (mode, title) {
        for text in wrap_text(title, measure, WrapFont::bold(style.title_font_size), interior) {
            rows.push(Row {
                pieces: vec![(text, true)],
                size: style.title_font_size,
                is_title: true,
            });
        }
    }
    for line in lines {
        match line {
            InformationLine::LabelValue { label, value } => {
                let label = format!("{}: ", label.trim_end_matches(':').trim());
                let label_width = measure.width(&label, body.size, true);
                let wrapped =
                    wrap_text_indented(value, measure, body, (interior - label_width).max(1.0), interior);
                let mut wrapped = wrapped.into_iter();
                let first = wrapped.next().unwrap_or_default();
                rows.push(Row {
                    pieces: vec![(label, true), (first, false)],
                    size: body.size,
                    is_title: false,
                });
                for rest in wrapped {
                    rows.push(Row {
                        pieces: vec![(rest, false)],
                        size: body.size,
                        is_title: false,
                    });
                }
            }
            InformationLine::Plain(text) => {
                for wrapped in wrap_text(text, measure, body, interior) {
                    rows.push(Row {
                        pieces: vec![(wrapped, false)],
                        size: body.size,
                        is_title: false,
                    });
                }
            }
        }
    }

    // Vertical fit.
    let available = (page_height - 2.0 * style.margin - 2.0 * style.padding).max(0.0);
    let row_height = |row: &Row| row.size * style.line_spacing;
    let mut used = 0.0;
    let mut keep = 0;
    for row in &rows {
        if used + row_height(row) > available + 1e-9 {
            break;
        }
        used += row_height(row);
        keep += 1;
    }
    let keep = keep.max(1);
    let truncated = keep < rows.len();
    if truncated {
        rows.truncate(keep);
        if let Some(last) = rows.last_mut() {
            let prefix: f64 = last.pieces[..last.pieces.len() - 1]
                .iter()
                .map(|(t, b)| measure.width(t, last.size, *b))
                .sum();
            let font_size = last.size;
            if let Some((text, bold)) = last.pieces.last_mut() {
                *text = truncate_with_ellipsis(
                    text,
                    measure,
                    WrapFont {
                        size: font_size,
                        bold: *bold,
                    },
                    (interior - prefix).max(1.0),
                );
            }
        }
    }

    let row_widths: Vec<f64> = rows
        .iter()
        .map(|row| {
            row.pieces
                .iter()
                .map(|(t, b)| measure.width(t, row.size, *b))
                .sum()
        })
        .collect();
    let content_width = row_widths.iter().cloned().fold(0.0, f64::max).min(interior);
    let content_height: f64 = rows.iter().map(row_height).sum();
    let block_width = content_width + 2.0 * style.padding;
    let block_height = content_height + 2.0 * style.padding;
    let x0 = (page_width - block_width) / 2.0;
    let top = (page_height - block_height) / 2.0;
    let block = BBox::from_size(x0, top, block_width, block_height);

    let mut placed = Vec::with_capacity(rows.len());
    let mut cursor = top + style.padding;
    for (row, width) in rows.into_iter().zip(row_widths) {
        let height = row_height(&row);
        let baseline = cursor + row.size;
        let centered = row.is_title || mode == LayoutMode::CenteredBlock;
        let mut x = if centered {
            x0 + (block_width - width) / 2.0
        } else {
            x0 + style.padding
        };
        let mut segments = Vec::with_capacity(row.pieces.len());
        for (text, bold) in row.pieces {
            let w = measure.width(&text, row.size, bold);
            if !text.is_empty() {
                segments.push(Segment { text, bold, x });
            }
            x += w;
        }
        placed.push(PlacedLine {
            segments,
            baseline,
            font_size: row.size,
        });
        cursor += height;
    }

    StampLayout {
        mode,
        block,
        lines: placed,
        truncated,
    }
}
