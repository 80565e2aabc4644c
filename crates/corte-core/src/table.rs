//! Report grid: field definitions, field selection, column widths and the
//! row-atomic page plan.
//!
//! Coordinates are top-left page space in points, like the stamp layout.

use crate::error::CorteError;
use crate::geometry::BBox;
use crate::stamp_layout::Color;
use crate::wrap::{TextMeasure, WrapFont, truncate_lines, truncate_with_ellipsis, wrap_text};

/// Horizontal alignment of a column's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// How a field's raw value is formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum FieldKind {
    #[default]
    Text,
    Number,
    DateTime,
}

/// A column that can appear in a report.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDefinition {
    pub id: String,
    pub label: String,
    /// Record keys to read the value from, in priority order.
    pub source_columns: Vec<String>,
    pub alignment: Alignment,
    /// Preferred column width in points before scaling.
    pub nominal_width: f64,
    pub kind: FieldKind,
}

impl FieldDefinition {
    /// A left-aligned text field read from a column named like its id.
    pub fn new(id: impl Into<String>, label: impl Into<String>, nominal_width: f64) -> Self {
        let id = id.into();
        Self {
            source_columns: vec![id.clone()],
            id,
            label: label.into(),
            alignment: Alignment::Left,
            nominal_width,
            kind: FieldKind::Text,
        }
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    /// Replace the candidate source keys.
    pub fn with_sources(mut self, sources: &[&str]) -> Self {
        self.source_columns = sources.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// The user's choice of report columns.
///
/// Membership and order are tracked separately: reordering a deselected
/// field is allowed, and only `display_order ∩ selected` is rendered, in
/// display order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFieldSelection {
    available: Vec<FieldDefinition>,
    selected: Vec<String>,
    display_order: Vec<String>,
}

impl ReportFieldSelection {
    /// Selection over `available` with every field selected.
    pub fn new(available: Vec<FieldDefinition>) -> Self {
        let ids: Vec<String> = available.iter().map(|f| f.id.clone()).collect();
        Self {
            available,
            selected: ids.clone(),
            display_order: ids,
        }
    }

    /// Selection with only the given ids selected (unknown ids are ignored).
    pub fn with_selected(available: Vec<FieldDefinition>, ids: &[&str]) -> Self {
        let mut selection = Self::new(available);
        selection.selected.clear();
        for id in ids {
            selection.select(id);
        }
        selection
    }

    pub fn available(&self) -> &[FieldDefinition] {
        &self.available
    }

    pub fn display_order(&self) -> &[String] {
        &self.display_order
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    fn knows(&self, id: &str) -> bool {
        self.available.iter().any(|f| f.id == id)
    }

    /// Select a field. Returns `false` for unknown ids.
    pub fn select(&mut self, id: &str) -> bool {
        if !self.knows(id) {
            return false;
        }
        if !self.is_selected(id) {
            self.selected.push(id.to_string());
        }
        true
    }

    pub fn deselect(&mut self, id: &str) {
        self.selected.retain(|s| s != id);
    }

    pub fn toggle(&mut self, id: &str) {
        if self.is_selected(id) {
            self.deselect(id);
        } else {
            self.select(id);
        }
    }

    /// Move a field one place earlier in display order.
    pub fn move_up(&mut self, id: &str) {
        if let Some(pos) = self.display_order.iter().position(|s| s == id) {
            if pos > 0 {
                self.display_order.swap(pos, pos - 1);
            }
        }
    }

    /// Move a field one place later in display order.
    pub fn move_down(&mut self, id: &str) {
        if let Some(pos) = self.display_order.iter().position(|s| s == id) {
            if pos + 1 < self.display_order.len() {
                self.display_order.swap(pos, pos + 1);
            }
        }
    }

    /// Replace the display order. Must be a permutation of the available ids.
    pub fn set_display_order(&mut self, order: &[&str]) -> Result<(), CorteError> {
        let mut sorted_new: Vec<&str> = order.to_vec();
        let mut sorted_old: Vec<&str> = self.available.iter().map(|f| f.id.as_str()).collect();
        sorted_new.sort_unstable();
        sorted_old.sort_unstable();
        if sorted_new != sorted_old {
            return Err(CorteError::Config(
                "display order must list every available field exactly once".to_string(),
            ));
        }
        self.display_order = order.iter().map(|s| s.to_string()).collect();
        Ok(())
    }

    /// The fields to render, in display order.
    pub fn resolved(&self) -> Result<Vec<FieldDefinition>, CorteError> {
        let fields: Vec<FieldDefinition> = self
            .display_order
            .iter()
            .filter(|id| self.is_selected(id))
            .filter_map(|id| self.available.iter().find(|f| &f.id == id).cloned())
            .collect();
        if fields.is_empty() {
            Err(CorteError::NoFieldsSelected)
        } else {
            Ok(fields)
        }
    }
}

/// Scale nominal widths uniformly so their sum never exceeds `usable`.
///
/// The factor is `min(1, usable / sum)`; columns are never widened.
pub fn column_widths(nominal: &[f64], usable: f64) -> Vec<f64> {
    let nominal: Vec<f64> = nominal.iter().map(|w| w.max(0.0)).collect();
    let sum: f64 = nominal.iter().sum();
    if sum <= 0.0 || usable <= 0.0 {
        return vec![0.0; nominal.len()];
    }
    let scale = (usable / sum).min(1.0);
    nominal.iter().map(|w| w * scale).collect()
}

/// Visual parameters of a report.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReportStyle {
    pub margin_left: f64,
    pub margin_right: f64,
    /// Space reserved at the top for the letterhead.
    pub margin_top: f64,
    /// Space reserved at the bottom for the letterhead footer.
    pub margin_bottom: f64,
    pub title_font_size: f64,
    pub subtitle_font_size: f64,
    pub header_font_size: f64,
    pub body_font_size: f64,
    pub line_spacing: f64,
    pub cell_padding_x: f64,
    pub cell_padding_y: f64,
    /// Gap between the subtitle and the grid.
    pub heading_gap: f64,
    pub border_width: f64,
    pub header_fill: Color,
    pub border_color: Color,
    pub text_color: Color,
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            margin_left: 40.0,
            margin_right: 40.0,
            margin_top: 110.0,
            margin_bottom: 60.0,
            title_font_size: 14.0,
            subtitle_font_size: 10.0,
            header_font_size: 8.0,
            body_font_size: 8.0,
            line_spacing: 1.25,
            cell_padding_x: 3.0,
            cell_padding_y: 3.0,
            heading_gap: 10.0,
            border_width: 0.5,
            header_fill: Color::gray(0.85),
            border_color: Color::gray(0.3),
            text_color: Color::BLACK,
        }
    }
}

/// A column of the grid after width scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableColumn {
    pub width: f64,
    pub alignment: Alignment,
}

/// A single line of text with its final position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub text: String,
    pub x: f64,
    pub baseline: f64,
    pub font_size: f64,
    pub bold: bool,
}

/// A grid cell: its rectangle and the lines drawn inside.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedCell {
    pub bbox: BBox,
    pub lines: Vec<PlacedText>,
}

/// A grid row.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedRow {
    pub bbox: BBox,
    pub cells: Vec<PlacedCell>,
    /// Whether cell text was cut to fit one page.
    pub truncated: bool,
}

/// Everything drawn on one output page.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPage {
    pub title: Option<PlacedText>,
    pub subtitle: Option<PlacedText>,
    pub header: PlacedRow,
    pub rows: Vec<PlacedRow>,
    /// Indices into the input rows placed on this page.
    pub row_indices: Vec<usize>,
}

/// The complete page plan of a report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub columns: Vec<TableColumn>,
    pub pages: Vec<ReportPage>,
}

/// Text content of a report before layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportContent<'a> {
    pub title: &'a str,
    pub subtitle: &'a str,
    pub headers: &'a [String],
    pub alignments: &'a [Alignment],
    pub nominal_widths: &'a [f64],
    /// One entry per row, one string per column.
    pub rows: &'a [Vec<String>],
}

/// Lay out a report grid onto pages of the given size.
///
/// Every page starts with the title, the subtitle and the header row. A row
/// that does not fit below the previous one starts a new page; rows are never
/// split. A row taller than a whole page is cut with an ellipsis.
pub fn layout_report(
    content: &ReportContent<'_>,
    style: &ReportStyle,
    measure: &dyn TextMeasure,
    page_width: f64,
    page_height: f64,
) -> ReportLayout {
    let usable = (page_width - style.margin_left - style.margin_right).max(0.0);
    let widths = column_widths(content.nominal_widths, usable);
    let columns: Vec<TableColumn> = widths
        .iter()
        .enumerate()
        .map(|(i, &width)| TableColumn {
            width,
            alignment: content.alignments.get(i).copied().unwrap_or_default(),
        })
        .collect();

    let center = style.margin_left + usable / 2.0;
    let heading = |text: &str, size: f64, baseline: f64| -> Option<PlacedText> {
        if text.trim().is_empty() {
            return None;
        }
        let font = WrapFont::bold(size);
        let mut text = text.trim().to_string();
        if measure.width(&text, size, true) > usable {
            text = truncate_with_ellipsis(&text, measure, font, usable);
        }
        let w = measure.width(&text, size, true);
        Some(PlacedText {
            text,
            x: center - w / 2.0,
            baseline,
            font_size: size,
            bold: true,
        })
    };

    let title_baseline = style.margin_top + style.title_font_size;
    let subtitle_baseline = title_baseline + style.subtitle_font_size * style.line_spacing + 2.0;
    let header_top = subtitle_baseline + style.heading_gap;
    let bottom_limit = page_height - style.margin_bottom;

    let header_lines: Vec<Vec<String>> = content
        .headers
        .iter()
        .zip(&columns)
        .map(|(label, col)| wrap_cell(label, col, style, measure, style.header_font_size, true))
        .collect();
    let header = place_row(
        header_lines,
        &columns,
        style,
        measure,
        header_top,
        style.header_font_size,
        true,
        false,
    );
    let body_top = header.bbox.bottom;
    let body_space = (bottom_limit - body_top).max(0.0);
    let body_line = style.body_font_size * style.line_spacing;
    let max_body_lines =
        (((body_space - 2.0 * style.cell_padding_y) / body_line).floor() as usize).max(1);

    let new_page = || ReportPage {
        title: heading(content.title, style.title_font_size, title_baseline),
        subtitle: heading(content.subtitle, style.subtitle_font_size, subtitle_baseline),
        header: header.clone(),
        rows: Vec::new(),
        row_indices: Vec::new(),
    };

    let mut pages = vec![new_page()];
    let mut cursor = body_top;
    for (index, row) in content.rows.iter().enumerate() {
        let mut cells: Vec<Vec<String>> = columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let text = row.get(i).map(String::as_str).unwrap_or("");
                wrap_cell(text, col, style, measure, style.body_font_size, false)
            })
            .collect();
        let mut truncated = false;
        for (cell, col) in cells.iter_mut().zip(&columns) {
            let inner = (col.width - 2.0 * style.cell_padding_x).max(1.0);
            truncated |= truncate_lines(
                cell,
                max_body_lines,
                measure,
                WrapFont::regular(style.body_font_size),
                inner,
            );
        }
        let height = row_height(&cells, style, style.body_font_size);
        let page_has_rows = pages.last().is_some_and(|p| !p.rows.is_empty());
        if cursor + height > bottom_limit + 1e-9 && page_has_rows {
            pages.push(new_page());
            cursor = body_top;
        }
        let placed = place_row(
            cells,
            &columns,
            style,
            measure,
            cursor,
            style.body_font_size,
            false,
            truncated,
        );
        cursor = placed.bbox.bottom;
        if let Some(page) = pages.last_mut() {
            page.rows.push(placed);
            page.row_indices.push(index);
        }
    }

    ReportLayout { columns, pages }
}

fn wrap_cell(
    text: &str,
    col: &TableColumn,
    style: &ReportStyle,
    measure: &dyn TextMeasure,
    size: f64,
    bold: bool,
) -> Vec<String> {
    let inner = (col.width - 2.0 * style.cell_padding_x).max(1.0);
    let font = WrapFont { size, bold };
    wrap_text(text, measure, font, inner)
}

fn row_height(cells: &[Vec<String>], style: &ReportStyle, size: f64) -> f64 {
    let line = size * style.line_spacing;
    let max_lines = cells.iter().map(Vec::len).max().unwrap_or(0);
    (max_lines as f64 * line).max(line) + 2.0 * style.cell_padding_y
}

#[allow(clippy::too_many_arguments)]
fn place_row(
    cells: Vec<Vec<String>>,
    columns: &[TableColumn],
    style: &ReportStyle,
    measure: &dyn TextMeasure,
    top: f64,
    size: f64,
    bold: bool,
    truncated: bool,
) -> PlacedRow {
    let height = row_height(&cells, style, size);
    let line = size * style.line_spacing;
    let mut x = style.margin_left;
    let mut placed = Vec::with_capacity(columns.len());
    for (lines, col) in cells.into_iter().zip(columns) {
        let bbox = BBox::from_size(x, top, col.width, height);
        let texts = lines
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let w = measure.width(&text, size, bold);
                let tx = match col.alignment {
                    Alignment::Left => bbox.x0 + style.cell_padding_x,
                    Alignment::Center => bbox.x0 + (col.width - w) / 2.0,
                    Alignment::Right => bbox.x1 - style.cell_padding_x - w,
                };
                PlacedText {
                    text,
                    x: tx,
                    baseline: top + style.cell_padding_y + i as f64 * line + size,
                    font_size: size,
                    bold,
                }
            })
            .collect();
        placed.push(PlacedCell { bbox, lines: texts });
        x += col.width;
    }
    PlacedRow {
        bbox: BBox::new(style.margin_left, top, x, top + height),
        cells: placed,
        truncated,
    }
}
