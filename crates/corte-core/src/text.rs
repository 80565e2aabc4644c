//! Positioned text runs and reading-order text assembly.

/// A run of text shown by one text-showing operator.
///
/// Coordinates are in top-left origin pixel space: `y` grows downward and
/// marks the run's baseline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextRun {
    /// Decoded text content.
    pub text: String,
    /// Baseline start, horizontal.
    pub x: f64,
    /// Baseline, vertical (distance from top of page).
    pub y: f64,
    /// Advance width of the run.
    pub width: f64,
    /// Effective font size (already scaled to pixel space).
    pub font_size: f64,
}

impl TextRun {
    pub fn new(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width: 0.0,
            font_size: 0.0,
        }
    }

    /// Copy of this run shifted vertically by `dy`.
    pub fn shifted(&self, dy: f64) -> TextRun {
        TextRun {
            y: self.y + dy,
            ..self.clone()
        }
    }
}

/// Default baseline tolerance for grouping runs into lines.
pub const DEFAULT_LINE_TOLERANCE: f64 = 3.0;

/// Group runs into lines by baseline proximity, in reading order.
///
/// Runs are sorted top-to-bottom, then a run joins the current line when its
/// baseline is within `tolerance` of the line's first baseline. Each line is
/// sorted left-to-right.
pub fn group_lines(runs: &[TextRun], tolerance: f64) -> Vec<Vec<&TextRun>> {
    let mut sorted: Vec<&TextRun> = runs.iter().filter(|r| !r.text.trim().is_empty()).collect();
    sorted.sort_by(|a, b| {
        a.y.partial_cmp(&b.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<Vec<&TextRun>> = Vec::new();
    let mut line_y = f64::NEG_INFINITY;
    for run in sorted {
        let starts_line = lines.is_empty() || (run.y - line_y).abs() > tolerance;
        if starts_line {
            line_y = run.y;
            lines.push(vec![run]);
        } else if let Some(line) = lines.last_mut() {
            line.push(run);
        }
    }
    for line in &mut lines {
        line.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
    }
    lines
}

/// Concatenate runs into reading-order text.
///
/// Runs on the same line are joined by a single space, lines by `\n`.
pub fn runs_to_text(runs: &[TextRun], tolerance: f64) -> String {
    group_lines(runs, tolerance)
        .iter()
        .map(|line| {
            line.iter()
                .map(|r| r.text.trim())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_on_same_baseline_join_with_space() {
        let runs = vec![
            TextRun::new("08561", 120.0, 100.0),
            TextRun::new("LIGAÇÃO:", 20.0, 100.5),
        ];
        assert_eq!(runs_to_text(&runs, DEFAULT_LINE_TOLERANCE), "LIGAÇÃO: 08561");
    }

    #[test]
    fn lines_are_ordered_top_to_bottom() {
        let runs = vec![
            TextRun::new("second", 10.0, 200.0),
            TextRun::new("first", 10.0, 50.0),
        ];
        assert_eq!(runs_to_text(&runs, DEFAULT_LINE_TOLERANCE), "first\nsecond");
    }

    #[test]
    fn blank_runs_are_ignored() {
        let runs = vec![TextRun::new("  ", 0.0, 0.0), TextRun::new("x", 5.0, 0.0)];
        assert_eq!(runs_to_text(&runs, DEFAULT_LINE_TOLERANCE), "x");
    }

    #[test]
    fn empty_input_gives_empty_text() {
        assert_eq!(runs_to_text(&[], DEFAULT_LINE_TOLERANCE), "");
    }

    #[test]
    fn shifted_moves_baseline_only() {
        let run = TextRun::new("a", 1.0, 10.0).shifted(-4.0);
        assert_eq!(run.x, 1.0);
        assert_eq!(run.y, 6.0);
    }
}
