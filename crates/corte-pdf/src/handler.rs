//! Content handler callback trait for content stream interpretation.
//!
//! The interpreter walks a page's operators and reports what it paints
//! through [`ContentHandler`]. The rasterizer subscribes to paths, glyphs
//! and images; the text-run collector subscribes to text.

use corte_core::{Color, Ctm, Point};
use lopdf::Stream;

use crate::font_program::FontProgram;

/// The type of paint operation applied to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintOp {
    Stroke,
    Fill,
    FillAndStroke,
}

/// Winding rule for filled paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

/// One segment of a path, in page user space (CTM already applied).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    CurveTo(Point, Point, Point),
    Close,
}

/// A path that was stroked, filled, or both.
#[derive(Debug, Clone)]
pub struct PathEvent {
    pub segments: Vec<PathSegment>,
    pub paint_op: PaintOp,
    pub fill_rule: FillRule,
    /// Stroke width in user space.
    pub line_width: f64,
    pub stroke_color: Color,
    pub fill_color: Color,
}

/// Text shown by one `Tj`, `TJ`, `'` or `"` operator.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEvent {
    pub text: String,
    /// Baseline start in page user space.
    pub origin: Point,
    /// Baseline end in page user space.
    pub end: Point,
    /// Font size after the text and graphics matrices, in user space.
    pub font_size: f64,
}

/// One visible glyph, ready to paint.
#[derive(Debug, Clone)]
pub struct GlyphEvent<'a> {
    pub program: &'a FontProgram,
    pub glyph_index: u16,
    /// Glyph space (one unit per em, `y` up) to page user space.
    pub matrix: Ctm,
    pub color: Color,
}

/// An image XObject placed with `Do`.
///
/// The image occupies the unit square mapped through `ctm`.
#[derive(Debug, Clone)]
pub struct ImageEvent<'a> {
    pub name: String,
    pub stream: &'a Stream,
    pub ctm: Ctm,
}

/// Callback handler for content stream interpretation.
///
/// All methods have default no-op implementations, allowing handlers to
/// subscribe only to the event types they care about.
pub trait ContentHandler {
    /// Called once per text-showing operator.
    fn on_text(&mut self, _event: TextEvent) {}

    /// Called for each glyph drawn in a visible text rendering mode.
    fn on_glyph(&mut self, _event: GlyphEvent<'_>) {}

    /// Called when a path is painted (stroked, filled, or both).
    fn on_path_painted(&mut self, _event: PathEvent) {}

    /// Called when an image XObject is placed on the page.
    fn on_image(&mut self, _event: ImageEvent<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingHandler {
        texts: usize,
        paths: usize,
    }

    impl ContentHandler for CountingHandler {
        fn on_text(&mut self, _event: TextEvent) {
            self.texts += 1;
        }

        fn on_path_painted(&mut self, _event: PathEvent) {
            self.paths += 1;
        }
    }

    struct NoopHandler;
    impl ContentHandler for NoopHandler {}

    fn text_event() -> TextEvent {
        TextEvent {
            text: "A".to_string(),
            origin: Point::new(0.0, 0.0),
            end: Point::new(6.0, 0.0),
            font_size: 12.0,
        }
    }

    #[test]
    fn noop_handler_accepts_all_events() {
        let mut handler = NoopHandler;
        handler.on_text(text_event());
        let stream = Stream::new(lopdf::Dictionary::new(), Vec::new());
        handler.on_image(ImageEvent {
            name: "Im0".to_string(),
            stream: &stream,
            ctm: Ctm::identity(),
        });
    }

    #[test]
    fn handler_counts_subscribed_events() {
        let mut handler = CountingHandler { texts: 0, paths: 0 };
        handler.on_text(text_event());
        handler.on_path_painted(PathEvent {
            segments: vec![PathSegment::MoveTo(Point::new(0.0, 0.0)), PathSegment::Close],
            paint_op: PaintOp::Fill,
            fill_rule: FillRule::NonZero,
            line_width: 1.0,
            stroke_color: Color::BLACK,
            fill_color: Color::BLACK,
        });
        assert_eq!(handler.texts, 1);
        assert_eq!(handler.paths, 1);
    }
}
