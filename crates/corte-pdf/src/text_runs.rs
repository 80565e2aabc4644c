//! Collects text events as positioned runs in top-left pixel space.

use corte_core::{Ctm, TextRun};

use crate::handler::{ContentHandler, TextEvent};
use crate::page_geometry::PageGeometry;

/// Handler turning [`TextEvent`]s into [`TextRun`]s.
///
/// Positions go through the page's display transform and the render scale,
/// so run baselines share the raster's coordinate space.
#[derive(Debug)]
pub struct TextRunCollector {
    to_pixels: Ctm,
    scale: f64,
    runs: Vec<TextRun>,
}

impl TextRunCollector {
    pub fn new(geometry: &PageGeometry, scale: f64) -> Self {
        Self {
            to_pixels: geometry.pixel_ctm(scale),
            scale,
            runs: Vec::new(),
        }
    }

    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    pub fn into_runs(self) -> Vec<TextRun> {
        self.runs
    }
}

impl ContentHandler for TextRunCollector {
    fn on_text(&mut self, event: TextEvent) {
        let start = self.to_pixels.transform_point(event.origin);
        let end = self.to_pixels.transform_point(event.end);
        self.runs.push(TextRun {
            text: event.text,
            x: start.x,
            y: start.y,
            width: (end.x - start.x).hypot(end.y - start.y),
            font_size: event.font_size * self.scale,
        });
    }
}
