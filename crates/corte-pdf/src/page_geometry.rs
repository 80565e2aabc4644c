//! Where a page's visible area sits, and how native coordinates reach it.
//!
//! Display space has its origin at the top-left corner of the visible box
//! (CropBox, or MediaBox when absent) after `/Rotate` has turned the page
//! clockwise, with `y` growing downward. Raster pixels are display space
//! scaled by the render scale.

use corte_core::{BBox, Ctm, Point};

/// The visible area of one page and the native → display matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    rotation: i32,
    width: f64,
    height: f64,
    display: Ctm,
}

/// Clockwise quarter turns in PDF's `y`-up space.
fn quarter_turn(rotation: i32) -> Ctm {
    match rotation {
        90 => Ctm::new(0.0, -1.0, 1.0, 0.0, 0.0, 0.0),
        180 => Ctm::new(-1.0, 0.0, 0.0, -1.0, 0.0, 0.0),
        270 => Ctm::new(0.0, 1.0, -1.0, 0.0, 0.0, 0.0),
        _ => Ctm::identity(),
    }
}

impl PageGeometry {
    /// Boxes are raw PDF rectangles (`top` holds the lower `y`). Rotation
    /// is reduced to 0, 90, 180 or 270; anything else counts as 0.
    pub fn new(media_box: BBox, crop_box: Option<BBox>, rotation: i32) -> Self {
        let rotation = match rotation.rem_euclid(360) {
            r @ (90 | 180 | 270) => r,
            _ => 0,
        };
        let visible = crop_box.unwrap_or(media_box);
        let turn = quarter_turn(rotation);

        let corners = [
            Point::new(visible.x0, visible.top),
            Point::new(visible.x1, visible.top),
            Point::new(visible.x0, visible.bottom),
            Point::new(visible.x1, visible.bottom),
        ]
        .map(|p| turn.transform_point(p));
        let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

        // After turning, shift the visible box's upper-left corner to the
        // origin and flip y.
        let flip = Ctm::new(1.0, 0.0, 0.0, -1.0, -min_x, max_y);
        Self {
            rotation,
            width: max_x - min_x,
            height: max_y - min_y,
            display: turn.then(&flip),
        }
    }

    /// Visible width after rotation and cropping, in points.
    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    /// Whether the visible page is wider than it is tall.
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }

    /// Native → display matrix.
    pub fn display_ctm(&self) -> Ctm {
        self.display
    }

    /// A native point in display space.
    pub fn to_display(&self, p: Point) -> Point {
        self.display.transform_point(p)
    }

    /// Native → raster pixel matrix at `scale` pixels per point.
    pub fn pixel_ctm(&self, scale: f64) -> Ctm {
        self.display.then(&Ctm::scale(scale, scale))
    }

    /// Raster size in pixels at `scale`, never below 1×1.
    pub fn pixel_size(&self, scale: f64) -> (u32, u32) {
        let px = |v: f64| (v * scale).round().max(1.0) as u32;
        (px(self.width), px(self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a4() -> BBox {
        BBox::new(0.0, 0.0, 595.0, 842.0)
    }

    fn close(p: Point, x: f64, y: f64) {
        assert!(
            (p.x - x).abs() < 1e-6 && (p.y - y).abs() < 1e-6,
            "expected ({x}, {y}), got ({}, {})",
            p.x,
            p.y
        );
    }

    #[test]
    fn upright_page_flips_y() {
        let geo = PageGeometry::new(a4(), None, 0);
        assert_eq!((geo.width(), geo.height()), (595.0, 842.0));
        close(geo.to_display(Point::new(60.0, 700.0)), 60.0, 142.0);
        assert!(!geo.is_landscape());
    }

    #[test]
    fn quarter_turn_swaps_sides() {
        let geo = PageGeometry::new(a4(), None, 90);
        assert_eq!((geo.width(), geo.height()), (842.0, 595.0));
        assert!(geo.is_landscape());
        // Native bottom-left becomes the display top-left.
        close(geo.to_display(Point::new(0.0, 0.0)), 0.0, 0.0);
        close(geo.to_display(Point::new(595.0, 0.0)), 0.0, 595.0);
        close(geo.to_display(Point::new(0.0, 842.0)), 842.0, 0.0);
    }

    #[test]
    fn half_turn() {
        let geo = PageGeometry::new(a4(), None, 180);
        close(geo.to_display(Point::new(0.0, 0.0)), 595.0, 0.0);
        close(geo.to_display(Point::new(595.0, 842.0)), 0.0, 842.0);
    }

    #[test]
    fn three_quarter_turn() {
        let geo = PageGeometry::new(a4(), None, 270);
        close(geo.to_display(Point::new(0.0, 0.0)), 842.0, 595.0);
    }

    #[test]
    fn rotation_is_reduced() {
        assert_eq!(PageGeometry::new(a4(), None, -90).rotation(), 270);
        assert_eq!(PageGeometry::new(a4(), None, 450).rotation(), 90);
        assert_eq!(PageGeometry::new(a4(), None, 30).rotation(), 0);
    }

    #[test]
    fn crop_box_moves_the_origin() {
        let crop = BBox::new(20.0, 40.0, 520.0, 800.0);
        let geo = PageGeometry::new(a4(), Some(crop), 0);
        assert_eq!((geo.width(), geo.height()), (500.0, 760.0));
        close(geo.to_display(Point::new(20.0, 800.0)), 0.0, 0.0);

        let turned = PageGeometry::new(a4(), Some(crop), 90);
        assert_eq!((turned.width(), turned.height()), (760.0, 500.0));
        close(turned.to_display(Point::new(20.0, 40.0)), 0.0, 0.0);
    }

    #[test]
    fn offset_media_box() {
        let geo = PageGeometry::new(BBox::new(100.0, 50.0, 695.0, 892.0), None, 0);
        close(geo.to_display(Point::new(100.0, 892.0)), 0.0, 0.0);
        close(geo.to_display(Point::new(695.0, 50.0)), 595.0, 842.0);
    }

    #[test]
    fn pixels_scale_display_space() {
        let geo = PageGeometry::new(a4(), None, 0);
        assert_eq!(geo.pixel_size(2.0), (1190, 1684));
        close(geo.pixel_ctm(2.0).transform_point(Point::new(0.0, 842.0)), 0.0, 0.0);
        close(geo.pixel_ctm(2.0).transform_point(Point::new(100.0, 0.0)), 200.0, 1684.0);
    }
}
