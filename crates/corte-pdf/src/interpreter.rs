//! Content stream interpreter.
//!
//! Walks decoded page operators, maintaining graphics and text state, and
//! emits events to a [`ContentHandler`]. Form XObjects are interpreted
//! recursively via `Do`; image XObjects are reported as placed.

use std::collections::HashMap;

use corte_core::{Color, Ctm, Point};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object};
use tracing::{debug, warn};

use crate::document::{PageRef, PdfDocument, decode_stream, object_to_f64, resolve_ref};
use crate::error::BackendError;
use crate::font::LoadedFont;
use crate::handler::{
    ContentHandler, FillRule, GlyphEvent, ImageEvent, PaintOp, PathEvent, PathSegment, TextEvent,
};

/// Maximum nesting of Form XObjects.
pub const MAX_FORM_DEPTH: usize = 12;

/// A `TJ` adjustment wider than this fraction of an em reads as a word gap.
const TJ_SPACE_THRESHOLD: f64 = 0.2;

#[derive(Debug, Clone)]
struct TextParams {
    font: Option<Vec<u8>>,
    size: f64,
    char_spacing: f64,
    word_spacing: f64,
    h_scale: f64,
    leading: f64,
    rise: f64,
    /// `Tr`: 3 and 7 leave no ink.
    render_mode: i64,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            font: None,
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
            render_mode: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Ctm,
    line_width: f64,
    stroke_color: Color,
    fill_color: Color,
    text: TextParams,
}

impl GraphicsState {
    fn new(ctm: Ctm) -> Self {
        Self {
            ctm,
            line_width: 1.0,
            stroke_color: Color::BLACK,
            fill_color: Color::BLACK,
            text: TextParams::default(),
        }
    }
}

/// Interpret every content stream of a page.
pub fn interpret_page(
    doc: &PdfDocument,
    page: PageRef,
    handler: &mut dyn ContentHandler,
) -> Result<(), BackendError> {
    let content = doc.content_bytes(page)?;
    let resources = doc.resources(page)?;
    interpret_content(doc.inner(), &content, resources, handler)
}

/// Interpret raw content bytes against a resources dictionary.
pub fn interpret_content(
    doc: &Document,
    content: &[u8],
    resources: &Dictionary,
    handler: &mut dyn ContentHandler,
) -> Result<(), BackendError> {
    let mut interp = Interpreter { doc, handler };
    interp.run(content, resources, GraphicsState::new(Ctm::identity()), 0)
}

struct Interpreter<'d, 'h> {
    doc: &'d Document,
    handler: &'h mut dyn ContentHandler,
}

/// Per-stream mutable state that does not survive `q`/`Q`.
struct Scratch {
    path: Vec<PathSegment>,
    current: Point,
    subpath_start: Point,
    tm: Ctm,
    tlm: Ctm,
}

impl<'d> Interpreter<'d, '_> {
    fn run(
        &mut self,
        content: &[u8],
        resources: &'d Dictionary,
        initial: GraphicsState,
        depth: usize,
    ) -> Result<(), BackendError> {
        let content = Content::decode(content)
            .map_err(|e| BackendError::Parse(format!("failed to decode content stream: {e}")))?;
        let mut fonts: HashMap<Vec<u8>, LoadedFont> = HashMap::new();
        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut gs = initial;
        let mut s = Scratch {
            path: Vec::new(),
            current: Point::new(0.0, 0.0),
            subpath_start: Point::new(0.0, 0.0),
            tm: Ctm::identity(),
            tlm: Ctm::identity(),
        };

        for op in &content.operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "q" => stack.push(gs.clone()),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        gs = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix(operands) {
                        gs.ctm = m.then(&gs.ctm);
                    }
                }
                "w" => {
                    if let Some(v) = num(operands, 0) {
                        gs.line_width = v;
                    }
                }

                // --- Color operators ---
                "G" | "g" | "RG" | "rg" | "K" | "k" | "SC" | "sc" | "SCN" | "scn" => {
                    if let Some(color) = color_from(operands) {
                        if op.operator.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
                            gs.stroke_color = color;
                        } else {
                            gs.fill_color = color;
                        }
                    }
                }
                "CS" => gs.stroke_color = Color::BLACK,
                "cs" => gs.fill_color = Color::BLACK,

                // --- Path construction ---
                "m" => {
                    if let Some(p) = point(operands, 0, &gs.ctm) {
                        s.path.push(PathSegment::MoveTo(p));
                        s.current = p;
                        s.subpath_start = p;
                    }
                }
                "l" => {
                    if let Some(p) = point(operands, 0, &gs.ctm) {
                        s.path.push(PathSegment::LineTo(p));
                        s.current = p;
                    }
                }
                "c" => {
                    if let (Some(c1), Some(c2), Some(p)) = (
                        point(operands, 0, &gs.ctm),
                        point(operands, 2, &gs.ctm),
                        point(operands, 4, &gs.ctm),
                    ) {
                        s.path.push(PathSegment::CurveTo(c1, c2, p));
                        s.current = p;
                    }
                }
                "v" => {
                    if let (Some(c2), Some(p)) =
                        (point(operands, 0, &gs.ctm), point(operands, 2, &gs.ctm))
                    {
                        s.path.push(PathSegment::CurveTo(s.current, c2, p));
                        s.current = p;
                    }
                }
                "y" => {
                    if let (Some(c1), Some(p)) =
                        (point(operands, 0, &gs.ctm), point(operands, 2, &gs.ctm))
                    {
                        s.path.push(PathSegment::CurveTo(c1, p, p));
                        s.current = p;
                    }
                }
                "h" => {
                    s.path.push(PathSegment::Close);
                    s.current = s.subpath_start;
                }
                "re" => {
                    if let (Some(x), Some(y), Some(w), Some(h)) = (
                        num(operands, 0),
                        num(operands, 1),
                        num(operands, 2),
                        num(operands, 3),
                    ) {
                        let corner = |px: f64, py: f64| gs.ctm.transform_point(Point::new(px, py));
                        let start = corner(x, y);
                        s.path.push(PathSegment::MoveTo(start));
                        s.path.push(PathSegment::LineTo(corner(x + w, y)));
                        s.path.push(PathSegment::LineTo(corner(x + w, y + h)));
                        s.path.push(PathSegment::LineTo(corner(x, y + h)));
                        s.path.push(PathSegment::Close);
                        s.current = start;
                        s.subpath_start = start;
                    }
                }

                // --- Path painting ---
                "S" => self.paint(&mut s, &gs, PaintOp::Stroke, FillRule::NonZero, false),
                "s" => self.paint(&mut s, &gs, PaintOp::Stroke, FillRule::NonZero, true),
                "f" | "F" => self.paint(&mut s, &gs, PaintOp::Fill, FillRule::NonZero, false),
                "f*" => self.paint(&mut s, &gs, PaintOp::Fill, FillRule::EvenOdd, false),
                "B" => self.paint(&mut s, &gs, PaintOp::FillAndStroke, FillRule::NonZero, false),
                "B*" => self.paint(&mut s, &gs, PaintOp::FillAndStroke, FillRule::EvenOdd, false),
                "b" => self.paint(&mut s, &gs, PaintOp::FillAndStroke, FillRule::NonZero, true),
                "b*" => self.paint(&mut s, &gs, PaintOp::FillAndStroke, FillRule::EvenOdd, true),
                "n" => s.path.clear(),
                // Clipping is not applied; the painted result is a superset.
                "W" | "W*" => {}

                // --- Text state ---
                "BT" => {
                    s.tm = Ctm::identity();
                    s.tlm = Ctm::identity();
                }
                "ET" => {}
                "Tf" => {
                    if let Some(Ok(name)) = operands.first().map(Object::as_name) {
                        gs.text.font = Some(name.to_vec());
                    }
                    if let Some(size) = num(operands, 1) {
                        gs.text.size = size;
                    }
                }
                "Tc" => set(&mut gs.text.char_spacing, operands),
                "Tw" => set(&mut gs.text.word_spacing, operands),
                "TL" => set(&mut gs.text.leading, operands),
                "Ts" => set(&mut gs.text.rise, operands),
                "Tr" => {
                    if let Some(mode) = num(operands, 0) {
                        gs.text.render_mode = mode as i64;
                    }
                }
                "Tz" => {
                    if let Some(v) = num(operands, 0) {
                        gs.text.h_scale = v / 100.0;
                    }
                }
                "Td" => {
                    if let (Some(tx), Some(ty)) = (num(operands, 0), num(operands, 1)) {
                        next_line(&mut s, tx, ty);
                    }
                }
                "TD" => {
                    if let (Some(tx), Some(ty)) = (num(operands, 0), num(operands, 1)) {
                        gs.text.leading = -ty;
                        next_line(&mut s, tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = matrix(operands) {
                        s.tm = m;
                        s.tlm = m;
                    }
                }
                "T*" => next_line(&mut s, 0.0, -gs.text.leading),

                // --- Text showing ---
                "Tj" => {
                    if let Some(bytes) = string_bytes(operands.first()) {
                        let pieces = [TjPiece::Text(bytes)];
                        self.show(&pieces, &mut s, &gs, resources, &mut fonts);
                    }
                }
                "'" => {
                    next_line(&mut s, 0.0, -gs.text.leading);
                    if let Some(bytes) = string_bytes(operands.first()) {
                        let pieces = [TjPiece::Text(bytes)];
                        self.show(&pieces, &mut s, &gs, resources, &mut fonts);
                    }
                }
                "\"" => {
                    set(&mut gs.text.word_spacing, operands);
                    if let Some(v) = num(operands, 1) {
                        gs.text.char_spacing = v;
                    }
                    next_line(&mut s, 0.0, -gs.text.leading);
                    if let Some(bytes) = string_bytes(operands.get(2)) {
                        let pieces = [TjPiece::Text(bytes)];
                        self.show(&pieces, &mut s, &gs, resources, &mut fonts);
                    }
                }
                "TJ" => {
                    if let Some(Ok(items)) = operands.first().map(Object::as_array) {
                        let pieces: Vec<TjPiece<'_>> = items
                            .iter()
                            .filter_map(|item| match item {
                                Object::String(bytes, _) => Some(TjPiece::Text(bytes)),
                                other => object_to_f64(other).map(TjPiece::Adjust),
                            })
                            .collect();
                        self.show(&pieces, &mut s, &gs, resources, &mut fonts);
                    }
                }

                // --- XObjects ---
                "Do" => {
                    if let Some(Ok(name)) = operands.first().map(Object::as_name) {
                        self.handle_do(name, &gs, resources, depth)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn paint(
        &mut self,
        s: &mut Scratch,
        gs: &GraphicsState,
        paint_op: PaintOp,
        fill_rule: FillRule,
        close: bool,
    ) {
        if close {
            s.path.push(PathSegment::Close);
        }
        let segments = std::mem::take(&mut s.path);
        if segments.is_empty() {
            return;
        }
        self.handler.on_path_painted(PathEvent {
            segments,
            paint_op,
            fill_rule,
            line_width: gs.line_width * ctm_scale(&gs.ctm),
            stroke_color: gs.stroke_color,
            fill_color: gs.fill_color,
        });
    }

    fn show(
        &mut self,
        pieces: &[TjPiece<'_>],
        s: &mut Scratch,
        gs: &GraphicsState,
        resources: &Dictionary,
        fonts: &mut HashMap<Vec<u8>, LoadedFont>,
    ) {
        let t = &gs.text;
        let font_key = t.font.clone().unwrap_or_default();
        let font = fonts
            .entry(font_key)
            .or_insert_with_key(|key| load_font(self.doc, resources, key));

        let rise = Point::new(0.0, t.rise);
        let origin = s.tm.then(&gs.ctm).transform_point(rise);
        let size_vec = s.tm.then(&gs.ctm).transform_vector(Point::new(0.0, t.size));
        // Glyph space to text space, before the text matrix.
        let em = Ctm::new(t.size * t.h_scale, 0.0, 0.0, t.size, 0.0, t.rise);
        let ink = match t.render_mode {
            3 | 7 => None,
            1 | 5 => Some(gs.stroke_color),
            _ => Some(gs.fill_color),
        };
        let mut text = String::new();

        for piece in pieces {
            match piece {
                TjPiece::Text(bytes) => {
                    for glyph in font.decode(bytes) {
                        if let Some(color) = ink {
                            if let Some((program, glyph_index)) = font.outline(&glyph) {
                                self.handler.on_glyph(GlyphEvent {
                                    program,
                                    glyph_index,
                                    matrix: em.then(&s.tm).then(&gs.ctm),
                                    color,
                                });
                            }
                        }
                        let mut advance = glyph.width / 1000.0 * t.size + t.char_spacing;
                        if glyph.is_space {
                            advance += t.word_spacing;
                        }
                        s.tm = Ctm::translate(advance * t.h_scale, 0.0).then(&s.tm);
                        text.push_str(&glyph.text);
                    }
                }
                TjPiece::Adjust(n) => {
                    let shift = -n / 1000.0;
                    s.tm = Ctm::translate(shift * t.size * t.h_scale, 0.0).then(&s.tm);
                    if shift > TJ_SPACE_THRESHOLD && !text.is_empty() && !text.ends_with(' ') {
                        text.push(' ');
                    }
                }
            }
        }

        if text.trim().is_empty() {
            return;
        }
        let end = s.tm.then(&gs.ctm).transform_point(rise);
        self.handler.on_text(TextEvent {
            text,
            origin,
            end,
            font_size: size_vec.x.hypot(size_vec.y),
        });
    }

    fn handle_do(
        &mut self,
        name: &[u8],
        gs: &GraphicsState,
        resources: &'d Dictionary,
        depth: usize,
    ) -> Result<(), BackendError> {
        let doc = self.doc;
        let Some(stream) = resources
            .get(b"XObject")
            .ok()
            .and_then(|o| resolve_ref(doc, o).as_dict().ok())
            .and_then(|xobjects| xobjects.get(name).ok())
            .and_then(|o| resolve_ref(doc, o).as_stream().ok())
        else {
            debug!(name = %String::from_utf8_lossy(name), "XObject not found");
            return Ok(());
        };

        let subtype = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .unwrap_or(b"");
        match subtype {
            b"Image" => {
                self.handler.on_image(ImageEvent {
                    name: String::from_utf8_lossy(name).into_owned(),
                    stream,
                    ctm: gs.ctm,
                });
                Ok(())
            }
            b"Form" => {
                if depth + 1 > MAX_FORM_DEPTH {
                    warn!(depth, "form XObject nesting too deep, skipping");
                    return Ok(());
                }
                let form_matrix = stream
                    .dict
                    .get(b"Matrix")
                    .ok()
                    .and_then(|o| resolve_ref(doc, o).as_array().ok())
                    .and_then(|arr| matrix(arr))
                    .unwrap_or_default();
                let form_resources = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|o| resolve_ref(doc, o).as_dict().ok())
                    .unwrap_or(resources);
                let bytes = decode_stream(stream)?;
                let mut state = gs.clone();
                state.ctm = form_matrix.then(&gs.ctm);
                self.run(&bytes, form_resources, state, depth + 1)
            }
            _ => Ok(()),
        }
    }
}

enum TjPiece<'a> {
    Text(&'a [u8]),
    Adjust(f64),
}

fn load_font(doc: &Document, resources: &Dictionary, name: &[u8]) -> LoadedFont {
    resources
        .get(b"Font")
        .ok()
        .and_then(|o| resolve_ref(doc, o).as_dict().ok())
        .and_then(|fonts| fonts.get(name).ok())
        .and_then(|o| resolve_ref(doc, o).as_dict().ok())
        .map(|dict| LoadedFont::from_dict(doc, dict))
        .unwrap_or_else(|| LoadedFont::missing(&String::from_utf8_lossy(name)))
}

fn next_line(s: &mut Scratch, tx: f64, ty: f64) {
    s.tlm = Ctm::translate(tx, ty).then(&s.tlm);
    s.tm = s.tlm;
}

fn num(operands: &[Object], index: usize) -> Option<f64> {
    operands.get(index).and_then(object_to_f64)
}

fn set(slot: &mut f64, operands: &[Object]) {
    if let Some(v) = num(operands, 0) {
        *slot = v;
    }
}

fn point(operands: &[Object], index: usize, ctm: &Ctm) -> Option<Point> {
    Some(ctm.transform_point(Point::new(num(operands, index)?, num(operands, index + 1)?)))
}

fn matrix(operands: &[Object]) -> Option<Ctm> {
    if operands.len() < 6 {
        return None;
    }
    Some(Ctm::new(
        num(operands, 0)?,
        num(operands, 1)?,
        num(operands, 2)?,
        num(operands, 3)?,
        num(operands, 4)?,
        num(operands, 5)?,
    ))
}

/// Color from numeric operands: 1 = gray, 3 = RGB, 4 = CMYK.
/// Pattern names (trailing `/Name` on `scn`) are ignored.
fn color_from(operands: &[Object]) -> Option<Color> {
    let values: Vec<f64> = operands.iter().filter_map(object_to_f64).collect();
    match values.as_slice() {
        [g] => Some(Color::gray(*g)),
        [r, g, b] => Some(Color::rgb(*r, *g, *b)),
        [c, m, y, k] => Some(Color::rgb(
            (1.0 - c) * (1.0 - k),
            (1.0 - m) * (1.0 - k),
            (1.0 - y) * (1.0 - k),
        )),
        _ => None,
    }
}

fn string_bytes(obj: Option<&Object>) -> Option<&[u8]> {
    match obj {
        Some(Object::String(bytes, _)) => Some(bytes),
        _ => None,
    }
}

/// Average linear scale of a matrix, for line widths.
fn ctm_scale(ctm: &Ctm) -> f64 {
    (ctm.a * ctm.d - ctm.b * ctm.c).abs().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;
    use lopdf::{Stream, dictionary};

    #[derive(Default)]
    struct Collect {
        texts: Vec<TextEvent>,
        paths: Vec<PathEvent>,
        images: Vec<(String, Ctm)>,
        glyphs: Vec<(u16, Ctm, Color)>,
    }

    impl ContentHandler for Collect {
        fn on_text(&mut self, event: TextEvent) {
            self.texts.push(event);
        }
        fn on_glyph(&mut self, event: GlyphEvent<'_>) {
            self.glyphs.push((event.glyph_index, event.matrix, event.color));
        }
        fn on_path_painted(&mut self, event: PathEvent) {
            self.paths.push(event);
        }
        fn on_image(&mut self, event: ImageEvent<'_>) {
            self.images.push((event.name, event.ctm));
        }
    }

    fn helvetica_resources() -> Dictionary {
        dictionary! {
            "Font" => dictionary! {
                "F1" => dictionary! { "Type" => "Font", "Subtype" => "Type1", "BaseFont" => "Helvetica" },
            },
        }
    }

    fn run(content: &[u8], resources: &Dictionary, doc: &Document) -> Collect {
        let mut handler = Collect::default();
        interpret_content(doc, content, resources, &mut handler).unwrap();
        handler
    }

    #[test]
    fn simple_text_position() {
        let doc = Document::with_version("1.5");
        let out = run(b"BT /F1 12 Tf 72 700 Td (Hello) Tj ET", &helvetica_resources(), &doc);
        assert_eq!(out.texts.len(), 1);
        let t = &out.texts[0];
        assert_eq!(t.text, "Hello");
        assert_eq!(t.origin, Point::new(72.0, 700.0));
        assert!((t.font_size - 12.0).abs() < 1e-9);
        // H e l l o = 722 + 556 + 222 + 222 + 556
        assert!((t.end.x - (72.0 + 2.278 * 12.0)).abs() < 1e-6);
    }

    #[test]
    fn glyphs_advance_along_the_baseline() {
        let doc = Document::with_version("1.5");
        let out = run(
            b"0 0 1 rg BT /F1 10 Tf 50 600 Td 200 Tz (LI) Tj ET",
            &helvetica_resources(),
            &doc,
        );
        assert_eq!(out.glyphs.len(), 2);
        let (_, first, color) = out.glyphs[0];
        assert_eq!(first, Ctm::new(20.0, 0.0, 0.0, 10.0, 50.0, 600.0));
        assert_eq!(color, Color::rgb(0.0, 0.0, 1.0));
        // L advances 556/1000 em, doubled by the horizontal scale.
        let (_, second, _) = out.glyphs[1];
        assert!((second.e - (50.0 + 0.556 * 10.0 * 2.0)).abs() < 1e-9);
    }

    #[test]
    fn invisible_text_has_runs_but_no_glyphs() {
        let doc = Document::with_version("1.5");
        let out = run(
            b"BT /F1 10 Tf 3 Tr (OS 42) Tj 0 Tr ( ) Tj ET",
            &helvetica_resources(),
            &doc,
        );
        assert_eq!(out.texts.len(), 1);
        assert_eq!(out.texts[0].text, "OS 42");
        // The visible show is a lone space, which has an outline but no run.
        assert_eq!(out.glyphs.len(), 1);
    }

    #[test]
    fn tj_gap_becomes_space() {
        let doc = Document::with_version("1.5");
        let out = run(
            b"BT /F1 10 Tf [(LIG) -50 (A) -600 (08561)] TJ ET",
            &helvetica_resources(),
            &doc,
        );
        assert_eq!(out.texts[0].text, "LIGA 08561");
    }

    #[test]
    fn cm_and_text_matrix_compose() {
        let doc = Document::with_version("1.5");
        let out = run(
            b"2 0 0 2 10 20 cm BT /F1 5 Tf 1 0 0 1 3 4 Tm (x) Tj ET",
            &helvetica_resources(),
            &doc,
        );
        let t = &out.texts[0];
        assert_eq!(t.origin, Point::new(16.0, 28.0));
        assert!((t.font_size - 10.0).abs() < 1e-9);
    }

    #[test]
    fn leading_moves_down() {
        let doc = Document::with_version("1.5");
        let out = run(
            b"BT /F1 10 Tf 14 TL 0 100 Td (a) Tj T* (b) Tj (c) ' ET",
            &helvetica_resources(),
            &doc,
        );
        let ys: Vec<f64> = out.texts.iter().map(|t| t.origin.y).collect();
        assert_eq!(ys, vec![100.0, 86.0, 72.0]);
    }

    #[test]
    fn state_restored_by_q() {
        let doc = Document::with_version("1.5");
        let out = run(
            b"q 1 0 0 rg 0 0 10 10 re f Q 0 0 10 10 re f",
            &Dictionary::new(),
            &doc,
        );
        assert_eq!(out.paths.len(), 2);
        assert_eq!(out.paths[0].fill_color, Color::rgb(1.0, 0.0, 0.0));
        assert_eq!(out.paths[1].fill_color, Color::BLACK);
        assert_eq!(out.paths[0].segments.len(), 5);
    }

    #[test]
    fn path_ops_and_paint_modes() {
        let doc = Document::with_version("1.5");
        let out = run(
            b"0 0 m 10 0 l 10 10 5 15 0 10 c h S 2 w 0 0 m 5 5 l b* 1 0 0 0 k 0 0 1 1 re f* 0 0 m n",
            &Dictionary::new(),
            &doc,
        );
        assert_eq!(out.paths.len(), 3);
        assert_eq!(out.paths[0].paint_op, PaintOp::Stroke);
        assert_eq!(out.paths[1].paint_op, PaintOp::FillAndStroke);
        assert_eq!(out.paths[1].fill_rule, FillRule::EvenOdd);
        assert_eq!(out.paths[1].line_width, 2.0);
        assert_eq!(out.paths[2].fill_color, Color::rgb(0.0, 1.0, 1.0));
    }

    #[test]
    fn image_and_form_xobjects() {
        let mut doc = Document::with_version("1.5");
        let image = Stream::new(
            dictionary! { "Type" => "XObject", "Subtype" => "Image", "Width" => 1i64, "Height" => 1i64 },
            vec![0, 0, 0],
        );
        let image_id = doc.add_object(image);
        let form = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "Matrix" => vec![1.into(), 0.into(), 0.into(), 1.into(), 100.into(), 0.into()],
                "Resources" => dictionary! { "XObject" => dictionary! { "Im0" => image_id } },
            },
            b"50 0 0 50 0 0 cm /Im0 Do".to_vec(),
        );
        let form_id = doc.add_object(form);
        let resources = dictionary! {
            "XObject" => dictionary! { "Im0" => image_id, "Fm0" => form_id },
        };
        let out = run(b"q 10 0 0 10 0 0 cm /Im0 Do Q /Fm0 Do /Missing Do", &resources, &doc);
        assert_eq!(out.images.len(), 2);
        assert_eq!(out.images[0].1, Ctm::scale(10.0, 10.0));
        assert_eq!(out.images[1].1, Ctm::new(50.0, 0.0, 0.0, 50.0, 100.0, 0.0));
    }

    #[test]
    fn self_referencing_form_stops() {
        let mut doc = Document::with_version("1.5");
        let form_id = doc.new_object_id();
        let form = Stream::new(
            dictionary! {
                "Subtype" => "Form",
                "Resources" => dictionary! { "XObject" => dictionary! { "Fm0" => form_id } },
            },
            b"0 0 1 1 re f /Fm0 Do".to_vec(),
        );
        doc.objects.insert(form_id, Object::Stream(form));
        let resources = dictionary! { "XObject" => dictionary! { "Fm0" => form_id } };
        let out = run(b"/Fm0 Do", &resources, &doc);
        assert_eq!(out.paths.len(), MAX_FORM_DEPTH);
    }

    #[test]
    fn missing_font_still_yields_text() {
        let doc = Document::with_version("1.5");
        let out = run(b"BT /F9 12 Tf (ORDEM) Tj ET", &Dictionary::new(), &doc);
        assert_eq!(out.texts[0].text, "ORDEM");
    }

    #[test]
    fn encoded_operations_round_trip_through_decoder() {
        let doc = Document::with_version("1.5");
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 9.into()]),
                Operation::new("Td", vec![5.into(), 6.into()]),
                Operation::new("Tj", vec![Object::string_literal("LIGACAO")]),
                Operation::new("ET", vec![]),
            ],
        };
        let bytes = content.encode().unwrap();
        let out = run(&bytes, &helvetica_resources(), &doc);
        assert_eq!(out.texts[0].text, "LIGACAO");
        assert_eq!(out.texts[0].origin, Point::new(5.0, 6.0));
    }
}
