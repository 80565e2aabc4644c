//! tiny-skia painter for interpreted page content.
//!
//! Paints filled and stroked paths, glyph outlines and image XObjects onto
//! an RGBA pixmap.

use corte_core::{Color, Ctm};
use image::ImageFormat;
use lopdf::{Object, Stream};
use tiny_skia::{
    FillRule as SkFillRule, FilterQuality, IntSize, Paint, PathBuilder, Pixmap, PixmapPaint,
    Stroke, Transform,
};
use tracing::{debug, warn};

use crate::document::{decode_stream, object_to_f64};
use crate::error::BackendError;
use crate::font_program::GlyphBitmap;
use crate::handler::{
    ContentHandler, FillRule, GlyphEvent, ImageEvent, PaintOp, PathEvent, PathSegment,
};
use crate::page_geometry::PageGeometry;

/// Largest raster side, in pixels. Also bounds declared image sizes.
pub const MAX_PIXELS_PER_SIDE: u32 = 16_384;

/// Largest decoded image, in pixels (256 MiB of RGBA).
pub const MAX_IMAGE_PIXELS: u64 = 64 * 1024 * 1024;

/// Glyphs smaller than this many pixels per em are skipped.
const MIN_GLYPH_PX: f64 = 1.0;
/// Glyphs larger than this are skipped rather than rasterized whole.
const MAX_GLYPH_PX: f64 = 2048.0;

/// Content handler that paints onto a white pixmap.
pub struct Rasterizer<'doc> {
    doc: &'doc lopdf::Document,
    pixmap: Pixmap,
    to_pixels: Ctm,
}

impl std::fmt::Debug for Rasterizer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rasterizer")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .finish_non_exhaustive()
    }
}

impl<'doc> Rasterizer<'doc> {
    /// Allocate a white canvas for the page at `scale` pixels per point.
    pub fn new(
        doc: &'doc lopdf::Document,
        geometry: &PageGeometry,
        scale: f64,
    ) -> Result<Self, BackendError> {
        let (width, height) = geometry.pixel_size(scale);
        if width > MAX_PIXELS_PER_SIDE || height > MAX_PIXELS_PER_SIDE {
            return Err(BackendError::Render(format!(
                "raster of {width}x{height} exceeds the {MAX_PIXELS_PER_SIDE} pixel limit"
            )));
        }
        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| BackendError::Render(format!("cannot allocate {width}x{height} pixmap")))?;
        pixmap.fill(tiny_skia::Color::WHITE);
        Ok(Self {
            doc,
            pixmap,
            to_pixels: geometry.pixel_ctm(scale),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Finish painting and return the RGBA8 pixel data.
    ///
    /// The canvas starts opaque and every paint is opaque, so the
    /// premultiplied buffer equals straight RGBA.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixmap.take()
    }

    fn draw_image(&mut self, event: &ImageEvent<'_>) -> Result<(), BackendError> {
        let Some(image) = decode_image(self.doc, event.stream)? else {
            return Ok(());
        };
        let (w, h) = (image.width() as f64, image.height() as f64);
        // Image row 0 is the top edge of the unit square.
        let unit = Ctm::new(1.0 / w, 0.0, 0.0, -1.0 / h, 0.0, 1.0);
        let transform = to_transform(&unit.then(&event.ctm).then(&self.to_pixels));
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(0, 0, image.as_ref(), &paint, transform, None);
        Ok(())
    }
}

/// Premultiplied pixmap of a glyph's coverage in one color.
fn glyph_pixmap(bitmap: &GlyphBitmap, color: Color) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(bitmap.width as u32, bitmap.height as u32)?;
    let rgb = [channel(color.r), channel(color.g), channel(color.b)];
    for (px, &alpha) in pixmap.data_mut().chunks_exact_mut(4).zip(&bitmap.coverage) {
        let premul = |c: u8| ((c as u32 * alpha as u32 + 127) / 255) as u8;
        px.copy_from_slice(&[premul(rgb[0]), premul(rgb[1]), premul(rgb[2]), alpha]);
    }
    Some(pixmap)
}

impl ContentHandler for Rasterizer<'_> {
    fn on_glyph(&mut self, event: GlyphEvent<'_>) {
        let to_pixels = event.matrix.then(&self.to_pixels);
        // Pixels per em along the glyph's vertical axis.
        let px = to_pixels.c.hypot(to_pixels.d);
        if !(MIN_GLYPH_PX..=MAX_GLYPH_PX).contains(&px) {
            return;
        }
        let bitmap = event.program.rasterize(event.glyph_index, px as f32);
        let Some(glyph) = glyph_pixmap(&bitmap, event.color) else {
            return;
        };
        // Bitmap pixels to glyph space: rows run downward from the top edge.
        let place = Ctm::new(
            1.0 / px,
            0.0,
            0.0,
            -1.0 / px,
            bitmap.left as f64 / px,
            (bitmap.bottom as f64 + bitmap.height as f64) / px,
        );
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(
            0,
            0,
            glyph.as_ref(),
            &paint,
            to_transform(&place.then(&to_pixels)),
            None,
        );
    }

    fn on_path_painted(&mut self, event: PathEvent) {
        let mut pb = PathBuilder::new();
        for segment in &event.segments {
            match *segment {
                PathSegment::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
                PathSegment::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
                PathSegment::CurveTo(c1, c2, p) => pb.cubic_to(
                    c1.x as f32,
                    c1.y as f32,
                    c2.x as f32,
                    c2.y as f32,
                    p.x as f32,
                    p.y as f32,
                ),
                PathSegment::Close => pb.close(),
            }
        }
        let Some(path) = pb.finish() else {
            return;
        };
        let transform = to_transform(&self.to_pixels);

        if matches!(event.paint_op, PaintOp::Fill | PaintOp::FillAndStroke) {
            let rule = match event.fill_rule {
                FillRule::NonZero => SkFillRule::Winding,
                FillRule::EvenOdd => SkFillRule::EvenOdd,
            };
            self.pixmap
                .fill_path(&path, &paint_for(event.fill_color), rule, transform, None);
        }
        if matches!(event.paint_op, PaintOp::Stroke | PaintOp::FillAndStroke) {
            // Width 0 is a hairline in both PDF and tiny-skia.
            let stroke = Stroke {
                width: event.line_width.max(0.0) as f32,
                ..Stroke::default()
            };
            self.pixmap
                .stroke_path(&path, &paint_for(event.stroke_color), &stroke, transform, None);
        }
    }

    fn on_image(&mut self, event: ImageEvent<'_>) {
        if let Err(err) = self.draw_image(&event) {
            warn!(image = %event.name, error = %err, "skipping undecodable image");
        }
    }
}

fn paint_for(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(channel(color.r), channel(color.g), channel(color.b), 255);
    paint.anti_alias = true;
    paint
}

fn channel(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn to_transform(m: &Ctm) -> Transform {
    Transform::from_row(
        m.a as f32, m.b as f32, m.c as f32, m.d as f32, m.e as f32, m.f as f32,
    )
}

/// Validate declared image dimensions before anything is allocated for them.
fn checked_image_size(width: f64, height: f64) -> Result<(u32, u32), BackendError> {
    if !(width >= 1.0 && height >= 1.0) {
        return Err(BackendError::Image("image has no dimensions".to_string()));
    }
    let limit = MAX_PIXELS_PER_SIDE as f64;
    if width > limit || height > limit || width * height > MAX_IMAGE_PIXELS as f64 {
        return Err(BackendError::Image(format!(
            "declared image size {width}x{height} exceeds the decoding limit"
        )));
    }
    Ok((width as u32, height as u32))
}

/// Bytes of sample data a `width`×`height` image needs.
fn required_sample_bytes(width: u32, height: u32, bpc: u8, components: usize) -> Option<usize> {
    let row_bits = (width as usize)
        .checked_mul(components)?
        .checked_mul(bpc as usize)?;
    row_bits.div_ceil(8).checked_mul(height as usize)
}

/// Color space of raw image samples.
#[derive(Debug, Clone, PartialEq)]
enum ImageColor {
    Gray,
    Rgb,
    Cmyk,
    /// Palette of RGB triples.
    Indexed(Vec<[u8; 3]>),
}

/// Decode an image XObject to an opaque pixmap.
///
/// Returns `Ok(None)` for images this painter does not handle (stencil
/// masks, JPEG 2000, fax and JBIG2 data).
fn decode_image(doc: &lopdf::Document, stream: &Stream) -> Result<Option<Pixmap>, BackendError> {
    let dict = &stream.dict;
    if let Ok(Object::Boolean(true)) = dict.get(b"ImageMask") {
        debug!("stencil image masks are not painted");
        return Ok(None);
    }
    let width = dict.get(b"Width").ok().and_then(object_to_f64).unwrap_or(0.0);
    let height = dict.get(b"Height").ok().and_then(object_to_f64).unwrap_or(0.0);
    let (width, height) = checked_image_size(width, height)?;

    let filters = filter_names(dict);
    let rgba = if filters.iter().any(|f| f == "DCTDecode") {
        if filters.len() != 1 {
            warn!(?filters, "chained DCT filters are not supported");
            return Ok(None);
        }
        let decoded = image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)?;
        decoded.to_rgba8().into_raw()
    } else if let Some(other) = filters
        .iter()
        .find(|f| !matches!(f.as_str(), "FlateDecode" | "LZWDecode" | "ASCIIHexDecode" | "ASCII85Decode" | "RunLengthDecode"))
    {
        warn!(filter = %other, "unsupported image filter");
        return Ok(None);
    } else {
        let samples = decode_stream(stream)?;
        let bpc = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(object_to_f64)
            .unwrap_or(8.0) as u8;
        let color = image_color(doc, dict.get(b"ColorSpace").ok());
        let Some(color) = color else {
            warn!("unsupported image color space");
            return Ok(None);
        };
        samples_to_rgba(&samples, width, height, bpc, &color)?
    };

    let size = IntSize::from_wh(width, height)
        .ok_or_else(|| BackendError::Image(format!("invalid image size {width}x{height}")))?;
    // DCT output may disagree with the dictionary's declared size.
    if rgba.len() != width as usize * height as usize * 4 {
        return Err(BackendError::Image(format!(
            "image data does not match {width}x{height}"
        )));
    }
    Pixmap::from_vec(rgba, size)
        .map(Some)
        .ok_or_else(|| BackendError::Image("cannot build image pixmap".to_string()))
}

fn filter_names(dict: &lopdf::Dictionary) -> Vec<String> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![String::from_utf8_lossy(name).into_owned()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .collect(),
        _ => Vec::new(),
    }
}

fn image_color(doc: &lopdf::Document, obj: Option<&Object>) -> Option<ImageColor> {
    let obj = match obj {
        Some(Object::Reference(id)) => doc.get_object(*id).ok()?,
        Some(o) => o,
        None => return Some(ImageColor::Gray),
    };
    match obj {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" | b"G" => Some(ImageColor::Gray),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Some(ImageColor::Rgb),
            b"DeviceCMYK" | b"CMYK" => Some(ImageColor::Cmyk),
            _ => None,
        },
        Object::Array(items) => {
            let family = items.first()?.as_name().ok()?;
            match family {
                b"ICCBased" => {
                    let id = items.get(1)?.as_reference().ok()?;
                    let n = doc
                        .get_object(id)
                        .ok()?
                        .as_stream()
                        .ok()?
                        .dict
                        .get(b"N")
                        .ok()
                        .and_then(object_to_f64)?;
                    match n as u32 {
                        1 => Some(ImageColor::Gray),
                        3 => Some(ImageColor::Rgb),
                        4 => Some(ImageColor::Cmyk),
                        _ => None,
                    }
                }
                b"CalGray" => Some(ImageColor::Gray),
                b"CalRGB" => Some(ImageColor::Rgb),
                b"Indexed" | b"I" => indexed_palette(doc, items),
                _ => None,
            }
        }
        _ => None,
    }
}

/// `[/Indexed base hival lookup]` with a Gray, RGB or CMYK base.
fn indexed_palette(doc: &lopdf::Document, items: &[Object]) -> Option<ImageColor> {
    let base = image_color(doc, items.get(1))?;
    let lookup: Vec<u8> = match items.get(3)? {
        Object::String(bytes, _) => bytes.clone(),
        Object::Reference(id) => match doc.get_object(*id).ok()? {
            Object::String(bytes, _) => bytes.clone(),
            Object::Stream(s) => decode_stream(s).ok()?,
            _ => return None,
        },
        _ => return None,
    };
    let palette = match base {
        ImageColor::Gray => lookup.iter().map(|&g| [g, g, g]).collect(),
        ImageColor::Rgb => lookup.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect(),
        ImageColor::Cmyk => lookup.chunks_exact(4).map(|c| cmyk_to_rgb(c[0], c[1], c[2], c[3])).collect(),
        ImageColor::Indexed(_) => return None,
    };
    Some(ImageColor::Indexed(palette))
}

fn cmyk_to_rgb(c: u8, m: u8, y: u8, k: u8) -> [u8; 3] {
    let inv = |v: u8| 255 - v as u32;
    let kk = inv(k);
    [
        (inv(c) * kk / 255) as u8,
        (inv(m) * kk / 255) as u8,
        (inv(y) * kk / 255) as u8,
    ]
}

/// Expand raw samples (8 bits per component, or 1-bit gray / 1-bit
/// indexed) to opaque RGBA.
fn samples_to_rgba(
    samples: &[u8],
    width: u32,
    height: u32,
    bpc: u8,
    color: &ImageColor,
) -> Result<Vec<u8>, BackendError> {
    let components = match color {
        ImageColor::Rgb => 3,
        ImageColor::Cmyk => 4,
        ImageColor::Gray | ImageColor::Indexed(_) => 1,
    };
    let needed = required_sample_bytes(width, height, bpc, components)
        .ok_or_else(|| BackendError::Image(format!("image size {width}x{height} overflows")))?;
    if samples.len() < needed {
        return Err(BackendError::Image(format!(
            "image data too short for {width}x{height}: {} of {needed} bytes",
            samples.len()
        )));
    }
    let pixels = (width as usize)
        .checked_mul(height as usize)
        .and_then(|p| p.checked_mul(4).map(|bytes| (p, bytes)));
    let Some((pixels, capacity)) = pixels else {
        return Err(BackendError::Image(format!("image size {width}x{height} overflows")));
    };
    let mut out = Vec::with_capacity(capacity);
    match (bpc, color) {
        (8, ImageColor::Gray) => {
            for &g in samples.iter().take(pixels) {
                out.extend_from_slice(&[g, g, g, 255]);
            }
        }
        (8, ImageColor::Rgb) => {
            for px in samples.chunks_exact(3).take(pixels) {
                out.extend_from_slice(&[px[0], px[1], px[2], 255]);
            }
        }
        (8, ImageColor::Cmyk) => {
            for px in samples.chunks_exact(4).take(pixels) {
                let [r, g, b] = cmyk_to_rgb(px[0], px[1], px[2], px[3]);
                out.extend_from_slice(&[r, g, b, 255]);
            }
        }
        (8, ImageColor::Indexed(palette)) => {
            for &i in samples.iter().take(pixels) {
                let [r, g, b] = palette.get(i as usize).copied().unwrap_or([0, 0, 0]);
                out.extend_from_slice(&[r, g, b, 255]);
            }
        }
        (1, ImageColor::Gray | ImageColor::Indexed(_)) => {
            // Rows are padded to whole bytes.
            let row_bytes = (width as usize).div_ceil(8);
            for row in samples.chunks(row_bytes).take(height as usize) {
                for x in 0..width as usize {
                    let bit = row.get(x / 8).map_or(0, |b| (b >> (7 - x % 8)) & 1);
                    let [r, g, b] = match color {
                        ImageColor::Indexed(palette) => {
                            palette.get(bit as usize).copied().unwrap_or([0, 0, 0])
                        }
                        _ => {
                            let v = bit * 255;
                            [v, v, v]
                        }
                    };
                    out.extend_from_slice(&[r, g, b, 255]);
                }
            }
        }
        _ => {
            return Err(BackendError::Image(format!(
                "unsupported sample layout: {bpc} bits per component"
            )));
        }
    }
    if out.len() != capacity {
        return Err(BackendError::Image(format!(
            "image data too short for {width}x{height}"
        )));
    }
    Ok(out)
}
