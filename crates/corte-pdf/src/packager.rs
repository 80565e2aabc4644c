//! Image-to-PDF packager: wraps a raster crop into a one-page document.
//!
//! The page is exactly the image's pixel size in points, with the image
//! filling it edge to edge. Output bytes depend only on the pixels.

use corte_core::raster::BYTES_PER_PIXEL;
use corte_core::{CorteError, RasterPage};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use crate::error::BackendError;

const IMAGE_NAME: &str = "Im0";

/// Package an RGBA8 buffer as a standalone single-page PDF.
pub fn package_as_single_page_pdf(
    pixels: &[u8],
    width: u32,
    height: u32,
) -> Result<Vec<u8>, CorteError> {
    if width == 0 || height == 0 {
        return Err(CorteError::InvalidDocument(format!(
            "cannot package an empty {width}x{height} image"
        )));
    }
    let expected = width as usize * height as usize * BYTES_PER_PIXEL;
    if pixels.len() != expected {
        return Err(CorteError::InvalidDocument(format!(
            "pixel buffer has {} bytes, expected {expected}",
            pixels.len()
        )));
    }
    Ok(build(pixels, width, height)?)
}

/// Package a rendered page or half.
pub fn package_raster(page: &RasterPage) -> Result<Vec<u8>, CorteError> {
    package_as_single_page_pdf(&page.pixels, page.width, page.height)
}

fn build(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, BackendError> {
    // Alpha is dropped: the rasterizer only produces opaque pixels.
    let rgb: Vec<u8> = pixels
        .chunks_exact(BYTES_PER_PIXEL)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut image = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8i64,
        },
        rgb,
    );
    image.compress()?;
    let image_id = doc.add_object(image);

    let (w, h) = (width as i64, height as i64);
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new("cm", vec![w.into(), 0.into(), 0.into(), h.into(), 0.into(), 0.into()]),
            Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let mut content_stream = Stream::new(dictionary! {}, content.encode()?);
    content_stream.compress()?;
    let content_id = doc.add_object(content_stream);

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), w.into(), h.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { IMAGE_NAME => image_id },
        },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}
