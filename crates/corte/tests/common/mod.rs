//! Shared fixtures for the integration tests.
//!
//! Documents are built with lopdf so every test controls exactly what text
//! sits where.

#![allow(dead_code)]

use corte::corte_pdf::encoding::win_ansi_encode_str;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, StringFormat, dictionary};

pub const A4: (i64, i64) = (595, 842);

/// A line of text placed in native page space (`y` up).
#[derive(Debug, Clone, Copy)]
pub struct Placed<'a> {
    pub x: f64,
    pub y: f64,
    pub text: &'a str,
}

pub fn at(x: f64, y: f64, text: &str) -> Placed<'_> {
    Placed { x, y, text }
}

fn page_content(lines: &[Placed<'_>]) -> Vec<u8> {
    let mut ops = vec![
        // A dark bar so pixels differ between halves.
        Operation::new("rg", vec![0.2.into(), 0.2.into(), 0.2.into()]),
        Operation::new("re", vec![40.into(), 60.into(), 515.into(), 8.into()]),
        Operation::new("f", vec![]),
    ];
    for line in lines {
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec!["F1".into(), 11.into()]));
        ops.push(Operation::new("Td", vec![line.x.into(), line.y.into()]));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(win_ansi_encode_str(line.text), StringFormat::Literal)],
        ));
        ops.push(Operation::new("ET", vec![]));
    }
    Content { operations: ops }.encode().unwrap()
}

/// A document with one page per entry, each of the given size.
pub fn pdf_with_pages(pages: &[(&[Placed<'_>], (i64, i64))]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let mut kids = Vec::new();
    for (lines, (w, h)) in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, page_content(lines)));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), (*w).into(), (*h).into()],
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);
    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// A4 portrait document.
pub fn a4_pdf(pages: &[&[Placed<'_>]]) -> Vec<u8> {
    let sized: Vec<(&[Placed<'_>], (i64, i64))> = pages.iter().map(|p| (*p, A4)).collect();
    pdf_with_pages(&sized)
}

/// Two orders on one A4 page: `top` in the upper half, `bottom` in the lower.
pub fn two_order_page<'a>(top: &'a str, bottom: &'a str) -> [Placed<'a>; 2] {
    [at(60.0, 700.0, top), at(60.0, 250.0, bottom)]
}

/// Bytes that look like a PDF header but do not parse.
pub fn corrupt_pdf() -> Vec<u8> {
    b"%PDF-1.4\n1 0 obj << /Type /Catalog".to_vec()
}

/// A letterhead: company name at the top of an A4 page.
pub fn letterhead() -> Vec<u8> {
    a4_pdf(&[&[at(40.0, 800.0, "COMPANHIA DE ÁGUAS")]])
}

/// One page whose image XObject declares 200000x200000 pixels but carries
/// three bytes of data.
pub fn oversized_image_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 200_000i64,
            "Height" => 200_000i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8i64,
        },
        vec![0, 0, 0],
    ));
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        b"q 595 0 0 842 0 0 cm /Im0 Do Q".to_vec(),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), A4.0.into(), A4.1.into()],
        "Contents" => content_id,
        "Resources" => dictionary! { "XObject" => dictionary! { "Im0" => image_id } },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);
    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}
