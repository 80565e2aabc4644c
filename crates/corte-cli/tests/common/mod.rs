#![allow(dead_code)]

use std::io::Write;

use assert_cmd::Command;

pub fn cmd() -> Command {
    Command::cargo_bin("corte").unwrap()
}

/// Build an A4 PDF with one page per content stream, using Helvetica as /F1.
pub fn pdf_with_pages(contents: &[&[u8]]) -> Vec<u8> {
    use lopdf::{Object, Stream, dictionary};

    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for content in contents {
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(Object::Reference(page_id));
    }
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// One scanned sheet: connection number on top, order number below.
pub fn order_sheet() -> Vec<u8> {
    pdf_with_pages(&[b"BT /F1 11 Tf 60 700 Td (LIGACAO: 08561) Tj ET \
BT /F1 11 Tf 60 250 Td (ORDEM DE SERVICO NUMERO 254651) Tj ET"])
}

/// A letterhead with the company name at the top.
pub fn letterhead() -> Vec<u8> {
    pdf_with_pages(&[b"BT /F1 14 Tf 40 800 Td (COMPANHIA DE AGUAS) Tj ET"])
}

/// Write bytes to a temporary file with the given suffix.
pub fn write_temp(bytes: &[u8], suffix: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    f.write_all(bytes).unwrap();
    f.flush().unwrap();
    f
}

pub fn path_str(path: &std::path::Path) -> &str {
    path.to_str().unwrap()
}
