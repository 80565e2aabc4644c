use std::path::Path;

use corte::corte_core::{CutRatio, ExtractOptions, FieldExtractor, Half, RasterPage, split_halves};
use corte::corte_pdf::{DEFAULT_SCALE, page_count};
use corte::{CorteError, ExtractedFields, FieldId, render_page};

use crate::cli::OutputFormat;
use crate::shared::{fail, read_file, resolve_pages};

/// One half of a page as the importer sees it.
struct HalfDump {
    page: usize,
    half: Half,
    raster: RasterPage,
    fields: ExtractedFields,
    ambiguous: Vec<FieldId>,
}

pub fn run(
    file: &Path,
    pages: Option<&str>,
    scale: Option<f64>,
    cut_ratio: Option<f64>,
    format: OutputFormat,
) -> Result<(), i32> {
    let bytes = read_file(file)?;
    let count = page_count(&bytes).map_err(fail)?;
    let indices = resolve_pages(pages, count)?;
    let ratio = CutRatio::new(cut_ratio.unwrap_or(0.5)).map_err(fail)?;
    let scale = scale.unwrap_or(DEFAULT_SCALE);

    let mut halves = Vec::with_capacity(indices.len() * 2);
    for idx in indices {
        halves.extend(dump_page(&bytes, idx, scale, ratio).map_err(|e| {
            eprintln!("Error reading page {}: {e}", idx + 1);
            1
        })?);
    }

    match format {
        OutputFormat::Text => {
            write_text(&halves);
            Ok(())
        }
        OutputFormat::Json => write_json(&halves),
    }
}

fn dump_page(
    bytes: &[u8],
    idx: usize,
    scale: f64,
    ratio: CutRatio,
) -> Result<[HalfDump; 2], CorteError> {
    let page = render_page(bytes, idx, scale)?;
    let (top, bottom) = split_halves(&page, ratio)?;
    let options = ExtractOptions::default();
    let dump = |half: Half, raster: RasterPage| {
        let extraction = FieldExtractor::builtin().extract_runs(&raster.runs, &options);
        HalfDump {
            page: idx,
            half,
            raster,
            fields: extraction.fields,
            ambiguous: extraction.ambiguous,
        }
    };
    Ok([dump(Half::Top, top), dump(Half::Bottom, bottom)])
}

fn write_text(halves: &[HalfDump]) {
    println!("page\thalf\tx\ty\twidth\tsize\ttext");
    for h in halves {
        for run in &h.raster.runs {
            println!(
                "{}\t{}\t{:.2}\t{:.2}\t{:.2}\t{:.2}\t{}",
                h.page + 1,
                h.half.tag(),
                run.x,
                run.y,
                run.width,
                run.font_size,
                run.text,
            );
        }
    }
    for h in halves {
        let field = |id: FieldId| h.fields.digits(id).unwrap_or("-").to_string();
        let mut line = format!(
            "# page {} {}: connection={} order={} registration={}",
            h.page + 1,
            h.half.tag(),
            field(FieldId::Connection),
            field(FieldId::Order),
            field(FieldId::Registration),
        );
        if !h.ambiguous.is_empty() {
            let names: Vec<&str> = h.ambiguous.iter().map(FieldId::as_str).collect();
            line.push_str(&format!(" ambiguous={}", names.join(",")));
        }
        println!("{line}");
    }
}

fn write_json(halves: &[HalfDump]) -> Result<(), i32> {
    let items: Vec<serde_json::Value> = halves
        .iter()
        .map(|h| {
            serde_json::json!({
                "page": h.page + 1,
                "half": h.half,
                "width": h.raster.width,
                "height": h.raster.height,
                "runs": h.raster.runs,
                "fields": h.fields,
                "ambiguous": h.ambiguous,
            })
        })
        .collect();
    let text = serde_json::to_string_pretty(&items).map_err(fail)?;
    println!("{text}");
    Ok(())
}
