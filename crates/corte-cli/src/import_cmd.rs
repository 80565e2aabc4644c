use corte::corte_core::RegistrationFallback;
use corte::{FieldId, HalfPageRecord, ImportSession, import_paths};
use tracing::debug;

use crate::cli::{ImportArgs, OutputFormat};
use crate::shared::{fail, load_config, write_file};

pub fn run(args: &ImportArgs) -> Result<(), i32> {
    let mut config = load_config(args.config.as_deref())?.import;
    if let Some(ratio) = args.cut_ratio {
        config.cut_ratio = ratio;
    }
    if let Some(scale) = args.scale {
        config.render_scale = scale;
    }
    if let Some(prefix) = &args.prefix {
        config.filename_prefix = Some(prefix.clone());
    }
    if args.no_fallback {
        config.registration_fallback = RegistrationFallback::None;
    }

    debug!(?config, "effective import settings");

    let session = import_paths(&args.files, &config).map_err(fail)?;

    match args.format {
        OutputFormat::Text => write_text(&session),
        OutputFormat::Json => write_json(&session)?,
    }

    if let Some(dir) = &args.out {
        std::fs::create_dir_all(dir).map_err(|e| fail(format!("{}: {e}", dir.display())))?;
        let written = session.save_to_folder(dir).map_err(fail)?;
        eprintln!("{} file(s) written to {}", written.len(), dir.display());
    } else if let Some(path) = &args.archive {
        let bytes = session.download_archive().map_err(fail)?;
        write_file(path, &bytes)?;
        eprintln!("archive written to {}", path.display());
    }
    Ok(())
}

fn digits(record: &HalfPageRecord, field: FieldId) -> &str {
    record.fields.digits(field).unwrap_or("-")
}

fn write_text(session: &ImportSession) {
    println!("id\tsource\tpage\thalf\tconnection\torder\tregistration\tfilename");
    for record in session.records() {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            record.id,
            record.source_name,
            record.page_index + 1,
            record.half.tag(),
            digits(record, FieldId::Connection),
            digits(record, FieldId::Order),
            digits(record, FieldId::Registration),
            record.filename,
        );
    }
    for entry in session.log() {
        println!("{entry}");
    }
}

fn write_json(session: &ImportSession) -> Result<(), i32> {
    let records: Vec<serde_json::Value> = session
        .records()
        .iter()
        .map(|r| {
            serde_json::json!({
                "id": r.id,
                "source": r.source_name,
                "page": r.page_index + 1,
                "half": r.half,
                "width": r.width,
                "height": r.height,
                "fields": r.fields,
                "filename": r.filename,
                "include": r.include,
            })
        })
        .collect();
    let output = serde_json::json!({
        "records": records,
        "log": session.log(),
    });
    let text = serde_json::to_string_pretty(&output).map_err(fail)?;
    println!("{text}");
    Ok(())
}
