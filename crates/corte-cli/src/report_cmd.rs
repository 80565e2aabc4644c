use corte::{FsTemplateSource, ReportFieldSelection, compose_order_report, order_fields};
use serde_json::{Map, Value};

use crate::cli::ReportArgs;
use crate::shared::{fail, load_config, read_file, write_file};

pub fn run(args: &ReportArgs) -> Result<(), i32> {
    let config = load_config(args.config.as_deref())?;
    let rows = read_rows(&read_file(&args.rows)?).map_err(fail)?;
    let selection = selection(&args.fields).map_err(fail)?;

    let pdf = compose_order_report(
        &FsTemplateSource::new(&args.template),
        &selection,
        &rows,
        &args.date_range,
        &config.report,
        &config.placeholders(),
    )
    .map_err(fail)?;
    write_file(&args.output, &pdf)
}

/// Rows are a JSON array of objects.
fn read_rows(bytes: &[u8]) -> Result<Vec<Map<String, Value>>, String> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| format!("rows: {e}"))?;
    let Value::Array(items) = value else {
        return Err("rows: expected a JSON array".to_string());
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map),
            _ => Err(format!("rows[{i}]: expected an object")),
        })
        .collect()
}

/// Selected ids come first in the given order; the rest keep catalog order.
fn selection(ids: &[String]) -> Result<ReportFieldSelection, String> {
    let catalog = order_fields();
    if ids.is_empty() {
        return Ok(ReportFieldSelection::new(catalog));
    }
    let wanted: Vec<&str> = ids.iter().map(|s| s.trim()).filter(|s| !s.is_empty()).collect();
    if let Some(unknown) = wanted.iter().find(|id| !catalog.iter().any(|f| f.id == **id)) {
        let known: Vec<&str> = catalog.iter().map(|f| f.id.as_str()).collect();
        return Err(format!(
            "unknown field '{unknown}' (known: {})",
            known.join(", ")
        ));
    }

    let mut order: Vec<&str> = Vec::with_capacity(catalog.len());
    for id in &wanted {
        if !order.contains(id) {
            order.push(*id);
        }
    }
    for field in &catalog {
        if !order.contains(&field.id.as_str()) {
            order.push(field.id.as_str());
        }
    }

    let mut selection = ReportFieldSelection::with_selected(catalog.clone(), &wanted);
    selection
        .set_display_order(&order)
        .map_err(|e| e.to_string())?;
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_render_in_requested_order() {
        let ids = vec!["status".to_string(), "order_number".to_string()];
        let resolved = selection(&ids).unwrap().resolved().unwrap();
        let resolved: Vec<&str> = resolved.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(resolved, ["status", "order_number"]);
    }

    #[test]
    fn unknown_field_is_reported() {
        let err = selection(&["bogus".to_string()]).unwrap_err();
        assert!(err.contains("bogus"));
        assert!(err.contains("order_number"));
    }

    #[test]
    fn rows_must_be_objects() {
        assert_eq!(read_rows(br#"[{"numero_os": 1}]"#).unwrap().len(), 1);
        assert!(read_rows(b"{}").is_err());
        assert!(read_rows(b"[1]").unwrap_err().contains("rows[0]"));
    }
}
