//! Order reports: the field catalog, cell formatting and composition onto
//! the letterhead.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use corte_core::{
    Alignment, CorteError, FieldDefinition, FieldKind, Placeholders, ReportContent,
    ReportFieldSelection, ReportStyle,
};
use serde_json::{Map, Value};
use tracing::info;

use crate::order_info::value_text;
use crate::template::{TemplateSource, load_template};

pub const REPORT_TITLE: &str = "Relatório de Ordens de Serviço";

/// pt-BR full date-time.
const DATE_TIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Every order field a report can show, in default display order.
pub fn order_fields() -> Vec<FieldDefinition> {
    vec![
        FieldDefinition::new("order_number", "OS", 60.0)
            .with_sources(&["numero_os", "os", "ordem_servico"])
            .with_alignment(Alignment::Right)
            .with_kind(FieldKind::Number),
        FieldDefinition::new("connection", "Ligação", 60.0)
            .with_sources(&["ligacao", "numero_ligacao"])
            .with_alignment(Alignment::Right)
            .with_kind(FieldKind::Number),
        FieldDefinition::new("registration", "Matrícula", 60.0)
            .with_sources(&["matricula", "numero_matricula"])
            .with_alignment(Alignment::Right)
            .with_kind(FieldKind::Number),
        FieldDefinition::new("kind", "Tipo", 60.0)
            .with_sources(&["tipo", "tipo_servico"])
            .with_alignment(Alignment::Center),
        FieldDefinition::new("status", "Status", 70.0).with_alignment(Alignment::Center),
        FieldDefinition::new("solicitant", "Solicitante", 120.0).with_sources(&[
            "solicitante_nome",
            "nome_solicitante",
            "solicitante",
            "cliente_nome",
            "nome",
        ]),
        FieldDefinition::new("phone", "Telefone", 80.0).with_sources(&[
            "solicitante_telefone",
            "telefone",
            "celular",
        ]),
        FieldDefinition::new("address", "Endereço", 160.0).with_sources(&[
            "endereco_servico",
            "endereco",
            "logradouro",
        ]),
        FieldDefinition::new("neighborhood", "Bairro", 80.0).with_sources(&["bairro"]),
        FieldDefinition::new("observations", "Observações", 140.0).with_sources(&[
            "observacoes",
            "observacao",
            "obs",
        ]),
        FieldDefinition::new("created_at", "Criada em", 90.0)
            .with_alignment(Alignment::Center)
            .with_kind(FieldKind::DateTime),
        FieldDefinition::new("updated_at", "Atualizada em", 90.0)
            .with_alignment(Alignment::Center)
            .with_kind(FieldKind::DateTime),
    ]
}

/// A selection over [`order_fields`] with every field selected.
pub fn order_field_selection() -> ReportFieldSelection {
    ReportFieldSelection::new(order_fields())
}

/// Render a date-time cell; unparseable input is shown as given.
///
/// Accepts RFC 3339, `YYYY-MM-DD[ T]HH:MM:SS`, plain dates and epoch
/// milliseconds.
pub fn format_datetime(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => {
            let formatted = n
                .as_i64()
                .and_then(DateTime::from_timestamp_millis)
                .map(|dt| dt.format(DATE_TIME_FORMAT).to_string());
            formatted.or_else(|| value_text(value))
        }
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.format(DATE_TIME_FORMAT).to_string());
            }
            for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, pattern) {
                    return Some(dt.format(DATE_TIME_FORMAT).to_string());
                }
            }
            if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return Some(date.format("%d/%m/%Y 00:00:00").to_string());
            }
            Some(s.to_string())
        }
        other => value_text(other),
    }
}

/// Text of one cell, or its placeholder.
pub fn cell_text(field: &FieldDefinition, row: &Map<String, Value>, placeholders: &Placeholders) -> String {
    let value = field
        .source_columns
        .iter()
        .filter_map(|key| row.get(key))
        .find_map(|value| match field.kind {
            FieldKind::DateTime => format_datetime(value),
            FieldKind::Text | FieldKind::Number => value_text(value),
        });
    placeholders.format(&field.id, value.as_deref())
}

/// Compose an order report.
///
/// Fails with `NoFieldsSelected` when the selection renders nothing and
/// `TemplateUnavailable` when the letterhead is not a PDF.
pub fn compose_order_report(
    template: &dyn TemplateSource,
    selection: &ReportFieldSelection,
    rows: &[Map<String, Value>],
    date_range_label: &str,
    style: &ReportStyle,
    placeholders: &Placeholders,
) -> Result<Vec<u8>, CorteError> {
    let fields = selection.resolved()?;
    let template = load_template(template)?;

    let headers: Vec<String> = fields.iter().map(|f| f.label.clone()).collect();
    let alignments: Vec<Alignment> = fields.iter().map(|f| f.alignment).collect();
    let widths: Vec<f64> = fields.iter().map(|f| f.nominal_width).collect();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            fields
                .iter()
                .map(|f| cell_text(f, row, placeholders))
                .collect()
        })
        .collect();
    let subtitle = if date_range_label.trim().is_empty() {
        String::new()
    } else {
        format!("Período: {}", date_range_label.trim())
    };
    let content = ReportContent {
        title: REPORT_TITLE,
        subtitle: &subtitle,
        headers: &headers,
        alignments: &alignments,
        nominal_widths: &widths,
        rows: &cells,
    };
    let pdf = corte_pdf::compose_report(&template, &content, style)?;
    info!(fields = fields.len(), rows = rows.len(), "report composed");
    Ok(pdf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn catalog_ids_are_unique() {
        let fields = order_fields();
        let mut ids: Vec<&str> = fields.iter().map(|f| f.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), fields.len());
    }

    #[test]
    fn datetime_formats() {
        assert_eq!(
            format_datetime(&json!("2026-03-05T14:07:09-03:00")).as_deref(),
            Some("05/03/2026 14:07:09")
        );
        assert_eq!(
            format_datetime(&json!("2026-03-05 08:00:00")).as_deref(),
            Some("05/03/2026 08:00:00")
        );
        assert_eq!(
            format_datetime(&json!("2026-03-05")).as_deref(),
            Some("05/03/2026 00:00:00")
        );
        assert_eq!(
            format_datetime(&json!(0)).as_deref(),
            Some("01/01/1970 00:00:00")
        );
        assert_eq!(format_datetime(&json!("ontem")).as_deref(), Some("ontem"));
        assert_eq!(format_datetime(&json!(null)), None);
    }

    #[test]
    fn cells_fall_back_through_sources_and_placeholders() {
        let fields = order_fields();
        let solicitant = fields.iter().find(|f| f.id == "solicitant").unwrap();
        let created = fields.iter().find(|f| f.id == "created_at").unwrap();
        let placeholders = Placeholders::default();
        let r = row(json!({ "nome": "Ana", "created_at": "2026-01-02T03:04:05Z" }));
        assert_eq!(cell_text(solicitant, &r, &placeholders), "Ana");
        assert_eq!(cell_text(created, &r, &placeholders), "02/01/2026 03:04:05");
        assert_eq!(cell_text(solicitant, &row(json!({})), &placeholders), "—");
    }

    #[test]
    fn empty_selection_is_rejected_before_template_fetch() {
        struct Unreachable;
        impl TemplateSource for Unreachable {
            fn fetch(&self) -> Result<(Vec<u8>, String), CorteError> {
                panic!("template fetched for an empty selection");
            }
        }
        let selection = ReportFieldSelection::with_selected(order_fields(), &[]);
        let err = compose_order_report(
            &Unreachable,
            &selection,
            &[],
            "",
            &ReportStyle::default(),
            &Placeholders::default(),
        )
        .unwrap_err();
        assert_eq!(err, CorteError::NoFieldsSelected);
    }
}
