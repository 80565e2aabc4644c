//! Normalizing loosely shaped order rows into stamp lines.
//!
//! Order rows come from several table versions that name the same datum
//! differently. Each logical field lists its candidate column names in
//! priority order; a row is resolved once into an [`OrderInfo`].

use corte_core::{InformationLine, LayoutMode, Placeholders, StampStyle};
use corte_pdf::StampRequest;
use serde_json::{Map, Value};

/// A datum printed on the order stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderField {
    OrderNumber,
    SolicitantName,
    SolicitantPhone,
    SolicitantDocument,
    ServiceAddress,
    MailingAddress,
    Observations,
}

impl OrderField {
    pub const ALL: [OrderField; 7] = [
        OrderField::OrderNumber,
        OrderField::SolicitantName,
        OrderField::SolicitantPhone,
        OrderField::SolicitantDocument,
        OrderField::ServiceAddress,
        OrderField::MailingAddress,
        OrderField::Observations,
    ];

    /// Key used for placeholders.
    pub fn id(&self) -> &'static str {
        match self {
            OrderField::OrderNumber => "order_number",
            OrderField::SolicitantName => "solicitant_name",
            OrderField::SolicitantPhone => "solicitant_phone",
            OrderField::SolicitantDocument => "solicitant_document",
            OrderField::ServiceAddress => "service_address",
            OrderField::MailingAddress => "mailing_address",
            OrderField::Observations => "observations",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderField::OrderNumber => "OS",
            OrderField::SolicitantName => "Solicitante",
            OrderField::SolicitantPhone => "Telefone",
            OrderField::SolicitantDocument => "CPF/CNPJ",
            OrderField::ServiceAddress => "Endereço do serviço",
            OrderField::MailingAddress => "Endereço de correspondência",
            OrderField::Observations => "Observações",
        }
    }

    /// Column names holding this datum, most preferred first.
    pub fn candidates(&self) -> &'static [&'static str] {
        match self {
            OrderField::OrderNumber => &["numero_os", "os", "ordem_servico", "numero_ordem"],
            OrderField::SolicitantName => &[
                "solicitante_nome",
                "nome_solicitante",
                "solicitante",
                "cliente_nome",
                "nome",
            ],
            OrderField::SolicitantPhone => &[
                "solicitante_telefone",
                "telefone_solicitante",
                "telefone",
                "celular",
                "fone",
            ],
            OrderField::SolicitantDocument => &[
                "solicitante_documento",
                "documento_solicitante",
                "cpf_cnpj",
                "cpf",
                "cnpj",
                "documento",
            ],
            OrderField::ServiceAddress => &[
                "endereco_servico",
                "endereco_ligacao",
                "endereco",
                "logradouro",
            ],
            OrderField::MailingAddress => &[
                "endereco_correspondencia",
                "endereco_cobranca",
                "endereco_entrega",
            ],
            OrderField::Observations => &["observacoes", "observacao", "obs"],
        }
    }
}

/// An order row resolved to its stamp fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderInfo {
    pub order_number: Option<String>,
    pub solicitant_name: Option<String>,
    pub solicitant_phone: Option<String>,
    pub solicitant_document: Option<String>,
    pub service_address: Option<String>,
    pub mailing_address: Option<String>,
    pub observations: Option<String>,
}

impl OrderInfo {
    /// Resolve every field from the first candidate column with a value.
    pub fn from_record(record: &Map<String, Value>) -> Self {
        let pick = |field: OrderField| {
            field
                .candidates()
                .iter()
                .find_map(|key| record.get(*key).and_then(value_text))
        };
        Self {
            order_number: pick(OrderField::OrderNumber),
            solicitant_name: pick(OrderField::SolicitantName),
            solicitant_phone: pick(OrderField::SolicitantPhone),
            solicitant_document: pick(OrderField::SolicitantDocument),
            service_address: pick(OrderField::ServiceAddress),
            mailing_address: pick(OrderField::MailingAddress),
            observations: pick(OrderField::Observations),
        }
    }

    pub fn get(&self, field: OrderField) -> Option<&str> {
        let value = match field {
            OrderField::OrderNumber => &self.order_number,
            OrderField::SolicitantName => &self.solicitant_name,
            OrderField::SolicitantPhone => &self.solicitant_phone,
            OrderField::SolicitantDocument => &self.solicitant_document,
            OrderField::ServiceAddress => &self.service_address,
            OrderField::MailingAddress => &self.mailing_address,
            OrderField::Observations => &self.observations,
        };
        value.as_deref()
    }

    /// Stamp title naming the order, when its number is known.
    pub fn title(&self) -> String {
        match &self.order_number {
            Some(number) => format!("Ordem de Serviço {number}"),
            None => "Ordem de Serviço".to_string(),
        }
    }

    /// Label/value lines for the stamp; absent values use placeholders.
    pub fn information_lines(&self, placeholders: &Placeholders) -> Vec<InformationLine> {
        OrderField::ALL
            .iter()
            .filter(|f| **f != OrderField::OrderNumber)
            .map(|f| InformationLine::label_value(f.label(), placeholders.format(f.id(), self.get(*f))))
            .collect()
    }

    /// Card stamp for this order.
    pub fn stamp_request(&self, placeholders: &Placeholders, style: &StampStyle) -> StampRequest {
        StampRequest::new(self.information_lines(placeholders), LayoutMode::BorderedCard)
            .with_title(self.title())
            .with_style(style.clone())
    }
}

/// Display text of a JSON cell; blank, null and structured values are absent.
pub fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "Sim".to_string(),
        Value::Bool(false) => "Não".to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}
