//! Identifier extraction from the text of one half-page.
//!
//! The heuristics are a declarative table of [`FieldRule`]s: each row names
//! the field it fills, a label pattern and the shape of the value that
//! follows the label. Supporting a new document layout means adding rows.
//!
//! Matching runs on accent-folded text (NFD with combining marks removed),
//! case-insensitively, so `LIGAÇÃO`, `Ligacao` and `LIGACAO` all hit the same
//! row. The earliest match in the text wins; ties go to the earlier row.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::error::CorteError;
use crate::text::{DEFAULT_LINE_TOLERANCE, TextRun, runs_to_text};

/// The identifiers looked for in each half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FieldId {
    /// Connection number ("ligação").
    Connection,
    /// Service order number ("ordem de serviço").
    Order,
    /// Registration number ("matrícula").
    Registration,
}

impl FieldId {
    pub const ALL: [FieldId; 3] = [FieldId::Connection, FieldId::Order, FieldId::Registration];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldId::Connection => "connection",
            FieldId::Order => "order",
            FieldId::Registration => "registration",
        }
    }
}

/// Shape of the value that follows a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// A plain run of digits.
    Digits,
    /// Digit groups joined by dots or dashes (`45.678-9`), or thousands
    /// groups joined by single spaces (`12 345`). A space before anything
    /// other than a complete three-digit group ends the value, so trailing
    /// dates and counts stay out.
    SeparatedDigits,
}

impl ValueShape {
    fn pattern(&self) -> &'static str {
        match self {
            ValueShape::Digits => r"\d+",
            ValueShape::SeparatedDigits => r"\d{1,3}(?: \d{3})+\b|\d+(?:[.\-]\d+)*",
        }
    }
}

/// One row of the extraction table.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub field: FieldId,
    /// Regex for the label, written against accent-folded text.
    pub label: Cow<'static, str>,
    pub shape: ValueShape,
}

impl FieldRule {
    pub fn new(field: FieldId, label: impl Into<Cow<'static, str>>, shape: ValueShape) -> Self {
        Self {
            field,
            label: label.into(),
            shape,
        }
    }

    /// Full pattern: label, optional "nº"/"número", optional separator, value.
    fn pattern(&self) -> String {
        format!(
            r"(?i){}\s*(?:(?:numero|num\.|n[º°o])\.?\s*)?[:\-]?\s*(?P<value>(?:{}))",
            self.label,
            self.shape.pattern()
        )
    }
}

/// Built-in label table for cutoff/reconnection order sheets.
pub static DEFAULT_RULES: &[FieldRule] = &[
    FieldRule {
        field: FieldId::Connection,
        label: Cow::Borrowed(r"\bligacao\b"),
        shape: ValueShape::SeparatedDigits,
    },
    FieldRule {
        field: FieldId::Connection,
        label: Cow::Borrowed(r"\blig\."),
        shape: ValueShape::SeparatedDigits,
    },
    FieldRule {
        field: FieldId::Order,
        label: Cow::Borrowed(r"\bordem\s+de\s+servico\b"),
        shape: ValueShape::SeparatedDigits,
    },
    FieldRule {
        field: FieldId::Order,
        label: Cow::Borrowed(r"(?-i:\bO\.?\s?S\b\.?)"),
        shape: ValueShape::SeparatedDigits,
    },
    FieldRule {
        field: FieldId::Registration,
        label: Cow::Borrowed(r"\bmatricula\b"),
        shape: ValueShape::SeparatedDigits,
    },
    FieldRule {
        field: FieldId::Registration,
        label: Cow::Borrowed(r"\bmat\."),
        shape: ValueShape::SeparatedDigits,
    },
    FieldRule {
        field: FieldId::Registration,
        label: Cow::Borrowed(r"\binscricao\b"),
        shape: ValueShape::Digits,
    },
];

/// An extracted identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldValue {
    /// Digits-only normalized value (never empty).
    pub digits: String,
    /// The matched text before normalization, when the value came from a match.
    pub raw: Option<String>,
}

impl FieldValue {
    /// Build a value from arbitrary input, keeping only ASCII digits.
    ///
    /// Returns `None` when the input contains no digits.
    pub fn from_input(input: &str) -> Option<Self> {
        let digits = digits_only(input);
        if digits.is_empty() {
            None
        } else {
            Some(Self { digits, raw: None })
        }
    }

    fn from_match(raw: &str) -> Option<Self> {
        let digits = digits_only(raw);
        if digits.is_empty() {
            None
        } else {
            Some(Self {
                digits,
                raw: Some(raw.to_string()),
            })
        }
    }
}

/// The identifiers found in one half. Absent fields are `None`, never empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtractedFields {
    pub connection: Option<FieldValue>,
    pub order: Option<FieldValue>,
    pub registration: Option<FieldValue>,
}

impl ExtractedFields {
    pub fn get(&self, field: FieldId) -> Option<&FieldValue> {
        match field {
            FieldId::Connection => self.connection.as_ref(),
            FieldId::Order => self.order.as_ref(),
            FieldId::Registration => self.registration.as_ref(),
        }
    }

    pub fn set(&mut self, field: FieldId, value: Option<FieldValue>) {
        match field {
            FieldId::Connection => self.connection = value,
            FieldId::Order => self.order = value,
            FieldId::Registration => self.registration = value,
        }
    }

    /// Digits of a field, if present.
    pub fn digits(&self, field: FieldId) -> Option<&str> {
        self.get(field).map(|v| v.digits.as_str())
    }
}

/// What to do when no registration number is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum RegistrationFallback {
    /// Reuse the connection number (they are usually the same value).
    #[default]
    Connection,
    /// Leave the registration number absent.
    None,
}

/// Options controlling extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractOptions {
    pub registration_fallback: RegistrationFallback,
    /// Baseline tolerance used when assembling lines from runs.
    pub line_tolerance: f64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            registration_fallback: RegistrationFallback::default(),
            line_tolerance: DEFAULT_LINE_TOLERANCE,
        }
    }
}

/// Result of running the extractor over one half.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub fields: ExtractedFields,
    /// Fields for which more than one distinct value was matched.
    pub ambiguous: Vec<FieldId>,
}

struct CompiledRule {
    field: FieldId,
    regex: Regex,
}

/// A compiled extraction table.
pub struct FieldExtractor {
    rules: Vec<CompiledRule>,
}

static DEFAULT_EXTRACTOR: LazyLock<FieldExtractor> =
    LazyLock::new(|| FieldExtractor::compile_lenient(DEFAULT_RULES));

impl FieldExtractor {
    /// Compile a rule table, rejecting rows whose pattern is invalid.
    pub fn new(rules: &[FieldRule]) -> Result<Self, CorteError> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let regex = Regex::new(&rule.pattern()).map_err(|e| {
                CorteError::Config(format!("invalid label pattern {:?}: {e}", rule.label))
            })?;
            compiled.push(CompiledRule {
                field: rule.field,
                regex,
            });
        }
        Ok(Self { rules: compiled })
    }

    fn compile_lenient(rules: &[FieldRule]) -> Self {
        let rules = rules
            .iter()
            .filter_map(|rule| {
                Regex::new(&rule.pattern())
                    .ok()
                    .map(|regex| CompiledRule {
                        field: rule.field,
                        regex,
                    })
            })
            .collect();
        Self { rules }
    }

    /// The extractor built from [`DEFAULT_RULES`].
    pub fn builtin() -> &'static FieldExtractor {
        &DEFAULT_EXTRACTOR
    }

    /// Number of compiled rows.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Extract identifiers from free text. Never fails.
    pub fn extract_text(&self, text: &str, options: &ExtractOptions) -> Extraction {
        let folded = fold_accents(text);
        let mut extraction = Extraction::default();

        for field in FieldId::ALL {
            // (match start, rule index, value)
            let mut best: Option<(usize, usize, FieldValue)> = None;
            let mut distinct: Vec<String> = Vec::new();

            for (idx, rule) in self.rules.iter().enumerate() {
                if rule.field != field {
                    continue;
                }
                for caps in rule.regex.captures_iter(&folded) {
                    let (Some(whole), Some(value)) = (caps.get(0), caps.name("value")) else {
                        continue;
                    };
                    let Some(parsed) = FieldValue::from_match(value.as_str()) else {
                        continue;
                    };
                    if !distinct.contains(&parsed.digits) {
                        distinct.push(parsed.digits.clone());
                    }
                    let better = match &best {
                        None => true,
                        Some((start, _, _)) => whole.start() < *start,
                    };
                    if better {
                        best = Some((whole.start(), idx, parsed));
                    }
                }
            }

            if distinct.len() > 1 {
                extraction.ambiguous.push(field);
            }
            extraction.fields.set(field, best.map(|(_, _, v)| v));
        }

        if extraction.fields.registration.is_none()
            && options.registration_fallback == RegistrationFallback::Connection
        {
            extraction.fields.registration = extraction.fields.connection.clone();
        }
        extraction
    }

    /// Extract identifiers from positioned runs, in reading order.
    pub fn extract_runs(&self, runs: &[TextRun], options: &ExtractOptions) -> Extraction {
        let text = runs_to_text(runs, options.line_tolerance);
        self.extract_text(&text, options)
    }
}

/// Extract identifiers from runs with the built-in table.
pub fn extract_fields(runs: &[TextRun], options: &ExtractOptions) -> ExtractedFields {
    FieldExtractor::builtin().extract_runs(runs, options).fields
}

/// Remove accents: NFD decomposition with combining marks dropped.
pub fn fold_accents(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Keep only ASCII digits.
pub fn digits_only(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}
