//! Placeholder text for absent values.

use std::collections::BTreeMap;

/// Key that sets the default placeholder in a placeholder map.
pub const WILDCARD: &str = "*";

/// Default placeholder for absent values.
pub const DEFAULT_PLACEHOLDER: &str = "—";

/// Per-field placeholder strings with a wildcard default.
///
/// Passed explicitly to formatting functions.
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholders {
    per_field: BTreeMap<String, String>,
    default: String,
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            per_field: BTreeMap::new(),
            default: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

impl Placeholders {
    /// Build from a map where the `"*"` key, if present, is the default.
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let mut per_field = map.clone();
        let default = per_field
            .remove(WILDCARD)
            .unwrap_or_else(|| DEFAULT_PLACEHOLDER.to_string());
        Self { per_field, default }
    }

    /// Placeholder for a field.
    pub fn for_field(&self, field: &str) -> &str {
        self.per_field
            .get(field)
            .map(String::as_str)
            .unwrap_or(&self.default)
    }

    /// The value itself, or the field's placeholder when absent or blank.
    pub fn format(&self, field: &str, value: Option<&str>) -> String {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => self.for_field(field).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_em_dash() {
        let p = Placeholders::default();
        assert_eq!(p.format("phone", None), "—");
        assert_eq!(p.format("phone", Some("  ")), "—");
        assert_eq!(p.format("phone", Some(" 123 ")), "123");
    }

    #[test]
    fn per_field_and_wildcard() {
        let mut map = BTreeMap::new();
        map.insert("*".to_string(), "n/d".to_string());
        map.insert("phone".to_string(), "sem telefone".to_string());
        let p = Placeholders::from_map(&map);
        assert_eq!(p.format("phone", None), "sem telefone");
        assert_eq!(p.format("name", None), "n/d");
    }

    #[test]
    fn map_without_wildcard_keeps_default() {
        let p = Placeholders::from_map(&BTreeMap::new());
        assert_eq!(p.for_field("x"), DEFAULT_PLACEHOLDER);
    }
}
