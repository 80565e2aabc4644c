//! Configuration loaded from TOML.
//!
//! ```toml
//! [import]
//! cut_ratio = 0.5
//! render_scale = 2.0
//! filename_prefix = "LOTE3"
//! registration_fallback = "connection"
//! filename_policy = "preserve-manual"
//!
//! [stamp]
//! font_size = 10.0
//!
//! [placeholders]
//! "*" = "—"
//! phone = "sem telefone"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use corte_core::placeholder::{DEFAULT_PLACEHOLDER, WILDCARD};
use corte_core::{
    CorteError, CutRatio, ExtractOptions, FilenamePolicy, Placeholders, RegistrationFallback,
    ReportStyle, StampStyle,
};
use corte_pdf::DEFAULT_SCALE;
use serde::{Deserialize, Serialize};

/// Settings of the batch import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportConfig {
    /// Fraction of the page height assigned to the top half.
    pub cut_ratio: f64,
    /// Pixels per point.
    pub render_scale: f64,
    /// Optional `PREFIX_` prepended to every generated filename.
    pub filename_prefix: Option<String>,
    pub registration_fallback: RegistrationFallback,
    pub filename_policy: FilenamePolicy,
    /// Whether records carry a PNG preview.
    pub previews: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            cut_ratio: 0.5,
            render_scale: DEFAULT_SCALE,
            filename_prefix: None,
            registration_fallback: RegistrationFallback::default(),
            filename_policy: FilenamePolicy::default(),
            previews: true,
        }
    }
}

impl ImportConfig {
    pub fn cut_ratio(&self) -> Result<CutRatio, CorteError> {
        CutRatio::new(self.cut_ratio).map_err(|e| CorteError::Config(e.to_string()))
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            registration_fallback: self.registration_fallback,
            ..ExtractOptions::default()
        }
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), CorteError> {
        self.cut_ratio()?;
        if !(self.render_scale.is_finite() && self.render_scale > 0.0) {
            return Err(CorteError::Config(format!(
                "render_scale must be positive, got {}",
                self.render_scale
            )));
        }
        Ok(())
    }
}

/// All configuration of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorteConfig {
    pub import: ImportConfig,
    pub stamp: StampStyle,
    pub report: ReportStyle,
    /// Field id to placeholder; `"*"` is the default for every field.
    pub placeholders: BTreeMap<String, String>,
}

impl Default for CorteConfig {
    fn default() -> Self {
        Self {
            import: ImportConfig::default(),
            stamp: StampStyle::default(),
            report: ReportStyle::default(),
            placeholders: BTreeMap::from([(WILDCARD.to_string(), DEFAULT_PLACEHOLDER.to_string())]),
        }
    }
}

impl CorteConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, CorteError> {
        let config: CorteConfig =
            toml::from_str(text).map_err(|e| CorteError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CorteError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CorteError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, CorteError> {
        toml::to_string_pretty(self).map_err(|e| CorteError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), CorteError> {
        self.import.validate()?;
        let stamp = &self.stamp;
        for (name, value) in [
            ("stamp.font_size", stamp.font_size),
            ("stamp.title_font_size", stamp.title_font_size),
            ("stamp.line_spacing", stamp.line_spacing),
            ("stamp.max_width", stamp.max_width),
            ("report.body_font_size", self.report.body_font_size),
            ("report.header_font_size", self.report.header_font_size),
            ("report.line_spacing", self.report.line_spacing),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(CorteError::Config(format!("{name} must be positive, got {value}")));
            }
        }
        Ok(())
    }

    pub fn placeholders(&self) -> Placeholders {
        Placeholders::from_map(&self.placeholders)
    }
}
