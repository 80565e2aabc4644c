//! Half-page records and their pure update reducer.
//!
//! A [`HalfPageRecord`] is never edited in place by callers: every change is
//! a [`RecordPatch`] passed through [`apply`], which returns the updated
//! record. Filename re-derivation lives in one place and is testable without
//! any UI.

use crate::fields::{ExtractedFields, FieldId, FieldValue};
use crate::naming::{derive_filename, sanitize_filename};
use crate::raster::Half;

/// How field edits interact with a filename the user typed directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum FilenamePolicy {
    /// A manually edited filename survives later field edits.
    #[default]
    PreserveManual,
    /// Every field edit re-derives the filename, discarding manual edits.
    AlwaysRederive,
}

/// One of the two single-order documents produced from an input page.
#[derive(Debug, Clone, PartialEq)]
pub struct HalfPageRecord {
    /// Position of the record in its import session.
    pub id: usize,
    pub source_name: String,
    /// 0-based page index within the source document.
    pub page_index: usize,
    pub half: Half,
    pub width: u32,
    pub height: u32,
    /// PNG preview of the half, empty when previews are disabled.
    pub preview_png: Vec<u8>,
    /// Standalone single-page PDF of the half.
    pub document_bytes: Vec<u8>,
    pub fields: ExtractedFields,
    /// Optional prefix prepended to derived filenames.
    pub prefix: Option<String>,
    pub filename: String,
    /// Set once the filename has been edited directly.
    pub filename_overridden: bool,
    pub include: bool,
}

impl HalfPageRecord {
    /// The filename derived from the current field values.
    pub fn derived_filename(&self) -> String {
        derive_filename(
            self.prefix.as_deref(),
            self.fields.digits(FieldId::Connection),
            self.fields.digits(FieldId::Order),
            self.half,
            self.page_index,
        )
    }
}

/// A single user edit on a record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordPatch {
    /// Replace a field from user input; input without digits clears it.
    SetField { field: FieldId, value: String },
    /// Remove a field value.
    ClearField(FieldId),
    ToggleInclude,
    SetInclude(bool),
    /// Set the filename directly, detaching it from derivation.
    RenameFile(String),
    /// Drop a manual filename and go back to the derived one.
    ResetFilename,
}

/// Apply a patch to a record, returning the updated record.
pub fn apply(record: &HalfPageRecord, patch: &RecordPatch, policy: FilenamePolicy) -> HalfPageRecord {
    let mut next = record.clone();
    match patch {
        RecordPatch::SetField { field, value } => {
            next.fields.set(*field, FieldValue::from_input(value));
            rederive_after_field_edit(&mut next, policy);
        }
        RecordPatch::ClearField(field) => {
            next.fields.set(*field, None);
            rederive_after_field_edit(&mut next, policy);
        }
        RecordPatch::ToggleInclude => next.include = !next.include,
        RecordPatch::SetInclude(include) => next.include = *include,
        RecordPatch::RenameFile(name) => {
            next.filename = sanitize_filename(name);
            next.filename_overridden = true;
        }
        RecordPatch::ResetFilename => {
            next.filename = next.derived_filename();
            next.filename_overridden = false;
        }
    }
    next
}

fn rederive_after_field_edit(record: &mut HalfPageRecord, policy: FilenamePolicy) {
    if record.filename_overridden && policy == FilenamePolicy::PreserveManual {
        return;
    }
    record.filename = record.derived_filename();
    record.filename_overridden = false;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> HalfPageRecord {
        let mut r = HalfPageRecord {
            id: 0,
            source_name: "lote.pdf".to_string(),
            page_index: 0,
            half: Half::Top,
            width: 100,
            height: 50,
            preview_png: Vec::new(),
            document_bytes: Vec::new(),
            fields: ExtractedFields::default(),
            prefix: None,
            filename: String::new(),
            filename_overridden: false,
            include: true,
        };
        r.filename = r.derived_filename();
        r
    }

    fn set(field: FieldId, value: &str) -> RecordPatch {
        RecordPatch::SetField {
            field,
            value: value.to_string(),
        }
    }

    #[test]
    fn field_edit_rederives_filename() {
        let r = record();
        assert_eq!(r.filename, "LIG_X_OS_X_p1_T.pdf");
        let r = apply(&r, &set(FieldId::Connection, "08561"), FilenamePolicy::default());
        assert_eq!(r.filename, "LIG_08561_OS_X_p1_T.pdf");
        assert_eq!(r.fields.digits(FieldId::Connection), Some("08561"));
    }

    #[test]
    fn field_edit_strips_separators() {
        let r = apply(&record(), &set(FieldId::Order, "25.46-51"), FilenamePolicy::default());
        assert_eq!(r.fields.digits(FieldId::Order), Some("254651"));
    }

    #[test]
    fn non_digit_input_clears_field() {
        let r = apply(&record(), &set(FieldId::Connection, "1"), FilenamePolicy::default());
        let r = apply(&r, &set(FieldId::Connection, "abc"), FilenamePolicy::default());
        assert_eq!(r.fields.connection, None);
        assert_eq!(r.filename, "LIG_X_OS_X_p1_T.pdf");
    }

    #[test]
    fn rename_sanitizes_and_detaches() {
        let r = apply(
            &record(),
            &RecordPatch::RenameFile("  minha: ordem ".to_string()),
            FilenamePolicy::default(),
        );
        assert_eq!(r.filename, "minha ordem.pdf");
        assert!(r.filename_overridden);
    }

    #[test]
    fn manual_name_survives_field_edit_by_default() {
        let policy = FilenamePolicy::PreserveManual;
        let r = apply(&record(), &RecordPatch::RenameFile("manual".to_string()), policy);
        let r = apply(&r, &set(FieldId::Connection, "77"), policy);
        assert_eq!(r.filename, "manual.pdf");
        assert_eq!(r.fields.digits(FieldId::Connection), Some("77"));
    }

    #[test]
    fn always_rederive_discards_manual_name() {
        let policy = FilenamePolicy::AlwaysRederive;
        let r = apply(&record(), &RecordPatch::RenameFile("manual".to_string()), policy);
        let r = apply(&r, &set(FieldId::Connection, "77"), policy);
        assert_eq!(r.filename, "LIG_77_OS_X_p1_T.pdf");
        assert!(!r.filename_overridden);
    }

    #[test]
    fn reset_filename_reattaches() {
        let policy = FilenamePolicy::PreserveManual;
        let r = apply(&record(), &set(FieldId::Order, "5"), policy);
        let r = apply(&r, &RecordPatch::RenameFile("x".to_string()), policy);
        let r = apply(&r, &RecordPatch::ResetFilename, policy);
        assert_eq!(r.filename, "LIG_X_OS_5_p1_T.pdf");
        assert!(!r.filename_overridden);
    }

    #[test]
    fn toggle_include_flips() {
        let r = apply(&record(), &RecordPatch::ToggleInclude, FilenamePolicy::default());
        assert!(!r.include);
        let r = apply(&r, &RecordPatch::ToggleInclude, FilenamePolicy::default());
        assert!(r.include);
        let r = apply(&r, &RecordPatch::SetInclude(false), FilenamePolicy::default());
        assert!(!r.include);
    }

    #[test]
    fn apply_leaves_input_untouched() {
        let r = record();
        let _ = apply(&r, &set(FieldId::Connection, "1"), FilenamePolicy::default());
        assert_eq!(r.fields.connection, None);
    }

    #[test]
    fn registration_edit_does_not_change_filename_segments() {
        let r = apply(&record(), &set(FieldId::Registration, "9"), FilenamePolicy::default());
        assert_eq!(r.filename, "LIG_X_OS_X_p1_T.pdf");
    }
}
