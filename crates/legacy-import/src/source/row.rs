//! Loosely-typed legacy row representation.
//!
//! Legacy tables are untyped from the importer's point of view: each row is a
//! mapping of column name to a loosely-typed value, tagged with the source
//! table. Shape validation happens here at the boundary so transformers stay
//! total: the required-field accessors produce transformation errors naming
//! the offending field and the row identifier.

use std::collections::BTreeMap;

use crate::error::{ImportError, Result};

/// A single cell value from the legacy database.
#[derive(Debug, Clone, PartialEq)]
pub enum LegacyValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl LegacyValue {
    /// Render the value for row identifiers and log output.
    fn render(&self) -> String {
        match self {
            LegacyValue::Null => "?".to_string(),
            LegacyValue::Int(v) => v.to_string(),
            LegacyValue::Float(v) => v.to_string(),
            LegacyValue::Text(v) => v.clone(),
        }
    }
}

impl From<&str> for LegacyValue {
    fn from(v: &str) -> Self {
        LegacyValue::Text(v.to_string())
    }
}

impl From<String> for LegacyValue {
    fn from(v: String) -> Self {
        LegacyValue::Text(v)
    }
}

impl From<i64> for LegacyValue {
    fn from(v: i64) -> Self {
        LegacyValue::Int(v)
    }
}

impl From<f64> for LegacyValue {
    fn from(v: f64) -> Self {
        LegacyValue::Float(v)
    }
}

/// One row read from a legacy table.
#[derive(Debug, Clone)]
pub struct LegacyRow {
    table: String,
    key: Option<String>,
    values: BTreeMap<String, LegacyValue>,
}

impl LegacyRow {
    /// Create an empty row for a table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            key: None,
            values: BTreeMap::new(),
        }
    }

    /// Builder-style insert, used by readers and test fixtures.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<LegacyValue>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    /// Insert a cell value.
    pub fn insert(&mut self, column: impl Into<String>, value: LegacyValue) {
        self.values.insert(column.into(), value);
    }

    /// Source table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Tag the row with its primary-key columns so error messages can
    /// identify it. Missing or null key columns render as `?`.
    pub fn keyed(mut self, key_columns: &[&str]) -> Self {
        let key = key_columns
            .iter()
            .map(|c| {
                self.values
                    .get(*c)
                    .map_or_else(|| "?".to_string(), LegacyValue::render)
            })
            .collect::<Vec<_>>()
            .join(":");
        self.key = Some(key);
        self
    }

    /// Rendered key columns, if the row has been tagged with [`keyed`].
    ///
    /// [`keyed`]: LegacyRow::keyed
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Row identifier for error messages: `table[k1:k2:...]`.
    pub fn describe(&self) -> String {
        format!("{}[{}]", self.table, self.key.as_deref().unwrap_or("?"))
    }

    fn missing(&self, field: &str) -> ImportError {
        ImportError::transformation(field, self.describe())
    }

    /// Required text field. Absent, null or empty values are transformation
    /// errors; required fields are never silently defaulted.
    pub fn req_str(&self, field: &str) -> Result<&str> {
        match self.values.get(field) {
            Some(LegacyValue::Text(v)) if !v.trim().is_empty() => Ok(v),
            _ => Err(self.missing(field)),
        }
    }

    /// Optional text field; null and empty map to `None`.
    pub fn opt_str(&self, field: &str) -> Option<&str> {
        match self.values.get(field) {
            Some(LegacyValue::Text(v)) if !v.trim().is_empty() => Some(v),
            _ => None,
        }
    }

    /// Required identifier field. Legacy key columns are inconsistently
    /// typed across schema variants, so integers are accepted and rendered
    /// as text.
    pub fn req_id(&self, field: &str) -> Result<String> {
        self.opt_id(field).ok_or_else(|| self.missing(field))
    }

    /// Optional identifier field; see [`req_id`](LegacyRow::req_id).
    pub fn opt_id(&self, field: &str) -> Option<String> {
        match self.values.get(field) {
            Some(LegacyValue::Text(v)) if !v.trim().is_empty() => Some(v.trim().to_string()),
            Some(LegacyValue::Int(v)) => Some(v.to_string()),
            _ => None,
        }
    }

    /// Required integer field. Accepts numeric text since legacy columns are
    /// inconsistently typed across schema variants.
    pub fn req_int(&self, field: &str) -> Result<i64> {
        self.opt_int(field).ok_or_else(|| self.missing(field))
    }

    /// Optional integer field.
    pub fn opt_int(&self, field: &str) -> Option<i64> {
        match self.values.get(field) {
            Some(LegacyValue::Int(v)) => Some(*v),
            Some(LegacyValue::Text(v)) => v.trim().parse().ok(),
            _ => None,
        }
    }

    /// Optional float field.
    pub fn opt_float(&self, field: &str) -> Option<f64> {
        match self.values.get(field) {
            Some(LegacyValue::Float(v)) => Some(*v),
            Some(LegacyValue::Int(v)) => Some(*v as f64),
            Some(LegacyValue::Text(v)) => v.trim().parse().ok(),
            _ => None,
        }
    }

    /// Legacy boolean flags arrive as ints (`1`), text (`Y`/`yes`) or are
    /// absent entirely.
    pub fn flag(&self, field: &str) -> bool {
        match self.values.get(field) {
            Some(LegacyValue::Int(v)) => *v != 0,
            Some(LegacyValue::Text(v)) => {
                matches!(v.trim().to_lowercase().as_str(), "y" | "yes" | "1" | "true")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> LegacyRow {
        LegacyRow::new("objects")
            .with("project_id", "isl")
            .with("country", "ma")
            .with("number", 17i64)
            .with("name", "Astrolabe")
            .with("active", "Y")
            .with("blank", "  ")
            .keyed(&["project_id", "country", "number"])
    }

    #[test]
    fn required_field_access() {
        let r = row();
        assert_eq!(r.req_str("name").unwrap(), "Astrolabe");
        assert_eq!(r.req_int("number").unwrap(), 17);
    }

    #[test]
    fn missing_required_field_names_field_and_row() {
        let err = row().req_str("museum_id").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("`museum_id`"));
        assert!(msg.contains("objects[isl:ma:17]"));
    }

    #[test]
    fn blank_text_is_treated_as_absent() {
        let r = row();
        assert!(r.req_str("blank").is_err());
        assert_eq!(r.opt_str("blank"), None);
    }

    #[test]
    fn key_renders_missing_columns_as_question_marks() {
        let r = LegacyRow::new("museums")
            .with("museum_id", "louvre")
            .keyed(&["museum_id", "country"]);
        assert_eq!(r.describe(), "museums[louvre:?]");
    }

    #[test]
    fn id_fields_accept_integer_columns() {
        let r = LegacyRow::new("sh_partners").with("partners_id", 42i64);
        assert_eq!(r.req_id("partners_id").unwrap(), "42");
        assert_eq!(r.opt_id("missing"), None);
    }

    #[test]
    fn numeric_text_coercion() {
        let r = LegacyRow::new("t").with("n", "42").with("f", "3.5");
        assert_eq!(r.opt_int("n"), Some(42));
        assert_eq!(r.opt_float("f"), Some(3.5));
    }

    #[test]
    fn legacy_flags() {
        let r = LegacyRow::new("t")
            .with("a", "Y")
            .with("b", 1i64)
            .with("c", "N");
        assert!(r.flag("a"));
        assert!(r.flag("b"));
        assert!(!r.flag("c"));
        assert!(!r.flag("missing"));
    }
}
