//! Pure transformations from legacy rows to creation payloads.
//!
//! Transformers perform no I/O. They consume one legacy row (plus any
//! resolved foreign-key ids) and produce the target system's request shape,
//! failing with a transformation error when a required legacy field is
//! absent or malformed. Optional legacy fields map to `None` and are omitted
//! from the serialized payload.
//!
//! Two legacy schema variants are supported: `mwnf3` (museums, institutions,
//! objects and monuments with composite country-scoped keys) and
//! `mwnf3_sharing_history` (single-key partners, `*_texts` translation
//! tables). Each variant has its own transformer module.

pub mod codes;
pub mod mwnf3;
pub mod sharing;

use serde::Serialize;

use crate::error::{ImportError, Result};
use crate::source::LegacyRow;

/// Backward-compatibility key: `schema:table:pk1[:pk2...]`.
///
/// The key is stable across runs and uniquely identifies a legacy record,
/// including the schema variant it came from.
pub fn backward_key(schema: &str, table: &str, pk_values: &[&str]) -> String {
    let mut key = format!("{schema}:{table}");
    for value in pk_values {
        key.push(':');
        key.push_str(value);
    }
    key
}

/// Parse a legacy `"lat,lon"` coordinate pair.
///
/// Returns `None` for absent input; malformed input is a transformation
/// error rather than a silent null, since a present-but-broken coordinate
/// usually means a row-level data problem worth surfacing.
pub fn parse_geo(row: &LegacyRow, field: &str) -> Result<Option<(f64, f64)>> {
    let Some(raw) = row.opt_str(field) else {
        return Ok(None);
    };

    let mut parts = raw.split(',').map(str::trim);
    let lat = parts.next().and_then(|p| p.parse::<f64>().ok());
    let lon = parts.next().and_then(|p| p.parse::<f64>().ok());
    match (lat, lon, parts.next()) {
        (Some(lat), Some(lon), None) => Ok(Some((lat, lon))),
        _ => Err(ImportError::transformation(field, row.describe())),
    }
}

/// Partner kind in the target system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PartnerKind {
    Museum,
    Institution,
}

/// Item kind in the target system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Object,
    Monument,
}

/// Language creation payload (id is the ISO 639-3 code).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguagePayload {
    pub id: String,
    pub internal_name: String,
    pub backward_compatibility: String,
    pub is_default: bool,
}

/// Language name translation payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageTranslationPayload {
    pub language_id: String,
    pub display_language_id: String,
    pub name: String,
    pub backward_compatibility: String,
}

/// Country creation payload (id is the ISO 3166-1 alpha-3 code).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryPayload {
    pub id: String,
    pub internal_name: String,
    pub backward_compatibility: String,
}

/// Country name translation payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryTranslationPayload {
    pub country_id: String,
    pub language_id: String,
    pub name: String,
    pub backward_compatibility: String,
}

/// Project creation payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectPayload {
    pub internal_name: String,
    pub backward_compatibility: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_date: Option<String>,
    pub is_launched: bool,
}

/// Project translation payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectTranslationPayload {
    pub project_id: String,
    pub language_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub backward_compatibility: String,
}

/// Partner (museum or institution) creation payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerPayload {
    pub internal_name: String,
    pub backward_compatibility: String,
    #[serde(rename = "type")]
    pub kind: PartnerKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// Partner translation payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerTranslationPayload {
    pub partner_id: String,
    pub language_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email_general: Option<String>,
    pub backward_compatibility: String,
}

/// Item (object or monument) creation payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemPayload {
    pub internal_name: String,
    pub backward_compatibility: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mwnf_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// Item translation payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemTranslationPayload {
    pub item_id: String,
    pub language_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternate_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dates: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    pub backward_compatibility: String,
}

/// Foreign keys resolved through the tracker before building a partner.
#[derive(Debug, Clone, Default)]
pub struct PartnerRefs {
    pub country_id: Option<String>,
    pub project_id: Option<String>,
}

/// Foreign keys resolved through the tracker before building an item.
#[derive(Debug, Clone, Default)]
pub struct ItemRefs {
    pub partner_id: Option<String>,
    pub country_id: Option<String>,
    pub project_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::LegacyRow;

    #[test]
    fn backward_key_format() {
        assert_eq!(
            backward_key("mwnf3", "objects", &["isl", "ma", "louvre", "17"]),
            "mwnf3:objects:isl:ma:louvre:17"
        );
        assert_eq!(backward_key("mwnf3", "projects", &["vm"]), "mwnf3:projects:vm");
    }

    #[test]
    fn geo_parsing() {
        let row = LegacyRow::new("monuments")
            .with("geoCoordinates", "33.5899, -7.6039")
            .keyed(&[]);
        assert_eq!(
            parse_geo(&row, "geoCoordinates").unwrap(),
            Some((33.5899, -7.6039))
        );

        let absent = LegacyRow::new("monuments");
        assert_eq!(parse_geo(&absent, "geoCoordinates").unwrap(), None);
    }

    #[test]
    fn malformed_geo_is_a_transformation_error() {
        let row = LegacyRow::new("monuments")
            .with("geoCoordinates", "not-a-coordinate")
            .keyed(&[]);
        let err = parse_geo(&row, "geoCoordinates").unwrap_err();
        assert!(err.to_string().contains("geoCoordinates"));
    }

    #[test]
    fn optional_fields_are_omitted_from_payload_json() {
        let payload = PartnerPayload {
            internal_name: "Louvre".into(),
            backward_compatibility: "mwnf3:museums:louvre:fr".into(),
            kind: PartnerKind::Museum,
            country_id: None,
            project_id: None,
            latitude: None,
            longitude: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "museum");
        assert!(json.get("country_id").is_none());
    }
}
