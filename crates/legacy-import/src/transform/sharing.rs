//! Transformers for the `mwnf3_sharing_history` legacy schema variant.
//!
//! Differences from mwnf3: partners live in a single table keyed by
//! `partners_id` alone (no country scoping), items are keyed by
//! `(project_id, country, number)` with the partner linked through a
//! `partners_id` foreign key, and translations live in `*_texts` /
//! `*_names` tables.

use crate::error::Result;
use crate::source::LegacyRow;

use super::codes;
use super::{
    backward_key, parse_geo, ItemKind, ItemPayload, ItemRefs, ItemTranslationPayload, PartnerKind,
    PartnerPayload, PartnerRefs, PartnerTranslationPayload,
};

const SCHEMA: &str = "mwnf3_sharing_history";

/// Tracker key for a legacy sharing-history partner.
pub fn partner_key(partners_id: &str) -> String {
    backward_key(SCHEMA, "sh_partners", &[partners_id])
}

/// Tracker key for a legacy `sh_objects` row, derived from its key columns.
pub fn object_key(row: &LegacyRow) -> Result<String> {
    row_key(row, "sh_objects")
}

/// Tracker key for a legacy `sh_monuments` row.
pub fn monument_key(row: &LegacyRow) -> Result<String> {
    row_key(row, "sh_monuments")
}

fn row_key(row: &LegacyRow, table: &str) -> Result<String> {
    let number = row.req_id("number")?;
    Ok(backward_key(
        SCHEMA,
        table,
        &[row.req_str("project_id")?, row.req_str("country")?, &number],
    ))
}

/// Legacy `sh_partners` row -> partner payload.
///
/// `partner_category` distinguishes museums from other institutions; anything
/// that is not a museum maps to an institution partner.
pub fn partner(row: &LegacyRow, refs: &PartnerRefs) -> Result<PartnerPayload> {
    let partners_id = row.req_id("partners_id")?;
    let kind = match row.opt_str("partner_category") {
        Some(c) if c.eq_ignore_ascii_case("museum") => PartnerKind::Museum,
        _ => PartnerKind::Institution,
    };
    let geo = parse_geo(row, "geoCoordinates")?;

    Ok(PartnerPayload {
        internal_name: row.req_str("name")?.to_string(),
        backward_compatibility: backward_key(SCHEMA, "sh_partners", &[&partners_id]),
        kind,
        country_id: refs.country_id.clone(),
        project_id: refs.project_id.clone(),
        latitude: geo.map(|(lat, _)| lat),
        longitude: geo.map(|(_, lon)| lon),
    })
}

/// Legacy `sh_partner_names` row -> partner translation payload.
pub fn partner_name(row: &LegacyRow, partner_id: &str) -> Result<PartnerTranslationPayload> {
    let partners_id = row.req_id("partners_id")?;
    let lang = row.req_str("lang")?;

    Ok(PartnerTranslationPayload {
        partner_id: partner_id.to_string(),
        language_id: codes::language_id(row, "lang", lang)?,
        name: row.req_str("name")?.to_string(),
        description: row.opt_str("description").map(str::to_string),
        city_display: row.opt_str("city").map(str::to_string),
        address: row.opt_str("address").map(str::to_string),
        contact_website: row.opt_str("url").map(str::to_string),
        contact_phone: row.opt_str("phone").map(str::to_string),
        contact_email_general: row.opt_str("email").map(str::to_string),
        backward_compatibility: backward_key(SCHEMA, "sh_partner_names", &[&partners_id, lang]),
    })
}

/// Legacy `sh_objects` row -> base item payload.
pub fn object(row: &LegacyRow, refs: &ItemRefs) -> Result<ItemPayload> {
    item(row, "sh_objects", ItemKind::Object, refs)
}

/// Legacy `sh_monuments` row -> base item payload.
pub fn monument(row: &LegacyRow, refs: &ItemRefs) -> Result<ItemPayload> {
    item(row, "sh_monuments", ItemKind::Monument, refs)
}

fn item(row: &LegacyRow, table: &str, kind: ItemKind, refs: &ItemRefs) -> Result<ItemPayload> {
    let project_id = row.req_str("project_id")?;
    let country = row.req_str("country")?;
    let number = row.req_id("number")?;
    let geo = parse_geo(row, "geoCoordinates")?;

    Ok(ItemPayload {
        internal_name: row.req_str("name")?.to_string(),
        backward_compatibility: backward_key(SCHEMA, table, &[project_id, country, &number]),
        kind,
        partner_id: refs.partner_id.clone(),
        country_id: refs.country_id.clone(),
        project_id: refs.project_id.clone(),
        owner_reference: row.opt_str("inventory_id").map(str::to_string),
        mwnf_reference: None,
        latitude: geo.map(|(lat, _)| lat),
        longitude: geo.map(|(_, lon)| lon),
    })
}

/// Legacy `sh_objects_texts` / `sh_monument_texts` row -> item translation.
pub fn item_text(row: &LegacyRow, table: &str, item_id: &str) -> Result<ItemTranslationPayload> {
    let project_id = row.req_str("project_id")?;
    let country = row.req_str("country")?;
    let number = row.req_id("number")?;
    let lang = row.req_str("lang")?;

    Ok(ItemTranslationPayload {
        item_id: item_id.to_string(),
        language_id: codes::language_id(row, "lang", lang)?,
        name: row.req_str("name")?.to_string(),
        description: row.opt_str("description").map(str::to_string),
        alternate_name: None,
        holder: row.opt_str("holding_museum").map(str::to_string),
        dates: row.opt_str("date_description").map(str::to_string),
        location: row.opt_str("location").map(str::to_string),
        dimensions: row.opt_str("dimensions").map(str::to_string),
        backward_compatibility: backward_key(SCHEMA, table, &[project_id, country, &number, lang]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::LegacyRow;

    #[test]
    fn sh_partner_has_single_key_and_category() {
        let row = LegacyRow::new("sh_partners")
            .with("partners_id", "42")
            .with("partner_category", "Museum")
            .with("name", "National Museum of Damascus")
            .keyed(&["partners_id"]);

        let payload = partner(&row, &PartnerRefs::default()).unwrap();
        assert_eq!(payload.kind, PartnerKind::Museum);
        assert_eq!(
            payload.backward_compatibility,
            "mwnf3_sharing_history:sh_partners:42"
        );
    }

    #[test]
    fn non_museum_category_maps_to_institution() {
        let row = LegacyRow::new("sh_partners")
            .with("partners_id", "7")
            .with("partner_category", "Ministry")
            .with("name", "Ministry of Culture")
            .keyed(&["partners_id"]);
        assert_eq!(
            partner(&row, &PartnerRefs::default()).unwrap().kind,
            PartnerKind::Institution
        );
    }

    #[test]
    fn sh_item_key_omits_partner() {
        let row = LegacyRow::new("sh_objects")
            .with("project_id", "sh1")
            .with("country", "sy")
            .with("number", "101")
            .with("name", "Ugarit tablet")
            .keyed(&["project_id", "country", "number"]);

        let payload = object(&row, &ItemRefs::default()).unwrap();
        assert_eq!(
            payload.backward_compatibility,
            "mwnf3_sharing_history:sh_objects:sh1:sy:101"
        );
    }

    #[test]
    fn missing_partner_name_is_a_transformation_error() {
        let row = LegacyRow::new("sh_partners")
            .with("partners_id", "9")
            .keyed(&["partners_id"]);
        let err = partner(&row, &PartnerRefs::default()).unwrap_err();
        assert!(err.to_string().contains("`name`"));
        assert!(err.to_string().contains("sh_partners[9]"));
    }

    #[test]
    fn item_text_maps_language_and_key() {
        let row = LegacyRow::new("sh_objects_texts")
            .with("project_id", "sh1")
            .with("country", "sy")
            .with("number", "101")
            .with("lang", "ar")
            .with("name", "رقيم أوغاريت")
            .keyed(&["project_id", "country", "number", "lang"]);

        let t = item_text(&row, "sh_objects_texts", "item-5").unwrap();
        assert_eq!(t.language_id, "ara");
        assert_eq!(
            t.backward_compatibility,
            "mwnf3_sharing_history:sh_objects_texts:sh1:sy:101:ar"
        );
    }
}
