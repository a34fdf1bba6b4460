//! Transformers for the `mwnf3` legacy schema variant.
//!
//! mwnf3 keys museums by `(museum_id, country)`, institutions by
//! `(institution_id, country)`, objects by
//! `(project_id, country, museum_id, number)` and monuments by
//! `(project_id, country, institution_id, number)`. Object and monument
//! tables are denormalized: one row per translation language, grouped by the
//! importer before the base item is built.

use crate::error::Result;
use crate::source::LegacyRow;

use super::codes;
use super::{
    backward_key, parse_geo, CountryPayload, CountryTranslationPayload, ItemKind, ItemPayload,
    ItemRefs, ItemTranslationPayload, LanguagePayload, LanguageTranslationPayload, PartnerKind,
    PartnerPayload, PartnerRefs, PartnerTranslationPayload, ProjectPayload,
    ProjectTranslationPayload,
};

const SCHEMA: &str = "mwnf3";

/// Tracker key for a legacy language.
pub fn language_key(code: &str) -> String {
    backward_key(SCHEMA, "languages", &[code])
}

/// Tracker key for a legacy country.
pub fn country_key(code: &str) -> String {
    backward_key(SCHEMA, "countries", &[code])
}

/// Tracker key for a legacy project.
pub fn project_key(project_id: &str) -> String {
    backward_key(SCHEMA, "projects", &[project_id])
}

/// Tracker key for a legacy museum.
pub fn museum_key(museum_id: &str, country: &str) -> String {
    backward_key(SCHEMA, "museums", &[museum_id, country])
}

/// Tracker key for a legacy institution.
pub fn institution_key(institution_id: &str, country: &str) -> String {
    backward_key(SCHEMA, "institutions", &[institution_id, country])
}

/// Tracker key for one legacy `objects` group, derived from its key columns.
pub fn object_key(row: &LegacyRow) -> Result<String> {
    let number = row.req_id("number")?;
    Ok(backward_key(
        SCHEMA,
        "objects",
        &[
            row.req_str("project_id")?,
            row.req_str("country")?,
            row.req_str("museum_id")?,
            &number,
        ],
    ))
}

/// Tracker key for one legacy `monuments` group.
pub fn monument_key(row: &LegacyRow) -> Result<String> {
    let number = row.req_id("number")?;
    Ok(backward_key(
        SCHEMA,
        "monuments",
        &[
            row.req_str("project_id")?,
            row.req_str("country")?,
            row.req_str("institution_id")?,
            &number,
        ],
    ))
}

/// Legacy `languages` row -> language payload.
pub fn language(row: &LegacyRow) -> Result<LanguagePayload> {
    let code = row.req_str("code")?;
    let id = codes::language_id(row, "code", code)?;
    let name = row.req_str("name")?;

    Ok(LanguagePayload {
        internal_name: name.to_string(),
        backward_compatibility: backward_key(SCHEMA, "languages", &[code]),
        // English is the pivot language of the legacy corpus.
        is_default: id == "eng",
        id,
    })
}

/// Legacy `languagenames` row -> language translation payload.
pub fn language_name(row: &LegacyRow) -> Result<LanguageTranslationPayload> {
    let code = row.req_str("code")?;
    let lang = row.req_str("lang")?;

    Ok(LanguageTranslationPayload {
        language_id: codes::language_id(row, "code", code)?,
        display_language_id: codes::language_id(row, "lang", lang)?,
        name: row.req_str("name")?.to_string(),
        backward_compatibility: backward_key(SCHEMA, "languagenames", &[code, lang]),
    })
}

/// Legacy `countries` row -> country payload.
pub fn country(row: &LegacyRow) -> Result<CountryPayload> {
    let code = row.req_str("code")?;

    Ok(CountryPayload {
        id: codes::country_id(row, "code", code)?,
        internal_name: row.req_str("name")?.to_string(),
        backward_compatibility: backward_key(SCHEMA, "countries", &[code]),
    })
}

/// Legacy `countrynames` row -> country translation payload.
pub fn country_name(row: &LegacyRow) -> Result<CountryTranslationPayload> {
    let code = row.req_str("code")?;
    let lang = row.req_str("lang")?;

    Ok(CountryTranslationPayload {
        country_id: codes::country_id(row, "code", code)?,
        language_id: codes::language_id(row, "lang", lang)?,
        name: row.req_str("name")?.to_string(),
        backward_compatibility: backward_key(SCHEMA, "countrynames", &[code, lang]),
    })
}

/// Legacy `projects` row -> project payload.
pub fn project(row: &LegacyRow) -> Result<ProjectPayload> {
    let project_id = row.req_str("project_id")?;

    Ok(ProjectPayload {
        internal_name: row.opt_str("name").unwrap_or(project_id).to_string(),
        backward_compatibility: backward_key(SCHEMA, "projects", &[project_id]),
        launch_date: row.opt_str("launchdate").map(str::to_string),
        is_launched: row.flag("active"),
    })
}

/// Legacy `projectnames` row -> project translation payload.
pub fn project_name(row: &LegacyRow, project_id: &str) -> Result<ProjectTranslationPayload> {
    let legacy_project = row.req_str("project_id")?;
    let lang = row.req_str("lang")?;

    Ok(ProjectTranslationPayload {
        project_id: project_id.to_string(),
        language_id: codes::language_id(row, "lang", lang)?,
        name: row.req_str("name")?.to_string(),
        description: row.opt_str("description").map(str::to_string),
        backward_compatibility: backward_key(SCHEMA, "projectnames", &[legacy_project, lang]),
    })
}

/// Legacy `museums` row -> partner payload.
pub fn museum(row: &LegacyRow, refs: &PartnerRefs) -> Result<PartnerPayload> {
    let museum_id = row.req_str("museum_id")?;
    let country = row.req_str("country")?;
    let geo = parse_geo(row, "geoCoordinates")?;

    Ok(PartnerPayload {
        internal_name: row.req_str("name")?.to_string(),
        backward_compatibility: backward_key(SCHEMA, "museums", &[museum_id, country]),
        kind: PartnerKind::Museum,
        country_id: refs.country_id.clone(),
        project_id: refs.project_id.clone(),
        latitude: geo.map(|(lat, _)| lat),
        longitude: geo.map(|(_, lon)| lon),
    })
}

/// Legacy `museumnames` row -> partner translation payload.
pub fn museum_name(row: &LegacyRow, partner_id: &str) -> Result<PartnerTranslationPayload> {
    let museum_id = row.req_str("museum_id")?;
    let country = row.req_str("country")?;
    let lang = row.req_str("lang")?;

    Ok(PartnerTranslationPayload {
        partner_id: partner_id.to_string(),
        language_id: codes::language_id(row, "lang", lang)?,
        name: row.req_str("name")?.to_string(),
        description: row.opt_str("description").map(str::to_string),
        city_display: row.opt_str("city").map(str::to_string),
        address: None,
        contact_website: None,
        contact_phone: None,
        contact_email_general: None,
        backward_compatibility: backward_key(SCHEMA, "museumnames", &[museum_id, country, lang]),
    })
}

/// Legacy `institutions` row -> partner payload.
pub fn institution(row: &LegacyRow, refs: &PartnerRefs) -> Result<PartnerPayload> {
    let institution_id = row.req_str("institution_id")?;
    let country = row.req_str("country")?;

    Ok(PartnerPayload {
        internal_name: row.req_str("name")?.to_string(),
        backward_compatibility: backward_key(SCHEMA, "institutions", &[institution_id, country]),
        kind: PartnerKind::Institution,
        country_id: refs.country_id.clone(),
        project_id: refs.project_id.clone(),
        latitude: None,
        longitude: None,
    })
}

/// Legacy `institutionnames` row -> partner translation payload.
pub fn institution_name(row: &LegacyRow, partner_id: &str) -> Result<PartnerTranslationPayload> {
    let institution_id = row.req_str("institution_id")?;
    let country = row.req_str("country")?;
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
        backward_compatibility: backward_key(
            SCHEMA,
            "institutionnames",
            &[institution_id, country, lang],
        ),
    })
}

/// One legacy `objects` row (any language of the group) -> base item payload.
pub fn object(row: &LegacyRow, refs: &ItemRefs) -> Result<ItemPayload> {
    let project_id = row.req_str("project_id")?;
    let country = row.req_str("country")?;
    let museum_id = row.req_str("museum_id")?;
    let number = row.req_id("number")?;

    Ok(ItemPayload {
        internal_name: row.req_str("name")?.to_string(),
        backward_compatibility: backward_key(
            SCHEMA,
            "objects",
            &[project_id, country, museum_id, &number],
        ),
        kind: ItemKind::Object,
        partner_id: refs.partner_id.clone(),
        country_id: refs.country_id.clone(),
        project_id: refs.project_id.clone(),
        owner_reference: row.opt_str("inventory_id").map(str::to_string),
        mwnf_reference: row.opt_str("working_number").map(str::to_string),
        latitude: None,
        longitude: None,
    })
}

/// One legacy `objects` row -> item translation payload for its language.
pub fn object_translation(row: &LegacyRow, item_id: &str) -> Result<ItemTranslationPayload> {
    let project_id = row.req_str("project_id")?;
    let country = row.req_str("country")?;
    let museum_id = row.req_str("museum_id")?;
    let number = row.req_id("number")?;
    let lang = row.req_str("lang")?;

    Ok(ItemTranslationPayload {
        item_id: item_id.to_string(),
        language_id: codes::language_id(row, "lang", lang)?,
        name: row.req_str("name")?.to_string(),
        description: row.opt_str("description").map(str::to_string),
        alternate_name: row.opt_str("name2").map(str::to_string),
        holder: row.opt_str("holding_museum").map(str::to_string),
        dates: row.opt_str("date_description").map(str::to_string),
        location: row.opt_str("location").map(str::to_string),
        dimensions: row.opt_str("dimensions").map(str::to_string),
        backward_compatibility: backward_key(
            SCHEMA,
            "objects",
            &[project_id, country, museum_id, &number, lang],
        ),
    })
}

/// One legacy `monuments` row (any language of the group) -> base item payload.
pub fn monument(row: &LegacyRow, refs: &ItemRefs) -> Result<ItemPayload> {
    let project_id = row.req_str("project_id")?;
    let country = row.req_str("country")?;
    let institution_id = row.req_str("institution_id")?;
    let number = row.req_id("number")?;
    let geo = parse_geo(row, "geoCoordinates")?;

    Ok(ItemPayload {
        internal_name: row.req_str("name")?.to_string(),
        backward_compatibility: backward_key(
            SCHEMA,
            "monuments",
            &[project_id, country, institution_id, &number],
        ),
        kind: ItemKind::Monument,
        partner_id: refs.partner_id.clone(),
        country_id: refs.country_id.clone(),
        project_id: refs.project_id.clone(),
        owner_reference: None,
        mwnf_reference: row.opt_str("working_number").map(str::to_string),
        latitude: geo.map(|(lat, _)| lat),
        longitude: geo.map(|(_, lon)| lon),
    })
}

/// One legacy `monuments` row -> item translation payload for its language.
pub fn monument_translation(row: &LegacyRow, item_id: &str) -> Result<ItemTranslationPayload> {
    let project_id = row.req_str("project_id")?;
    let country = row.req_str("country")?;
    let institution_id = row.req_str("institution_id")?;
    let number = row.req_id("number")?;
    let lang = row.req_str("lang")?;

    Ok(ItemTranslationPayload {
        item_id: item_id.to_string(),
        language_id: codes::language_id(row, "lang", lang)?,
        name: row.req_str("name")?.to_string(),
        description: row.opt_str("description").map(str::to_string),
        alternate_name: row.opt_str("name2").map(str::to_string),
        holder: None,
        dates: row.opt_str("date_description").map(str::to_string),
        location: row.opt_str("location").map(str::to_string),
        dimensions: None,
        backward_compatibility: backward_key(
            SCHEMA,
            "monuments",
            &[project_id, country, institution_id, &number, lang],
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::LegacyRow;

    #[test]
    fn country_row_transforms_to_alpha3_payload() {
        let row = LegacyRow::new("countries")
            .with("code", "FRA")
            .with("name", "France")
            .keyed(&["code"]);

        let payload = country(&row).unwrap();
        assert_eq!(payload.id, "fra");
        assert_eq!(payload.internal_name, "France");
        assert_eq!(payload.backward_compatibility, "mwnf3:countries:FRA");
    }

    #[test]
    fn country_without_name_fails_naming_the_field() {
        let row = LegacyRow::new("countries").with("code", "fr").keyed(&["code"]);
        let err = country(&row).unwrap_err();
        assert!(err.to_string().contains("`name`"));
        assert!(err.to_string().contains("countries[fr]"));
    }

    #[test]
    fn language_default_flag_follows_english() {
        let en = LegacyRow::new("languages")
            .with("code", "en")
            .with("name", "English")
            .keyed(&["code"]);
        let fr = LegacyRow::new("languages")
            .with("code", "fr")
            .with("name", "French")
            .keyed(&["code"]);

        assert!(language(&en).unwrap().is_default);
        assert!(!language(&fr).unwrap().is_default);
    }

    #[test]
    fn museum_carries_resolved_foreign_keys() {
        let row = LegacyRow::new("museums")
            .with("museum_id", "louvre")
            .with("country", "fr")
            .with("name", "Louvre")
            .with("geoCoordinates", "48.8606,2.3376")
            .keyed(&["museum_id", "country"]);
        let refs = PartnerRefs {
            country_id: Some("fra".into()),
            project_id: Some("project-1".into()),
        };

        let payload = museum(&row, &refs).unwrap();
        assert_eq!(payload.kind, PartnerKind::Museum);
        assert_eq!(payload.country_id.as_deref(), Some("fra"));
        assert_eq!(payload.project_id.as_deref(), Some("project-1"));
        assert_eq!(payload.latitude, Some(48.8606));
        assert_eq!(payload.backward_compatibility, "mwnf3:museums:louvre:fr");
    }

    #[test]
    fn object_key_is_composite_and_translation_appends_lang() {
        let row = LegacyRow::new("objects")
            .with("project_id", "isl")
            .with("country", "ma")
            .with("museum_id", "louvre")
            .with("number", "17")
            .with("lang", "en")
            .with("name", "Astrolabe")
            .with("inventory_id", "INV-204")
            .keyed(&["project_id", "country", "museum_id", "number"]);

        let item = object(&row, &ItemRefs::default()).unwrap();
        assert_eq!(item.kind, ItemKind::Object);
        assert_eq!(
            item.backward_compatibility,
            "mwnf3:objects:isl:ma:louvre:17"
        );
        assert_eq!(item.owner_reference.as_deref(), Some("INV-204"));

        let translation = object_translation(&row, "item-1").unwrap();
        assert_eq!(translation.language_id, "eng");
        assert_eq!(
            translation.backward_compatibility,
            "mwnf3:objects:isl:ma:louvre:17:en"
        );
    }

    #[test]
    fn monument_parses_coordinates() {
        let row = LegacyRow::new("monuments")
            .with("project_id", "isl")
            .with("country", "ma")
            .with("institution_id", "inst1")
            .with("number", "3")
            .with("name", "Koutoubia Mosque")
            .with("geoCoordinates", "31.6237,-7.9938")
            .keyed(&["project_id", "country", "institution_id", "number"]);

        let payload = monument(&row, &ItemRefs::default()).unwrap();
        assert_eq!(payload.kind, ItemKind::Monument);
        assert_eq!(payload.latitude, Some(31.6237));
        assert_eq!(payload.longitude, Some(-7.9938));
    }

    #[test]
    fn project_falls_back_to_id_for_internal_name() {
        let row = LegacyRow::new("projects")
            .with("project_id", "vm")
            .with("active", "Y")
            .keyed(&["project_id"]);
        let payload = project(&row).unwrap();
        assert_eq!(payload.internal_name, "vm");
        assert!(payload.is_launched);
    }
}
