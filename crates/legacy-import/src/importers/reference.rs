//! Phase 00 importers: reference data.
//!
//! Languages and countries carry natural ids in the target system (ISO 639-3
//! and ISO 3166-1 alpha-3), so their translation payloads reference those ids
//! directly instead of going through tracker resolution.

use async_trait::async_trait;

use crate::error::Result;
use crate::source::LegacyRow;
use crate::tracker::EntityType;
use crate::transform::mwnf3;

use super::{
    tally, ImportContext, ImportResult, Importer, RowOutcome, META_DEFAULT_LANGUAGE,
};

/// Imports the `languages` table and its `languagenames` translations.
pub struct LanguageImporter;

#[async_trait]
impl Importer for LanguageImporter {
    fn name(&self) -> &'static str {
        "languages"
    }

    fn description(&self) -> &'static str {
        "Languages and their display-name translations"
    }

    async fn run(&self, ctx: &ImportContext) -> Result<ImportResult> {
        let mut result = ImportResult::default();

        let rows = ctx.apply_limit(
            ctx.legacy
                .query("languages", "SELECT * FROM languages ORDER BY code", &[])
                .await?,
        );
        for row in rows {
            let row = row.keyed(&["code"]);
            let outcome = import_language(ctx, &row).await;
            tally(ctx, &mut result, outcome);
        }

        let names = ctx.apply_limit(
            ctx.legacy
                .query(
                    "languagenames",
                    "SELECT * FROM languagenames ORDER BY code, lang",
                    &[],
                )
                .await?,
        );
        for row in names {
            let row = row.keyed(&["code", "lang"]);
            let outcome = import_language_name(ctx, &row).await;
            tally(ctx, &mut result, outcome);
        }

        ctx.progress.end_line();
        Ok(result.finish())
    }
}

async fn import_language(ctx: &ImportContext, row: &LegacyRow) -> Result<RowOutcome> {
    let payload = mwnf3::language(row)?;
    let key = payload.backward_compatibility.clone();
    if ctx.already_imported(EntityType::Language, &key) {
        return Ok(RowOutcome::Skipped);
    }
    if ctx.dry_run {
        return Ok(RowOutcome::Imported);
    }

    let id = ctx.store.create_language(&payload).await?;
    ctx.register(EntityType::Language, &key, &id)?;
    if payload.is_default {
        ctx.tracker().set_meta(META_DEFAULT_LANGUAGE, payload.id.as_str());
    }
    Ok(RowOutcome::Imported)
}

async fn import_language_name(ctx: &ImportContext, row: &LegacyRow) -> Result<RowOutcome> {
    let payload = mwnf3::language_name(row)?;
    let key = payload.backward_compatibility.clone();
    if ctx.already_imported(EntityType::LanguageTranslation, &key) {
        return Ok(RowOutcome::Skipped);
    }
    if ctx.dry_run {
        return Ok(RowOutcome::Imported);
    }

    let id = ctx.store.create_language_translation(&payload).await?;
    ctx.register(EntityType::LanguageTranslation, &key, &id)?;
    Ok(RowOutcome::Imported)
}

/// Imports the `countries` table and its `countrynames` translations.
pub struct CountryImporter;

#[async_trait]
impl Importer for CountryImporter {
    fn name(&self) -> &'static str {
        "countries"
    }

    fn description(&self) -> &'static str {
        "Countries and their display-name translations"
    }

    async fn run(&self, ctx: &ImportContext) -> Result<ImportResult> {
        let mut result = ImportResult::default();

        let rows = ctx.apply_limit(
            ctx.legacy
                .query("countries", "SELECT * FROM countries ORDER BY code", &[])
                .await?,
        );
        for row in rows {
            let row = row.keyed(&["code"]);
            let outcome = import_country(ctx, &row).await;
            tally(ctx, &mut result, outcome);
        }

        let names = ctx.apply_limit(
            ctx.legacy
                .query(
                    "countrynames",
                    "SELECT * FROM countrynames ORDER BY code, lang",
                    &[],
                )
                .await?,
        );
        for row in names {
            let row = row.keyed(&["code", "lang"]);
            let outcome = import_country_name(ctx, &row).await;
            tally(ctx, &mut result, outcome);
        }

        ctx.progress.end_line();
        Ok(result.finish())
    }
}

async fn import_country(ctx: &ImportContext, row: &LegacyRow) -> Result<RowOutcome> {
    let payload = mwnf3::country(row)?;
    let key = payload.backward_compatibility.clone();
    if ctx.already_imported(EntityType::Country, &key) {
        return Ok(RowOutcome::Skipped);
    }
    if ctx.dry_run {
        return Ok(RowOutcome::Imported);
    }

    let id = ctx.store.create_country(&payload).await?;
    ctx.register(EntityType::Country, &key, &id)?;
    Ok(RowOutcome::Imported)
}

async fn import_country_name(ctx: &ImportContext, row: &LegacyRow) -> Result<RowOutcome> {
    let payload = mwnf3::country_name(row)?;
    let key = payload.backward_compatibility.clone();
    if ctx.already_imported(EntityType::CountryTranslation, &key) {
        return Ok(RowOutcome::Skipped);
    }
    if ctx.dry_run {
        return Ok(RowOutcome::Imported);
    }

    let id = ctx.store.create_country_translation(&payload).await?;
    ctx.register(EntityType::CountryTranslation, &key, &id)?;
    Ok(RowOutcome::Imported)
}
