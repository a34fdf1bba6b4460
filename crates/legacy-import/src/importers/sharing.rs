//! Phase 02 importers for the `mwnf3_sharing_history` schema.
//!
//! Sharing-history partners are keyed by `partners_id` alone and items by
//! `(project_id, country, number)`; translations live in separate `*_names`
//! and `*_texts` tables rather than denormalized rows.

use async_trait::async_trait;

use crate::error::Result;
use crate::source::LegacyRow;
use crate::tracker::EntityType;
use crate::transform::{mwnf3, sharing};
use crate::transform::{ItemRefs, PartnerRefs};

use super::{tally, ImportContext, ImportResult, Importer, RowOutcome, DRY_RUN_ID};

/// Imports `sh_partners` and its `sh_partner_names` translations.
pub struct SharingPartnerImporter;

#[async_trait]
impl Importer for SharingPartnerImporter {
    fn name(&self) -> &'static str {
        "sh-partners"
    }

    fn description(&self) -> &'static str {
        "Sharing-history partners with their translations"
    }

    async fn run(&self, ctx: &ImportContext) -> Result<ImportResult> {
        let mut result = ImportResult::default();

        let rows = ctx.apply_limit(
            ctx.legacy
                .query(
                    "sh_partners",
                    "SELECT * FROM sh_partners ORDER BY partners_id",
                    &[],
                )
                .await?,
        );
        for row in rows {
            let row = row.keyed(&["partners_id"]);
            let outcome = import_partner(ctx, &row).await;
            tally(ctx, &mut result, outcome);
        }

        let names = ctx.apply_limit(
            ctx.legacy
                .query(
                    "sh_partner_names",
                    "SELECT * FROM sh_partner_names ORDER BY partners_id, lang",
                    &[],
                )
                .await?,
        );
        for row in names {
            let row = row.keyed(&["partners_id", "lang"]);
            let outcome = import_partner_name(ctx, &row).await;
            tally(ctx, &mut result, outcome);
        }

        ctx.progress.end_line();
        Ok(result.finish())
    }
}

async fn import_partner(ctx: &ImportContext, row: &LegacyRow) -> Result<RowOutcome> {
    let key = sharing::partner_key(&row.req_id("partners_id")?);
    if ctx.already_imported(EntityType::Partner, &key) {
        return Ok(RowOutcome::Skipped);
    }

    // Country and project scoping is optional in the sharing-history schema.
    let country_id = match row.opt_str("country") {
        Some(c) => Some(ctx.resolve_parent(EntityType::Country, &mwnf3::country_key(c))?),
        None => None,
    };
    let project_id = match row.opt_id("project_id") {
        Some(p) => Some(ctx.resolve_parent(EntityType::Project, &mwnf3::project_key(&p))?),
        None => None,
    };
    let refs = PartnerRefs {
        country_id,
        project_id,
    };

    let payload = sharing::partner(row, &refs)?;
    if ctx.dry_run {
        return Ok(RowOutcome::Imported);
    }

    let id = ctx.store.create_partner(&payload).await?;
    ctx.register(EntityType::Partner, &key, &id)?;
    Ok(RowOutcome::Imported)
}

async fn import_partner_name(ctx: &ImportContext, row: &LegacyRow) -> Result<RowOutcome> {
    let parent_key = sharing::partner_key(&row.req_id("partners_id")?);
    let partner_id = ctx.resolve_parent(EntityType::Partner, &parent_key)?;

    let payload = sharing::partner_name(row, &partner_id)?;
    let key = payload.backward_compatibility.clone();
    if ctx.already_imported(EntityType::PartnerTranslation, &key) {
        return Ok(RowOutcome::Skipped);
    }
    if ctx.dry_run {
        return Ok(RowOutcome::Imported);
    }

    let id = ctx.store.create_partner_translation(&payload).await?;
    ctx.register(EntityType::PartnerTranslation, &key, &id)?;
    Ok(RowOutcome::Imported)
}

/// Imports `sh_objects` and its `sh_objects_texts` translations.
pub struct SharingObjectImporter;

#[async_trait]
impl Importer for SharingObjectImporter {
    fn name(&self) -> &'static str {
        "sh-objects"
    }

    fn description(&self) -> &'static str {
        "Sharing-history objects with their text translations"
    }

    async fn run(&self, ctx: &ImportContext) -> Result<ImportResult> {
        run_items(
            ctx,
            ItemTables {
                base: "sh_objects",
                base_sql: "SELECT * FROM sh_objects ORDER BY project_id, country, number",
                texts: "sh_objects_texts",
                texts_sql:
                    "SELECT * FROM sh_objects_texts ORDER BY project_id, country, number, lang",
                monument: false,
            },
        )
        .await
    }
}

/// Imports `sh_monuments` and its `sh_monument_texts` translations.
pub struct SharingMonumentImporter;

#[async_trait]
impl Importer for SharingMonumentImporter {
    fn name(&self) -> &'static str {
        "sh-monuments"
    }

    fn description(&self) -> &'static str {
        "Sharing-history monuments with their text translations"
    }

    async fn run(&self, ctx: &ImportContext) -> Result<ImportResult> {
        run_items(
            ctx,
            ItemTables {
                base: "sh_monuments",
                base_sql: "SELECT * FROM sh_monuments ORDER BY project_id, country, number",
                texts: "sh_monument_texts",
                texts_sql:
                    "SELECT * FROM sh_monument_texts ORDER BY project_id, country, number, lang",
                monument: true,
            },
        )
        .await
    }
}

struct ItemTables {
    base: &'static str,
    base_sql: &'static str,
    texts: &'static str,
    texts_sql: &'static str,
    monument: bool,
}

async fn run_items(ctx: &ImportContext, tables: ItemTables) -> Result<ImportResult> {
    let mut result = ImportResult::default();

    let rows = ctx.apply_limit(ctx.legacy.query(tables.base, tables.base_sql, &[]).await?);
    for row in rows {
        let row = row.keyed(&["project_id", "country", "number"]);
        let outcome = import_item(ctx, &row, tables.monument).await;
        tally(ctx, &mut result, outcome);
    }

    let texts = ctx.apply_limit(ctx.legacy.query(tables.texts, tables.texts_sql, &[]).await?);
    for row in texts {
        let row = row.keyed(&["project_id", "country", "number", "lang"]);
        let outcome = import_item_text(ctx, &row, &tables).await;
        tally(ctx, &mut result, outcome);
    }

    ctx.progress.end_line();
    Ok(result.finish())
}

async fn import_item(ctx: &ImportContext, row: &LegacyRow, monument: bool) -> Result<RowOutcome> {
    let key = if monument {
        sharing::monument_key(row)?
    } else {
        sharing::object_key(row)?
    };
    if ctx.already_imported(EntityType::Item, &key) {
        return Ok(RowOutcome::Skipped);
    }

    let partner_id = match row.opt_id("partners_id") {
        Some(p) => Some(ctx.resolve_parent(EntityType::Partner, &sharing::partner_key(&p))?),
        None => None,
    };
    let refs = ItemRefs {
        partner_id,
        country_id: Some(
            ctx.resolve_parent(EntityType::Country, &mwnf3::country_key(row.req_str("country")?))?,
        ),
        project_id: Some(ctx.resolve_parent(
            EntityType::Project,
            &mwnf3::project_key(&row.req_id("project_id")?),
        )?),
    };

    let payload = if monument {
        sharing::monument(row, &refs)?
    } else {
        sharing::object(row, &refs)?
    };
    if ctx.dry_run {
        return Ok(RowOutcome::Imported);
    }

    let id = ctx.store.create_item(&payload).await?;
    ctx.register(EntityType::Item, &key, &id)?;
    Ok(RowOutcome::Imported)
}

async fn import_item_text(
    ctx: &ImportContext,
    row: &LegacyRow,
    tables: &ItemTables,
) -> Result<RowOutcome> {
    let parent_key = if tables.monument {
        sharing::monument_key(row)?
    } else {
        sharing::object_key(row)?
    };
    let item_id = if ctx.dry_run && !ctx.already_imported(EntityType::Item, &parent_key) {
        DRY_RUN_ID.to_string()
    } else {
        ctx.resolve(EntityType::Item, &parent_key)?
    };

    let payload = sharing::item_text(row, tables.texts, &item_id)?;
    let key = payload.backward_compatibility.clone();
    if ctx.already_imported(EntityType::ItemTranslation, &key) {
        return Ok(RowOutcome::Skipped);
    }
    if ctx.dry_run {
        return Ok(RowOutcome::Imported);
    }

    let id = ctx.store.create_item_translation(&payload).await?;
    ctx.register(EntityType::ItemTranslation, &key, &id)?;
    Ok(RowOutcome::Imported)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::source::FixtureReader;
    use crate::store::MemoryStore;

    fn context(reader: FixtureReader) -> (ImportContext, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let ctx = ImportContext::new(Arc::new(reader), store.clone());
        (ctx, store)
    }

    fn partner_row(id: i64, category: &str, name: &str) -> LegacyRow {
        LegacyRow::new("sh_partners")
            .with("partners_id", id)
            .with("partner_category", category)
            .with("name", name)
    }

    fn object_row(number: i64, name: &str) -> LegacyRow {
        LegacyRow::new("sh_objects")
            .with("project_id", "sh1")
            .with("country", "sy")
            .with("number", number)
            .with("partners_id", 42i64)
            .with("name", name)
    }

    fn seed_reference(ctx: &ImportContext) {
        let mut tracker = ctx.tracker();
        tracker
            .register(EntityType::Country, "mwnf3:countries:sy", "country-sy")
            .unwrap();
        tracker
            .register(EntityType::Project, "mwnf3:projects:sh1", "project-sh1")
            .unwrap();
    }

    #[tokio::test]
    async fn partners_import_with_integer_keys() {
        let reader = FixtureReader::new().with_table(
            "sh_partners",
            vec![
                partner_row(42, "Museum", "National Museum of Damascus"),
                partner_row(43, "Ministry", "Ministry of Culture"),
            ],
        );
        let (ctx, store) = context(reader);

        let result = SharingPartnerImporter.run(&ctx).await.unwrap();
        assert!(result.success, "errors: {:?}", result.errors);
        assert_eq!(result.imported, 2);
        assert!(ctx
            .tracker()
            .has(EntityType::Partner, "mwnf3_sharing_history:sh_partners:42"));

        let kinds: Vec<_> = store
            .created("partner")
            .iter()
            .map(|p| p["type"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(kinds, ["museum", "institution"]);
    }

    #[tokio::test]
    async fn objects_link_partner_through_tracker() {
        let reader = FixtureReader::new()
            .with_table("sh_partners", vec![partner_row(42, "Museum", "Damascus")])
            .with_table("sh_objects", vec![object_row(101, "Ugarit tablet")]);
        let (ctx, store) = context(reader);
        seed_reference(&ctx);

        SharingPartnerImporter.run(&ctx).await.unwrap();
        let result = SharingObjectImporter.run(&ctx).await.unwrap();
        assert!(result.success, "errors: {:?}", result.errors);

        let item = &store.created("item")[0];
        assert_eq!(item["country_id"], "country-sy");
        assert_eq!(item["project_id"], "project-sh1");
        assert_eq!(
            item["backward_compatibility"],
            "mwnf3_sharing_history:sh_objects:sh1:sy:101"
        );
    }

    #[tokio::test]
    async fn texts_before_items_are_unresolved() {
        let reader = FixtureReader::new().with_table(
            "sh_objects_texts",
            vec![LegacyRow::new("sh_objects_texts")
                .with("project_id", "sh1")
                .with("country", "sy")
                .with("number", 101i64)
                .with("lang", "ar")
                .with("name", "لوح")],
        );
        let (ctx, store) = context(reader);
        seed_reference(&ctx);

        let result = SharingObjectImporter.run(&ctx).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.unresolved_refs, 1);
        assert_eq!(store.count("item-translation"), 0);
    }

    #[tokio::test]
    async fn dry_run_reports_without_writes() {
        let reader = FixtureReader::new()
            .with_table("sh_partners", vec![partner_row(42, "Museum", "Damascus")])
            .with_table("sh_objects", vec![object_row(101, "Ugarit tablet")]);
        let (ctx, store) = context(reader);
        let ctx = ctx.with_dry_run(true);

        let partners = SharingPartnerImporter.run(&ctx).await.unwrap();
        let objects = SharingObjectImporter.run(&ctx).await.unwrap();

        assert!(partners.success && objects.success);
        assert_eq!(partners.imported, 1);
        assert_eq!(objects.imported, 1);
        assert_eq!(store.total(), 0);
        assert!(ctx.tracker().is_empty());
    }
}
