//! Phase 01 importers for the `mwnf3` schema: projects, partners and items.
//!
//! Partners and items resolve their parents through the tracker, so these
//! importers depend on phase 00 having run (and, for items, on the partner
//! importer earlier in this phase). A missing parent fails the row with an
//! unresolved reference instead of writing a null foreign key.

use async_trait::async_trait;

use crate::error::Result;
use crate::source::LegacyRow;
use crate::tracker::EntityType;
use crate::transform::mwnf3;
use crate::transform::{ItemRefs, PartnerRefs};

use super::{
    base_row, group_by_key, tally, ImportContext, ImportResult, Importer, RowOutcome, DRY_RUN_ID,
};

/// Imports the `projects` table and its `projectnames` translations.
pub struct ProjectImporter;

#[async_trait]
impl Importer for ProjectImporter {
    fn name(&self) -> &'static str {
        "projects"
    }

    fn description(&self) -> &'static str {
        "Projects and their translations"
    }

    async fn run(&self, ctx: &ImportContext) -> Result<ImportResult> {
        let mut result = ImportResult::default();

        let rows = ctx.apply_limit(
            ctx.legacy
                .query("projects", "SELECT * FROM projects ORDER BY project_id", &[])
                .await?,
        );
        for row in rows {
            let row = row.keyed(&["project_id"]);
            let outcome = import_project(ctx, &row).await;
            tally(ctx, &mut result, outcome);
        }

        let names = ctx.apply_limit(
            ctx.legacy
                .query(
                    "projectnames",
                    "SELECT * FROM projectnames ORDER BY project_id, lang",
                    &[],
                )
                .await?,
        );
        for row in names {
            let row = row.keyed(&["project_id", "lang"]);
            let outcome = import_project_name(ctx, &row).await;
            tally(ctx, &mut result, outcome);
        }

        ctx.progress.end_line();
        Ok(result.finish())
    }
}

async fn import_project(ctx: &ImportContext, row: &LegacyRow) -> Result<RowOutcome> {
    let payload = mwnf3::project(row)?;
    let key = payload.backward_compatibility.clone();
    if ctx.already_imported(EntityType::Project, &key) {
        return Ok(RowOutcome::Skipped);
    }
    if ctx.dry_run {
        return Ok(RowOutcome::Imported);
    }

    let id = ctx.store.create_project(&payload).await?;
    ctx.register(EntityType::Project, &key, &id)?;
    Ok(RowOutcome::Imported)
}

async fn import_project_name(ctx: &ImportContext, row: &LegacyRow) -> Result<RowOutcome> {
    let legacy_project = row.req_id("project_id")?;
    let project_id =
        ctx.resolve_parent(EntityType::Project, &mwnf3::project_key(&legacy_project))?;

    let payload = mwnf3::project_name(row, &project_id)?;
    let key = payload.backward_compatibility.clone();
    if ctx.already_imported(EntityType::ProjectTranslation, &key) {
        return Ok(RowOutcome::Skipped);
    }
    if ctx.dry_run {
        return Ok(RowOutcome::Imported);
    }

    let id = ctx.store.create_project_translation(&payload).await?;
    ctx.register(EntityType::ProjectTranslation, &key, &id)?;
    Ok(RowOutcome::Imported)
}

/// Imports `museums` and `institutions` (both become partners) along with
/// their translation tables.
pub struct PartnerImporter;

#[async_trait]
impl Importer for PartnerImporter {
    fn name(&self) -> &'static str {
        "partners"
    }

    fn description(&self) -> &'static str {
        "Museums and institutions with their translations"
    }

    async fn run(&self, ctx: &ImportContext) -> Result<ImportResult> {
        let mut result = ImportResult::default();

        let museums = ctx.apply_limit(
            ctx.legacy
                .query(
                    "museums",
                    "SELECT * FROM museums ORDER BY country, museum_id",
                    &[],
                )
                .await?,
        );
        for row in museums {
            let row = row.keyed(&["museum_id", "country"]);
            let outcome = import_museum(ctx, &row).await;
            tally(ctx, &mut result, outcome);
        }

        let museum_names = ctx.apply_limit(
            ctx.legacy
                .query(
                    "museumnames",
                    "SELECT * FROM museumnames ORDER BY country, museum_id, lang",
                    &[],
                )
                .await?,
        );
        for row in museum_names {
            let row = row.keyed(&["museum_id", "country", "lang"]);
            let outcome = import_museum_name(ctx, &row).await;
            tally(ctx, &mut result, outcome);
        }

        let institutions = ctx.apply_limit(
            ctx.legacy
                .query(
                    "institutions",
                    "SELECT * FROM institutions ORDER BY country, institution_id",
                    &[],
                )
                .await?,
        );
        for row in institutions {
            let row = row.keyed(&["institution_id", "country"]);
            let outcome = import_institution(ctx, &row).await;
            tally(ctx, &mut result, outcome);
        }

        let institution_names = ctx.apply_limit(
            ctx.legacy
                .query(
                    "institutionnames",
                    "SELECT * FROM institutionnames ORDER BY country, institution_id, lang",
                    &[],
                )
                .await?,
        );
        for row in institution_names {
            let row = row.keyed(&["institution_id", "country", "lang"]);
            let outcome = import_institution_name(ctx, &row).await;
            tally(ctx, &mut result, outcome);
        }

        ctx.progress.end_line();
        Ok(result.finish())
    }
}

/// Resolve the partner foreign keys shared by museum and institution rows.
fn partner_refs(ctx: &ImportContext, row: &LegacyRow) -> Result<PartnerRefs> {
    let country = row.req_str("country")?;
    let country_id = ctx.resolve_parent(EntityType::Country, &mwnf3::country_key(country))?;

    let project_id = match row.opt_id("project_id") {
        Some(p) => Some(ctx.resolve_parent(EntityType::Project, &mwnf3::project_key(&p))?),
        None => None,
    };

    Ok(PartnerRefs {
        country_id: Some(country_id),
        project_id,
    })
}

async fn import_museum(ctx: &ImportContext, row: &LegacyRow) -> Result<RowOutcome> {
    let key = mwnf3::museum_key(row.req_str("museum_id")?, row.req_str("country")?);
    if ctx.already_imported(EntityType::Partner, &key) {
        return Ok(RowOutcome::Skipped);
    }

    let refs = partner_refs(ctx, row)?;
    let payload = mwnf3::museum(row, &refs)?;
    if ctx.dry_run {
        return Ok(RowOutcome::Imported);
    }

    let id = ctx.store.create_partner(&payload).await?;
    ctx.register(EntityType::Partner, &key, &id)?;
    Ok(RowOutcome::Imported)
}

async fn import_museum_name(ctx: &ImportContext, row: &LegacyRow) -> Result<RowOutcome> {
    let parent_key = mwnf3::museum_key(row.req_str("museum_id")?, row.req_str("country")?);
    let partner_id = ctx.resolve_parent(EntityType::Partner, &parent_key)?;

    let payload = mwnf3::museum_name(row, &partner_id)?;
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

async fn import_institution(ctx: &ImportContext, row: &LegacyRow) -> Result<RowOutcome> {
    let key = mwnf3::institution_key(row.req_str("institution_id")?, row.req_str("country")?);
    if ctx.already_imported(EntityType::Partner, &key) {
        return Ok(RowOutcome::Skipped);
    }

    let refs = partner_refs(ctx, row)?;
    let payload = mwnf3::institution(row, &refs)?;
    if ctx.dry_run {
        return Ok(RowOutcome::Imported);
    }

    let id = ctx.store.create_partner(&payload).await?;
    ctx.register(EntityType::Partner, &key, &id)?;
    Ok(RowOutcome::Imported)
}

async fn import_institution_name(ctx: &ImportContext, row: &LegacyRow) -> Result<RowOutcome> {
    let parent_key =
        mwnf3::institution_key(row.req_str("institution_id")?, row.req_str("country")?);
    let partner_id = ctx.resolve_parent(EntityType::Partner, &parent_key)?;

    let payload = mwnf3::institution_name(row, &partner_id)?;
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

/// Imports the denormalized `objects` table: one item per key group plus one
/// translation per language row.
pub struct ObjectImporter;

#[async_trait]
impl Importer for ObjectImporter {
    fn name(&self) -> &'static str {
        "objects"
    }

    fn description(&self) -> &'static str {
        "Museum objects grouped from per-language rows"
    }

    async fn run(&self, ctx: &ImportContext) -> Result<ImportResult> {
        let mut result = ImportResult::default();

        let rows = ctx
            .legacy
            .query(
                "objects",
                "SELECT * FROM objects ORDER BY project_id, country, museum_id, number, lang",
                &[],
            )
            .await?;
        let mut groups = group_by_key(rows, &["project_id", "country", "museum_id", "number"]);
        if let Some(limit) = ctx.limit {
            groups.truncate(limit);
        }

        let default_language = ctx.default_language();
        for group in &groups {
            let item_id = match object_item_id(ctx, base_row(group, &default_language)).await {
                Ok((id, outcome)) => {
                    tally(ctx, &mut result, Ok(outcome));
                    id
                }
                Err(err) => {
                    tally(ctx, &mut result, Err(err));
                    continue;
                }
            };
            for row in group {
                let outcome = import_object_translation(ctx, row, &item_id).await;
                tally(ctx, &mut result, outcome);
            }
        }

        ctx.progress.end_line();
        Ok(result.finish())
    }
}

async fn object_item_id(ctx: &ImportContext, base: &LegacyRow) -> Result<(String, RowOutcome)> {
    let key = mwnf3::object_key(base)?;
    if ctx.already_imported(EntityType::Item, &key) {
        return Ok((ctx.resolve(EntityType::Item, &key)?, RowOutcome::Skipped));
    }

    let refs = ItemRefs {
        partner_id: Some(ctx.resolve_parent(
            EntityType::Partner,
            &mwnf3::museum_key(base.req_str("museum_id")?, base.req_str("country")?),
        )?),
        country_id: Some(
            ctx.resolve_parent(EntityType::Country, &mwnf3::country_key(base.req_str("country")?))?,
        ),
        project_id: Some(ctx.resolve_parent(
            EntityType::Project,
            &mwnf3::project_key(&base.req_id("project_id")?),
        )?),
    };
    let payload = mwnf3::object(base, &refs)?;
    if ctx.dry_run {
        return Ok((DRY_RUN_ID.to_string(), RowOutcome::Imported));
    }

    let id = ctx.store.create_item(&payload).await?;
    ctx.register(EntityType::Item, &key, &id)?;
    Ok((id, RowOutcome::Imported))
}

async fn import_object_translation(
    ctx: &ImportContext,
    row: &LegacyRow,
    item_id: &str,
) -> Result<RowOutcome> {
    let payload = mwnf3::object_translation(row, item_id)?;
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

/// Imports the denormalized `monuments` table, mirroring [`ObjectImporter`]
/// with institution-scoped keys.
pub struct MonumentImporter;

#[async_trait]
impl Importer for MonumentImporter {
    fn name(&self) -> &'static str {
        "monuments"
    }

    fn description(&self) -> &'static str {
        "Monuments grouped from per-language rows"
    }

    async fn run(&self, ctx: &ImportContext) -> Result<ImportResult> {
        let mut result = ImportResult::default();

        let rows = ctx
            .legacy
            .query(
                "monuments",
                "SELECT * FROM monuments ORDER BY project_id, country, institution_id, number, lang",
                &[],
            )
            .await?;
        let mut groups =
            group_by_key(rows, &["project_id", "country", "institution_id", "number"]);
        if let Some(limit) = ctx.limit {
            groups.truncate(limit);
        }

        let default_language = ctx.default_language();
        for group in &groups {
            let item_id = match monument_item_id(ctx, base_row(group, &default_language)).await {
                Ok((id, outcome)) => {
                    tally(ctx, &mut result, Ok(outcome));
                    id
                }
                Err(err) => {
                    tally(ctx, &mut result, Err(err));
                    continue;
                }
            };
            for row in group {
                let outcome = import_monument_translation(ctx, row, &item_id).await;
                tally(ctx, &mut result, outcome);
            }
        }

        ctx.progress.end_line();
        Ok(result.finish())
    }
}

async fn monument_item_id(ctx: &ImportContext, base: &LegacyRow) -> Result<(String, RowOutcome)> {
    let key = mwnf3::monument_key(base)?;
    if ctx.already_imported(EntityType::Item, &key) {
        return Ok((ctx.resolve(EntityType::Item, &key)?, RowOutcome::Skipped));
    }

    let refs = ItemRefs {
        partner_id: Some(ctx.resolve_parent(
            EntityType::Partner,
            &mwnf3::institution_key(base.req_str("institution_id")?, base.req_str("country")?),
        )?),
        country_id: Some(
            ctx.resolve_parent(EntityType::Country, &mwnf3::country_key(base.req_str("country")?))?,
        ),
        project_id: Some(ctx.resolve_parent(
            EntityType::Project,
            &mwnf3::project_key(&base.req_id("project_id")?),
        )?),
    };
    let payload = mwnf3::monument(base, &refs)?;
    if ctx.dry_run {
        return Ok((DRY_RUN_ID.to_string(), RowOutcome::Imported));
    }

    let id = ctx.store.create_item(&payload).await?;
    ctx.register(EntityType::Item, &key, &id)?;
    Ok((id, RowOutcome::Imported))
}

async fn import_monument_translation(
    ctx: &ImportContext,
    row: &LegacyRow,
    item_id: &str,
) -> Result<RowOutcome> {
    let payload = mwnf3::monument_translation(row, item_id)?;
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
