//! Per-entity importers.
//!
//! Each importer fetches its legacy rows, transforms them, deduplicates
//! against the tracker, creates entities in the target system and registers
//! the new ids. Rows are processed independently: one bad row is recorded in
//! the result and processing continues. Only a failed legacy fetch aborts an
//! importer; that failure stays contained in the orchestrator's report.
//!
//! In dry-run mode the create call is replaced with a no-op that still counts
//! what would be created, and no tracker entry is registered, so dry runs are
//! side-effect-free and repeatable.

pub mod core;
pub mod reference;
pub mod sharing;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{ImportError, Result};
use crate::logging::ProgressLog;
use crate::source::{LegacyReader, LegacyRow};
use crate::store::TargetStore;
use crate::tracker::{EntityType, Tracker};

/// Tracker metadata key for the default language id, registered by the
/// language importer and consumed by later phases.
pub const META_DEFAULT_LANGUAGE: &str = "default_language_id";

/// Placeholder id used where dry runs need a new-system id that was never
/// created.
pub(crate) const DRY_RUN_ID: &str = "dry-run";

/// Outcome of one importer invocation.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ImportResult {
    /// True when no row produced an error.
    pub success: bool,

    /// Rows created in the target system (or counted as creatable in a dry
    /// run).
    pub imported: usize,

    /// Rows skipped because the tracker already holds them.
    pub skipped: usize,

    /// Row-level error messages, appended in processing order.
    pub errors: Vec<String>,

    /// How many of the errors were unresolved references. A systematically
    /// non-zero value points at a phase-ordering problem.
    pub unresolved_refs: usize,
}

impl ImportResult {
    /// Record a row-level failure and keep going.
    pub fn record_error(&mut self, err: &ImportError) {
        if err.is_unresolved_reference() {
            self.unresolved_refs += 1;
        }
        self.errors.push(err.to_string());
    }

    /// Seal the result, deriving the success flag.
    pub fn finish(mut self) -> Self {
        self.success = self.errors.is_empty();
        self
    }
}

/// Shared run state handed to every importer.
///
/// Importers never mutate the context other than through the tracker.
pub struct ImportContext {
    pub legacy: Arc<dyn LegacyReader>,
    pub store: Arc<dyn TargetStore>,
    pub tracker: Mutex<Tracker>,
    pub dry_run: bool,
    pub limit: Option<usize>,
    pub progress: ProgressLog,
}

impl ImportContext {
    pub fn new(legacy: Arc<dyn LegacyReader>, store: Arc<dyn TargetStore>) -> Self {
        Self {
            legacy,
            store,
            tracker: Mutex::new(Tracker::new()),
            dry_run: false,
            limit: None,
            progress: ProgressLog::silent(),
        }
    }

    pub fn with_tracker(mut self, tracker: Tracker) -> Self {
        self.tracker = Mutex::new(tracker);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_progress(mut self, progress: ProgressLog) -> Self {
        self.progress = progress;
        self
    }

    /// Lock the tracker, recovering from a poisoned lock since the tracker
    /// has no invalid intermediate states.
    pub fn tracker(&self) -> MutexGuard<'_, Tracker> {
        self.tracker.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether a legacy key is already registered for this entity type.
    pub fn already_imported(&self, entity_type: EntityType, key: &str) -> bool {
        self.tracker().has(entity_type, key)
    }

    /// Register a new-system id, unless this is a dry run.
    pub fn register(&self, entity_type: EntityType, key: &str, new_id: &str) -> Result<()> {
        if self.dry_run {
            return Ok(());
        }
        self.tracker().register(entity_type, key, new_id)
    }

    /// Resolve a legacy foreign key to the new-system id.
    pub fn resolve(&self, entity_type: EntityType, key: &str) -> Result<String> {
        self.tracker().resolve(entity_type, key)
    }

    /// The run's default language id (ISO 639-3), registered by the language
    /// importer. Falls back to English when the language phase has not run,
    /// as in a dry run or a selection window that skips it.
    pub fn default_language(&self) -> String {
        self.tracker()
            .meta(META_DEFAULT_LANGUAGE)
            .unwrap_or("eng")
            .to_string()
    }

    /// Resolve a parent reference for a dependent row. Dry runs register
    /// nothing, so a parent the same run would have created resolves to a
    /// placeholder instead of failing the row.
    pub fn resolve_parent(&self, entity_type: EntityType, key: &str) -> Result<String> {
        match self.tracker().resolve(entity_type, key) {
            Ok(id) => Ok(id),
            Err(err) if self.dry_run && err.is_unresolved_reference() => {
                Ok(DRY_RUN_ID.to_string())
            }
            Err(err) => Err(err),
        }
    }

    /// Truncate a fetched row set to the configured per-importer limit.
    pub fn apply_limit(&self, mut rows: Vec<LegacyRow>) -> Vec<LegacyRow> {
        if let Some(limit) = self.limit {
            rows.truncate(limit);
        }
        rows
    }
}

/// One importer per entity type.
#[async_trait]
pub trait Importer: Send + Sync {
    /// Stable identifier used for logging, selection and error prefixes.
    fn name(&self) -> &'static str;

    /// One-line description for `list-importers`.
    fn description(&self) -> &'static str;

    /// Run the import. `Err` means the legacy fetch itself failed; row-level
    /// failures are recorded inside the returned result instead.
    async fn run(&self, ctx: &ImportContext) -> Result<ImportResult>;
}

/// Per-row processing outcome, folded into the result by [`tally`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RowOutcome {
    Imported,
    Skipped,
}

/// Fold one row's outcome into the result and the progress channel. Errors
/// are recorded and processing continues with the next row.
pub(crate) fn tally(
    ctx: &ImportContext,
    result: &mut ImportResult,
    outcome: Result<RowOutcome>,
) {
    match outcome {
        Ok(RowOutcome::Imported) => {
            ctx.progress.imported();
            result.imported += 1;
        }
        Ok(RowOutcome::Skipped) => {
            ctx.progress.skipped();
            result.skipped += 1;
        }
        Err(err) => {
            ctx.progress.failed();
            result.record_error(&err);
        }
    }
}

/// Group denormalized rows (one row per translation language) by their
/// primary-key columns, preserving first-seen order. Each returned row is
/// tagged with the key columns for error reporting.
pub(crate) fn group_by_key(rows: Vec<LegacyRow>, key_columns: &[&str]) -> Vec<Vec<LegacyRow>> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<LegacyRow>> = HashMap::new();

    for row in rows {
        let row = row.keyed(key_columns);
        let key = row.key().unwrap_or("?").to_string();
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(row);
    }

    order.into_iter().filter_map(|k| groups.remove(&k)).collect()
}

/// Pick the row a grouped item's base record is built from: the translation
/// in the run's default language when present, otherwise the first row of
/// the group.
pub(crate) fn base_row<'a>(group: &'a [LegacyRow], default_language: &str) -> &'a LegacyRow {
    group
        .iter()
        .find(|r| {
            r.opt_str("lang")
                .and_then(|l| crate::transform::codes::language_id(r, "lang", l).ok())
                .is_some_and(|id| id == default_language)
        })
        .unwrap_or(&group[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object_row(number: &str, lang: &str) -> LegacyRow {
        LegacyRow::new("objects")
            .with("project_id", "isl")
            .with("country", "ma")
            .with("number", number)
            .with("lang", lang)
    }

    #[test]
    fn grouping_preserves_first_seen_order() {
        let rows = vec![
            object_row("2", "en"),
            object_row("1", "en"),
            object_row("2", "fr"),
            object_row("1", "ar"),
        ];
        let groups = group_by_key(rows, &["project_id", "country", "number"]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[0][0].key(), Some("isl:ma:2"));
        assert_eq!(groups[1][0].key(), Some("isl:ma:1"));
    }

    #[test]
    fn base_row_prefers_the_default_language() {
        let rows = vec![object_row("1", "fr"), object_row("1", "en")];
        let groups = group_by_key(rows, &["project_id", "country", "number"]);
        assert_eq!(base_row(&groups[0], "eng").opt_str("lang"), Some("en"));
        assert_eq!(base_row(&groups[0], "fra").opt_str("lang"), Some("fr"));
    }

    #[test]
    fn base_row_maps_legacy_language_codes_before_comparing() {
        // The legacy code for Swedish is se, not sv.
        let rows = vec![object_row("1", "en"), object_row("1", "se")];
        let groups = group_by_key(rows, &["project_id", "country", "number"]);
        assert_eq!(base_row(&groups[0], "swe").opt_str("lang"), Some("se"));
    }

    #[test]
    fn base_row_falls_back_to_first() {
        let rows = vec![object_row("1", "fr"), object_row("1", "ar")];
        let groups = group_by_key(rows, &["project_id", "country", "number"]);
        assert_eq!(base_row(&groups[0], "eng").opt_str("lang"), Some("fr"));
    }

    #[test]
    fn result_tracks_unresolved_references_separately() {
        let mut result = ImportResult::default();
        result.record_error(&ImportError::UnresolvedReference {
            entity_type: EntityType::Country,
            legacy_id: "fra".into(),
        });
        result.record_error(&ImportError::transformation("name", "countries[fr]"));

        let result = result.finish();
        assert!(!result.success);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.unresolved_refs, 1);
    }
}
