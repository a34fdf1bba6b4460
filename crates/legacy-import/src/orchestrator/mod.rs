//! Phase orchestration.
//!
//! Importers run in a fixed, hardcoded order: phase 00 loads reference data
//! (languages, countries, projects), phase 01 loads the mwnf3 core tables and
//! phase 02 loads the sharing-history tables. Which of phases 01/02 runs is
//! decided by the configured schema variant; ordering within a phase is
//! load-bearing since later importers resolve tracker entries registered by
//! earlier ones.
//!
//! A failing importer is recorded in the report and the run continues with
//! the next importer. Only failures before any importer starts (legacy
//! database unreachable, unreadable tracker file) abort the run.

use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::SchemaVariant;
use crate::error::{ImportError, Result};
use crate::importers::{
    core::{MonumentImporter, ObjectImporter, PartnerImporter, ProjectImporter},
    reference::{CountryImporter, LanguageImporter},
    sharing::{SharingMonumentImporter, SharingObjectImporter, SharingPartnerImporter},
    ImportContext, ImportResult, Importer,
};
use crate::tracker::Tracker;

/// One importer together with the phase it belongs to.
pub struct RegistryEntry {
    pub phase: &'static str,
    pub importer: Box<dyn Importer>,
}

/// The fixed importer order for a schema variant.
pub fn registry(variant: SchemaVariant) -> Vec<RegistryEntry> {
    let mut entries = vec![
        entry("00-reference", LanguageImporter),
        entry("00-reference", CountryImporter),
        entry("00-reference", ProjectImporter),
    ];
    match variant {
        SchemaVariant::Mwnf3 => {
            entries.push(entry("01-core", PartnerImporter));
            entries.push(entry("01-core", ObjectImporter));
            entries.push(entry("01-core", MonumentImporter));
        }
        SchemaVariant::SharingHistory => {
            entries.push(entry("02-sharing-history", SharingPartnerImporter));
            entries.push(entry("02-sharing-history", SharingObjectImporter));
            entries.push(entry("02-sharing-history", SharingMonumentImporter));
        }
    }
    entries
}

fn entry(phase: &'static str, importer: impl Importer + 'static) -> RegistryEntry {
    RegistryEntry {
        phase,
        importer: Box::new(importer),
    }
}

/// Subset selection over the importer order.
#[derive(Debug, Default, Clone)]
pub struct Selection {
    /// Run exactly one importer.
    pub only: Option<String>,

    /// Skip importers before this one.
    pub start_at: Option<String>,

    /// Stop after this one.
    pub stop_at: Option<String>,
}

impl Selection {
    fn validate(&self, entries: &[RegistryEntry]) -> Result<()> {
        for name in [&self.only, &self.start_at, &self.stop_at].into_iter().flatten() {
            if !entries.iter().any(|e| e.importer.name() == name) {
                let known: Vec<_> = entries.iter().map(|e| e.importer.name()).collect();
                return Err(ImportError::Config(format!(
                    "unknown importer `{name}` (known: {})",
                    known.join(", ")
                )));
            }
        }
        Ok(())
    }

    fn pick(&self, entries: Vec<RegistryEntry>) -> Vec<RegistryEntry> {
        if let Some(only) = &self.only {
            return entries
                .into_iter()
                .filter(|e| e.importer.name() == only)
                .collect();
        }

        let mut started = self.start_at.is_none();
        let mut done = false;
        entries
            .into_iter()
            .filter(|e| {
                if done {
                    return false;
                }
                if !started {
                    started = self.start_at.as_deref() == Some(e.importer.name());
                }
                let include = started;
                if include && self.stop_at.as_deref() == Some(e.importer.name()) {
                    done = true;
                }
                include
            })
            .collect()
    }
}

/// Result of one importer, tagged with its name and phase.
#[derive(Debug, Clone, Serialize)]
pub struct ImporterReport {
    pub importer: String,
    pub phase: String,
    #[serde(flatten)]
    pub result: ImportResult,
}

/// Aggregated outcome of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub variant: String,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub importers: Vec<ImporterReport>,
    pub total_imported: usize,
    pub total_skipped: usize,
    /// Flattened error list, each message prefixed with its importer name.
    pub errors: Vec<String>,
    pub unresolved_refs: usize,
}

impl RunReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Human-readable summary block for the console.
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "run {} ({}{}) finished in {:.1}s\n",
            self.run_id,
            self.variant,
            if self.dry_run { ", dry run" } else { "" },
            self.duration_secs
        ));
        for report in &self.importers {
            out.push_str(&format!(
                "  {:<14} imported {:>6}  skipped {:>6}  errors {:>4}\n",
                report.importer,
                report.result.imported,
                report.result.skipped,
                report.result.errors.len()
            ));
        }
        out.push_str(&format!(
            "  total: {} imported, {} skipped, {} errors\n",
            self.total_imported,
            self.total_skipped,
            self.errors.len()
        ));
        if self.unresolved_refs > 0 {
            out.push_str(&format!(
                "  WARNING: {} unresolved references; check the phase ordering or run the missing importers first\n",
                self.unresolved_refs
            ));
        }
        for err in &self.errors {
            out.push_str(&format!("  error: {err}\n"));
        }
        out
    }
}

/// Runs the importer phases for one schema variant.
pub struct Orchestrator {
    variant: SchemaVariant,
    selection: Selection,
    tracker_file: Option<PathBuf>,
}

impl Orchestrator {
    pub fn new(variant: SchemaVariant) -> Self {
        Self {
            variant,
            selection: Selection::default(),
            tracker_file: None,
        }
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Persist the tracker to this path after the run, and seed it from the
    /// path before the run when the file exists.
    pub fn with_tracker_file(mut self, path: Option<PathBuf>) -> Self {
        self.tracker_file = path;
        self
    }

    pub async fn run(&self, ctx: &ImportContext) -> Result<RunReport> {
        let entries = registry(self.variant);
        self.selection.validate(&entries)?;
        let entries = self.selection.pick(entries);

        // Fatal by design: nothing has run yet, so an unreachable legacy
        // database aborts instead of producing an all-error report.
        ctx.legacy.ping().await?;

        if let Some(path) = &self.tracker_file {
            if path.exists() {
                let loaded = Tracker::load(path)?;
                info!(entries = loaded.len(), "loaded tracker from {}", path.display());
                *ctx.tracker() = loaded;
            }
        }

        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let clock = Instant::now();
        info!(
            run_id = %run_id,
            variant = self.variant.as_str(),
            dry_run = ctx.dry_run,
            "starting import run"
        );

        let mut reports = Vec::with_capacity(entries.len());
        for entry in &entries {
            let name = entry.importer.name();
            ctx.progress.section(name);
            info!(importer = name, phase = entry.phase, "importer starting");

            let result = match entry.importer.run(ctx).await {
                Ok(result) => result,
                Err(err) => {
                    // The importer could not even fetch its rows; contain the
                    // failure and move on to the next one.
                    error!(importer = name, "importer failed: {}", err.format_detailed());
                    let mut result = ImportResult::default();
                    result.record_error(&err);
                    result.finish()
                }
            };

            info!(
                importer = name,
                imported = result.imported,
                skipped = result.skipped,
                errors = result.errors.len(),
                "importer finished"
            );
            reports.push(ImporterReport {
                importer: name.to_string(),
                phase: entry.phase.to_string(),
                result,
            });
        }
        ctx.progress.end_line();

        if !ctx.dry_run {
            if let Some(path) = &self.tracker_file {
                ctx.tracker().save(path)?;
                info!("tracker saved to {}", path.display());
            }
        }

        let finished_at = Utc::now();
        let report = RunReport {
            run_id,
            variant: self.variant.as_str().to_string(),
            dry_run: ctx.dry_run,
            started_at,
            finished_at,
            duration_secs: clock.elapsed().as_secs_f64(),
            total_imported: reports.iter().map(|r| r.result.imported).sum(),
            total_skipped: reports.iter().map(|r| r.result.skipped).sum(),
            errors: reports
                .iter()
                .flat_map(|r| {
                    r.result
                        .errors
                        .iter()
                        .map(move |e| format!("{}: {e}", r.importer))
                })
                .collect(),
            unresolved_refs: reports.iter().map(|r| r.result.unresolved_refs).sum(),
            importers: reports,
        };

        if report.unresolved_refs > 0 {
            warn!(
                unresolved = report.unresolved_refs,
                "run finished with unresolved references"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::source::{FixtureReader, LegacyRow};
    use crate::store::MemoryStore;
    use crate::tracker::EntityType;

    fn mwnf3_reader() -> FixtureReader {
        FixtureReader::new()
            .with_table(
                "languages",
                vec![LegacyRow::new("languages")
                    .with("code", "en")
                    .with("name", "English")],
            )
            .with_table(
                "countries",
                vec![LegacyRow::new("countries")
                    .with("code", "FRA")
                    .with("name", "France")],
            )
            .with_table(
                "projects",
                vec![LegacyRow::new("projects")
                    .with("project_id", "isl")
                    .with("name", "Islamic Art")
                    .with("active", "Y")],
            )
            .with_table(
                "museums",
                vec![LegacyRow::new("museums")
                    .with("museum_id", "louvre")
                    .with("country", "FRA")
                    .with("name", "Louvre")],
            )
            .with_table(
                "objects",
                vec![LegacyRow::new("objects")
                    .with("project_id", "isl")
                    .with("country", "FRA")
                    .with("museum_id", "louvre")
                    .with("number", "17")
                    .with("lang", "en")
                    .with("name", "Astrolabe")],
            )
    }

    fn context(reader: FixtureReader) -> (ImportContext, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let ctx = ImportContext::new(Arc::new(reader), store.clone());
        (ctx, store)
    }

    #[test]
    fn registry_order_is_fixed_per_variant() {
        let names: Vec<_> = registry(SchemaVariant::Mwnf3)
            .iter()
            .map(|e| e.importer.name())
            .collect();
        assert_eq!(
            names,
            ["languages", "countries", "projects", "partners", "objects", "monuments"]
        );

        let names: Vec<_> = registry(SchemaVariant::SharingHistory)
            .iter()
            .map(|e| e.importer.name())
            .collect();
        assert_eq!(
            names,
            ["languages", "countries", "projects", "sh-partners", "sh-objects", "sh-monuments"]
        );
    }

    #[test]
    fn selection_rejects_unknown_names() {
        let selection = Selection {
            only: Some("muesums".into()),
            ..Selection::default()
        };
        let err = selection.validate(&registry(SchemaVariant::Mwnf3)).unwrap_err();
        assert!(err.to_string().contains("muesums"));
    }

    #[test]
    fn selection_windows_the_order() {
        let selection = Selection {
            start_at: Some("countries".into()),
            stop_at: Some("partners".into()),
            ..Selection::default()
        };
        let picked: Vec<_> = selection
            .pick(registry(SchemaVariant::Mwnf3))
            .iter()
            .map(|e| e.importer.name())
            .collect();
        assert_eq!(picked, ["countries", "projects", "partners"]);
    }

    #[tokio::test]
    async fn full_mwnf3_run_aggregates_reports() {
        let (ctx, store) = context(mwnf3_reader());
        let report = Orchestrator::new(SchemaVariant::Mwnf3)
            .run(&ctx)
            .await
            .unwrap();

        assert!(!report.has_errors(), "errors: {:?}", report.errors);
        assert_eq!(report.importers.len(), 6);
        // language, country, project, partner, item, item translation
        assert_eq!(report.total_imported, 6);
        assert_eq!(store.count("item"), 1);
        assert!(ctx.tracker().has(EntityType::Item, "mwnf3:objects:isl:FRA:louvre:17"));
    }

    #[tokio::test]
    async fn rerun_is_idempotent() {
        let (ctx, store) = context(mwnf3_reader());
        let orchestrator = Orchestrator::new(SchemaVariant::Mwnf3);

        let first = orchestrator.run(&ctx).await.unwrap();
        let second = orchestrator.run(&ctx).await.unwrap();

        assert_eq!(second.total_imported, 0);
        assert_eq!(second.total_skipped, first.total_imported);
        assert_eq!(store.count("item"), 1);
    }

    #[tokio::test]
    async fn errors_are_prefixed_with_importer_name() {
        let reader = mwnf3_reader().with_table(
            "museums",
            vec![LegacyRow::new("museums")
                .with("museum_id", "louvre")
                .with("country", "FRA")],
        );
        let (ctx, _store) = context(reader);
        let report = Orchestrator::new(SchemaVariant::Mwnf3)
            .run(&ctx)
            .await
            .unwrap();

        assert!(report.has_errors());
        assert!(report.errors.iter().any(|e| e.starts_with("partners: ")));
    }

    #[tokio::test]
    async fn tracker_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");

        let (ctx, _store) = context(mwnf3_reader());
        let orchestrator =
            Orchestrator::new(SchemaVariant::Mwnf3).with_tracker_file(Some(path.clone()));
        orchestrator.run(&ctx).await.unwrap();
        assert!(path.exists());

        // A fresh context seeded from the file skips everything.
        let (ctx, store) = context(mwnf3_reader());
        let report = orchestrator.run(&ctx).await.unwrap();
        assert_eq!(report.total_imported, 0);
        assert_eq!(store.total(), 0);
    }

    #[tokio::test]
    async fn dry_run_never_writes_the_tracker_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");

        let (ctx, store) = context(mwnf3_reader());
        let ctx = ctx.with_dry_run(true);
        let report = Orchestrator::new(SchemaVariant::Mwnf3)
            .with_tracker_file(Some(path.clone()))
            .run(&ctx)
            .await
            .unwrap();

        assert!(report.dry_run);
        assert!(report.total_imported > 0);
        assert!(!path.exists());
        assert_eq!(store.total(), 0);
    }
}
