//! Backward-compatibility id tracking.
//!
//! The tracker maps `(entity type, legacy id)` pairs to new-system ids. It is
//! the mechanism behind idempotent re-runs (already-registered rows are
//! skipped) and foreign-key resolution across phases: an importer for a
//! dependent entity resolves its parents here and fails loudly when a parent
//! has not been imported, instead of silently nulling the reference.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ImportError, Result};

/// Entity types known to the import system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Language,
    LanguageTranslation,
    Country,
    CountryTranslation,
    Project,
    ProjectTranslation,
    Partner,
    PartnerTranslation,
    Item,
    ItemTranslation,
}

impl EntityType {
    /// Stable identifier used in keys, logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Language => "language",
            EntityType::LanguageTranslation => "language_translation",
            EntityType::Country => "country",
            EntityType::CountryTranslation => "country_translation",
            EntityType::Project => "project",
            EntityType::ProjectTranslation => "project_translation",
            EntityType::Partner => "partner",
            EntityType::PartnerTranslation => "partner_translation",
            EntityType::Item => "item",
            EntityType::ItemTranslation => "item_translation",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-memory (optionally persisted) map from legacy ids to new-system ids.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Tracker {
    /// Entries grouped by entity type: legacy id -> new id.
    entries: HashMap<EntityType, HashMap<String, String>>,

    /// Run-scoped metadata (e.g. the default language id) registered by
    /// reference importers and consumed by later phases.
    #[serde(default)]
    meta: HashMap<String, String>,

    /// When the tracker was last saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Utc>>,
}

impl Tracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a legacy id is already registered for this entity type.
    pub fn has(&self, entity_type: EntityType, legacy_id: &str) -> bool {
        self.entries
            .get(&entity_type)
            .is_some_and(|m| m.contains_key(legacy_id))
    }

    /// Look up the new-system id for a legacy id, if registered.
    pub fn get(&self, entity_type: EntityType, legacy_id: &str) -> Option<&str> {
        self.entries
            .get(&entity_type)
            .and_then(|m| m.get(legacy_id))
            .map(String::as_str)
    }

    /// Register a legacy id -> new id mapping.
    ///
    /// Registering the identical pair again is a no-op (tolerates retries);
    /// registering the same pair with a different new id is a
    /// [`ImportError::DuplicateRegistration`]. Entries are never overwritten.
    pub fn register(
        &mut self,
        entity_type: EntityType,
        legacy_id: impl Into<String>,
        new_id: impl Into<String>,
    ) -> Result<()> {
        let legacy_id = legacy_id.into();
        let new_id = new_id.into();

        if let Some(existing) = self.get(entity_type, &legacy_id) {
            if existing == new_id {
                return Ok(());
            }
            return Err(ImportError::DuplicateRegistration {
                entity_type,
                legacy_id,
                existing: existing.to_string(),
                attempted: new_id,
            });
        }

        self.entries
            .entry(entity_type)
            .or_default()
            .insert(legacy_id, new_id);
        Ok(())
    }

    /// Resolve a legacy foreign key to the new-system id.
    ///
    /// Fails with [`ImportError::UnresolvedReference`] when the referenced
    /// entity has not been imported yet.
    pub fn resolve(&self, entity_type: EntityType, legacy_id: &str) -> Result<String> {
        self.get(entity_type, legacy_id)
            .map(str::to_string)
            .ok_or_else(|| ImportError::UnresolvedReference {
                entity_type,
                legacy_id: legacy_id.to_string(),
            })
    }

    /// Store a run-scoped metadata value.
    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.meta.insert(key.into(), value.into());
    }

    /// Fetch a run-scoped metadata value.
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }

    /// Total number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    /// Whether the tracker holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entries for one entity type.
    pub fn count(&self, entity_type: EntityType) -> usize {
        self.entries.get(&entity_type).map_or(0, HashMap::len)
    }

    /// Load a previously saved tracker from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save the tracker to a JSON file (atomic write via temp file + rename),
    /// so interrupted runs never leave a truncated tracker behind.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.saved_at = Some(Utc::now());

        let content = serde_json::to_string_pretty(self)?;
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, &content)?;
        std::fs::rename(&temp_path, path)?;
        Ok(())
    }
}
