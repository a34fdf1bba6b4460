//! In-memory target store for tests and offline experiments.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ImportError, Result};
use crate::transform::{
    CountryPayload, CountryTranslationPayload, ItemPayload, ItemTranslationPayload,
    LanguagePayload, LanguageTranslationPayload, PartnerPayload, PartnerTranslationPayload,
    ProjectPayload, ProjectTranslationPayload,
};

use super::TargetStore;

/// Target store that assigns sequential ids and records every payload.
///
/// Individual creates can be forced to fail by `internal_name`, which lets
/// tests exercise API-error paths without a server.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<(String, Value)>>,
    fail_names: Mutex<HashSet<String>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force create calls whose payload `internal_name` matches to fail with
    /// a 422 API error.
    pub fn fail_for(&self, internal_name: impl Into<String>) {
        self.fail_names
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(internal_name.into());
    }

    /// All recorded payloads for one entity path.
    pub fn created(&self, entity: &str) -> Vec<Value> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|(e, _)| e == entity)
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// Number of create calls for one entity path.
    pub fn count(&self, entity: &str) -> usize {
        self.created(entity).len()
    }

    /// Total number of create calls across all entities.
    pub fn total(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn put<T: Serialize>(&self, entity: &str, payload: &T) -> Result<String> {
        let value = serde_json::to_value(payload)?;

        if let Some(name) = value.get("internal_name").and_then(Value::as_str) {
            let failing = self.fail_names.lock().unwrap_or_else(|e| e.into_inner());
            if failing.contains(name) {
                return Err(ImportError::api(422, format!("rejected {name}")));
            }
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("{entity}-{n:04}");
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((entity.to_string(), value));
        Ok(id)
    }
}

#[async_trait]
impl TargetStore for MemoryStore {
    async fn create_language(&self, payload: &LanguagePayload) -> Result<String> {
        self.put("language", payload)
    }

    async fn create_language_translation(
        &self,
        payload: &LanguageTranslationPayload,
    ) -> Result<String> {
        self.put("language-translation", payload)
    }

    async fn create_country(&self, payload: &CountryPayload) -> Result<String> {
        self.put("country", payload)
    }

    async fn create_country_translation(
        &self,
        payload: &CountryTranslationPayload,
    ) -> Result<String> {
        self.put("country-translation", payload)
    }

    async fn create_project(&self, payload: &ProjectPayload) -> Result<String> {
        self.put("project", payload)
    }

    async fn create_project_translation(
        &self,
        payload: &ProjectTranslationPayload,
    ) -> Result<String> {
        self.put("project-translation", payload)
    }

    async fn create_partner(&self, payload: &PartnerPayload) -> Result<String> {
        self.put("partner", payload)
    }

    async fn create_partner_translation(
        &self,
        payload: &PartnerTranslationPayload,
    ) -> Result<String> {
        self.put("partner-translation", payload)
    }

    async fn create_item(&self, payload: &ItemPayload) -> Result<String> {
        self.put("item", payload)
    }

    async fn create_item_translation(&self, payload: &ItemTranslationPayload) -> Result<String> {
        self.put("item-translation", payload)
    }
}
