//! Target system write access.
//!
//! Importers talk to the new system exclusively through [`TargetStore`], one
//! create method per entity payload, each returning the new-system id. The
//! production implementation wraps the REST API ([`ApiClient`]); tests use
//! the in-memory [`MemoryStore`].

mod api;
mod memory;

use async_trait::async_trait;

pub use api::ApiClient;
pub use memory::MemoryStore;

use crate::error::Result;
use crate::transform::{
    CountryPayload, CountryTranslationPayload, ItemPayload, ItemTranslationPayload,
    LanguagePayload, LanguageTranslationPayload, PartnerPayload, PartnerTranslationPayload,
    ProjectPayload, ProjectTranslationPayload,
};

/// Create entities in the target system.
#[async_trait]
pub trait TargetStore: Send + Sync {
    async fn create_language(&self, payload: &LanguagePayload) -> Result<String>;
    async fn create_language_translation(
        &self,
        payload: &LanguageTranslationPayload,
    ) -> Result<String>;
    async fn create_country(&self, payload: &CountryPayload) -> Result<String>;
    async fn create_country_translation(
        &self,
        payload: &CountryTranslationPayload,
    ) -> Result<String>;
    async fn create_project(&self, payload: &ProjectPayload) -> Result<String>;
    async fn create_project_translation(
        &self,
        payload: &ProjectTranslationPayload,
    ) -> Result<String>;
    async fn create_partner(&self, payload: &PartnerPayload) -> Result<String>;
    async fn create_partner_translation(
        &self,
        payload: &PartnerTranslationPayload,
    ) -> Result<String>;
    async fn create_item(&self, payload: &ItemPayload) -> Result<String>;
    async fn create_item_translation(&self, payload: &ItemTranslationPayload) -> Result<String>;
}
