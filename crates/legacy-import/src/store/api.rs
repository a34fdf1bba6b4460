//! REST client for the target inventory system.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::config::TargetApiConfig;
use crate::error::{ImportError, Result};
use crate::transform::{
    CountryPayload, CountryTranslationPayload, ItemPayload, ItemTranslationPayload,
    LanguagePayload, LanguageTranslationPayload, PartnerPayload, PartnerTranslationPayload,
    ProjectPayload, ProjectTranslationPayload,
};

use super::TargetStore;

/// Request timeout for create calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Response bodies are truncated in error detail to keep reports readable.
const MAX_DETAIL_LEN: usize = 512;

/// Bearer-token REST client wrapping the target system's API.
///
/// One instance is shared for the whole run; transport failures surface as
/// API errors with status 0 since the target never saw the request.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    /// Build a client from the target configuration.
    pub fn new(config: &TargetApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ImportError::Config(format!("building HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Check that the target API is reachable.
    pub async fn ping(&self) -> Result<()> {
        let url = format!("{}/api/health", self.base_url);
        self.http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ImportError::api(0, e.to_string()))?;
        Ok(())
    }

    async fn create<T: Serialize + Sync>(&self, path: &str, payload: &T) -> Result<String> {
        let url = format!("{}/api/{}", self.base_url, path);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .await
            .map_err(|e| ImportError::api(0, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ImportError::api(status.as_u16(), e.to_string()))?;

        if !status.is_success() {
            return Err(ImportError::api(status.as_u16(), truncate(&body)));
        }

        debug!("POST {} -> {}", path, status);
        extract_id(&body)
            .ok_or_else(|| ImportError::api(status.as_u16(), "response contains no id"))
    }
}

/// Pull the created id out of a response body: `{"data":{"id":...}}` from the
/// resource controllers, plain `{"id":...}` from the simpler endpoints.
fn extract_id(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let id = value
        .get("data")
        .and_then(|d| d.get("id"))
        .or_else(|| value.get("id"))?;
    match id {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn truncate(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= MAX_DETAIL_LEN {
        trimmed.to_string()
    } else {
        let mut cut = MAX_DETAIL_LEN;
        while !trimmed.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &trimmed[..cut])
    }
}

#[async_trait]
impl TargetStore for ApiClient {
    async fn create_language(&self, payload: &LanguagePayload) -> Result<String> {
        self.create("language", payload).await
    }

    async fn create_language_translation(
        &self,
        payload: &LanguageTranslationPayload,
    ) -> Result<String> {
        self.create("language-translation", payload).await
    }

    async fn create_country(&self, payload: &CountryPayload) -> Result<String> {
        self.create("country", payload).await
    }

    async fn create_country_translation(
        &self,
        payload: &CountryTranslationPayload,
    ) -> Result<String> {
        self.create("country-translation", payload).await
    }

    async fn create_project(&self, payload: &ProjectPayload) -> Result<String> {
        self.create("project", payload).await
    }

    async fn create_project_translation(
        &self,
        payload: &ProjectTranslationPayload,
    ) -> Result<String> {
        self.create("project-translation", payload).await
    }

    async fn create_partner(&self, payload: &PartnerPayload) -> Result<String> {
        self.create("partner", payload).await
    }

    async fn create_partner_translation(
        &self,
        payload: &PartnerTranslationPayload,
    ) -> Result<String> {
        self.create("partner-translation", payload).await
    }

    async fn create_item(&self, payload: &ItemPayload) -> Result<String> {
        self.create("item", payload).await
    }

    async fn create_item_translation(&self, payload: &ItemTranslationPayload) -> Result<String> {
        self.create("item-translation", payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_id_from_wrapped_and_flat_responses() {
        assert_eq!(
            extract_id(r#"{"data":{"id":"abc-123"}}"#).as_deref(),
            Some("abc-123")
        );
        assert_eq!(extract_id(r#"{"id":42}"#).as_deref(), Some("42"));
        assert_eq!(extract_id(r#"{"status":"ok"}"#), None);
        assert_eq!(extract_id("not json"), None);
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(2000);
        let detail = truncate(&body);
        assert!(detail.len() < 600);
        assert!(detail.ends_with("..."));
    }

    #[test]
    fn truncation_respects_multibyte_boundaries() {
        // 600 three-byte characters; a byte cut at 512 would split one.
        let body = "€".repeat(600);
        let detail = truncate(&body);
        assert!(detail.ends_with("..."));
        assert!(detail.trim_end_matches("...").chars().all(|c| c == '€'));
    }
}
