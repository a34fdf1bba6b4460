//! Configuration validation.

use crate::error::{ImportError, Result};

use super::Config;

pub(super) fn validate(config: &Config) -> Result<()> {
    let mut errors = Vec::new();

    if config.legacy.host.trim().is_empty() {
        errors.push("legacy.host must not be empty".to_string());
    }
    if config.legacy.port == 0 {
        errors.push("legacy.port must not be 0".to_string());
    }
    if config.legacy.user.trim().is_empty() {
        errors.push("legacy.user must not be empty".to_string());
    }
    if config.legacy.database.trim().is_empty() {
        errors.push("legacy.database must not be empty".to_string());
    }

    if config.target.base_url.trim().is_empty() {
        errors.push("target.base_url must not be empty".to_string());
    } else if !config.target.base_url.starts_with("http://")
        && !config.target.base_url.starts_with("https://")
    {
        errors.push(format!(
            "target.base_url must be an http(s) URL, got `{}`",
            config.target.base_url
        ));
    }
    if config.target.token.trim().is_empty() {
        errors.push(
            "target.token must be set (in the file or via TARGET_API_TOKEN)".to_string(),
        );
    }

    if let Some(0) = config.import.limit {
        errors.push("import.limit must be greater than 0 when set".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ImportError::Config(errors.join("; ")))
    }
}
