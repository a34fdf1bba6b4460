//! Configuration loading and validation.
//!
//! Configuration is a YAML file with three sections: `legacy` (source
//! database), `target` (destination API) and `import` (run behavior).
//! Secrets may be omitted from the file and supplied through environment
//! variables; overrides are applied once at load time.

mod types;
mod validation;

use std::path::Path;

pub use types::{Config, ImportOptions, LegacyDbConfig, SchemaVariant, TargetApiConfig};

use crate::error::{ImportError, Result};

/// Environment variable that fills an empty `legacy.password`.
pub const ENV_DB_PASSWORD: &str = "LEGACY_DB_PASSWORD";

/// Environment variable that fills an empty `target.token`.
pub const ENV_API_TOKEN: &str = "TARGET_API_TOKEN";

impl Config {
    /// Load configuration from a YAML file, apply environment overrides and
    /// validate the result.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ImportError::Config(format!("reading {}: {e}", path.display()))
        })?;
        Self::from_yaml(&raw)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let mut config: Config = serde_yaml::from_str(raw)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Fill empty secrets from the environment. File values win when present.
    fn apply_env_overrides(&mut self) {
        if self.legacy.password.is_empty() {
            if let Ok(password) = std::env::var(ENV_DB_PASSWORD) {
                self.legacy.password = password;
            }
        }
        if self.target.token.is_empty() {
            if let Ok(token) = std::env::var(ENV_API_TOKEN) {
                self.target.token = token;
            }
        }
    }

    /// Check the configuration for structural problems.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}
