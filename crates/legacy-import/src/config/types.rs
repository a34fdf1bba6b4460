//! Configuration type definitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
///
/// Built once at process start and handed to the reader/client constructors;
/// no component performs ambient environment lookups of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Legacy database connection settings.
    pub legacy: LegacyDbConfig,

    /// Target system API settings.
    pub target: TargetApiConfig,

    /// Import behavior settings.
    #[serde(default)]
    pub import: ImportOptions,
}

/// Legacy schema variant; selects which importer phases run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SchemaVariant {
    #[default]
    #[serde(rename = "mwnf3")]
    Mwnf3,
    #[serde(rename = "mwnf3_sharing_history")]
    SharingHistory,
}

impl SchemaVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVariant::Mwnf3 => "mwnf3",
            SchemaVariant::SharingHistory => "mwnf3_sharing_history",
        }
    }
}

/// Legacy database (MySQL) connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyDbConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 3306).
    #[serde(default = "default_mysql_port")]
    pub port: u16,

    /// Username.
    pub user: String,

    /// Password. May be left empty in the file and supplied through the
    /// `LEGACY_DB_PASSWORD` environment variable at startup.
    #[serde(default)]
    pub password: String,

    /// Database name.
    pub database: String,

    /// Schema variant (default: mwnf3).
    #[serde(default)]
    pub variant: SchemaVariant,
}

/// Target system API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetApiConfig {
    /// Base URL of the target system, e.g. `https://inventory.example.org`.
    pub base_url: String,

    /// Bearer token. May be left empty in the file and supplied through the
    /// `TARGET_API_TOKEN` environment variable at startup.
    #[serde(default)]
    pub token: String,
}

/// Import behavior settings, overridable from the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Perform all read/transform/validate steps but suppress writes to the
    /// target system and the tracker.
    #[serde(default)]
    pub dry_run: bool,

    /// Per-importer row limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Detail log file path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    /// Tracker persistence path; when set, re-runs skip records imported by
    /// earlier runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracker_file: Option<PathBuf>,
}

fn default_mysql_port() -> u16 {
    3306
}
