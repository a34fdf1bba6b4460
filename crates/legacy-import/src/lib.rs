//! # legacy-import
//!
//! Import pipeline moving cultural-heritage records out of the legacy MySQL
//! databases and into the new inventory system's REST API, with support for:
//!
//! - **Two legacy schema variants** (`mwnf3` and `mwnf3_sharing_history`)
//!   with variant-specific transformers
//! - **Idempotent re-runs** via a backward-compatibility tracker that maps
//!   legacy ids to new-system ids
//! - **Row-level failure isolation**: one bad row is reported, the run
//!   continues
//! - **Dry-run mode** that reports what would be created without writing
//!   anything
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use legacy_import::{
//!     ApiClient, Config, ImportContext, MysqlReader, Orchestrator,
//! };
//!
//! #[tokio::main]
//! async fn main() -> legacy_import::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let reader = MysqlReader::connect(&config.legacy).await?;
//!     let client = ApiClient::new(&config.target)?;
//!
//!     let ctx = ImportContext::new(Arc::new(reader), Arc::new(client))
//!         .with_dry_run(config.import.dry_run);
//!     let report = Orchestrator::new(config.legacy.variant).run(&ctx).await?;
//!     println!("{}", report.render_summary());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod importers;
pub mod logging;
pub mod orchestrator;
pub mod source;
pub mod store;
pub mod tracker;
pub mod transform;

// Re-exports for convenient access
pub use config::{Config, ImportOptions, LegacyDbConfig, SchemaVariant, TargetApiConfig};
pub use error::{ImportError, Result};
pub use importers::{ImportContext, ImportResult, Importer};
pub use logging::ProgressLog;
pub use orchestrator::{Orchestrator, RunReport, Selection};
pub use source::{FixtureReader, LegacyReader, LegacyRow, LegacyValue, MysqlReader};
pub use store::{ApiClient, MemoryStore, TargetStore};
pub use tracker::{EntityType, Tracker};
