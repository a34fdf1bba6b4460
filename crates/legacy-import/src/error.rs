//! Error types for the import pipeline.

use thiserror::Error;

use crate::tracker::EntityType;

/// Main error type for import operations.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Legacy database unreachable or connection lost.
    #[error("Legacy database connection error: {message}\n  Context: {context}")]
    Connection { message: String, context: String },

    /// Query issued before `connect()` or after `close()`.
    #[error("Legacy database is not connected")]
    NotConnected,

    /// A required legacy field was absent or malformed.
    #[error("Transformation failed for {row}: bad or missing field `{field}`")]
    Transformation { field: String, row: String },

    /// The tracker already holds a different new-system id for this pair.
    #[error(
        "Conflicting registration for {entity_type} `{legacy_id}`: \
         already mapped to {existing}, attempted {attempted}"
    )]
    DuplicateRegistration {
        entity_type: EntityType,
        legacy_id: String,
        existing: String,
        attempted: String,
    },

    /// A referenced parent entity has not been imported yet.
    #[error("Unresolved reference: {entity_type} `{legacy_id}` has not been imported")]
    UnresolvedReference {
        entity_type: EntityType,
        legacy_id: String,
    },

    /// The target system rejected a create call.
    #[error("Target API error (status {status}): {detail}")]
    Api { status: u16, detail: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ImportError {
    /// Create a Connection error with context about where it occurred.
    pub fn connection(message: impl Into<String>, context: impl Into<String>) -> Self {
        ImportError::Connection {
            message: message.into(),
            context: context.into(),
        }
    }

    /// Create a Transformation error naming the offending field and row.
    pub fn transformation(field: impl Into<String>, row: impl Into<String>) -> Self {
        ImportError::Transformation {
            field: field.into(),
            row: row.into(),
        }
    }

    /// Create an Api error from a response status and body detail.
    pub fn api(status: u16, detail: impl Into<String>) -> Self {
        ImportError::Api {
            status,
            detail: detail.into(),
        }
    }

    /// True for errors that must abort the whole run before any importer executes.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ImportError::Config(_) | ImportError::Connection { .. } | ImportError::NotConnected
        )
    }

    /// True for a missing-dependency error, surfaced prominently in the final
    /// report because a systematic occurrence indicates a phase-ordering bug.
    pub fn is_unresolved_reference(&self) -> bool {
        matches!(self, ImportError::UnresolvedReference { .. })
    }

    /// Process exit code for fatal errors. Row-level errors never reach the
    /// process boundary; a completed run with recorded errors exits with 2
    /// from the CLI instead.
    pub fn exit_code(&self) -> u8 {
        1
    }

    /// Format error with full details including error chain.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for import operations.
pub type Result<T> = std::result::Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transformation_error_names_field_and_row() {
        let err = ImportError::transformation("code", "countries[?]");
        let msg = err.to_string();
        assert!(msg.contains("`code`"));
        assert!(msg.contains("countries[?]"));
    }

    #[test]
    fn fatal_classification() {
        assert!(ImportError::Config("bad".into()).is_fatal());
        assert!(ImportError::NotConnected.is_fatal());
        assert!(!ImportError::api(422, "validation failed").is_fatal());
        assert!(!ImportError::UnresolvedReference {
            entity_type: EntityType::Country,
            legacy_id: "fr".into(),
        }
        .is_fatal());
    }

    #[test]
    fn unresolved_reference_detection() {
        let err = ImportError::UnresolvedReference {
            entity_type: EntityType::Partner,
            legacy_id: "mwnf3:museums:ma:louvre".into(),
        };
        assert!(err.is_unresolved_reference());
        assert!(!ImportError::api(500, "boom").is_unresolved_reference());
    }
}
