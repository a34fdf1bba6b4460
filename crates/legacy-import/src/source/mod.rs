//! Legacy database access.
//!
//! The [`LegacyReader`] trait is the importers' only view of the legacy
//! source: parameterized queries returning [`LegacyRow`] mappings. The
//! production implementation is [`MysqlReader`]; tests run against the
//! in-memory [`FixtureReader`].

mod mysql;
mod row;

use std::collections::HashMap;

use async_trait::async_trait;

pub use mysql::MysqlReader;
pub use row::{LegacyRow, LegacyValue};

use crate::error::{ImportError, Result};

/// Read-only access to a legacy database.
#[async_trait]
pub trait LegacyReader: Send + Sync {
    /// Execute a parameterized statement and return zero or more rows.
    ///
    /// `table` names the logical source table used to tag returned rows.
    async fn query(&self, table: &str, sql: &str, params: &[LegacyValue]) -> Result<Vec<LegacyRow>>;

    /// Execute a parameterized statement and return the first row, or `None`
    /// for an empty result. Never errors on empty results.
    async fn query_one(
        &self,
        table: &str,
        sql: &str,
        params: &[LegacyValue],
    ) -> Result<Option<LegacyRow>> {
        Ok(self.query(table, sql, params).await?.into_iter().next())
    }

    /// Verify the connection is alive.
    async fn ping(&self) -> Result<()>;
}

/// Reject multi-statement SQL before it reaches the driver. Batched
/// statements are the injection vector parameterization alone does not cover.
pub(crate) fn assert_single_statement(sql: &str) -> Result<()> {
    if sql.trim().trim_end_matches(';').contains(';') {
        return Err(ImportError::connection(
            "multi-statement SQL rejected",
            format!("query: {}", sql.trim()),
        ));
    }
    Ok(())
}

/// In-memory reader serving canned rows per table, for tests.
#[derive(Debug, Default)]
pub struct FixtureReader {
    tables: HashMap<String, Vec<LegacyRow>>,
}

impl FixtureReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register fixture rows for a table.
    pub fn with_table(mut self, table: impl Into<String>, rows: Vec<LegacyRow>) -> Self {
        self.tables.insert(table.into(), rows);
        self
    }
}

#[async_trait]
impl LegacyReader for FixtureReader {
    async fn query(
        &self,
        table: &str,
        sql: &str,
        _params: &[LegacyValue],
    ) -> Result<Vec<LegacyRow>> {
        assert_single_statement(sql)?;
        Ok(self.tables.get(table).cloned().unwrap_or_default())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_reader_serves_registered_rows() {
        let reader = FixtureReader::new().with_table(
            "countries",
            vec![LegacyRow::new("countries").with("code", "fr")],
        );

        let rows = reader
            .query("countries", "SELECT * FROM countries", &[])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);

        let none = reader
            .query_one("museums", "SELECT * FROM museums", &[])
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn multi_statement_sql_is_rejected() {
        let reader = FixtureReader::new();
        let err = reader
            .query("countries", "SELECT 1; DROP TABLE countries", &[])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("multi-statement"));
    }

    #[test]
    fn trailing_semicolon_is_allowed() {
        assert!(assert_single_statement("SELECT * FROM countries;").is_ok());
        assert!(assert_single_statement("SELECT 1; SELECT 2").is_err());
    }
}
