//! MySQL legacy source reader built on SQLx.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow, MySqlSslMode};
use sqlx::{Column, Row, TypeInfo};
use tracing::{debug, info};

use crate::config::LegacyDbConfig;
use crate::error::{ImportError, Result};

use super::{assert_single_statement, LegacyReader, LegacyRow, LegacyValue};

/// Connection pool timeout.
const POOL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// MySQL implementation of [`LegacyReader`].
///
/// Holds a single small pool for the whole run; the importer is strictly
/// sequential, so one connection is enough.
pub struct MysqlReader {
    pool: Mutex<Option<MySqlPool>>,
}

impl MysqlReader {
    /// Connect to the legacy database and verify the connection.
    ///
    /// Fails with a fatal connection error when the server is unreachable,
    /// before any importer executes.
    pub async fn connect(config: &LegacyDbConfig) -> Result<Self> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.user)
            .password(&config.password)
            .ssl_mode(MySqlSslMode::Preferred);

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(POOL_CONNECTION_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| ImportError::connection(e.to_string(), "connecting to legacy MySQL"))?;

        sqlx::query("SELECT 1")
            .fetch_one(&pool)
            .await
            .map_err(|e| ImportError::connection(e.to_string(), "testing legacy connection"))?;

        info!(
            "Connected to legacy database: {}:{}/{}",
            config.host, config.port, config.database
        );

        Ok(Self {
            pool: Mutex::new(Some(pool)),
        })
    }

    /// Release the connection. Idempotent; subsequent queries fail with
    /// [`ImportError::NotConnected`].
    pub async fn close(&self) {
        let pool = self.pool.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(pool) = pool {
            pool.close().await;
            debug!("Legacy database connection closed");
        }
    }

    fn current_pool(&self) -> Result<MySqlPool> {
        self.pool
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or(ImportError::NotConnected)
    }

    fn convert_row(table: &str, row: &MySqlRow) -> LegacyRow {
        let mut out = LegacyRow::new(table);
        for (idx, column) in row.columns().iter().enumerate() {
            out.insert(column.name(), Self::convert_cell(row, idx));
        }
        out
    }

    /// Decode one cell into a loosely-typed value. Legacy columns mix
    /// integer, decimal and text types across schema variants, so decoding
    /// is attempted by family with a lossy byte fallback.
    fn convert_cell(row: &MySqlRow, idx: usize) -> LegacyValue {
        let type_name = row.column(idx).type_info().name().to_uppercase();

        if type_name.contains("INT") || type_name == "YEAR" || type_name == "BIT" {
            if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
                return LegacyValue::Int(v);
            }
            if let Ok(Some(v)) = row.try_get::<Option<u64>, _>(idx) {
                return LegacyValue::Int(v as i64);
            }
            return LegacyValue::Null;
        }

        if type_name.contains("FLOAT") || type_name.contains("DOUBLE") {
            return match row.try_get::<Option<f64>, _>(idx) {
                Ok(Some(v)) => LegacyValue::Float(v),
                _ => LegacyValue::Null,
            };
        }

        if let Ok(Some(v)) = row.try_get::<Option<String>, _>(idx) {
            return LegacyValue::Text(v);
        }
        if let Ok(Some(v)) = row.try_get::<Option<Vec<u8>>, _>(idx) {
            return LegacyValue::Text(String::from_utf8_lossy(&v).into_owned());
        }
        LegacyValue::Null
    }
}

#[async_trait]
impl LegacyReader for MysqlReader {
    async fn query(&self, table: &str, sql: &str, params: &[LegacyValue]) -> Result<Vec<LegacyRow>> {
        assert_single_statement(sql)?;
        let pool = self.current_pool()?;

        let mut query = sqlx::query(sql);
        for param in params {
            query = match param {
                LegacyValue::Null => query.bind(Option::<String>::None),
                LegacyValue::Int(v) => query.bind(*v),
                LegacyValue::Float(v) => query.bind(*v),
                LegacyValue::Text(v) => query.bind(v.clone()),
            };
        }

        let rows = query
            .fetch_all(&pool)
            .await
            .map_err(|e| ImportError::connection(e.to_string(), format!("querying {table}")))?;

        debug!("Fetched {} rows from {}", rows.len(), table);
        Ok(rows.iter().map(|r| Self::convert_row(table, r)).collect())
    }

    async fn ping(&self) -> Result<()> {
        let pool = self.current_pool()?;
        sqlx::query("SELECT 1")
            .fetch_one(&pool)
            .await
            .map_err(|e| ImportError::connection(e.to_string(), "pinging legacy database"))?;
        Ok(())
    }
}
