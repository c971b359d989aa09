//! SQLite transport over an SQLx pool.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, ConnectOptions, Row as _, ValueRef};
use tracing::info;

use crate::config::DbConfig;
use crate::core::traits::{Connection, Connector};
use crate::core::value::Row;
use crate::drivers::mysql::statement_log_level;
use crate::error::{MigrateError, Result};

const POOL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// `dsn` may be an `sqlite:` URL or a bare path; `database` is a bare path.
fn connect_options(config: &DbConfig) -> Result<SqliteConnectOptions> {
    let options = if config.dsn.starts_with("sqlite:") {
        SqliteConnectOptions::from_str(&config.dsn)
            .map_err(|e| MigrateError::Config(format!("invalid SQLite DSN: {}", e)))?
    } else {
        let path = if config.dsn.is_empty() {
            &config.database
        } else {
            &config.dsn
        };
        if path.is_empty() {
            return Err(MigrateError::Config(format!(
                "SQLite database '{}' needs a file path",
                config.db_name
            )));
        }
        SqliteConnectOptions::new().filename(path)
    };
    Ok(options
        .create_if_missing(config.create_if_missing)
        .log_statements(statement_log_level(&config.log_mode)))
}

#[derive(Debug, Clone, Default)]
pub struct SqliteConnector;

impl SqliteConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for SqliteConnector {
    async fn connect(&self, config: &DbConfig) -> Result<Arc<dyn Connection>> {
        Ok(Arc::new(SqliteConnection::open(config).await?))
    }
}

/// A pooled SQLite connection.
pub struct SqliteConnection {
    name: String,
    pool: SqlitePool,
}

impl SqliteConnection {
    pub async fn open(config: &DbConfig) -> Result<Self> {
        let options = connect_options(config)?;
        let settings = config.pool_settings();
        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_open)
            .min_connections(settings.idle_floor())
            .max_lifetime(settings.max_lifetime)
            .acquire_timeout(POOL_CONNECTION_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| MigrateError::pool(e, "opening SQLite database"))?;

        info!(
            "Opened SQLite '{}': {}",
            config.db_name,
            if config.dsn.is_empty() { &config.database } else { &config.dsn }
        );

        Ok(Self {
            name: config.db_name.clone(),
            pool,
        })
    }

    fn cell_to_text(row: &SqliteRow, idx: usize) -> Option<String> {
        let is_null = row.try_get_raw(idx).map(|r| r.is_null()).unwrap_or(true);
        if is_null {
            return None;
        }
        if let Ok(v) = row.try_get::<String, _>(idx) {
            return Some(v);
        }
        if let Ok(v) = row.try_get::<i64, _>(idx) {
            return Some(v.to_string());
        }
        if let Ok(v) = row.try_get::<f64, _>(idx) {
            return Some(v.to_string());
        }
        row.try_get::<Vec<u8>, _>(idx)
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .ok()
    }

    fn to_row(row: &SqliteRow) -> Row {
        let mut out = Row::new();
        for (idx, column) in row.columns().iter().enumerate() {
            out.push(column.name(), Self::cell_to_text(row, idx));
        }
        out
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn dialect(&self) -> &str {
        "sqlite"
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        let result = sqlx::raw_sql(sql)
            .execute(&self.pool)
            .await
            .map_err(|e| MigrateError::query("sqlite", e))?;
        Ok(result.rows_affected())
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        let rows: Vec<SqliteRow> = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MigrateError::query("sqlite", e))?;
        Ok(rows.iter().map(Self::to_row).collect())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| MigrateError::connection(&self.name, e))
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Closed SQLite connection '{}'", self.name);
    }
}
