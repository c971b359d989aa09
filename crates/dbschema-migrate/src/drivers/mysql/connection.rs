//! MySQL/MariaDB transport over an SQLx pool.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, ConnectOptions, Row as _, ValueRef};
use tracing::info;

use crate::config::DbConfig;
use crate::core::traits::{Connection, Connector};
use crate::core::value::Row;
use crate::drivers::common::SslMode;
use crate::error::{MigrateError, Result};

/// Connection pool timeout.
const POOL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Statement log level derived from `DbConfig::log_mode`.
pub(crate) fn statement_log_level(log_mode: &str) -> tracing::log::LevelFilter {
    match log_mode.to_lowercase().as_str() {
        "info" => tracing::log::LevelFilter::Info,
        "warn" => tracing::log::LevelFilter::Warn,
        "error" => tracing::log::LevelFilter::Error,
        _ => tracing::log::LevelFilter::Off,
    }
}

/// Opens [`MysqlConnection`]s.
#[derive(Debug, Clone, Default)]
pub struct MysqlConnector;

impl MysqlConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for MysqlConnector {
    async fn connect(&self, config: &DbConfig) -> Result<Arc<dyn Connection>> {
        Ok(Arc::new(MysqlConnection::open(config).await?))
    }
}

/// A pooled MySQL/MariaDB connection.
pub struct MysqlConnection {
    name: String,
    pool: MySqlPool,
}

impl MysqlConnection {
    pub async fn open(config: &DbConfig) -> Result<Self> {
        let options = if config.dsn.is_empty() {
            let mut options = MySqlConnectOptions::new()
                .host(&config.host)
                .port(config.effective_port())
                .database(&config.database)
                .username(&config.user)
                .password(&config.password)
                .ssl_mode(SslMode::parse(&config.ssl_mode)?.to_mysql());
            if !config.charset.is_empty() {
                options = options.charset(&config.charset);
            }
            if !config.time_zone.is_empty() {
                options = options.timezone(Some(config.time_zone.clone()));
            }
            options
        } else {
            config
                .dsn
                .parse::<MySqlConnectOptions>()
                .map_err(|e| MigrateError::Config(format!("invalid MySQL DSN: {}", e)))?
        };
        let options = options.log_statements(statement_log_level(&config.log_mode));

        let pool_settings = config.pool_settings();
        let pool = MySqlPoolOptions::new()
            .max_connections(pool_settings.max_open)
            .min_connections(pool_settings.idle_floor())
            .max_lifetime(pool_settings.max_lifetime)
            .acquire_timeout(POOL_CONNECTION_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| MigrateError::pool(e, "creating MySQL pool"))?;

        sqlx::query("SELECT 1")
            .fetch_one(&pool)
            .await
            .map_err(|e| MigrateError::pool(e, "testing MySQL connection"))?;

        info!(
            "Connected to MySQL '{}': {}:{}/{}",
            config.db_name,
            config.host,
            config.effective_port(),
            config.database
        );

        Ok(Self {
            name: config.db_name.clone(),
            pool,
        })
    }

    /// Render one cell as text, trying the decoders MySQL types map onto.
    fn cell_to_text(row: &MySqlRow, idx: usize) -> Option<String> {
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
        if let Ok(v) = row.try_get::<u64, _>(idx) {
            return Some(v.to_string());
        }
        if let Ok(v) = row.try_get::<f64, _>(idx) {
            return Some(v.to_string());
        }
        if let Ok(v) = row.try_get::<bool, _>(idx) {
            return Some(v.to_string());
        }
        if let Ok(v) = row.try_get::<chrono::NaiveDateTime, _>(idx) {
            return Some(v.to_string());
        }
        if let Ok(v) = row.try_get::<chrono::NaiveDate, _>(idx) {
            return Some(v.to_string());
        }
        row.try_get::<Vec<u8>, _>(idx)
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .ok()
    }

    fn to_row(row: &MySqlRow) -> Row {
        let mut out = Row::new();
        for (idx, column) in row.columns().iter().enumerate() {
            out.push(column.name(), Self::cell_to_text(row, idx));
        }
        out
    }
}

#[async_trait]
impl Connection for MysqlConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn dialect(&self) -> &str {
        "mysql"
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        let result = sqlx::raw_sql(sql)
            .execute(&self.pool)
            .await
            .map_err(|e| MigrateError::query("mysql", e))?;
        Ok(result.rows_affected())
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        let rows: Vec<MySqlRow> = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MigrateError::query("mysql", e))?;
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
        info!("Closed MySQL connection '{}'", self.name);
    }
}
