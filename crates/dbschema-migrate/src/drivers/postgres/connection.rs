//! PostgreSQL transport over a deadpool-postgres pool.
//!
//! Catalog queries go through the simple query protocol, which returns every
//! value as text and needs no per-type decoding.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::{Config as PgConfig, SimpleQueryMessage};
use tracing::{info, warn};

use crate::config::DbConfig;
use crate::core::traits::{Connection, Connector};
use crate::core::value::Row;
use crate::drivers::common::{SslMode, TlsBuilder};
use crate::error::{MigrateError, Result};

/// How long to wait for a pooled client.
const POOL_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Opens [`PostgresConnection`]s.
#[derive(Debug, Clone, Default)]
pub struct PostgresConnector;

impl PostgresConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for PostgresConnector {
    async fn connect(&self, config: &DbConfig) -> Result<Arc<dyn Connection>> {
        Ok(Arc::new(PostgresConnection::open(config).await?))
    }
}

fn pg_config(config: &DbConfig) -> Result<PgConfig> {
    if !config.dsn.is_empty() {
        return config
            .dsn
            .parse::<PgConfig>()
            .map_err(|e| MigrateError::Config(format!("invalid PostgreSQL DSN: {}", e)));
    }
    let mut pg = PgConfig::new();
    pg.host(&config.host);
    pg.port(config.effective_port());
    pg.dbname(&config.database);
    pg.user(&config.user);
    pg.password(&config.password);
    pg.application_name("dbschema-migrate");
    if !config.time_zone.is_empty() {
        pg.options(&format!("-c TimeZone={}", config.time_zone));
    }
    Ok(pg)
}

/// A pooled PostgreSQL connection.
pub struct PostgresConnection {
    name: String,
    pool: Pool,
}

impl PostgresConnection {
    pub async fn open(config: &DbConfig) -> Result<Self> {
        let pg = pg_config(config)?;
        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let max_size = config.pool_settings().max_open as usize;

        let ssl_mode = SslMode::parse(&config.ssl_mode)?;
        let mgr = match TlsBuilder::new(ssl_mode).build()? {
            Some(tls) => Manager::from_config(pg, tls, mgr_config),
            None => {
                if ssl_mode == SslMode::Disable {
                    warn!("PostgreSQL TLS is disabled for '{}'", config.db_name);
                }
                Manager::from_config(pg, tokio_postgres::NoTls, mgr_config)
            }
        };
        let pool = Pool::builder(mgr)
            .max_size(max_size)
            .runtime(Runtime::Tokio1)
            .wait_timeout(Some(POOL_WAIT_TIMEOUT))
            .build()
            .map_err(|e| MigrateError::pool(e, "creating PostgreSQL pool"))?;

        let client = pool
            .get()
            .await
            .map_err(|e| MigrateError::pool(e, "testing PostgreSQL connection"))?;
        client.simple_query("SELECT 1").await?;

        info!(
            "Connected to PostgreSQL '{}': {}:{}/{}",
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

    async fn client(&self) -> Result<deadpool_postgres::Object> {
        self.pool
            .get()
            .await
            .map_err(|e| MigrateError::pool(e, format!("getting connection for '{}'", self.name)))
    }
}

#[async_trait]
impl Connection for PostgresConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn dialect(&self) -> &str {
        "postgres"
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        let client = self.client().await?;
        let messages = client.simple_query(sql).await?;
        Ok(messages
            .iter()
            .map(|m| match m {
                SimpleQueryMessage::CommandComplete(n) => *n,
                _ => 0,
            })
            .sum())
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        let client = self.client().await?;
        let messages = client.simple_query(sql).await?;
        let mut rows = Vec::new();
        for message in messages {
            if let SimpleQueryMessage::Row(r) = message {
                let mut row = Row::new();
                for (idx, column) in r.columns().iter().enumerate() {
                    row.push(column.name(), r.get(idx).map(str::to_string));
                }
                rows.push(row);
            }
        }
        Ok(rows)
    }

    async fn ping(&self) -> Result<()> {
        let client = self
            .client()
            .await
            .map_err(|e| MigrateError::connection(&self.name, e))?;
        client
            .simple_query("SELECT 1")
            .await
            .map(|_| ())
            .map_err(|e| MigrateError::connection(&self.name, e))
    }

    async fn close(&self) {
        self.pool.close();
        info!("Closed PostgreSQL connection '{}'", self.name);
    }
}
