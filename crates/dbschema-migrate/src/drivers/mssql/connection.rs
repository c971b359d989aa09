//! SQL Server transport over a bb8 pool of Tiberius clients.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tiberius::{AuthMethod, Client, ColumnData, Config, FromSql};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

use crate::config::DbConfig;
use crate::core::traits::{Connection, Connector};
use crate::core::value::Row;
use crate::drivers::common::SslMode;
use crate::error::{MigrateError, Result};

const POOL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

fn tiberius_config(config: &DbConfig) -> Result<Config> {
    if !config.dsn.is_empty() {
        return Config::from_ado_string(&config.dsn)
            .map_err(|e| MigrateError::Config(format!("invalid SQL Server DSN: {}", e)));
    }
    let ssl_mode = SslMode::parse(&config.ssl_mode)?;
    let mut tds = Config::new();
    tds.host(&config.host);
    tds.port(config.effective_port());
    tds.database(&config.database);
    tds.authentication(AuthMethod::sql_server(&config.user, &config.password));
    tds.application_name("dbschema-migrate");
    tds.encryption(ssl_mode.encryption_level());
    if ssl_mode.trust_server_certificate() {
        tds.trust_cert();
    }
    Ok(tds)
}

struct TiberiusConnectionManager {
    config: Config,
}

#[async_trait]
impl bb8::ManageConnection for TiberiusConnectionManager {
    type Connection = Client<Compat<TcpStream>>;
    type Error = tiberius::error::Error;

    async fn connect(&self) -> std::result::Result<Self::Connection, Self::Error> {
        let tcp = TcpStream::connect(self.config.get_addr())
            .await
            .map_err(|e| tiberius::error::Error::Io {
                kind: e.kind(),
                message: e.to_string(),
            })?;
        tcp.set_nodelay(true).ok();
        Client::connect(self.config.clone(), tcp.compat_write()).await
    }

    async fn is_valid(&self, conn: &mut Self::Connection) -> std::result::Result<(), Self::Error> {
        conn.simple_query("SELECT 1").await?.into_row().await?;
        Ok(())
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

/// Opens [`MssqlConnection`]s.
#[derive(Debug, Clone, Default)]
pub struct MssqlConnector;

impl MssqlConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for MssqlConnector {
    async fn connect(&self, config: &DbConfig) -> Result<Arc<dyn Connection>> {
        Ok(Arc::new(MssqlConnection::open(config).await?))
    }
}

/// A pooled SQL Server connection.
pub struct MssqlConnection {
    name: String,
    pool: Pool<TiberiusConnectionManager>,
}

impl MssqlConnection {
    pub async fn open(config: &DbConfig) -> Result<Self> {
        let manager = TiberiusConnectionManager {
            config: tiberius_config(config)?,
        };
        let settings = config.pool_settings();
        let pool = Pool::builder()
            .max_size(settings.max_open)
            .min_idle(Some(settings.idle_floor()))
            .max_lifetime(Some(settings.max_lifetime))
            .connection_timeout(POOL_CONNECTION_TIMEOUT)
            .build(manager)
            .await
            .map_err(|e| MigrateError::pool(e, "creating SQL Server pool"))?;

        {
            let mut client = pool
                .get()
                .await
                .map_err(|e| MigrateError::pool(e, "testing SQL Server connection"))?;
            client.simple_query("SELECT 1").await?.into_row().await?;
        }

        info!(
            "Connected to SQL Server '{}': {}:{}/{} (pool_size={})",
            config.db_name,
            config.host,
            config.effective_port(),
            config.database,
            settings.max_open
        );

        Ok(Self {
            name: config.db_name.clone(),
            pool,
        })
    }

    async fn client(&self) -> Result<PooledConnection<'_, TiberiusConnectionManager>> {
        self.pool
            .get()
            .await
            .map_err(|e| MigrateError::pool(e, format!("getting connection for '{}'", self.name)))
    }
}

/// Render one cell as text; NULL stays `None`.
fn cell_to_text(data: &ColumnData<'static>) -> Option<String> {
    match data {
        ColumnData::U8(v) => v.map(|v| v.to_string()),
        ColumnData::I16(v) => v.map(|v| v.to_string()),
        ColumnData::I32(v) => v.map(|v| v.to_string()),
        ColumnData::I64(v) => v.map(|v| v.to_string()),
        ColumnData::F32(v) => v.map(|v| v.to_string()),
        ColumnData::F64(v) => v.map(|v| v.to_string()),
        ColumnData::Bit(v) => v.map(|v| if v { "1" } else { "0" }.to_string()),
        ColumnData::String(v) => v.as_ref().map(|s| s.to_string()),
        ColumnData::Guid(v) => v.map(|g| g.to_string()),
        ColumnData::Numeric(v) => v.map(|n| n.to_string()),
        ColumnData::Binary(v) => v
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned()),
        ColumnData::Xml(v) => v.as_ref().map(|x| x.clone().into_owned().into_string()),
        ColumnData::Date(_) => NaiveDate::from_sql(data).ok().flatten().map(|d| d.to_string()),
        ColumnData::Time(_) => NaiveTime::from_sql(data).ok().flatten().map(|t| t.to_string()),
        ColumnData::DateTimeOffset(_) => DateTime::<Utc>::from_sql(data)
            .ok()
            .flatten()
            .map(|t| t.to_rfc3339()),
        _ => NaiveDateTime::from_sql(data)
            .ok()
            .flatten()
            .map(|t| t.to_string()),
    }
}

#[async_trait]
impl Connection for MssqlConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn dialect(&self) -> &str {
        "sqlserver"
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        let mut client = self.client().await?;
        let result = client.execute(sql, &[]).await?;
        Ok(result.total())
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        let mut client = self.client().await?;
        let rows = client.simple_query(sql).await?.into_first_result().await?;
        debug!("'{}' returned {} row(s)", self.name, rows.len());
        Ok(rows
            .iter()
            .map(|r| Row::from_pairs(r.cells().map(|(col, data)| (col.name(), cell_to_text(data)))))
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        let mut client = self
            .client()
            .await
            .map_err(|e| MigrateError::connection(&self.name, e))?;
        let result = client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| MigrateError::connection(&self.name, e))?
            .into_row()
            .await
            .map(|_| ())
            .map_err(|e| MigrateError::connection(&self.name, e));
        result
    }

    async fn close(&self) {
        // bb8 drops idle clients with the pool; nothing to flush.
        info!("Closed SQL Server connection '{}'", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    use crate::core::catalog::DialectTag;

    #[test]
    fn test_config_from_fields() {
        let mut cfg = DbConfig::new(DialectTag::SqlServer);
        cfg.host = "mssql".into();
        cfg.database = "app".into();
        let tds = tiberius_config(&cfg).unwrap();
        assert_eq!(tds.get_addr(), "mssql:1433");
    }

    #[test]
    fn test_config_from_ado_string() {
        let mut cfg = DbConfig::new(DialectTag::SqlServer);
        cfg.dsn = "server=tcp:db,14330;database=app;user=sa;password=x;TrustServerCertificate=true".into();
        let tds = tiberius_config(&cfg).unwrap();
        assert_eq!(tds.get_addr(), "db:14330");
    }

    #[test]
    fn test_cell_to_text() {
        assert_eq!(cell_to_text(&ColumnData::I32(Some(7))), Some("7".to_string()));
        assert_eq!(cell_to_text(&ColumnData::Bit(Some(true))), Some("1".to_string()));
        assert_eq!(
            cell_to_text(&ColumnData::String(Some(Cow::Borrowed("nvarchar(50)")))),
            Some("nvarchar(50)".to_string())
        );
        assert_eq!(cell_to_text(&ColumnData::String(None)), None);
    }
}
