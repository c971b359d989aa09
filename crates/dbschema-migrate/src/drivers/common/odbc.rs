//! ODBC transport shared by the Oracle and DM drivers.
//!
//! Neither database has a maintained async Rust client, so both go through
//! the system driver manager with `odbc-api`. ODBC calls block, so every
//! statement runs on tokio's blocking pool with a fresh connection from a
//! shared [`Environment`].
//!
//! **Requirements:**
//! - The `odbc` cargo feature must be enabled
//! - unixODBC (or the Windows driver manager) plus the vendor driver:
//!   Oracle Instant Client ODBC for `oracle`, `DM8 ODBC DRIVER` for `dm`
//!
//! Without the feature, connecting returns a configuration error that names
//! the missing feature.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::DbConfig;
use crate::core::catalog::DialectTag;
use crate::core::traits::{Connection, Connector};
use crate::error::{MigrateError, Result};

/// Connector for an ODBC-backed dialect.
#[derive(Debug, Clone)]
pub struct OdbcConnector {
    tag: DialectTag,
}

impl OdbcConnector {
    pub fn new(tag: DialectTag) -> Self {
        Self { tag }
    }
}

#[cfg(not(feature = "odbc"))]
#[async_trait]
impl Connector for OdbcConnector {
    async fn connect(&self, config: &DbConfig) -> Result<Arc<dyn Connection>> {
        let _ = config;
        Err(MigrateError::Config(format!(
            "{} support requires building with the `odbc` feature",
            self.tag
        )))
    }
}

#[cfg(feature = "odbc")]
#[async_trait]
impl Connector for OdbcConnector {
    async fn connect(&self, config: &DbConfig) -> Result<Arc<dyn Connection>> {
        let conn = imp::OdbcConnection::open(self.tag, config).await?;
        Ok(Arc::new(conn))
    }
}

#[cfg(feature = "odbc")]
mod imp {
    use std::sync::Arc;

    use async_trait::async_trait;
    use odbc_api::buffers::TextRowSet;
    use odbc_api::{ConnectionOptions, Cursor, Environment, ResultSetMetadata};
    use tokio::sync::Semaphore;
    use tracing::{debug, info};

    use crate::config::DbConfig;
    use crate::core::catalog::DialectTag;
    use crate::core::traits::Connection;
    use crate::core::value::Row;
    use crate::error::{MigrateError, Result};

    /// Rows fetched per ODBC round trip.
    const FETCH_BATCH: usize = 500;
    /// Upper bound for a single text cell.
    const MAX_STR_LEN: usize = 8192;

    pub struct OdbcConnection {
        name: String,
        tag: DialectTag,
        env: Arc<Environment>,
        connection_string: String,
        /// Caps concurrent ODBC connections at the configured pool size.
        permits: Semaphore,
    }

    impl OdbcConnection {
        pub async fn open(tag: DialectTag, config: &DbConfig) -> Result<Self> {
            let env = Environment::new().map_err(|e| {
                MigrateError::pool(
                    format!(
                        "Failed to create ODBC environment: {}. \
                         Make sure unixODBC and the {} ODBC driver are installed.",
                        e, tag
                    ),
                    "ODBC environment",
                )
            })?;

            let conn = Self {
                name: config.db_name.clone(),
                tag,
                env: Arc::new(env),
                connection_string: config.connection_string(),
                permits: Semaphore::new(config.pool_settings().max_open as usize),
            };

            conn.ping()
                .await
                .map_err(|e| MigrateError::connection(&conn.name, e))?;

            info!(
                "Connected to {} via ODBC: {}:{}/{}",
                tag,
                config.host,
                config.effective_port(),
                config.database
            );
            Ok(conn)
        }

        async fn run<T, F>(&self, sql: &str, f: F) -> Result<T>
        where
            T: Send + 'static,
            F: FnOnce(&odbc_api::Connection<'_>, &str) -> Result<T> + Send + 'static,
        {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|e| MigrateError::pool(e, "acquiring ODBC connection"))?;

            let env = Arc::clone(&self.env);
            let connection_string = self.connection_string.clone();
            let sql = sql.to_string();
            let tag = self.tag;

            tokio::task::spawn_blocking(move || {
                let conn = env
                    .connect_with_connection_string(&connection_string, ConnectionOptions::default())
                    .map_err(|e| MigrateError::pool(e, format!("opening {} ODBC connection", tag)))?;
                f(&conn, &sql)
            })
            .await
            .map_err(|e| MigrateError::query(self.tag.as_str(), e))?
        }
    }

    fn fetch_rows(conn: &odbc_api::Connection<'_>, sql: &str, tag: DialectTag) -> Result<Vec<Row>> {
        let err = |e: odbc_api::Error| MigrateError::query(tag.as_str(), e);
        let mut rows = Vec::new();

        let Some(mut cursor) = conn.execute(sql, ()).map_err(err)? else {
            return Ok(rows);
        };

        let labels = cursor
            .column_names()
            .map_err(err)?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(err)?;

        let mut buffers =
            TextRowSet::for_cursor(FETCH_BATCH, &mut cursor, Some(MAX_STR_LEN)).map_err(err)?;
        let mut row_cursor = cursor.bind_buffer(&mut buffers).map_err(err)?;

        while let Some(batch) = row_cursor.fetch().map_err(err)? {
            for row_idx in 0..batch.num_rows() {
                let mut row = Row::new();
                for (col_idx, label) in labels.iter().enumerate() {
                    let value = batch
                        .at(col_idx, row_idx)
                        .map(|bytes| String::from_utf8_lossy(bytes).into_owned());
                    row.push(label.clone(), value);
                }
                rows.push(row);
            }
        }
        Ok(rows)
    }

    #[async_trait]
    impl Connection for OdbcConnection {
        fn name(&self) -> &str {
            &self.name
        }

        fn dialect(&self) -> &str {
            self.tag.as_str()
        }

        async fn execute(&self, sql: &str) -> Result<u64> {
            debug!("{} execute: {}", self.tag, sql);
            let tag = self.tag;
            self.run(sql, move |conn, sql| {
                conn.execute(sql, ())
                    .map_err(|e| MigrateError::query(tag.as_str(), e))?;
                Ok(0)
            })
            .await
        }

        async fn query(&self, sql: &str) -> Result<Vec<Row>> {
            debug!("{} query: {}", self.tag, sql);
            let tag = self.tag;
            self.run(sql, move |conn, sql| fetch_rows(conn, sql, tag)).await
        }

        async fn ping(&self) -> Result<()> {
            let ping_sql = match self.tag {
                DialectTag::Oracle => "SELECT 1 FROM DUAL",
                _ => "SELECT 1",
            };
            self.query(ping_sql).await.map(|_| ())
        }

        async fn close(&self) {
            self.permits.close();
            info!("Closed {} ODBC connection '{}'", self.tag, self.name);
        }
    }
}
