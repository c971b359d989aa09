//! Connection registry keyed by logical database name.
//!
//! Handles are opened through the connector of the dialect bundle that the
//! [`DriverCatalog`] holds for `db_type`. Opening is idempotent: concurrent
//! callers for the same name share one [`OnceCell`], so the first writer
//! wins and the others observe its handle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::config::DbConfig;
use crate::core::catalog::{DialectTag, DriverCatalog};
use crate::core::page::Pagination;
use crate::core::traits::Connection;
use crate::core::value::Row;
use crate::error::{MigrateError, Result};

type Slot = Arc<OnceCell<Arc<dyn Connection>>>;

/// Open connections by logical name.
#[derive(Default)]
pub struct ConnectionRegistry {
    slots: RwLock<HashMap<String, Slot>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Slot>> {
        self.slots.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Slot>> {
        self.slots.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Open `name` with `config`, or return the handle already stored under it.
    ///
    /// `config.db_name` is overwritten with `name` so the handle reports the
    /// logical name in errors.
    pub async fn open(
        &self,
        name: &str,
        config: &DbConfig,
        catalog: &DriverCatalog,
    ) -> Result<Arc<dyn Connection>> {
        if name.trim().is_empty() {
            return Err(MigrateError::Config(
                "logical database name must not be empty".into(),
            ));
        }
        let bundle = catalog.require(config.db_type)?;

        let slot = self
            .write()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();
        if let Some(existing) = slot.get() {
            debug!("Connection '{}' already open, reusing it", name);
            return Ok(existing.clone());
        }

        let mut config = config.clone();
        config.db_name = name.to_string();
        let created = AtomicBool::new(false);
        let opened = slot
            .get_or_try_init(|| async {
                let conn = bundle.connector.connect(&config).await?;
                created.store(true, Ordering::SeqCst);
                info!(
                    "Opened connection '{}' ({})",
                    config.db_name,
                    config.db_type.as_str()
                );
                Ok::<_, MigrateError>(conn)
            })
            .await;

        match opened {
            Ok(conn) => {
                let conn = conn.clone();
                let registered = self
                    .read()
                    .get(name)
                    .is_some_and(|s| Arc::ptr_eq(s, &slot));
                if registered {
                    return Ok(conn);
                }
                // Closed while the connect was in flight; nobody else can reach it.
                if created.load(Ordering::SeqCst) {
                    conn.close().await;
                    info!("Released connection '{}' closed during open", name);
                }
                Err(MigrateError::connection(name, "closed while opening"))
            }
            Err(e) => {
                // Drop the empty slot so a later open can retry.
                let mut slots = self.write();
                if slots
                    .get(name)
                    .is_some_and(|s| Arc::ptr_eq(s, &slot) && !s.initialized())
                {
                    slots.remove(name);
                }
                Err(e)
            }
        }
    }

    /// The open handle for `name`.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Connection>> {
        self.read()
            .get(name)
            .and_then(|slot| slot.get().cloned())
            .ok_or_else(|| MigrateError::connection(name, "no open connection by that name"))
    }

    pub async fn ping(&self, name: &str) -> Result<()> {
        self.get(name)?.ping().await
    }

    /// Remove `name` and release its handle. Unknown names are ignored.
    ///
    /// An open still in flight for `name` releases its handle itself once
    /// the connect finishes.
    pub async fn close(&self, name: &str) {
        let slot = self.write().remove(name);
        match slot.and_then(|s| s.get().cloned()) {
            Some(conn) => {
                conn.close().await;
                info!("Closed connection '{}'", name);
            }
            None => debug!("Close of unknown connection '{}' ignored", name),
        }
    }

    /// Close every open handle.
    pub async fn close_all(&self) {
        for name in self.names() {
            self.close(&name).await;
        }
    }

    /// Run `sql` on the handle for `name` and return the raw rows.
    pub async fn query_rows(&self, name: &str, sql: &str) -> Result<Vec<Row>> {
        let conn = self.get(name)?;
        debug!("Query on '{}':\n{}", name, sql);
        conn.query(sql).await
    }

    /// Read the rows of `schema.table` on `name`, one page at a time.
    ///
    /// With no `page` every row is returned. With a page, the table is
    /// counted first and `page.total`/`page.page_count` are filled in. An
    /// empty schema reads the table unqualified.
    pub async fn table_data(
        &self,
        name: &str,
        catalog: &DriverCatalog,
        schema: &str,
        table: &str,
        page: Option<&mut Pagination>,
    ) -> Result<Vec<Row>> {
        let conn = self.get(name)?;
        let tag: DialectTag = conn.dialect().parse()?;
        let dialect = catalog.require(tag)?.dialect.clone();
        let source = if schema.is_empty() {
            dialect.quote_ident(table)?
        } else {
            dialect.qualify(schema, table)?
        };
        let select = format!("SELECT * FROM {}", source);

        let Some(page) = page else {
            debug!("Full read of {} on '{}'", source, name);
            return conn.query(&select).await;
        };
        page.validate()?;

        let counted = conn
            .query(&format!("SELECT COUNT(*) AS total FROM {}", source))
            .await?;
        let total = counted
            .first()
            .and_then(|row| row.get_i64("total"))
            .ok_or_else(|| MigrateError::query(tag.as_str(), format!("no row count for {}", source)))?;
        page.set_total(total);

        let sql = dialect.paginate(&select, page.offset(), page.page_size);
        debug!(
            "Page {} of {} ({} rows) from {} on '{}':\n{}",
            page.page, page.page_count, page.page_size, source, name, sql
        );
        let mut rows = conn.query(&sql).await?;
        if let Some(helper) = dialect.paging_column() {
            for row in &mut rows {
                row.remove(helper);
            }
        }
        Ok(rows)
    }

    /// Names of the open handles, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .read()
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}
