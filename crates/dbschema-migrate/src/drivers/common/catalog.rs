//! Plumbing shared by the six schema introspectors.

use tracing::debug;

use crate::core::traits::{Connection, SqlDialect};
use crate::core::value::Row;
use crate::error::{MigrateError, Result};

/// Run a catalog query, wrapping failures as discovery errors on `conn`.
pub async fn fetch(conn: &dyn Connection, what: &str, sql: &str) -> Result<Vec<Row>> {
    debug!("Catalog query ({}) on '{}':\n{}", what, conn.name(), sql);
    conn.query(sql)
        .await
        .map_err(|e| MigrateError::discovery(conn.name(), None, format!("{}: {}", what, e)))
}

/// Run a DDL-like catalog statement such as `CREATE SCHEMA`.
pub async fn run(conn: &dyn Connection, what: &str, sql: &str) -> Result<()> {
    debug!("Catalog statement ({}) on '{}':\n{}", what, conn.name(), sql);
    conn.execute(sql)
        .await
        .map(|_| ())
        .map_err(|e| MigrateError::discovery(conn.name(), None, format!("{}: {}", what, e)))
}

/// Reject an empty schema name before it reaches a catalog query.
pub fn require_schema(conn: &dyn Connection, schema: &str) -> Result<()> {
    if schema.trim().is_empty() {
        return Err(MigrateError::Config(format!(
            "a schema name is required for discovery on '{}'",
            conn.name()
        )));
    }
    Ok(())
}

/// `col = 'schema'` or, with no schema, `col NOT IN (<system schemas>)`.
pub fn schema_predicate(
    dialect: &dyn SqlDialect,
    column: &str,
    schemas: &[String],
    system: &[&str],
) -> String {
    if schemas.is_empty() {
        let system: Vec<String> = system.iter().map(|s| s.to_string()).collect();
        format!("{} NOT IN ({})", column, dialect.literal_list(&system))
    } else {
        format!("{} IN ({})", column, dialect.literal_list(schemas))
    }
}
