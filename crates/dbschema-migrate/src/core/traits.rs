//! Capability traits implemented once per dialect.
//!
//! A dialect is a bundle of:
//!
//! - [`SqlDialect`]: identifier quoting and literal escaping
//! - [`TypeTranslator`](crate::dialect::TypeTranslator): native ⇄ canonical types
//! - [`SchemaIntrospector`]: catalog discovery
//! - [`DdlSynthesizer`]: `CREATE TABLE` generation and execution
//! - [`Connector`]: opens a [`Connection`] from a [`DbConfig`]
//!
//! The introspector and synthesizer only ever talk to a database through
//! [`Connection::execute`] and [`Connection::query`], so tests can swap the
//! transport for a scripted fake.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::DbConfig;
use crate::core::schema::{
    ColumnsBySchema, FieldsByTable, LogicDbInfo, PrimaryKeys, TableColInfo, UniqueKeys,
};
use crate::core::value::Row;
use crate::error::Result;

/// Quoting rules of one dialect.
pub trait SqlDialect: Send + Sync {
    /// Dialect tag, e.g. "sqlserver".
    fn name(&self) -> &str;

    /// Quote a table, column or schema name.
    fn quote_ident(&self, name: &str) -> Result<String>;

    /// Quote a string literal.
    fn quote_literal(&self, value: &str) -> String;

    /// `schema.table`, both parts quoted.
    fn qualify(&self, schema: &str, table: &str) -> Result<String> {
        Ok(format!(
            "{}.{}",
            self.quote_ident(schema)?,
            self.quote_ident(table)?
        ))
    }

    /// `'a', 'b', ...` for an `IN (...)` clause.
    fn literal_list(&self, values: &[String]) -> String {
        values
            .iter()
            .map(|v| self.quote_literal(v))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Restrict `select` to `limit` rows after skipping `offset`.
    fn paginate(&self, select: &str, offset: i64, limit: i64) -> String {
        format!("{} LIMIT {} OFFSET {}", select, limit, offset)
    }

    /// Helper column that [`SqlDialect::paginate`] adds to each row, if any.
    fn paging_column(&self) -> Option<&str> {
        None
    }
}

/// An open handle to one database.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Logical database name this handle was opened under.
    fn name(&self) -> &str;

    /// Dialect tag of the database behind this handle.
    fn dialect(&self) -> &str;

    /// Run a statement that returns no rows; yields the affected row count when known.
    async fn execute(&self, sql: &str) -> Result<u64>;

    /// Run a query and decode every row into a text row map.
    async fn query(&self, sql: &str) -> Result<Vec<Row>>;

    /// Round-trip a trivial query.
    async fn ping(&self) -> Result<()>;

    /// Release pooled resources. Further calls may fail.
    async fn close(&self);
}

/// Opens connections for one dialect.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &DbConfig) -> Result<Arc<dyn Connection>>;
}

/// Catalog discovery for one dialect.
///
/// Every method is one catalog query (SQLite loops a pragma per table) whose
/// rows are grouped with the helpers in [`crate::core::schema`]. The
/// "for tables" variants return an empty result for an empty table list.
#[async_trait]
pub trait SchemaIntrospector: Send + Sync {
    /// Tables of the given schemas, or of every non-system schema when `schemas` is empty.
    async fn list_tables(
        &self,
        conn: &dyn Connection,
        schemas: &[String],
    ) -> Result<Vec<LogicDbInfo>>;

    /// Columns of every table in `schema`, or in every non-system schema.
    async fn list_columns(
        &self,
        conn: &dyn Connection,
        schema: Option<&str>,
    ) -> Result<ColumnsBySchema>;

    /// Columns of the named tables in `schema`.
    async fn list_columns_for_tables(
        &self,
        conn: &dyn Connection,
        schema: &str,
        tables: &[String],
    ) -> Result<HashMap<String, TableColInfo>>;

    /// Primary key columns in key order.
    async fn list_primary_keys(
        &self,
        conn: &dyn Connection,
        schema: &str,
        tables: &[String],
    ) -> Result<PrimaryKeys>;

    /// Unique constraints and their columns in key order.
    async fn list_unique_keys(
        &self,
        conn: &dyn Connection,
        schema: &str,
        tables: &[String],
    ) -> Result<UniqueKeys>;

    /// Create `schema` if the dialect can do so safely; otherwise a logged no-op.
    async fn create_schema(
        &self,
        conn: &dyn Connection,
        schema: &str,
        comment: &str,
    ) -> Result<()>;
}

/// DDL produced by a synthesizer run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedDdl {
    /// All statements, in execution order.
    pub sql: String,
    /// Tables whose statement was executed.
    pub tables: Vec<String>,
    /// Fields or keys skipped, and lossy type renderings.
    pub warnings: Vec<String>,
}

/// `CREATE TABLE` generation for one dialect.
#[async_trait]
pub trait DdlSynthesizer: Send + Sync {
    /// Build one statement per table of `fields`, execute it on `conn`, and
    /// return the concatenated text. Stops at the first execution failure.
    ///
    /// A connection without a logical name is rejected before anything runs.
    async fn build_and_apply(
        &self,
        conn: &dyn Connection,
        target_schema: &str,
        primary_keys: &PrimaryKeys,
        unique_keys: &UniqueKeys,
        fields: &FieldsByTable,
    ) -> Result<GeneratedDdl>;
}
