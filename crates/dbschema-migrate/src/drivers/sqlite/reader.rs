//! SQLite schema introspection.
//!
//! SQLite has no schemas. Every requested schema name resolves to the single
//! namespace of the database file, and tables are reported under the first
//! requested name (or [`MAIN_SCHEMA`] when none is given) so callers can look
//! them up by the name they asked for. Columns come from one
//! `pragma_table_info` query per table.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, info};

use super::dialect::{SqliteDialect, MAIN_SCHEMA};
use crate::core::schema::{
    group_columns, group_primary_keys, group_tables, group_unique_keys, ColumnsBySchema,
    LogicDbInfo, PrimaryKeys, TableColInfo, UniqueKeys,
};
use crate::core::traits::{Connection, SchemaIntrospector, SqlDialect};
use crate::drivers::common::catalog::{fetch, require_schema};
use crate::error::{MigrateError, Result};

#[derive(Debug, Clone, Default)]
pub struct SqliteIntrospector {
    dialect: SqliteDialect,
}

impl SqliteIntrospector {
    pub fn new() -> Self {
        Self::default()
    }

    fn table_names_sql(&self, label: &str) -> String {
        format!(
            r#"
            SELECT {} AS table_schema, name AS table_name, '' AS comments
            FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
            ORDER BY name"#,
            self.dialect.quote_literal(label)
        )
    }

    fn table_info_sql(&self, table: &str) -> String {
        let table = self.dialect.quote_literal(table);
        format!(
            r#"
            SELECT
                {} AS table_name,
                name AS column_name,
                type AS data_type,
                '' AS comments,
                CASE WHEN "notnull" = 0 AND pk = 0 THEN 1 ELSE 0 END AS is_nullable,
                cid + 1 AS ordinal_position
            FROM pragma_table_info({})
            ORDER BY cid"#,
            table, table
        )
    }

    /// One pragma per table; a failure names the table it happened on.
    async fn columns_of(
        &self,
        conn: &dyn Connection,
        tables: &[String],
    ) -> Result<HashMap<String, TableColInfo>> {
        let mut rows = Vec::new();
        for table in tables {
            let sql = self.table_info_sql(table);
            debug!("Catalog query (table info) on '{}':\n{}", conn.name(), sql);
            let table_rows = conn
                .query(&sql)
                .await
                .map_err(|e| MigrateError::discovery(conn.name(), Some(table.as_str()), e))?;
            rows.extend(table_rows);
        }
        group_columns(&rows)
    }
}

#[async_trait]
impl SchemaIntrospector for SqliteIntrospector {
    async fn list_tables(
        &self,
        conn: &dyn Connection,
        schemas: &[String],
    ) -> Result<Vec<LogicDbInfo>> {
        for schema in schemas {
            require_schema(conn, schema)?;
        }
        let label = schemas.first().map(String::as_str).unwrap_or(MAIN_SCHEMA);
        let dbs = group_tables(&fetch(conn, "list tables", &self.table_names_sql(label)).await?)?;
        info!(
            "Found {} table(s) on '{}'",
            dbs.iter().map(|d| d.tables.len()).sum::<usize>(),
            conn.name()
        );
        Ok(dbs)
    }

    async fn list_columns(
        &self,
        conn: &dyn Connection,
        schema: Option<&str>,
    ) -> Result<ColumnsBySchema> {
        let label = schema.unwrap_or(MAIN_SCHEMA);
        let tables: Vec<String> = self
            .list_tables(conn, &[label.to_string()])
            .await?
            .iter()
            .flat_map(LogicDbInfo::table_names)
            .collect();
        let mut out = ColumnsBySchema::new();
        if !tables.is_empty() {
            out.insert(label.to_string(), self.columns_of(conn, &tables).await?);
        }
        Ok(out)
    }

    async fn list_columns_for_tables(
        &self,
        conn: &dyn Connection,
        schema: &str,
        tables: &[String],
    ) -> Result<HashMap<String, TableColInfo>> {
        require_schema(conn, schema)?;
        if tables.is_empty() {
            return Ok(HashMap::new());
        }
        self.columns_of(conn, tables).await
    }

    async fn list_primary_keys(
        &self,
        conn: &dyn Connection,
        schema: &str,
        tables: &[String],
    ) -> Result<PrimaryKeys> {
        require_schema(conn, schema)?;
        if tables.is_empty() {
            return Ok(PrimaryKeys::new());
        }
        let sql = format!(
            r#"
            SELECT m.name AS table_name, 'PRIMARY' AS constraint_name, p.name AS column_name
            FROM sqlite_master m, pragma_table_info(m.name) p
            WHERE m.type = 'table' AND m.name IN ({}) AND p.pk > 0
            ORDER BY m.name, p.pk"#,
            self.dialect.literal_list(tables)
        );
        group_primary_keys(&fetch(conn, "list primary keys", &sql).await?)
    }

    async fn list_unique_keys(
        &self,
        conn: &dyn Connection,
        schema: &str,
        tables: &[String],
    ) -> Result<UniqueKeys> {
        require_schema(conn, schema)?;
        if tables.is_empty() {
            return Ok(UniqueKeys::new());
        }
        // origin 'u' keeps UNIQUE constraints and drops the pk autoindex.
        let sql = format!(
            r#"
            SELECT m.name AS table_name, il.name AS constraint_name, ii.name AS column_name
            FROM sqlite_master m, pragma_index_list(m.name) il, pragma_index_info(il.name) ii
            WHERE m.type = 'table' AND m.name IN ({})
                AND il."unique" = 1 AND il.origin = 'u'
            ORDER BY m.name, il.name, ii.seqno"#,
            self.dialect.literal_list(tables)
        );
        group_unique_keys(&fetch(conn, "list unique keys", &sql).await?)
    }

    /// No-op: a SQLite file has one namespace and `ATTACH` needs a path.
    async fn create_schema(
        &self,
        conn: &dyn Connection,
        schema: &str,
        _comment: &str,
    ) -> Result<()> {
        require_schema(conn, schema)?;
        debug!(
            "SQLite has no schemas; '{}' maps to the main database of '{}'",
            schema,
            conn.name()
        );
        Ok(())
    }
}
