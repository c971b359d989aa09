//! PostgreSQL schema introspection.
//!
//! Tables come from `pg_class` so comments are available; columns and keys
//! come from `information_schema`. Column types are rebuilt from `udt_name`
//! plus the length, precision or fractional-second qualifier.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::info;

use super::dialect::PostgresDialect;
use crate::core::schema::{
    group_columns, group_columns_by_schema, group_primary_keys, group_tables, group_unique_keys,
    ColumnsBySchema, LogicDbInfo, PrimaryKeys, TableColInfo, UniqueKeys,
};
use crate::core::traits::{Connection, SchemaIntrospector, SqlDialect};
use crate::drivers::common::catalog::{fetch, require_schema, run, schema_predicate};
use crate::error::Result;

const SYSTEM_SCHEMAS: &[&str] = &["pg_catalog", "information_schema", "pg_toast"];

const COLUMN_SELECT: &str = r#"
            SELECT
                c.table_schema AS table_schema,
                c.table_name AS table_name,
                c.column_name AS column_name,
                c.udt_name || CASE
                    WHEN c.character_maximum_length IS NOT NULL
                        THEN '(' || c.character_maximum_length || ')'
                    WHEN c.udt_name = 'numeric' AND c.numeric_precision IS NOT NULL
                        THEN '(' || c.numeric_precision || ',' || COALESCE(c.numeric_scale, 0) || ')'
                    WHEN c.udt_name IN ('time', 'timetz', 'timestamp', 'timestamptz')
                        AND c.datetime_precision IS NOT NULL
                        THEN '(' || c.datetime_precision || ')'
                    ELSE ''
                END AS data_type,
                COALESCE(pg_catalog.col_description(
                    (quote_ident(c.table_schema) || '.' || quote_ident(c.table_name))::regclass,
                    c.ordinal_position::int), '') AS comments,
                CASE WHEN c.is_nullable = 'YES' THEN 1 ELSE 0 END AS is_nullable,
                c.ordinal_position AS ordinal_position
            FROM information_schema.columns c"#;

/// PostgreSQL introspector.
#[derive(Debug, Clone, Default)]
pub struct PostgresIntrospector {
    dialect: PostgresDialect,
}

impl PostgresIntrospector {
    pub fn new() -> Self {
        Self::default()
    }

    fn key_query(&self, constraint_type: &str, schema: &str, tables: &[String]) -> String {
        format!(
            r#"
            SELECT
                tc.table_name AS table_name,
                tc.constraint_name AS constraint_name,
                kcu.column_name AS column_name
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON kcu.constraint_schema = tc.constraint_schema
                AND kcu.constraint_name = tc.constraint_name
                AND kcu.table_name = tc.table_name
            WHERE tc.constraint_type = '{}'
                AND tc.table_schema = {}
                AND tc.table_name IN ({})
            ORDER BY tc.table_name, tc.constraint_name, kcu.ordinal_position"#,
            constraint_type,
            self.dialect.quote_literal(schema),
            self.dialect.literal_list(tables)
        )
    }
}

#[async_trait]
impl SchemaIntrospector for PostgresIntrospector {
    async fn list_tables(
        &self,
        conn: &dyn Connection,
        schemas: &[String],
    ) -> Result<Vec<LogicDbInfo>> {
        for schema in schemas {
            require_schema(conn, schema)?;
        }
        let sql = format!(
            r#"
            SELECT
                n.nspname AS table_schema,
                c.relname AS table_name,
                COALESCE(pg_catalog.obj_description(c.oid, 'pg_class'), '') AS comments
            FROM pg_catalog.pg_class c
            JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
            WHERE c.relkind IN ('r', 'p') AND NOT c.relispartition AND {}
            ORDER BY n.nspname, c.relname"#,
            schema_predicate(&self.dialect, "n.nspname", schemas, SYSTEM_SCHEMAS)
        );
        let dbs = group_tables(&fetch(conn, "list tables", &sql).await?)?;
        info!(
            "Found {} schema(s) with {} table(s) on '{}'",
            dbs.len(),
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
        let schemas: Vec<String> = schema.map(str::to_string).into_iter().collect();
        let sql = format!(
            "{}\n            WHERE {}\n            ORDER BY c.table_schema, c.table_name, c.ordinal_position",
            COLUMN_SELECT,
            schema_predicate(&self.dialect, "c.table_schema", &schemas, SYSTEM_SCHEMAS)
        );
        group_columns_by_schema(&fetch(conn, "list columns", &sql).await?)
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
        let sql = format!(
            "{}\n            WHERE c.table_schema = {} AND c.table_name IN ({})\n            ORDER BY c.table_name, c.ordinal_position",
            COLUMN_SELECT,
            self.dialect.quote_literal(schema),
            self.dialect.literal_list(tables)
        );
        group_columns(&fetch(conn, "list columns", &sql).await?)
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
        let sql = self.key_query("PRIMARY KEY", schema, tables);
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
        let sql = self.key_query("UNIQUE", schema, tables);
        group_unique_keys(&fetch(conn, "list unique keys", &sql).await?)
    }

    async fn create_schema(
        &self,
        conn: &dyn Connection,
        schema: &str,
        comment: &str,
    ) -> Result<()> {
        require_schema(conn, schema)?;
        let ident = self.dialect.quote_ident(schema)?;
        let comment = if comment.is_empty() { schema } else { comment };
        run(
            conn,
            "create schema",
            &format!("CREATE SCHEMA IF NOT EXISTS {}", ident),
        )
        .await?;
        run(
            conn,
            "comment schema",
            &format!(
                "COMMENT ON SCHEMA {} IS {}",
                ident,
                self.dialect.quote_literal(comment)
            ),
        )
        .await
    }
}
