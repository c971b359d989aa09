//! SQL Server schema introspection.
//!
//! Reads the `sys.*` catalog views. Column types are joined to their base
//! system type and rebuilt with their qualifier, `max` included;
//! `nvarchar`/`nchar` lengths are converted from bytes to characters.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, info};

use super::dialect::MssqlDialect;
use crate::core::schema::{
    group_columns, group_columns_by_schema, group_primary_keys, group_tables, group_unique_keys,
    ColumnsBySchema, LogicDbInfo, PrimaryKeys, TableColInfo, UniqueKeys,
};
use crate::core::traits::{Connection, SchemaIntrospector, SqlDialect};
use crate::drivers::common::catalog::{fetch, require_schema, run, schema_predicate};
use crate::error::Result;

const SYSTEM_SCHEMAS: &[&str] = &["sys", "INFORMATION_SCHEMA", "guest"];

const COLUMN_SELECT: &str = r#"
            SELECT
                s.name AS table_schema,
                t.name AS table_name,
                c.name AS column_name,
                ty.name + CASE
                    WHEN ty.name IN ('varchar', 'char', 'varbinary', 'binary')
                        THEN '(' + CASE WHEN c.max_length = -1 THEN 'max'
                            ELSE CAST(c.max_length AS VARCHAR(10)) END + ')'
                    WHEN ty.name IN ('nvarchar', 'nchar')
                        THEN '(' + CASE WHEN c.max_length = -1 THEN 'max'
                            ELSE CAST(c.max_length / 2 AS VARCHAR(10)) END + ')'
                    WHEN ty.name IN ('decimal', 'numeric')
                        THEN '(' + CAST(c.precision AS VARCHAR(10)) + ','
                            + CAST(c.scale AS VARCHAR(10)) + ')'
                    WHEN ty.name IN ('datetime2', 'time', 'datetimeoffset')
                        THEN '(' + CAST(c.scale AS VARCHAR(10)) + ')'
                    ELSE ''
                END AS data_type,
                CAST(ISNULL(ep.value, '') AS NVARCHAR(4000)) AS comments,
                CAST(c.is_nullable AS INT) AS is_nullable,
                c.column_id AS ordinal_position
            FROM sys.columns c
            JOIN sys.tables t ON t.object_id = c.object_id
            JOIN sys.schemas s ON s.schema_id = t.schema_id
            JOIN sys.types ty ON ty.user_type_id = c.system_type_id
            LEFT JOIN sys.extended_properties ep
                ON ep.class = 1 AND ep.major_id = c.object_id
                AND ep.minor_id = c.column_id AND ep.name = 'MS_Description'"#;

/// SQL Server introspector.
#[derive(Debug, Clone, Default)]
pub struct MssqlIntrospector {
    dialect: MssqlDialect,
}

impl MssqlIntrospector {
    pub fn new() -> Self {
        Self::default()
    }

    fn key_query(&self, kind: &str, schema: &str, tables: &[String]) -> String {
        format!(
            r#"
            SELECT
                t.name AS table_name,
                kc.name AS constraint_name,
                c.name AS column_name
            FROM sys.key_constraints kc
            JOIN sys.tables t ON t.object_id = kc.parent_object_id
            JOIN sys.schemas s ON s.schema_id = t.schema_id
            JOIN sys.index_columns ic
                ON ic.object_id = kc.parent_object_id AND ic.index_id = kc.unique_index_id
            JOIN sys.columns c ON c.object_id = ic.object_id AND c.column_id = ic.column_id
            WHERE kc.type = '{}'
                AND s.name = {}
                AND t.name IN ({})
            ORDER BY t.name, kc.name, ic.key_ordinal"#,
            kind,
            self.dialect.quote_literal(schema),
            self.dialect.literal_list(tables)
        )
    }
}

#[async_trait]
impl SchemaIntrospector for MssqlIntrospector {
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
                s.name AS table_schema,
                t.name AS table_name,
                CAST(ISNULL(ep.value, '') AS NVARCHAR(4000)) AS comments
            FROM sys.tables t
            JOIN sys.schemas s ON s.schema_id = t.schema_id
            LEFT JOIN sys.extended_properties ep
                ON ep.class = 1 AND ep.major_id = t.object_id
                AND ep.minor_id = 0 AND ep.name = 'MS_Description'
            WHERE t.is_ms_shipped = 0 AND {}
            ORDER BY s.name, t.name"#,
            schema_predicate(&self.dialect, "s.name", schemas, SYSTEM_SCHEMAS)
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
            "{}\n            WHERE {}\n            ORDER BY s.name, t.name, c.column_id",
            COLUMN_SELECT,
            schema_predicate(&self.dialect, "s.name", &schemas, SYSTEM_SCHEMAS)
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
            "{}\n            WHERE s.name = {} AND t.name IN ({})\n            ORDER BY t.name, c.column_id",
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
        let sql = self.key_query("PK", schema, tables);
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
        let sql = self.key_query("UQ", schema, tables);
        group_unique_keys(&fetch(conn, "list unique keys", &sql).await?)
    }

    async fn create_schema(
        &self,
        conn: &dyn Connection,
        schema: &str,
        comment: &str,
    ) -> Result<()> {
        require_schema(conn, schema)?;
        if !comment.is_empty() {
            debug!("SQL Server schema comments are not written, ignoring '{}'", comment);
        }
        // CREATE SCHEMA must be the only statement in its batch.
        let create = format!("CREATE SCHEMA {}", self.dialect.quote_ident(schema)?);
        let sql = format!(
            "IF NOT EXISTS (SELECT * FROM sys.schemas WHERE name = {}) EXEC({})",
            self.dialect.quote_literal(schema),
            self.dialect.quote_literal(&create)
        );
        run(conn, "create schema", &sql).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{row, ScriptedConnection};

    #[tokio::test]
    async fn test_create_schema_is_guarded() {
        let conn = ScriptedConnection::new("dst", "sqlserver");
        MssqlIntrospector::new()
            .create_schema(&conn, "sales", "")
            .await
            .unwrap();
        assert_eq!(
            conn.executed(),
            vec!["IF NOT EXISTS (SELECT * FROM sys.schemas WHERE name = N'sales') EXEC(N'CREATE SCHEMA [sales]')"]
        );
    }

    #[tokio::test]
    async fn test_primary_keys_use_key_ordinal() {
        let conn = ScriptedConnection::new("src", "sqlserver").on_query(
            "kc.type = 'PK'",
            vec![
                row(&[("table_name", "lines"), ("constraint_name", "PK_lines"), ("column_name", "order_id")]),
                row(&[("table_name", "lines"), ("constraint_name", "PK_lines"), ("column_name", "line_no")]),
            ],
        );
        let pks = MssqlIntrospector::new()
            .list_primary_keys(&conn, "dbo", &["lines".to_string()])
            .await
            .unwrap();
        assert_eq!(pks["lines"], vec!["order_id", "line_no"]);
        let sql = &conn.log()[0];
        assert!(sql.contains("s.name = N'dbo'"));
        assert!(sql.contains("ORDER BY t.name, kc.name, ic.key_ordinal"));
    }

    #[tokio::test]
    async fn test_list_tables() {
        let conn = ScriptedConnection::new("src", "sqlserver").on_query(
            "sys.tables",
            vec![row(&[("table_schema", "dbo"), ("table_name", "Users"), ("comments", "")])],
        );
        let dbs = MssqlIntrospector::new().list_tables(&conn, &[]).await.unwrap();
        assert_eq!(dbs[0].table_names(), vec!["Users"]);
        assert!(conn.log()[0].contains("s.name NOT IN (N'sys', N'INFORMATION_SCHEMA', N'guest')"));
    }
}
