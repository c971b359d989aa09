//! MySQL/MariaDB schema introspection.
//!
//! Reads `information_schema`. Catalog text columns are cast to `CHAR` since
//! MySQL 8 reports several of them as binary strings.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, info};

use super::dialect::MysqlDialect;
use crate::core::schema::{
    group_columns, group_columns_by_schema, group_primary_keys, group_tables, group_unique_keys,
    ColumnsBySchema, LogicDbInfo, PrimaryKeys, TableColInfo, UniqueKeys,
};
use crate::core::traits::{Connection, SchemaIntrospector, SqlDialect};
use crate::drivers::common::catalog::{fetch, require_schema, run, schema_predicate};
use crate::error::Result;

const SYSTEM_SCHEMAS: &[&str] = &["information_schema", "mysql", "performance_schema", "sys"];

const COLUMN_SELECT: &str = r#"
            SELECT
                CAST(TABLE_SCHEMA AS CHAR(255)) AS table_schema,
                CAST(TABLE_NAME AS CHAR(255)) AS table_name,
                CAST(COLUMN_NAME AS CHAR(255)) AS column_name,
                CAST(COLUMN_TYPE AS CHAR(255)) AS data_type,
                CAST(COLUMN_COMMENT AS CHAR(1024)) AS comments,
                IF(IS_NULLABLE = 'YES', 1, 0) AS is_nullable,
                CAST(ORDINAL_POSITION AS SIGNED) AS ordinal_position
            FROM information_schema.COLUMNS"#;

/// MySQL/MariaDB introspector.
#[derive(Debug, Clone, Default)]
pub struct MysqlIntrospector {
    dialect: MysqlDialect,
}

impl MysqlIntrospector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SchemaIntrospector for MysqlIntrospector {
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
                CAST(TABLE_SCHEMA AS CHAR(255)) AS table_schema,
                CAST(TABLE_NAME AS CHAR(255)) AS table_name,
                CAST(TABLE_COMMENT AS CHAR(2048)) AS comments
            FROM information_schema.TABLES
            WHERE TABLE_TYPE = 'BASE TABLE' AND {}
            ORDER BY TABLE_SCHEMA, TABLE_NAME"#,
            schema_predicate(&self.dialect, "TABLE_SCHEMA", schemas, SYSTEM_SCHEMAS)
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
            "{}\n            WHERE {}\n            ORDER BY TABLE_SCHEMA, TABLE_NAME, ORDINAL_POSITION",
            COLUMN_SELECT,
            schema_predicate(&self.dialect, "TABLE_SCHEMA", &schemas, SYSTEM_SCHEMAS)
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
            "{}\n            WHERE TABLE_SCHEMA = {} AND TABLE_NAME IN ({})\n            ORDER BY TABLE_NAME, ORDINAL_POSITION",
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
        let sql = format!(
            r#"
            SELECT
                CAST(TABLE_NAME AS CHAR(255)) AS table_name,
                CAST(COLUMN_NAME AS CHAR(255)) AS column_name
            FROM information_schema.KEY_COLUMN_USAGE
            WHERE CONSTRAINT_NAME = 'PRIMARY'
                AND TABLE_SCHEMA = {}
                AND TABLE_NAME IN ({})
            ORDER BY TABLE_NAME, ORDINAL_POSITION"#,
            self.dialect.quote_literal(schema),
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
        let sql = format!(
            r#"
            SELECT
                CAST(k.TABLE_NAME AS CHAR(255)) AS table_name,
                CAST(k.CONSTRAINT_NAME AS CHAR(255)) AS constraint_name,
                CAST(k.COLUMN_NAME AS CHAR(255)) AS column_name
            FROM information_schema.TABLE_CONSTRAINTS c
            JOIN information_schema.KEY_COLUMN_USAGE k
                ON k.CONSTRAINT_SCHEMA = c.CONSTRAINT_SCHEMA
                AND k.TABLE_NAME = c.TABLE_NAME
                AND k.CONSTRAINT_NAME = c.CONSTRAINT_NAME
            WHERE c.CONSTRAINT_TYPE = 'UNIQUE'
                AND c.TABLE_SCHEMA = {}
                AND c.TABLE_NAME IN ({})
            ORDER BY k.TABLE_NAME, k.CONSTRAINT_NAME, k.ORDINAL_POSITION"#,
            self.dialect.quote_literal(schema),
            self.dialect.literal_list(tables)
        );
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
            debug!("MySQL schemas carry no comment, ignoring '{}'", comment);
        }
        let sql = format!(
            "CREATE SCHEMA IF NOT EXISTS {}",
            self.dialect.quote_ident(schema)?
        );
        run(conn, "create schema", &sql).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{row, ScriptedConnection};

    fn col(table: &str, name: &str, ty: &str, pos: &str, nullable: &str) -> crate::core::value::Row {
        row(&[
            ("table_schema", "shop"),
            ("table_name", table),
            ("column_name", name),
            ("data_type", ty),
            ("is_nullable", nullable),
            ("ordinal_position", pos),
        ])
    }

    #[tokio::test]
    async fn test_list_tables_filters_by_schema() {
        let conn = ScriptedConnection::new("src", "mysql").on_query(
            "information_schema.TABLES",
            vec![row(&[
                ("table_schema", "shop"),
                ("table_name", "orders"),
                ("comments", "all orders"),
            ])],
        );
        let dbs = MysqlIntrospector::new()
            .list_tables(&conn, &["shop".to_string()])
            .await
            .unwrap();
        assert_eq!(dbs[0].schema_name, "shop");
        assert_eq!(dbs[0].tables[0].comment, "all orders");
        assert!(conn.log()[0].contains("TABLE_SCHEMA IN ('shop')"));
    }

    #[tokio::test]
    async fn test_list_tables_without_filter_skips_system_schemas() {
        let conn = ScriptedConnection::new("src", "mysql");
        MysqlIntrospector::new().list_tables(&conn, &[]).await.unwrap();
        assert!(conn.log()[0].contains("NOT IN ('information_schema', 'mysql'"));
    }

    #[tokio::test]
    async fn test_columns_for_tables() {
        let conn = ScriptedConnection::new("src", "mysql").on_query(
            "information_schema.COLUMNS",
            vec![
                col("orders", "amount", "decimal(10,2)", "2", "1"),
                col("orders", "id", "int(11)", "1", "0"),
            ],
        );
        let cols = MysqlIntrospector::new()
            .list_columns_for_tables(&conn, "shop", &["orders".to_string()])
            .await
            .unwrap();
        let orders = &cols["orders"];
        assert_eq!(orders.columns[0].column_name, "id");
        assert!(!orders.columns[0].is_nullable);
        assert_eq!(orders.columns[1].data_type, "decimal(10,2)");
    }

    #[tokio::test]
    async fn test_empty_table_list_short_circuits() {
        let conn = ScriptedConnection::new("src", "mysql");
        let i = MysqlIntrospector::new();
        assert!(i.list_columns_for_tables(&conn, "shop", &[]).await.unwrap().is_empty());
        assert!(i.list_primary_keys(&conn, "shop", &[]).await.unwrap().is_empty());
        assert!(i.list_unique_keys(&conn, "shop", &[]).await.unwrap().is_empty());
        assert!(conn.log().is_empty());
    }

    #[tokio::test]
    async fn test_empty_schema_is_rejected() {
        let conn = ScriptedConnection::new("src", "mysql");
        let err = MysqlIntrospector::new()
            .list_primary_keys(&conn, "", &["t".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::MigrateError::Config(_)));
    }

    #[tokio::test]
    async fn test_primary_key_order_follows_catalog() {
        let conn = ScriptedConnection::new("src", "mysql").on_query(
            "KEY_COLUMN_USAGE",
            vec![
                row(&[("table_name", "t"), ("column_name", "b")]),
                row(&[("table_name", "t"), ("column_name", "a")]),
            ],
        );
        let pks = MysqlIntrospector::new()
            .list_primary_keys(&conn, "shop", &["t".to_string()])
            .await
            .unwrap();
        assert_eq!(pks["t"], vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_query_failure_is_discovery_error() {
        let conn = ScriptedConnection::new("src", "mysql").fail_query("TABLES", "denied");
        let err = MysqlIntrospector::new().list_tables(&conn, &[]).await.unwrap_err();
        assert!(err.to_string().contains("Schema discovery failed on 'src'"));
    }

    #[tokio::test]
    async fn test_create_schema() {
        let conn = ScriptedConnection::new("dst", "mysql");
        MysqlIntrospector::new()
            .create_schema(&conn, "shop", "")
            .await
            .unwrap();
        assert_eq!(conn.executed(), vec!["CREATE SCHEMA IF NOT EXISTS `shop`"]);
    }
}
