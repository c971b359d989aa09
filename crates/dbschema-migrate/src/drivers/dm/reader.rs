//! DM schema introspection.
//!
//! DM keeps Oracle-compatible `ALL_*` views, so the catalog queries are the
//! Oracle ones with a DM type expression. Unlike Oracle, a DM schema is an
//! object of its own and can be created directly.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, info};

use super::dialect::DmDialect;
use crate::core::schema::{
    group_columns, group_columns_by_schema, group_primary_keys, group_tables, group_unique_keys,
    ColumnsBySchema, LogicDbInfo, PrimaryKeys, TableColInfo, UniqueKeys,
};
use crate::core::traits::{Connection, SchemaIntrospector, SqlDialect};
use crate::drivers::common::catalog::{fetch, require_schema, run, schema_predicate};
use crate::drivers::oracle::{all_constraints_sql, all_tab_columns_sql, all_tables_sql};
use crate::error::Result;

const SYSTEM_SCHEMAS: &[&str] = &["SYS", "SYSAUDITOR", "SYSSSO", "CTISYS", "SYSJOB"];

// Fractional seconds live in DATA_SCALE; zone suffixes follow the qualifier.
const DM_DATA_TYPE: &str = r#"CASE
                    WHEN atc.DATA_TYPE IN ('DECIMAL', 'DEC', 'NUMERIC', 'NUMBER')
                        AND atc.DATA_PRECISION > 0 AND atc.DATA_SCALE > 0
                        THEN atc.DATA_TYPE || '(' || atc.DATA_PRECISION || ',' || atc.DATA_SCALE || ')'
                    WHEN atc.DATA_TYPE IN ('DECIMAL', 'DEC', 'NUMERIC', 'NUMBER')
                        AND atc.DATA_PRECISION > 0
                        THEN atc.DATA_TYPE || '(' || atc.DATA_PRECISION || ')'
                    WHEN atc.DATA_TYPE IN ('CHAR', 'CHARACTER', 'VARCHAR', 'VARCHAR2', 'NCHAR', 'NVARCHAR')
                        THEN atc.DATA_TYPE || '(' || NVL(NULLIF(atc.CHAR_LENGTH, 0), atc.DATA_LENGTH) || ')'
                    WHEN atc.DATA_TYPE IN ('BINARY', 'VARBINARY', 'RAW')
                        THEN atc.DATA_TYPE || '(' || atc.DATA_LENGTH || ')'
                    WHEN atc.DATA_TYPE IN ('TIME', 'TIMESTAMP', 'DATETIME')
                        THEN atc.DATA_TYPE || '(' || atc.DATA_SCALE || ')'
                    WHEN atc.DATA_TYPE LIKE '% WITH %'
                        THEN SUBSTR(atc.DATA_TYPE, 1, INSTR(atc.DATA_TYPE, ' ') - 1)
                            || '(' || atc.DATA_SCALE || ')'
                            || SUBSTR(atc.DATA_TYPE, INSTR(atc.DATA_TYPE, ' '))
                    ELSE atc.DATA_TYPE
                END"#;

#[derive(Debug, Clone, Default)]
pub struct DmIntrospector {
    dialect: DmDialect,
}

impl DmIntrospector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SchemaIntrospector for DmIntrospector {
    async fn list_tables(
        &self,
        conn: &dyn Connection,
        schemas: &[String],
    ) -> Result<Vec<LogicDbInfo>> {
        for schema in schemas {
            require_schema(conn, schema)?;
        }
        let predicate = schema_predicate(&self.dialect, "t.OWNER", schemas, SYSTEM_SCHEMAS);
        let dbs = group_tables(&fetch(conn, "list tables", &all_tables_sql(&predicate)).await?)?;
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
        let predicate = schema_predicate(&self.dialect, "atc.OWNER", &schemas, SYSTEM_SCHEMAS);
        let sql = all_tab_columns_sql(DM_DATA_TYPE, &predicate);
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
        let filter = format!(
            "atc.OWNER = {} AND atc.TABLE_NAME IN ({})",
            self.dialect.quote_literal(schema),
            self.dialect.literal_list(tables)
        );
        let sql = all_tab_columns_sql(DM_DATA_TYPE, &filter);
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
        let sql = all_constraints_sql(&self.dialect, "P", schema, tables);
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
        let sql = all_constraints_sql(&self.dialect, "U", schema, tables);
        group_unique_keys(&fetch(conn, "list unique keys", &sql).await?)
    }

    async fn create_schema(
        &self,
        conn: &dyn Connection,
        schema: &str,
        comment: &str,
    ) -> Result<()> {
        require_schema(conn, schema)?;
        let sql = format!(
            "SELECT COUNT(*) AS schema_count FROM SYSOBJECTS WHERE TYPE$ = 'SCH' AND NAME = {}",
            self.dialect.quote_literal(schema)
        );
        let rows = fetch(conn, "check schema", &sql).await?;
        if rows.first().and_then(|r| r.get_i32("schema_count")).unwrap_or(0) > 0 {
            debug!("DM schema '{}' already exists on '{}'", schema, conn.name());
            return Ok(());
        }
        if !comment.is_empty() {
            debug!("DM schema comments are not written, ignoring '{}'", comment);
        }
        let create = format!("CREATE SCHEMA {}", self.dialect.quote_ident(schema)?);
        run(conn, "create schema", &create).await
    }
}
