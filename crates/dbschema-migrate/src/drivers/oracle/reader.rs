//! Oracle schema introspection over the `ALL_*` dictionary views.
//!
//! DM exposes Oracle-compatible copies of the same views, so the query
//! builders here are shared with the DM introspector; only the expression
//! that rebuilds a qualified type name differs.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::dialect::OracleDialect;
use crate::core::schema::{
    group_columns, group_columns_by_schema, group_primary_keys, group_tables, group_unique_keys,
    ColumnsBySchema, LogicDbInfo, PrimaryKeys, TableColInfo, UniqueKeys,
};
use crate::core::traits::{Connection, SchemaIntrospector, SqlDialect};
use crate::drivers::common::catalog::{fetch, require_schema, schema_predicate};
use crate::error::Result;

const SYSTEM_SCHEMAS: &[&str] = &[
    "SYS",
    "SYSTEM",
    "OUTLN",
    "DBSNMP",
    "XDB",
    "MDSYS",
    "CTXSYS",
    "ORDSYS",
    "ORDDATA",
    "WMSYS",
    "OLAPSYS",
    "LBACSYS",
    "DVSYS",
    "AUDSYS",
    "OJVMSYS",
    "APPQOSSYS",
    "GSMADMIN_INTERNAL",
];

const ORACLE_DATA_TYPE: &str = r#"CASE
                    WHEN atc.DATA_TYPE IN ('NUMBER', 'DECIMAL', 'NUMERIC')
                        AND atc.DATA_PRECISION IS NULL AND atc.DATA_SCALE = 0
                        THEN 'INTEGER'
                    WHEN atc.DATA_TYPE IN ('NUMBER', 'DECIMAL', 'NUMERIC')
                        AND atc.DATA_PRECISION > 0 AND atc.DATA_SCALE = 0
                        THEN atc.DATA_TYPE || '(' || atc.DATA_PRECISION || ')'
                    WHEN atc.DATA_TYPE IN ('NUMBER', 'DECIMAL', 'NUMERIC')
                        AND atc.DATA_PRECISION > 0 AND atc.DATA_SCALE > 0
                        THEN atc.DATA_TYPE || '(' || atc.DATA_PRECISION || ',' || atc.DATA_SCALE || ')'
                    WHEN atc.DATA_TYPE IN ('VARCHAR2', 'NVARCHAR2', 'CHAR', 'NCHAR')
                        AND atc.CHAR_LENGTH > 0
                        THEN atc.DATA_TYPE || '(' || atc.CHAR_LENGTH || ')'
                    WHEN atc.DATA_TYPE = 'RAW'
                        THEN 'RAW(' || atc.DATA_LENGTH || ')'
                    ELSE atc.DATA_TYPE
                END"#;

/// `ALL_TABLES` joined to its comments.
pub(crate) fn all_tables_sql(owner_predicate: &str) -> String {
    format!(
        r#"
            SELECT
                t.OWNER AS table_schema,
                t.TABLE_NAME AS table_name,
                c.COMMENTS AS comments
            FROM ALL_TABLES t
            LEFT JOIN ALL_TAB_COMMENTS c
                ON c.OWNER = t.OWNER AND c.TABLE_NAME = t.TABLE_NAME
            WHERE {}
            ORDER BY t.OWNER, t.TABLE_NAME"#,
        owner_predicate
    )
}

/// `ALL_TAB_COLUMNS` joined to its comments, with `data_type_expr` as the
/// qualified type.
pub(crate) fn all_tab_columns_sql(data_type_expr: &str, filter: &str) -> String {
    format!(
        r#"
            SELECT
                atc.OWNER AS table_schema,
                atc.TABLE_NAME AS table_name,
                atc.COLUMN_NAME AS column_name,
                acc.COMMENTS AS comments,
                {} AS data_type,
                CASE WHEN atc.NULLABLE = 'Y' THEN 1 ELSE 0 END AS is_nullable,
                atc.COLUMN_ID AS ordinal_position
            FROM ALL_TAB_COLUMNS atc
            LEFT JOIN ALL_COL_COMMENTS acc
                ON acc.OWNER = atc.OWNER
                AND acc.TABLE_NAME = atc.TABLE_NAME
                AND acc.COLUMN_NAME = atc.COLUMN_NAME
            WHERE {}
            ORDER BY atc.OWNER, atc.TABLE_NAME, atc.COLUMN_ID"#,
        data_type_expr, filter
    )
}

/// Key columns of constraint type `P` or `U`, in key position order.
pub(crate) fn all_constraints_sql(
    dialect: &dyn SqlDialect,
    constraint_type: &str,
    schema: &str,
    tables: &[String],
) -> String {
    format!(
        r#"
            SELECT
                au.TABLE_NAME AS table_name,
                au.CONSTRAINT_NAME AS constraint_name,
                cu.COLUMN_NAME AS column_name
            FROM ALL_CONSTRAINTS au
            JOIN ALL_CONS_COLUMNS cu
                ON cu.OWNER = au.OWNER
                AND cu.CONSTRAINT_NAME = au.CONSTRAINT_NAME
                AND cu.TABLE_NAME = au.TABLE_NAME
            WHERE au.CONSTRAINT_TYPE = '{}'
                AND au.OWNER = {}
                AND au.TABLE_NAME IN ({})
            ORDER BY au.TABLE_NAME, au.CONSTRAINT_NAME, cu.POSITION"#,
        constraint_type,
        dialect.quote_literal(schema),
        dialect.literal_list(tables)
    )
}

/// Oracle introspector.
#[derive(Debug, Clone, Default)]
pub struct OracleIntrospector {
    dialect: OracleDialect,
}

impl OracleIntrospector {
    pub fn new() -> Self {
        Self::default()
    }

    fn for_tables(&self, schema: &str, tables: &[String]) -> String {
        format!(
            "atc.OWNER = {} AND atc.TABLE_NAME IN ({})",
            self.dialect.quote_literal(schema),
            self.dialect.literal_list(tables)
        )
    }
}

#[async_trait]
impl SchemaIntrospector for OracleIntrospector {
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
        let sql = all_tab_columns_sql(ORACLE_DATA_TYPE, &predicate);
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
        let sql = all_tab_columns_sql(ORACLE_DATA_TYPE, &self.for_tables(schema, tables));
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

    /// An Oracle schema is a user; creating one needs credentials and
    /// privileges this tool does not manage. Only existence is checked.
    async fn create_schema(
        &self,
        conn: &dyn Connection,
        schema: &str,
        _comment: &str,
    ) -> Result<()> {
        require_schema(conn, schema)?;
        let sql = format!(
            "SELECT COUNT(*) AS user_count FROM ALL_USERS WHERE UPPER(USERNAME) = UPPER({})",
            self.dialect.quote_literal(schema)
        );
        let rows = fetch(conn, "check schema", &sql).await?;
        let exists = rows
            .first()
            .and_then(|r| r.get_i32("user_count"))
            .unwrap_or(0)
            > 0;
        if exists {
            debug!("Oracle schema '{}' exists on '{}'", schema, conn.name());
        } else {
            warn!(
                "Oracle schema '{}' does not exist on '{}'; create the user before migrating",
                schema,
                conn.name()
            );
        }
        Ok(())
    }
}
