//! Oracle DDL synthesis.
//!
//! Oracle only gained `CREATE TABLE IF NOT EXISTS` in 23c, so each statement
//! is wrapped in an anonymous block that checks `ALL_TABLES` first. The same
//! block runs unchanged on DM.

use async_trait::async_trait;

use super::dialect::OracleDialect;
use super::typemap::OracleTypeTranslator;
use crate::core::schema::{FieldsByTable, PrimaryKeys, UniqueKeys};
use crate::core::traits::{Connection, DdlSynthesizer, GeneratedDdl, SqlDialect};
use crate::dialect::{apply_tables, CreateTableTemplate, FromCanonical};
use crate::error::Result;

/// `CREATE TABLE` wrapped in an `ALL_TABLES` existence check.
pub(crate) fn guarded_create_table(
    dialect: &dyn SqlDialect,
    schema: &str,
    table: &str,
    body: &str,
) -> Result<String> {
    let create = format!("CREATE TABLE {} (\n{}\n)", dialect.qualify(schema, table)?, body);
    Ok(format!(
        "DECLARE\n\tv_count NUMBER;\nBEGIN\n\
         \tSELECT COUNT(*) INTO v_count FROM ALL_TABLES WHERE OWNER = {} AND TABLE_NAME = {};\n\
         \tIF v_count = 0 THEN\n\
         \t\tEXECUTE IMMEDIATE {};\n\
         \tEND IF;\nEND;",
        dialect.quote_literal(schema),
        dialect.quote_literal(table),
        dialect.quote_literal(&create)
    ))
}

#[derive(Debug, Clone, Default)]
pub struct OracleSynthesizer {
    dialect: OracleDialect,
    translator: OracleTypeTranslator,
}

impl OracleSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CreateTableTemplate for OracleSynthesizer {
    fn sql_dialect(&self) -> &dyn SqlDialect {
        &self.dialect
    }

    fn translator(&self) -> &dyn FromCanonical {
        &self.translator
    }

    fn create_table(&self, schema: &str, table: &str, body: &str) -> Result<String> {
        guarded_create_table(&self.dialect, schema, table, body)
    }
}

#[async_trait]
impl DdlSynthesizer for OracleSynthesizer {
    async fn build_and_apply(
        &self,
        conn: &dyn Connection,
        target_schema: &str,
        primary_keys: &PrimaryKeys,
        unique_keys: &UniqueKeys,
        fields: &FieldsByTable,
    ) -> Result<GeneratedDdl> {
        apply_tables(self, conn, target_schema, primary_keys, unique_keys, fields).await
    }
}
