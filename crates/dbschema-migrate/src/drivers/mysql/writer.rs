//! MySQL/MariaDB DDL synthesis.

use async_trait::async_trait;

use super::dialect::MysqlDialect;
use super::typemap::MysqlTypeTranslator;
use crate::core::schema::{FieldsByTable, PrimaryKeys, UniqueKeys};
use crate::core::traits::{Connection, DdlSynthesizer, GeneratedDdl, SqlDialect};
use crate::dialect::{apply_tables, CreateTableTemplate, FromCanonical};
use crate::error::Result;

/// Emits `CREATE TABLE IF NOT EXISTS` with InnoDB and utf8mb4.
#[derive(Debug, Clone, Default)]
pub struct MysqlSynthesizer {
    dialect: MysqlDialect,
    translator: MysqlTypeTranslator,
}

impl MysqlSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CreateTableTemplate for MysqlSynthesizer {
    fn sql_dialect(&self) -> &dyn SqlDialect {
        &self.dialect
    }

    fn translator(&self) -> &dyn FromCanonical {
        &self.translator
    }

    fn create_table(&self, schema: &str, table: &str, body: &str) -> Result<String> {
        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;",
            self.dialect.qualify(schema, table)?,
            body
        ))
    }
}

#[async_trait]
impl DdlSynthesizer for MysqlSynthesizer {
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
