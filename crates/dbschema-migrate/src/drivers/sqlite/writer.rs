//! SQLite DDL synthesis. Statements are unqualified.

use async_trait::async_trait;

use super::dialect::SqliteDialect;
use super::typemap::SqliteTypeTranslator;
use crate::core::schema::{FieldsByTable, PrimaryKeys, UniqueKeys};
use crate::core::traits::{Connection, DdlSynthesizer, GeneratedDdl, SqlDialect};
use crate::dialect::{apply_tables, CreateTableTemplate, FromCanonical};
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct SqliteSynthesizer {
    dialect: SqliteDialect,
    translator: SqliteTypeTranslator,
}

impl SqliteSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CreateTableTemplate for SqliteSynthesizer {
    fn sql_dialect(&self) -> &dyn SqlDialect {
        &self.dialect
    }

    fn translator(&self) -> &dyn FromCanonical {
        &self.translator
    }

    fn create_table(&self, schema: &str, table: &str, body: &str) -> Result<String> {
        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n);",
            self.dialect.qualify(schema, table)?,
            body
        ))
    }
}

#[async_trait]
impl DdlSynthesizer for SqliteSynthesizer {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_is_unqualified() {
        let sql = SqliteSynthesizer::new()
            .create_table("main", "users", "\t\"id\" INTEGER")
            .unwrap();
        assert_eq!(sql, "CREATE TABLE IF NOT EXISTS \"users\" (\n\t\"id\" INTEGER\n);");
    }
}
