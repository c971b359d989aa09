//! SQL Server DDL synthesis.
//!
//! SQL Server has no `CREATE TABLE IF NOT EXISTS`; statements are guarded
//! with an `OBJECT_ID` check instead.

use async_trait::async_trait;

use super::dialect::MssqlDialect;
use super::typemap::MssqlTypeTranslator;
use crate::core::schema::{FieldsByTable, PrimaryKeys, UniqueKeys};
use crate::core::traits::{Connection, DdlSynthesizer, GeneratedDdl, SqlDialect};
use crate::dialect::{apply_tables, CreateTableTemplate, FromCanonical};
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct MssqlSynthesizer {
    dialect: MssqlDialect,
    translator: MssqlTypeTranslator,
}

impl MssqlSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CreateTableTemplate for MssqlSynthesizer {
    fn sql_dialect(&self) -> &dyn SqlDialect {
        &self.dialect
    }

    fn translator(&self) -> &dyn FromCanonical {
        &self.translator
    }

    fn create_table(&self, schema: &str, table: &str, body: &str) -> Result<String> {
        let qualified = self.dialect.qualify(schema, table)?;
        Ok(format!(
            "IF OBJECT_ID({}, N'U') IS NULL\nCREATE TABLE {} (\n{}\n);",
            self.dialect.quote_literal(&qualified),
            qualified,
            body
        ))
    }
}

#[async_trait]
impl DdlSynthesizer for MssqlSynthesizer {
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
    fn test_guarded_template() {
        let sql = MssqlSynthesizer::new()
            .create_table("dbo", "O'Hare", "\t[id] int")
            .unwrap();
        assert_eq!(
            sql,
            "IF OBJECT_ID(N'[dbo].[O''Hare]', N'U') IS NULL\nCREATE TABLE [dbo].[O'Hare] (\n\t[id] int\n);"
        );
    }
}
