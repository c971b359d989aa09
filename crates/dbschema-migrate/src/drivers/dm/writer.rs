//! DM DDL synthesis, using the same guarded block as Oracle.

use async_trait::async_trait;

use super::dialect::DmDialect;
use super::typemap::DmTypeTranslator;
use crate::core::schema::{FieldsByTable, PrimaryKeys, UniqueKeys};
use crate::core::traits::{Connection, DdlSynthesizer, GeneratedDdl, SqlDialect};
use crate::dialect::{apply_tables, CreateTableTemplate, FromCanonical};
use crate::drivers::oracle::guarded_create_table;
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct DmSynthesizer {
    dialect: DmDialect,
    translator: DmTypeTranslator,
}

impl DmSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CreateTableTemplate for DmSynthesizer {
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
impl DdlSynthesizer for DmSynthesizer {
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
