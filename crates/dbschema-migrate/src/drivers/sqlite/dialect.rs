//! SQLite quoting rules.

use crate::core::identifier::{quote_ansi, quote_literal};
use crate::core::traits::SqlDialect;
use crate::error::Result;

/// Name reported for the single namespace of a SQLite database file.
pub const MAIN_SCHEMA: &str = "main";

#[derive(Debug, Clone, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    pub fn new() -> Self {
        Self
    }
}

impl SqlDialect for SqliteDialect {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn quote_ident(&self, name: &str) -> Result<String> {
        quote_ansi(name)
    }

    fn quote_literal(&self, value: &str) -> String {
        quote_literal(value)
    }

    /// Tables are created in the attached file itself, never schema-qualified.
    fn qualify(&self, _schema: &str, table: &str) -> Result<String> {
        self.quote_ident(table)
    }
}
