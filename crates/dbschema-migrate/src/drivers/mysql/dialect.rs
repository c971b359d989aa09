//! MySQL/MariaDB quoting rules.

use crate::core::identifier::{quote_mysql, quote_mysql_literal};
use crate::core::traits::SqlDialect;
use crate::error::Result;

/// MySQL/MariaDB dialect: backtick identifiers, backslash-aware literals.
#[derive(Debug, Clone, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
    pub fn new() -> Self {
        Self
    }
}

impl SqlDialect for MysqlDialect {
    fn name(&self) -> &str {
        "mysql"
    }

    fn quote_ident(&self, name: &str) -> Result<String> {
        quote_mysql(name)
    }

    fn quote_literal(&self, value: &str) -> String {
        quote_mysql_literal(value)
    }
}
