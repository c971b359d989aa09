//! SQL Server quoting rules.

use crate::core::identifier::{quote_mssql, quote_mssql_literal};
use crate::core::traits::SqlDialect;
use crate::error::Result;

/// SQL Server dialect: bracketed identifiers, `N'...'` literals.
#[derive(Debug, Clone, Default)]
pub struct MssqlDialect;

impl MssqlDialect {
    pub fn new() -> Self {
        Self
    }
}

impl SqlDialect for MssqlDialect {
    fn name(&self) -> &str {
        "sqlserver"
    }

    fn quote_ident(&self, name: &str) -> Result<String> {
        // Brackets inside the name are doubled
        quote_mssql(name)
    }

    fn quote_literal(&self, value: &str) -> String {
        quote_mssql_literal(value)
    }

    /// `OFFSET ... FETCH` needs an `ORDER BY`; `(SELECT NULL)` keeps the
    /// table's own order.
    fn paginate(&self, select: &str, offset: i64, limit: i64) -> String {
        format!(
            "{} ORDER BY (SELECT NULL) OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
            select, offset, limit
        )
    }
}
