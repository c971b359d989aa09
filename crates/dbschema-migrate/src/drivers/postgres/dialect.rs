//! PostgreSQL quoting rules.

use crate::core::identifier::{quote_ansi, quote_literal};
use crate::core::traits::SqlDialect;
use crate::error::Result;

/// PostgreSQL dialect: double-quoted identifiers, standard literals.
#[derive(Debug, Clone, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    pub fn new() -> Self {
        Self
    }
}

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &str {
        "postgres"
    }

    fn quote_ident(&self, name: &str) -> Result<String> {
        quote_ansi(name)
    }

    fn quote_literal(&self, value: &str) -> String {
        quote_literal(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        let d = PostgresDialect::new();
        assert_eq!(d.quote_ident("Order").unwrap(), "\"Order\"");
        assert_eq!(d.quote_ident("a\"b").unwrap(), "\"a\"\"b\"");
        assert!(d.quote_ident("").is_err());
    }
}
