//! Oracle quoting rules.

use crate::core::identifier::{quote_ansi, quote_literal};
use crate::core::traits::SqlDialect;
use crate::drivers::common::paging::{rownum_paginate, ROWNUM_COLUMN};
use crate::error::Result;

/// Oracle dialect. Quoted identifiers are case-sensitive, so names are
/// emitted exactly as discovered.
#[derive(Debug, Clone, Default)]
pub struct OracleDialect;

impl OracleDialect {
    pub fn new() -> Self {
        Self
    }
}

impl SqlDialect for OracleDialect {
    fn name(&self) -> &str {
        "oracle"
    }

    fn quote_ident(&self, name: &str) -> Result<String> {
        quote_ansi(name)
    }

    fn quote_literal(&self, value: &str) -> String {
        quote_literal(value)
    }

    fn paginate(&self, select: &str, offset: i64, limit: i64) -> String {
        rownum_paginate(select, offset, limit)
    }

    fn paging_column(&self) -> Option<&str> {
        Some(ROWNUM_COLUMN)
    }
}
