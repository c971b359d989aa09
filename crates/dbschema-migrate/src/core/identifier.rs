//! Identifier quoting and literal escaping shared by every dialect.
//!
//! Catalog queries and generated DDL are plain SQL text, so table, column
//! and schema names coming from a source catalog must never be spliced in
//! raw. Each dialect quotes identifiers one of three ways:
//!
//! | style   | dialects                       | form        |
//! |---------|--------------------------------|-------------|
//! | ANSI    | postgres, oracle, sqlite, dm   | `"name"`    |
//! | MySQL   | mysql                          | `` `name` ``|
//! | T-SQL   | sqlserver                      | `[name]`    |
//!
//! String literals use doubled single quotes everywhere; MySQL also escapes
//! backslashes because its default `sql_mode` treats them as escapes.

use crate::error::{MigrateError, Result};

/// Longest identifier accepted (SQL Server's limit, the largest of the six).
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Reject identifiers that no dialect can represent safely.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MigrateError::Config("Identifier cannot be empty".to_string()));
    }
    if name.contains('\0') {
        return Err(MigrateError::Config(format!(
            "Identifier contains a null byte: {:?}",
            name
        )));
    }
    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(MigrateError::Config(format!(
            "Identifier exceeds maximum length of {} bytes (got {}): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }
    Ok(())
}

/// `"name"` with embedded double quotes doubled.
pub fn quote_ansi(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// `` `name` `` with embedded backticks doubled.
pub fn quote_mysql(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("`{}`", name.replace('`', "``")))
}

/// `[name]` with embedded closing brackets doubled.
pub fn quote_mssql(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("[{}]", name.replace(']', "]]")))
}

/// `'value'` with embedded single quotes doubled.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// MySQL string literal; backslashes are escapes under the default sql_mode.
pub fn quote_mysql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}

/// SQL Server Unicode literal `N'value'`.
pub fn quote_mssql_literal(value: &str) -> String {
    format!("N{}", quote_literal(value))
}

/// Comma-separated literal list for `IN (...)` clauses.
pub fn literal_list(values: &[String], quote: fn(&str) -> String) -> String {
    values
        .iter()
        .map(|v| quote(v))
        .collect::<Vec<_>>()
        .join(", ")
}
