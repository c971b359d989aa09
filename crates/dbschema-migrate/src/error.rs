//! Error types for the schema migration library.

use thiserror::Error;

/// Main error type for schema migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (missing DSN, empty logical name, unknown dialect, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection pool error with context
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// Lookup, ping or open failure for a logical database name
    #[error("Connection '{name}' error: {message}")]
    Connection { name: String, message: String },

    /// Catalog query failed while discovering tables or columns
    #[error("Schema discovery failed on '{db}'{}: {message}", table_suffix(.table))]
    Discovery {
        db: String,
        table: Option<String>,
        message: String,
    },

    /// DDL statement could not be applied to the target
    #[error("DDL failed on '{db}' for table {table}: {message}")]
    Ddl {
        db: String,
        table: String,
        message: String,
    },

    /// Driver-level query or execute failure
    #[error("{dialect} query error: {message}")]
    Query { dialect: String, message: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Migration was cancelled (SIGINT, etc.)
    #[error("Migration cancelled")]
    Cancelled,
}

fn table_suffix(table: &Option<String>) -> String {
    match table {
        Some(t) => format!(" (table {})", t),
        None => String::new(),
    }
}

impl MigrateError {
    /// Create a Pool error with context about where it occurred
    pub fn pool(message: impl std::fmt::Display, context: impl Into<String>) -> Self {
        MigrateError::Pool {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a Connection error for a logical name
    pub fn connection(name: impl Into<String>, message: impl std::fmt::Display) -> Self {
        MigrateError::Connection {
            name: name.into(),
            message: message.to_string(),
        }
    }

    /// Create a Discovery error, optionally pinned to a table
    pub fn discovery(
        db: impl Into<String>,
        table: Option<&str>,
        message: impl std::fmt::Display,
    ) -> Self {
        MigrateError::Discovery {
            db: db.into(),
            table: table.map(str::to_string),
            message: message.to_string(),
        }
    }

    /// Create a Ddl error
    pub fn ddl(
        db: impl Into<String>,
        table: impl Into<String>,
        message: impl std::fmt::Display,
    ) -> Self {
        MigrateError::Ddl {
            db: db.into(),
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Create a Query error for a dialect
    pub fn query(dialect: impl Into<String>, message: impl std::fmt::Display) -> Self {
        MigrateError::Query {
            dialect: dialect.into(),
            message: message.to_string(),
        }
    }

    /// Table name carried by this error, if any.
    pub fn table(&self) -> Option<&str> {
        match self {
            MigrateError::Discovery { table, .. } => table.as_deref(),
            MigrateError::Ddl { table, .. } => Some(table),
            _ => None,
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) | MigrateError::Json(_) => 1,
            MigrateError::Pool { .. } | MigrateError::Connection { .. } => 2,
            MigrateError::Discovery { .. } | MigrateError::Ddl { .. } | MigrateError::Query { .. } => 3,
            MigrateError::Io(_) => 4,
            MigrateError::Cancelled => 130,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

impl From<tiberius::error::Error> for MigrateError {
    fn from(e: tiberius::error::Error) -> Self {
        MigrateError::query("sqlserver", e)
    }
}

impl From<tokio_postgres::Error> for MigrateError {
    fn from(e: tokio_postgres::Error) -> Self {
        MigrateError::query("postgres", e)
    }
}

impl From<sqlx::Error> for MigrateError {
    fn from(e: sqlx::Error) -> Self {
        MigrateError::query("sqlx", e)
    }
}

#[cfg(feature = "odbc")]
impl From<odbc_api::Error> for MigrateError {
    fn from(e: odbc_api::Error) -> Self {
        MigrateError::query("odbc", e)
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_message_includes_table() {
        let err = MigrateError::discovery("source", Some("orders"), "boom");
        assert_eq!(
            err.to_string(),
            "Schema discovery failed on 'source' (table orders): boom"
        );
        assert_eq!(err.table(), Some("orders"));

        let err = MigrateError::discovery("source", None, "boom");
        assert_eq!(err.to_string(), "Schema discovery failed on 'source': boom");
        assert_eq!(err.table(), None);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(MigrateError::Config("x".into()).exit_code(), 1);
        assert_eq!(MigrateError::pool("x", "y").exit_code(), 2);
        assert_eq!(MigrateError::ddl("t", "a", "x").exit_code(), 3);
        assert_eq!(MigrateError::Cancelled.exit_code(), 130);
    }

    #[test]
    fn test_format_detailed_has_header() {
        let err = MigrateError::connection("src", "refused");
        assert!(err.format_detailed().starts_with("Error: Connection 'src' error: refused"));
    }
}
