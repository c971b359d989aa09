//! SQLite database driver.
//!
//! - [`SqliteDialect`]: double-quoted identifiers, unqualified table names
//! - [`SqliteTypeTranslator`]: declared type ⇄ canonical types
//! - [`SqliteIntrospector`]: `sqlite_master` and table-valued pragmas
//! - [`SqliteSynthesizer`]: `CREATE TABLE IF NOT EXISTS`
//! - [`SqliteConnector`]: SQLx pool over a database file

mod connection;
mod dialect;
mod reader;
mod typemap;
mod writer;

use std::sync::Arc;

pub use connection::{SqliteConnection, SqliteConnector};
pub use dialect::{SqliteDialect, MAIN_SCHEMA};
pub use reader::SqliteIntrospector;
pub use typemap::SqliteTypeTranslator;
pub use writer::SqliteSynthesizer;

use crate::core::catalog::{DialectBundle, DialectTag};

/// The SQLite capability bundle.
pub fn bundle() -> DialectBundle {
    DialectBundle {
        tag: DialectTag::Sqlite,
        dialect: Arc::new(SqliteDialect::new()),
        translator: Arc::new(SqliteTypeTranslator::new()),
        introspector: Arc::new(SqliteIntrospector::new()),
        synthesizer: Arc::new(SqliteSynthesizer::new()),
        connector: Arc::new(SqliteConnector::new()),
    }
}
