//! PostgreSQL database driver.
//!
//! - [`PostgresDialect`]: identifier quoting and literal escaping
//! - [`PostgresTypeTranslator`]: native ⇄ canonical types
//! - [`PostgresIntrospector`]: `pg_catalog`/`information_schema` discovery
//! - [`PostgresSynthesizer`]: `CREATE TABLE IF NOT EXISTS` generation
//! - [`PostgresConnector`]: deadpool-postgres pool with optional rustls TLS

mod connection;
mod dialect;
mod reader;
mod typemap;
mod writer;

use std::sync::Arc;

pub use connection::{PostgresConnection, PostgresConnector};
pub use dialect::PostgresDialect;
pub use reader::PostgresIntrospector;
pub use typemap::PostgresTypeTranslator;
pub use writer::PostgresSynthesizer;

use crate::core::catalog::{DialectBundle, DialectTag};

/// The PostgreSQL capability bundle.
pub fn bundle() -> DialectBundle {
    DialectBundle {
        tag: DialectTag::Postgres,
        dialect: Arc::new(PostgresDialect::new()),
        translator: Arc::new(PostgresTypeTranslator::new()),
        introspector: Arc::new(PostgresIntrospector::new()),
        synthesizer: Arc::new(PostgresSynthesizer::new()),
        connector: Arc::new(PostgresConnector::new()),
    }
}
