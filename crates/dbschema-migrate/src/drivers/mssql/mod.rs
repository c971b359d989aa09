//! Microsoft SQL Server driver.
//!
//! - [`MssqlDialect`]: bracket quoting and `N'...'` literals
//! - [`MssqlTypeTranslator`]: native ⇄ canonical types
//! - [`MssqlIntrospector`]: `sys.*` catalog discovery
//! - [`MssqlSynthesizer`]: `OBJECT_ID`-guarded `CREATE TABLE`
//! - [`MssqlConnector`]: bb8 pool of Tiberius clients

mod connection;
mod dialect;
mod reader;
mod typemap;
mod writer;

use std::sync::Arc;

pub use connection::{MssqlConnection, MssqlConnector};
pub use dialect::MssqlDialect;
pub use reader::MssqlIntrospector;
pub use typemap::MssqlTypeTranslator;
pub use writer::MssqlSynthesizer;

use crate::core::catalog::{DialectBundle, DialectTag};

/// The SQL Server capability bundle.
pub fn bundle() -> DialectBundle {
    DialectBundle {
        tag: DialectTag::SqlServer,
        dialect: Arc::new(MssqlDialect::new()),
        translator: Arc::new(MssqlTypeTranslator::new()),
        introspector: Arc::new(MssqlIntrospector::new()),
        synthesizer: Arc::new(MssqlSynthesizer::new()),
        connector: Arc::new(MssqlConnector::new()),
    }
}
