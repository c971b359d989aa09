//! Oracle database driver.
//!
//! - [`OracleDialect`]: double-quoted, case-sensitive identifiers
//! - [`OracleTypeTranslator`]: native ⇄ canonical types
//! - [`OracleIntrospector`]: `ALL_*` dictionary discovery
//! - [`OracleSynthesizer`]: `CREATE TABLE` inside an existence-checking block
//!
//! Connections go through ODBC (see [`OdbcConnector`]).

mod dialect;
mod reader;
mod typemap;
mod writer;

use std::sync::Arc;

pub use dialect::OracleDialect;
pub use reader::OracleIntrospector;
pub use typemap::OracleTypeTranslator;
pub use writer::OracleSynthesizer;

pub(crate) use reader::{all_constraints_sql, all_tab_columns_sql, all_tables_sql};
pub(crate) use writer::guarded_create_table;

use crate::core::catalog::{DialectBundle, DialectTag};
use crate::drivers::common::OdbcConnector;

/// The Oracle capability bundle.
pub fn bundle() -> DialectBundle {
    DialectBundle {
        tag: DialectTag::Oracle,
        dialect: Arc::new(OracleDialect::new()),
        translator: Arc::new(OracleTypeTranslator::new()),
        introspector: Arc::new(OracleIntrospector::new()),
        synthesizer: Arc::new(OracleSynthesizer::new()),
        connector: Arc::new(OdbcConnector::new(DialectTag::Oracle)),
    }
}
