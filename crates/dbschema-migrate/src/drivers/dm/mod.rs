//! DM (Dameng) database driver.
//!
//! DM is largely Oracle-compatible at the catalog level; this driver reuses
//! the Oracle dictionary queries and table guard, with its own type table.
//! Connections go through ODBC (`DM8 ODBC DRIVER`).

mod dialect;
mod reader;
mod typemap;
mod writer;

use std::sync::Arc;

pub use dialect::DmDialect;
pub use reader::DmIntrospector;
pub use typemap::DmTypeTranslator;
pub use writer::DmSynthesizer;

use crate::core::catalog::{DialectBundle, DialectTag};
use crate::drivers::common::OdbcConnector;

/// The DM capability bundle.
pub fn bundle() -> DialectBundle {
    DialectBundle {
        tag: DialectTag::Dm,
        dialect: Arc::new(DmDialect::new()),
        translator: Arc::new(DmTypeTranslator::new()),
        introspector: Arc::new(DmIntrospector::new()),
        synthesizer: Arc::new(DmSynthesizer::new()),
        connector: Arc::new(OdbcConnector::new(DialectTag::Dm)),
    }
}
