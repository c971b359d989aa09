//! Utilities shared across database drivers.
//!
//! - [`catalog`]: catalog query helpers used by every introspector
//! - [`tls`]: TLS mode parsing and the rustls connector for PostgreSQL
//! - [`odbc`]: ODBC transport for Oracle and DM
//! - [`paging`]: the `ROWNUM` page window for Oracle and DM

pub mod catalog;
pub mod odbc;
pub mod paging;
pub mod tls;

pub use odbc::OdbcConnector;
pub use tls::{SslMode, TlsBuilder};
