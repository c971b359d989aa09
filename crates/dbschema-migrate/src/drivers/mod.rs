//! Database driver implementations.
//!
//! Each driver module provides one dialect's implementation of the core
//! traits plus a `bundle()` constructor that the
//! [`DriverCatalog`](crate::core::DriverCatalog) registers at startup:
//!
//! - [`mysql`]: MySQL/MariaDB (SQLx)
//! - [`postgres`]: PostgreSQL (deadpool-postgres)
//! - [`mssql`]: Microsoft SQL Server (Tiberius + bb8)
//! - [`oracle`]: Oracle (ODBC)
//! - [`sqlite`]: SQLite (SQLx)
//! - [`dm`]: DM/Dameng (ODBC)
//! - [`common`]: catalog helpers, TLS, and the ODBC transport
//!
//! # Adding New Databases
//!
//! 1. Create a new module under `drivers/` with `dialect`, `typemap`,
//!    `reader`, `writer` and, if needed, `connection`
//! 2. Implement [`SqlDialect`](crate::core::SqlDialect), the two translator
//!    traits, [`SchemaIntrospector`](crate::core::SchemaIntrospector),
//!    [`CreateTableTemplate`](crate::dialect::CreateTableTemplate) and
//!    [`Connector`](crate::core::Connector)
//! 3. Add a `DialectTag` variant and register the bundle in
//!    `DriverCatalog::with_builtins()`

pub mod common;
pub mod dm;
pub mod mssql;
pub mod mysql;
pub mod oracle;
pub mod postgres;
pub mod sqlite;

pub use common::{OdbcConnector, SslMode, TlsBuilder};
