//! # dbschema-migrate
//!
//! Heterogeneous relational schema migration library.
//!
//! Reads table and column metadata from one database's catalog, translates
//! each column through a dialect-neutral [`CanonicalField`], and recreates
//! the tables on another database with primary and unique keys. Supported
//! dialects:
//!
//! - **MySQL/MariaDB** via SQLx
//! - **PostgreSQL** via tokio-postgres and deadpool
//! - **SQL Server** via Tiberius
//! - **SQLite** via SQLx
//! - **Oracle** and **DM** via ODBC (`odbc` feature)
//!
//! Only structure moves. Rows, indexes other than unique keys, foreign keys
//! and views are left alone.
//!
//! ## Example
//!
//! ```rust,no_run
//! use dbschema_migrate::{MigrationRequest, SchemaMigrator};
//!
//! #[tokio::main]
//! async fn main() -> dbschema_migrate::Result<()> {
//!     let request = MigrationRequest::load("migrate.yaml")?;
//!     let migrator = SchemaMigrator::with_builtins();
//!     let result = migrator.run(&request, None).await?;
//!     println!("Created {} tables", result.tables.len());
//!     SchemaMigrator::save_ddl("schema.sql", &result.ddl)?;
//!     migrator.registry().close_all().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod dialect;
pub mod drivers;
pub mod error;
pub mod orchestrator;

#[doc(hidden)]
pub mod testing;

// Re-exports for convenient access
pub use crate::config::{DbConfig, MigrationRequest, PoolSettings};
pub use crate::core::{
    Connection, Connector, DdlSynthesizer, DialectBundle, DialectTag, DriverCatalog,
    GeneratedDdl, Pagination, Row, SchemaIntrospector, SqlDialect,
};
pub use crate::dialect::{CanonicalField, FieldKind, FromCanonical, TimeSubtype, ToCanonical};
pub use crate::error::{MigrateError, Result};
pub use crate::orchestrator::{ConnectionRegistry, SchemaMigrationResult, SchemaMigrator};
