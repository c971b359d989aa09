//! Core abstractions for dialect-agnostic schema migration.
//!
//! - [`catalog`]: dialect tags, capability bundles and the [`DriverCatalog`]
//! - [`traits`]: the capability traits each dialect implements
//! - [`schema`]: discovery structures and catalog row grouping
//! - [`value`]: the text [`Row`] returned by catalog queries
//! - [`page`]: the [`Pagination`] window for table reads
//! - [`identifier`]: identifier validation and quoting
//!
//! Nothing in here knows about a particular database; drivers under
//! `drivers/` implement the traits, and tests swap in
//! [`crate::testing::ScriptedConnection`].

pub mod catalog;
pub mod identifier;
pub mod page;
pub mod schema;
pub mod traits;
pub mod value;

pub use catalog::{DialectBundle, DialectTag, DriverCatalog};
pub use page::Pagination;
pub use schema::{
    ColumnInfo, ColumnsBySchema, FieldsByTable, LogicDbInfo, PrimaryKeys, TableColInfo,
    TableInfo, UniqueKeys,
};
pub use traits::{
    Connection, Connector, DdlSynthesizer, GeneratedDdl, SchemaIntrospector, SqlDialect,
};
pub use value::Row;
