//! Dialect registry for explicit dependency injection.
//!
//! The [`DriverCatalog`] maps a [`DialectTag`] to the capability bundle of
//! that dialect. It is constructed once at startup and handed to the
//! orchestrator rather than living in a global, so tests can build their own
//! catalog with mock connectors.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::traits::{Connector, DdlSynthesizer, SchemaIntrospector, SqlDialect};
use crate::dialect::TypeTranslator;
use crate::error::{MigrateError, Result};

/// The fixed set of supported dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialectTag {
    #[serde(rename = "mysql", alias = "mariadb")]
    Mysql,
    #[serde(rename = "postgres", alias = "postgresql", alias = "pg")]
    Postgres,
    #[serde(rename = "sqlserver", alias = "mssql", alias = "sql_server")]
    SqlServer,
    #[serde(rename = "oracle")]
    Oracle,
    #[serde(rename = "sqlite", alias = "sqlite3")]
    Sqlite,
    #[serde(rename = "dm", alias = "dameng")]
    Dm,
}

impl DialectTag {
    pub const ALL: [DialectTag; 6] = [
        DialectTag::Mysql,
        DialectTag::Postgres,
        DialectTag::SqlServer,
        DialectTag::Oracle,
        DialectTag::Sqlite,
        DialectTag::Dm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DialectTag::Mysql => "mysql",
            DialectTag::Postgres => "postgres",
            DialectTag::SqlServer => "sqlserver",
            DialectTag::Oracle => "oracle",
            DialectTag::Sqlite => "sqlite",
            DialectTag::Dm => "dm",
        }
    }
}

impl fmt::Display for DialectTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectTag {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(DialectTag::Mysql),
            "postgres" | "postgresql" | "pg" => Ok(DialectTag::Postgres),
            "sqlserver" | "mssql" | "sql_server" => Ok(DialectTag::SqlServer),
            "oracle" => Ok(DialectTag::Oracle),
            "sqlite" | "sqlite3" => Ok(DialectTag::Sqlite),
            "dm" | "dameng" => Ok(DialectTag::Dm),
            other => Err(MigrateError::Config(format!(
                "unknown dialect '{}', expected one of mysql, postgres, sqlserver, oracle, sqlite, dm",
                other
            ))),
        }
    }
}

/// Everything the orchestrator needs from one dialect.
#[derive(Clone)]
pub struct DialectBundle {
    pub tag: DialectTag,
    pub dialect: Arc<dyn SqlDialect>,
    pub translator: Arc<dyn TypeTranslator>,
    pub introspector: Arc<dyn SchemaIntrospector>,
    pub synthesizer: Arc<dyn DdlSynthesizer>,
    pub connector: Arc<dyn Connector>,
}

impl DialectBundle {
    /// Replace the connector, keeping the rest of the bundle.
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }
}

impl fmt::Debug for DialectBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialectBundle")
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

/// Registry of dialect bundles.
///
/// # Example
///
/// ```rust,ignore
/// let catalog = DriverCatalog::with_builtins();
/// let mysql = catalog.require(DialectTag::Mysql)?;
/// let info = mysql.translator.to_canonical("int(11)");
/// ```
#[derive(Default)]
pub struct DriverCatalog {
    bundles: HashMap<DialectTag, DialectBundle>,
}

impl DriverCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog with all six built-in dialects registered.
    pub fn with_builtins() -> Self {
        use crate::drivers::{dm, mssql, mysql, oracle, postgres, sqlite};

        let mut catalog = Self::new();
        for bundle in [
            mysql::bundle(),
            postgres::bundle(),
            mssql::bundle(),
            oracle::bundle(),
            sqlite::bundle(),
            dm::bundle(),
        ] {
            // Tags are distinct, registration cannot collide here.
            let _ = catalog.register(bundle);
        }
        catalog
    }

    /// Register a bundle. Fails if its tag is already registered.
    pub fn register(&mut self, bundle: DialectBundle) -> Result<()> {
        if self.bundles.contains_key(&bundle.tag) {
            return Err(MigrateError::Config(format!(
                "dialect '{}' is already registered",
                bundle.tag
            )));
        }
        self.bundles.insert(bundle.tag, bundle);
        Ok(())
    }

    /// Register a bundle, replacing any existing one for the same tag.
    pub fn replace(&mut self, bundle: DialectBundle) {
        self.bundles.insert(bundle.tag, bundle);
    }

    pub fn get(&self, tag: DialectTag) -> Option<&DialectBundle> {
        self.bundles.get(&tag)
    }

    /// Get a bundle or fail with a configuration error.
    pub fn require(&self, tag: DialectTag) -> Result<&DialectBundle> {
        self.get(tag)
            .ok_or_else(|| MigrateError::Config(format!("dialect '{}' is not registered", tag)))
    }

    pub fn has(&self, tag: DialectTag) -> bool {
        self.bundles.contains_key(&tag)
    }

    /// Registered tags in declaration order.
    pub fn tags(&self) -> Vec<DialectTag> {
        DialectTag::ALL
            .into_iter()
            .filter(|t| self.bundles.contains_key(t))
            .collect()
    }
}

impl fmt::Debug for DriverCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverCatalog")
            .field("dialects", &self.tags())
            .finish()
    }
}
