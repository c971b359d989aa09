//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use std::path::Path;

use crate::core::catalog::DialectTag;
use crate::error::{MigrateError, Result};

impl MigrationRequest {
    /// Load and validate a request from a `.yaml`, `.yml` or `.json` file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let request = Self::read(path)?;
        request.validate()?;
        Ok(request)
    }

    /// Parse a request file without validating it, so callers can apply
    /// overrides first.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            other => Err(MigrateError::Config(format!(
                "unsupported config extension {:?} for {}, expected .yaml, .yml or .json",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }

    /// Parse a request from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let request: MigrationRequest = serde_yaml::from_str(yaml)?;
        request.validate()?;
        Ok(request)
    }

    /// Parse a request from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let request: MigrationRequest = serde_json::from_str(json)?;
        request.validate()?;
        Ok(request)
    }

    /// Validate the request.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Logical name of the source connection.
    pub fn source_name(&self) -> &str {
        logical_name(&self.source, "source")
    }

    /// Logical name of the target connection.
    pub fn target_name(&self) -> &str {
        logical_name(&self.target, "target")
    }

    /// The target endpoint as it is opened: a missing SQLite file is created.
    pub fn target_config(&self) -> DbConfig {
        DbConfig {
            create_if_missing: true,
            ..self.target.clone()
        }
    }
}

fn logical_name<'a>(config: &'a DbConfig, fallback: &'a str) -> &'a str {
    if config.db_name.is_empty() {
        fallback
    } else {
        &config.db_name
    }
}

impl DbConfig {
    /// The DSN, or one generated from the discrete fields when `dsn` is empty.
    pub fn connection_string(&self) -> String {
        if !self.dsn.is_empty() {
            return self.dsn.clone();
        }
        let port = self.effective_port();
        match self.db_type {
            DialectTag::Mysql => {
                let mut dsn = format!(
                    "mysql://{}:{}@{}:{}/{}",
                    self.user, self.password, self.host, port, self.database
                );
                if !self.charset.is_empty() {
                    dsn.push_str("?charset=");
                    dsn.push_str(&self.charset);
                }
                dsn
            }
            DialectTag::Postgres => format!(
                "host={} port={} user={} password={} dbname={} sslmode={}",
                self.host, port, self.user, self.password, self.database, self.ssl_mode
            ),
            DialectTag::SqlServer => {
                let encrypt = match self.ssl_mode.to_lowercase().as_str() {
                    "disable" | "false" | "no" => "false",
                    _ => "true",
                };
                format!(
                    "server=tcp:{},{};database={};user id={};password={};encrypt={};TrustServerCertificate=true",
                    self.host, port, self.database, self.user, self.password, encrypt
                )
            }
            DialectTag::Oracle => format!(
                "Driver={{Oracle}};Dbq={}:{}/{};Uid={};Pwd={};",
                self.host, port, self.database, self.user, self.password
            ),
            DialectTag::Dm => format!(
                "Driver={{DM8 ODBC DRIVER}};Server={};TCP_Port={};UID={};PWD={};",
                self.host, port, self.user, self.password
            ),
            DialectTag::Sqlite => self.database.clone(),
        }
    }
}
