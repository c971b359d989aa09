//! Configuration type definitions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::catalog::DialectTag;

/// Default pool size when `max_open_conn` is unset.
pub const DEFAULT_MAX_OPEN_CONN: u32 = 100;
/// Default idle connections kept when `max_idle_conn` is unset.
pub const DEFAULT_MAX_IDLE_CONN: u32 = 10;
/// Default connection lifetime when `conn_max_lifetime_secs` is unset.
pub const DEFAULT_CONN_MAX_LIFETIME_SECS: u64 = 300;

/// One database endpoint: where it is, which dialect it speaks, and how its
/// pool is tuned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    /// Logical name the connection is registered under.
    #[serde(default, alias = "dbName")]
    pub db_name: String,

    /// Full connection string. Takes precedence over the discrete fields.
    #[serde(default)]
    pub dsn: String,

    /// Dialect tag selecting the driver bundle.
    #[serde(alias = "dbType", alias = "type")]
    pub db_type: DialectTag,

    #[serde(default)]
    pub host: String,

    /// Database port (dialect default when 0).
    #[serde(default)]
    pub port: u16,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// Database name, service name, or SQLite file path.
    #[serde(default)]
    pub database: String,

    #[serde(default, alias = "maxOpenConn")]
    pub max_open_conn: u32,

    #[serde(default, alias = "maxIdleConn")]
    pub max_idle_conn: u32,

    /// Connection lifetime in seconds.
    #[serde(default, alias = "connMaxLifeTime", alias = "conn_max_lifetime")]
    pub conn_max_lifetime_secs: u64,

    /// Driver statement logging: silent, info, warn or error.
    #[serde(default = "default_log_mode", alias = "logMode")]
    pub log_mode: String,

    /// TLS mode: disable, prefer, require, verify-ca, verify-full.
    #[serde(default = "default_ssl_mode", alias = "sslMode")]
    pub ssl_mode: String,

    #[serde(default, alias = "timeZone")]
    pub time_zone: String,

    #[serde(default)]
    pub charset: String,

    /// Create the database file when it does not exist (SQLite only).
    #[serde(default, alias = "createIfMissing")]
    pub create_if_missing: bool,
}

fn default_log_mode() -> String {
    "silent".to_string()
}

fn default_ssl_mode() -> String {
    "disable".to_string()
}

impl DbConfig {
    /// A config for `db_type` with every other field defaulted.
    pub fn new(db_type: DialectTag) -> Self {
        Self {
            db_name: String::new(),
            dsn: String::new(),
            db_type,
            host: String::new(),
            port: 0,
            user: String::new(),
            password: String::new(),
            database: String::new(),
            max_open_conn: 0,
            max_idle_conn: 0,
            conn_max_lifetime_secs: 0,
            log_mode: default_log_mode(),
            ssl_mode: default_ssl_mode(),
            time_zone: String::new(),
            charset: String::new(),
            create_if_missing: false,
        }
    }

    /// Pool tuning with defaults applied to unset values.
    pub fn pool_settings(&self) -> PoolSettings {
        fn or_default<T: PartialEq + Default>(value: T, default: T) -> T {
            if value == T::default() {
                default
            } else {
                value
            }
        }
        PoolSettings {
            max_open: or_default(self.max_open_conn, DEFAULT_MAX_OPEN_CONN),
            max_idle: or_default(self.max_idle_conn, DEFAULT_MAX_IDLE_CONN),
            max_lifetime: Duration::from_secs(or_default(
                self.conn_max_lifetime_secs,
                DEFAULT_CONN_MAX_LIFETIME_SECS,
            )),
        }
    }

    /// Port to use, falling back to the dialect's well-known port.
    pub fn effective_port(&self) -> u16 {
        if self.port != 0 {
            return self.port;
        }
        match self.db_type {
            DialectTag::Mysql => 3306,
            DialectTag::Postgres => 5432,
            DialectTag::SqlServer => 1433,
            DialectTag::Oracle => 1521,
            DialectTag::Dm => 5236,
            DialectTag::Sqlite => 0,
        }
    }
}

/// Resolved pool tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_open: u32,
    pub max_idle: u32,
    pub max_lifetime: Duration,
}

impl PoolSettings {
    /// Idle connections the pool keeps open, never more than `max_open`.
    pub fn idle_floor(&self) -> u32 {
        self.max_idle.min(self.max_open)
    }
}

/// A schema migration between two databases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationRequest {
    pub source: DbConfig,

    pub target: DbConfig,

    #[serde(default, alias = "sourceSchema")]
    pub source_schema: String,

    #[serde(default, alias = "targetSchema")]
    pub target_schema: String,

    /// Only migrate these tables. Empty means every table of the schema.
    #[serde(default, alias = "tableList")]
    pub table_list: Vec<String>,
}
