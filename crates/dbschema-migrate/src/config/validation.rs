//! Configuration validation.

use super::{DbConfig, MigrationRequest};
use crate::core::catalog::DialectTag;
use crate::error::{MigrateError, Result};

const LOG_MODES: &[&str] = &["silent", "info", "warn", "error"];
const SSL_MODES: &[&str] = &[
    "disable",
    "allow",
    "prefer",
    "require",
    "verify-ca",
    "verify-full",
    "true",
    "false",
];

fn validate_db(side: &str, config: &DbConfig) -> Result<()> {
    if config.db_type == DialectTag::Sqlite {
        if config.dsn.is_empty() && config.database.is_empty() {
            return Err(MigrateError::Config(format!(
                "{}.dsn or {}.database is required for sqlite",
                side, side
            )));
        }
    } else if config.dsn.is_empty() && config.host.is_empty() {
        return Err(MigrateError::Config(format!(
            "{}.dsn or {}.host is required",
            side, side
        )));
    }

    if !LOG_MODES.contains(&config.log_mode.to_lowercase().as_str()) {
        return Err(MigrateError::Config(format!(
            "{}.log_mode must be one of {}, got '{}'",
            side,
            LOG_MODES.join(", "),
            config.log_mode
        )));
    }
    if !SSL_MODES.contains(&config.ssl_mode.to_lowercase().as_str()) {
        return Err(MigrateError::Config(format!(
            "{}.ssl_mode '{}' is not recognized",
            side, config.ssl_mode
        )));
    }
    Ok(())
}

/// Validate a migration request.
pub fn validate(request: &MigrationRequest) -> Result<()> {
    validate_db("source", &request.source)?;
    validate_db("target", &request.target)?;

    if request.source_schema.trim().is_empty() {
        return Err(MigrateError::Config("source_schema is required".into()));
    }
    if request.target_schema.trim().is_empty() {
        return Err(MigrateError::Config("target_schema is required".into()));
    }

    if request.source_name() == request.target_name() {
        return Err(MigrateError::Config(format!(
            "source and target cannot share the logical name '{}'",
            request.source_name()
        )));
    }

    if request.table_list.iter().any(|t| t.trim().is_empty()) {
        return Err(MigrateError::Config(
            "table_list must not contain empty names".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> MigrationRequest {
        let mut source = DbConfig::new(DialectTag::Mysql);
        source.host = "db1".into();
        let mut target = DbConfig::new(DialectTag::Postgres);
        target.host = "db2".into();
        MigrationRequest {
            source,
            target,
            source_schema: "shop".into(),
            target_schema: "public".into(),
            table_list: vec![],
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(validate(&valid_request()).is_ok());
    }

    #[test]
    fn test_missing_host() {
        let mut req = valid_request();
        req.source.host.clear();
        let err = validate(&req).unwrap_err();
        assert!(err.to_string().contains("source.dsn or source.host"));
    }

    #[test]
    fn test_sqlite_needs_path() {
        let mut req = valid_request();
        req.source = DbConfig::new(DialectTag::Sqlite);
        assert!(validate(&req).is_err());
        req.source.database = "app.db".into();
        assert!(validate(&req).is_ok());
    }

    #[test]
    fn test_empty_schema() {
        let mut req = valid_request();
        req.target_schema = " ".into();
        assert!(validate(&req).is_err());
    }

    #[test]
    fn test_unknown_modes() {
        let mut req = valid_request();
        req.source.log_mode = "loud".into();
        assert!(validate(&req).is_err());

        let mut req = valid_request();
        req.target.ssl_mode = "sometimes".into();
        assert!(validate(&req).is_err());
    }

    #[test]
    fn test_same_logical_name() {
        let mut req = valid_request();
        req.source.db_name = "db".into();
        req.target.db_name = "db".into();
        assert!(validate(&req).is_err());
    }
}
