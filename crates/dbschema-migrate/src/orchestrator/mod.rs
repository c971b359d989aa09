//! Schema migration orchestrator - main workflow coordinator.
//!
//! A run is linear with no retries: discover the source schema, fetch keys,
//! prepare the target, translate every column through the canonical model
//! and hand the result to the target's synthesizer. Column discovery, the
//! connection opens and DDL execution are hard failures; key discovery and
//! schema creation only log a warning.

mod pools;

pub use pools::ConnectionRegistry;

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::MigrationRequest;
use crate::core::catalog::{DialectBundle, DriverCatalog};
use crate::core::schema::{FieldsByTable, PrimaryKeys, TableColInfo, UniqueKeys};
use crate::core::traits::Connection;
use crate::error::{MigrateError, Result};

/// Runs schema migrations against a shared catalog and connection registry.
pub struct SchemaMigrator {
    catalog: Arc<DriverCatalog>,
    registry: Arc<ConnectionRegistry>,
}

/// Result of a schema migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaMigrationResult {
    /// Unique run identifier.
    pub run_id: String,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Every statement executed on the target, in order.
    pub ddl: String,

    /// Tables created (or already present) on the target.
    pub tables: Vec<String>,

    /// Translation and soft-failure diagnostics.
    pub warnings: Vec<String>,
}

impl SchemaMigrationResult {
    /// Convert result to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn check_cancelled(cancel: &Option<CancellationToken>) -> Result<()> {
    match cancel {
        Some(token) if token.is_cancelled() => {
            warn!("Migration cancelled");
            Err(MigrateError::Cancelled)
        }
        _ => Ok(()),
    }
}

impl SchemaMigrator {
    pub fn new(catalog: Arc<DriverCatalog>, registry: Arc<ConnectionRegistry>) -> Self {
        Self { catalog, registry }
    }

    /// A migrator over the built-in dialects and a fresh registry.
    pub fn with_builtins() -> Self {
        Self::new(
            Arc::new(DriverCatalog::with_builtins()),
            Arc::new(ConnectionRegistry::new()),
        )
    }

    pub fn catalog(&self) -> &DriverCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Migrate the source schema's tables to the target and return the DDL.
    ///
    /// Connections stay open in the registry after the run; close them with
    /// [`ConnectionRegistry::close_all`].
    pub async fn run(
        &self,
        request: &MigrationRequest,
        cancel: Option<CancellationToken>,
    ) -> Result<SchemaMigrationResult> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        info!("Starting schema migration run: {}", run_id);

        request.validate()?;
        check_cancelled(&cancel)?;
        let source = self.catalog.require(request.source.db_type)?;
        let target = self.catalog.require(request.target.db_type)?;
        let source_name = request.source_name();
        let target_name = request.target_name();
        let schema = request.source_schema.as_str();
        let mut warnings = Vec::new();

        // Phase 1: Discover source schema
        info!(
            "Phase 1: Discovering tables of '{}' on '{}' ({})",
            schema, source_name, source.tag
        );
        let src_conn = self
            .registry
            .open(source_name, &request.source, &self.catalog)
            .await?;
        check_cancelled(&cancel)?;

        let tables = self
            .discover_tables(source, src_conn.as_ref(), request, &mut warnings)
            .await?;
        check_cancelled(&cancel)?;

        let columns = source
            .introspector
            .list_columns_for_tables(src_conn.as_ref(), schema, &tables)
            .await
            .map_err(|e| match e {
                MigrateError::Discovery { .. } | MigrateError::Cancelled => e,
                other => MigrateError::discovery(source_name, None, other),
            })?;
        for table in &tables {
            if columns.get(table).map_or(true, |t| t.columns.is_empty()) {
                return Err(MigrateError::discovery(
                    source_name,
                    Some(table.as_str()),
                    "no columns found",
                ));
            }
        }
        check_cancelled(&cancel)?;

        // Phase 2: Keys (soft)
        info!("Phase 2: Fetching primary and unique keys");
        let primary_keys = match source
            .introspector
            .list_primary_keys(src_conn.as_ref(), schema, &tables)
            .await
        {
            Ok(keys) => keys,
            Err(e) => {
                let msg = format!("primary keys of '{}' unavailable: {}", schema, e);
                warn!("{}, continuing without them", msg);
                warnings.push(msg);
                PrimaryKeys::new()
            }
        };
        let unique_keys = match source
            .introspector
            .list_unique_keys(src_conn.as_ref(), schema, &tables)
            .await
        {
            Ok(keys) => keys,
            Err(e) => {
                let msg = format!("unique keys of '{}' unavailable: {}", schema, e);
                warn!("{}, continuing without them", msg);
                warnings.push(msg);
                UniqueKeys::new()
            }
        };
        check_cancelled(&cancel)?;

        // Phase 3: Prepare target
        info!(
            "Phase 3: Preparing schema '{}' on '{}' ({})",
            request.target_schema, target_name, target.tag
        );
        let tgt_conn = self
            .registry
            .open(target_name, &request.target_config(), &self.catalog)
            .await?;
        if let Err(e) = target
            .introspector
            .create_schema(tgt_conn.as_ref(), &request.target_schema, "")
            .await
        {
            let msg = format!(
                "could not ensure schema '{}' on '{}': {}",
                request.target_schema, target_name, e
            );
            warn!("{}", msg);
            warnings.push(msg);
        }
        check_cancelled(&cancel)?;

        // Phase 4: Translate
        info!(
            "Phase 4: Translating {} table(s) from {} to {}",
            tables.len(),
            source.tag,
            target.tag
        );
        let fields = translate_tables(source, &tables, &columns, &mut warnings);
        check_cancelled(&cancel)?;

        // Phase 5: Create tables
        info!("Phase 5: Creating tables on '{}'", target_name);
        let generated = target
            .synthesizer
            .build_and_apply(
                tgt_conn.as_ref(),
                &request.target_schema,
                &primary_keys,
                &unique_keys,
                &fields,
            )
            .await?;
        warnings.extend(generated.warnings);

        let completed_at = Utc::now();
        info!(
            "Schema migration {} finished: {} table(s), {} warning(s) in {:.2}s",
            run_id,
            generated.tables.len(),
            warnings.len(),
            (completed_at - started_at).num_milliseconds() as f64 / 1000.0
        );

        Ok(SchemaMigrationResult {
            run_id,
            started_at,
            completed_at,
            ddl: generated.sql,
            tables: generated.tables,
            warnings,
        })
    }

    /// Tables of the source schema, narrowed to `table_list` when it is set.
    async fn discover_tables(
        &self,
        source: &DialectBundle,
        conn: &dyn Connection,
        request: &MigrationRequest,
        warnings: &mut Vec<String>,
    ) -> Result<Vec<String>> {
        let schema = request.source_schema.as_str();
        let dbs = source
            .introspector
            .list_tables(conn, &[schema.to_string()])
            .await
            .map_err(|e| match e {
                MigrateError::Discovery { .. } => e,
                other => MigrateError::discovery(conn.name(), None, other),
            })?;
        let discovered: Vec<String> = dbs
            .iter()
            .filter(|db| db.schema_name == schema)
            .flat_map(|db| db.table_names())
            .collect();

        if request.table_list.is_empty() {
            info!("Discovered {} table(s) in '{}'", discovered.len(), schema);
            return Ok(discovered);
        }

        for wanted in &request.table_list {
            if !discovered.contains(wanted) {
                let msg = format!("table '{}' not found in schema '{}'", wanted, schema);
                warn!("{}", msg);
                warnings.push(msg);
            }
        }
        let selected: Vec<String> = discovered
            .into_iter()
            .filter(|t| request.table_list.contains(t))
            .collect();
        info!(
            "Selected {} of {} requested table(s) in '{}'",
            selected.len(),
            request.table_list.len(),
            schema
        );
        Ok(selected)
    }

    /// Append `ddl` to the file at `path`, creating it if needed.
    pub fn save_ddl(path: impl AsRef<Path>, ddl: &str) -> Result<()> {
        let path = path.as_ref();
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        file.write_all(ddl.as_bytes())?;
        info!("Saved DDL to {}", path.display());
        Ok(())
    }
}

/// Translate every discovered column into the canonical model.
fn translate_tables(
    source: &DialectBundle,
    tables: &[String],
    columns: &HashMap<String, TableColInfo>,
    warnings: &mut Vec<String>,
) -> FieldsByTable {
    let mut fields = FieldsByTable::new();
    for table in tables {
        let Some(info) = columns.get(table) else {
            continue;
        };
        let mut ordered = info.columns.clone();
        ordered.sort_by_key(|c| c.ordinal_position);
        let translated = ordered
            .iter()
            .map(|col| {
                let info = source.translator.to_canonical(&col.data_type);
                if let Some(w) = info.warning {
                    let msg = format!("{}.{}: {}", table, col.column_name, w);
                    warn!("{}", msg);
                    warnings.push(msg);
                }
                info.field
                    .with_column_name(&col.column_name)
                    .with_nullable(col.is_nullable)
            })
            .collect();
        fields.insert(table.clone(), translated);
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbConfig;
    use crate::core::catalog::DialectTag;
    use crate::core::traits::Connector;
    use crate::drivers::{mysql, postgres};
    use crate::testing::{row, FailingConnector, ScriptedConnection, ScriptedConnector};

    fn request() -> MigrationRequest {
        let mut source = DbConfig::new(DialectTag::Mysql);
        source.db_name = "src".into();
        source.host = "db1".into();
        let mut target = DbConfig::new(DialectTag::Postgres);
        target.db_name = "dst".into();
        target.host = "db2".into();
        MigrationRequest {
            source,
            target,
            source_schema: "shop".into(),
            target_schema: "public".into(),
            table_list: Vec::new(),
        }
    }

    fn migrator(src: Arc<dyn Connector>, dst: Arc<dyn Connector>) -> SchemaMigrator {
        let mut catalog = DriverCatalog::new();
        catalog.register(mysql::bundle().with_connector(src)).unwrap();
        catalog
            .register(postgres::bundle().with_connector(dst))
            .unwrap();
        SchemaMigrator::new(Arc::new(catalog), Arc::new(ConnectionRegistry::new()))
    }

    fn source_conn() -> ScriptedConnection {
        ScriptedConnection::new("src", "mysql")
            .on_query(
                "information_schema.TABLES",
                vec![
                    row(&[("table_schema", "shop"), ("table_name", "a"), ("comments", "")]),
                    row(&[("table_schema", "shop"), ("table_name", "b"), ("comments", "")]),
                ],
            )
            .on_query(
                "information_schema.COLUMNS",
                vec![
                    row(&[
                        ("table_name", "a"),
                        ("column_name", "id"),
                        ("data_type", "int(11)"),
                        ("is_nullable", "NO"),
                        ("ordinal_position", "1"),
                    ]),
                    row(&[
                        ("table_name", "b"),
                        ("column_name", "geo"),
                        ("data_type", "geometry"),
                        ("is_nullable", "YES"),
                        ("ordinal_position", "1"),
                    ]),
                ],
            )
    }

    #[tokio::test]
    async fn test_table_list_filters_and_warns() {
        let src = Arc::new(source_conn());
        let dst = Arc::new(ScriptedConnection::new("dst", "postgres"));
        let m = migrator(
            Arc::new(ScriptedConnector::new(src)),
            Arc::new(ScriptedConnector::new(dst.clone())),
        );
        let mut req = request();
        req.table_list = vec!["a".into(), "missing".into()];

        let result = m.run(&req, None).await.unwrap();
        assert_eq!(result.tables, vec!["a"]);
        assert!(result.ddl.contains("\"a\""));
        assert!(!result.ddl.contains("\"b\""));
        assert!(result.warnings.iter().any(|w| w.contains("'missing'")));
    }

    #[tokio::test]
    async fn test_unknown_type_is_a_warning_not_an_error() {
        let src = Arc::new(source_conn());
        let dst = Arc::new(ScriptedConnection::new("dst", "postgres"));
        let m = migrator(
            Arc::new(ScriptedConnector::new(src)),
            Arc::new(ScriptedConnector::new(dst)),
        );
        let result = m.run(&request(), None).await.unwrap();
        assert!(result.warnings.iter().any(|w| w.starts_with("b.geo:")));
        assert!(result.ddl.contains("\"geo\" text"));
    }

    #[tokio::test]
    async fn test_key_failures_are_soft() {
        let src = Arc::new(
            source_conn()
                .fail_query("CONSTRAINT_NAME = 'PRIMARY'", "denied")
                .fail_query("CONSTRAINT_TYPE = 'UNIQUE'", "denied"),
        );
        let dst = Arc::new(ScriptedConnection::new("dst", "postgres"));
        let m = migrator(
            Arc::new(ScriptedConnector::new(src)),
            Arc::new(ScriptedConnector::new(dst)),
        );
        let result = m.run(&request(), None).await.unwrap();
        assert_eq!(result.tables.len(), 2);
        assert!(!result.ddl.contains("PRIMARY KEY"));
        assert!(result.warnings.iter().any(|w| w.contains("primary keys")));
        assert!(result.warnings.iter().any(|w| w.contains("unique keys")));
    }

    #[tokio::test]
    async fn test_target_open_failure_is_hard() {
        let src = Arc::new(source_conn());
        let m = migrator(
            Arc::new(ScriptedConnector::new(src)),
            Arc::new(FailingConnector("refused".into())),
        );
        let err = m.run(&request(), None).await.unwrap_err();
        assert!(matches!(err, MigrateError::Connection { ref name, .. } if name == "dst"));
    }

    #[tokio::test]
    async fn test_schema_creation_failure_is_soft() {
        let src = Arc::new(source_conn());
        let dst = Arc::new(
            ScriptedConnection::new("dst", "postgres").fail_execute("CREATE SCHEMA", "denied"),
        );
        let m = migrator(
            Arc::new(ScriptedConnector::new(src)),
            Arc::new(ScriptedConnector::new(dst)),
        );
        let result = m.run(&request(), None).await.unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("could not ensure schema")));
        assert_eq!(result.tables.len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let src = Arc::new(source_conn());
        let dst = Arc::new(ScriptedConnection::new("dst", "postgres"));
        let m = migrator(
            Arc::new(ScriptedConnector::new(src)),
            Arc::new(ScriptedConnector::new(dst.clone())),
        );
        let token = CancellationToken::new();
        token.cancel();
        let err = m.run(&request(), Some(token)).await.unwrap_err();
        assert!(matches!(err, MigrateError::Cancelled));
        assert!(dst.log().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_request_is_rejected_before_connecting() {
        let src = Arc::new(ScriptedConnection::new("src", "mysql"));
        let connector = Arc::new(ScriptedConnector::new(src));
        let m = migrator(connector.clone(), Arc::new(FailingConnector("x".into())));
        let mut req = request();
        req.source_schema.clear();
        assert!(matches!(
            m.run(&req, None).await,
            Err(MigrateError::Config(_))
        ));
        assert_eq!(connector.connects(), 0);
    }

    #[test]
    fn test_save_ddl_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.sql");
        SchemaMigrator::save_ddl(&path, "CREATE TABLE a ();\n").unwrap();
        SchemaMigrator::save_ddl(&path, "CREATE TABLE b ();\n").unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "CREATE TABLE a ();\nCREATE TABLE b ();\n");
    }

    #[test]
    fn test_result_to_json() {
        let now = Utc::now();
        let result = SchemaMigrationResult {
            run_id: "r1".into(),
            started_at: now,
            completed_at: now,
            ddl: "x".into(),
            tables: vec!["a".into()],
            warnings: Vec::new(),
        };
        let json = result.to_json().unwrap();
        assert!(json.contains("\"run_id\": \"r1\""));
    }
}
