//! End-to-end orchestrator scenarios over scripted connections.

use std::sync::Arc;

use dbschema_migrate::drivers::{mysql, postgres, sqlite};
use dbschema_migrate::testing::{row, ScriptedConnection, ScriptedConnector};
use dbschema_migrate::{
    ConnectionRegistry, DbConfig, DialectTag, DriverCatalog, MigrateError, MigrationRequest,
    SchemaMigrator,
};

fn request(source: DialectTag, target: DialectTag, schema: &str) -> MigrationRequest {
    let mut src = DbConfig::new(source);
    src.db_name = "legacy".into();
    src.host = "db1".into();
    src.database = "legacy.db".into();
    let mut dst = DbConfig::new(target);
    dst.db_name = "warehouse".into();
    dst.host = "db2".into();
    MigrationRequest {
        source: src,
        target: dst,
        source_schema: schema.into(),
        target_schema: "public".into(),
        table_list: Vec::new(),
    }
}

fn column(table: &str, name: &str, ty: &str, nullable: &str, pos: &str) -> dbschema_migrate::Row {
    row(&[
        ("table_schema", "shop"),
        ("table_name", table),
        ("column_name", name),
        ("data_type", ty),
        ("comments", ""),
        ("is_nullable", nullable),
        ("ordinal_position", pos),
    ])
}

#[tokio::test]
async fn mysql_orders_to_postgres() {
    let src = Arc::new(
        ScriptedConnection::new("legacy", "mysql")
            .on_query(
                "information_schema.TABLES",
                vec![row(&[
                    ("table_schema", "shop"),
                    ("table_name", "orders"),
                    ("comments", ""),
                ])],
            )
            .on_query(
                "information_schema.COLUMNS",
                vec![
                    column("orders", "id", "int(11)", "0", "1"),
                    column("orders", "amount", "decimal(10,2)", "1", "2"),
                    column("orders", "created", "datetime", "1", "3"),
                ],
            )
            .on_query(
                "CONSTRAINT_NAME = 'PRIMARY'",
                vec![row(&[("table_name", "orders"), ("column_name", "id")])],
            ),
    );
    let dst = Arc::new(ScriptedConnection::new("warehouse", "postgres"));

    let mut catalog = DriverCatalog::new();
    catalog
        .register(mysql::bundle().with_connector(Arc::new(ScriptedConnector::new(src.clone()))))
        .unwrap();
    catalog
        .register(postgres::bundle().with_connector(Arc::new(ScriptedConnector::new(dst.clone()))))
        .unwrap();
    let migrator = SchemaMigrator::new(Arc::new(catalog), Arc::new(ConnectionRegistry::new()));

    let result = migrator
        .run(&request(DialectTag::Mysql, DialectTag::Postgres, "shop"), None)
        .await
        .unwrap();

    assert_eq!(result.tables, vec!["orders"]);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    let ddl = &result.ddl;
    assert!(ddl.contains("CREATE TABLE IF NOT EXISTS \"public\".\"orders\""));
    assert!(ddl.contains("\t\"id\" integer NOT NULL"));
    assert!(ddl.contains("\t\"amount\" decimal(10,2)"));
    assert!(ddl.contains("\t\"created\" timestamp"));
    assert!(ddl.contains("PRIMARY KEY (\"id\")"));

    let executed = dst.executed();
    assert!(executed[0].starts_with("CREATE SCHEMA IF NOT EXISTS \"public\""));
    assert!(executed.iter().any(|s| s.contains("\"orders\"")));
    assert_eq!(migrator.registry().names(), vec!["legacy", "warehouse"]);

    migrator.registry().close_all().await;
    assert!(src.is_closed());
    assert!(dst.is_closed());
}

fn five_tables() -> Vec<dbschema_migrate::Row> {
    ["t1", "t2", "t3", "t4", "t5"]
        .iter()
        .map(|t| row(&[("table_schema", "main"), ("table_name", t), ("comments", "")]))
        .collect()
}

fn lite_column(table: &str) -> dbschema_migrate::Row {
    row(&[
        ("table_name", table),
        ("column_name", "id"),
        ("data_type", "INTEGER"),
        ("is_nullable", "0"),
        ("ordinal_position", "1"),
    ])
}

#[tokio::test]
async fn column_failure_on_one_of_five_tables_aborts() {
    let mut src = ScriptedConnection::new("legacy", "sqlite")
        .on_query("NOT LIKE 'sqlite_%'", five_tables())
        .fail_query("'t3' AS table_name", "database disk image is malformed");
    for t in ["t1", "t2", "t4", "t5"] {
        src = src.on_query(format!("'{}' AS table_name", t), vec![lite_column(t)]);
    }
    let src = Arc::new(src);
    let dst = Arc::new(ScriptedConnection::new("warehouse", "postgres"));
    let dst_connector = Arc::new(ScriptedConnector::new(dst.clone()));

    let mut catalog = DriverCatalog::new();
    catalog
        .register(sqlite::bundle().with_connector(Arc::new(ScriptedConnector::new(src))))
        .unwrap();
    catalog
        .register(postgres::bundle().with_connector(dst_connector.clone()))
        .unwrap();
    let migrator = SchemaMigrator::new(Arc::new(catalog), Arc::new(ConnectionRegistry::new()));

    let err = migrator
        .run(&request(DialectTag::Sqlite, DialectTag::Postgres, "main"), None)
        .await
        .unwrap_err();

    assert!(matches!(err, MigrateError::Discovery { .. }));
    assert_eq!(err.table(), Some("t3"));
    assert_eq!(err.exit_code(), 3);
    assert_eq!(dst_connector.connects(), 0);
    assert!(dst.executed().is_empty());
}

#[tokio::test]
async fn table_without_columns_is_named_in_the_error() {
    let src = Arc::new(
        ScriptedConnection::new("legacy", "mysql")
            .on_query(
                "information_schema.TABLES",
                ["a", "b", "c", "d", "e"]
                    .iter()
                    .map(|t| row(&[("table_schema", "shop"), ("table_name", t), ("comments", "")]))
                    .collect(),
            )
            .on_query(
                "information_schema.COLUMNS",
                ["a", "b", "c", "e"]
                    .iter()
                    .map(|t| column(t, "id", "bigint", "0", "1"))
                    .collect(),
            ),
    );
    let dst = Arc::new(ScriptedConnection::new("warehouse", "postgres"));

    let mut catalog = DriverCatalog::new();
    catalog
        .register(mysql::bundle().with_connector(Arc::new(ScriptedConnector::new(src))))
        .unwrap();
    catalog
        .register(postgres::bundle().with_connector(Arc::new(ScriptedConnector::new(dst.clone()))))
        .unwrap();
    let migrator = SchemaMigrator::new(Arc::new(catalog), Arc::new(ConnectionRegistry::new()));

    let err = migrator
        .run(&request(DialectTag::Mysql, DialectTag::Postgres, "shop"), None)
        .await
        .unwrap_err();
    assert_eq!(err.table(), Some("d"));
    assert!(err.to_string().contains("'legacy'"));
    assert!(dst.log().is_empty());
}

#[tokio::test]
async fn ddl_failure_reports_the_table_and_stops() {
    let src = Arc::new(
        ScriptedConnection::new("legacy", "mysql")
            .on_query(
                "information_schema.TABLES",
                ["a", "b", "c"]
                    .iter()
                    .map(|t| row(&[("table_schema", "shop"), ("table_name", t), ("comments", "")]))
                    .collect(),
            )
            .on_query(
                "information_schema.COLUMNS",
                ["a", "b", "c"]
                    .iter()
                    .map(|t| column(t, "id", "bigint", "0", "1"))
                    .collect(),
            ),
    );
    let dst = Arc::new(
        ScriptedConnection::new("warehouse", "postgres")
            .fail_execute("\"public\".\"b\"", "permission denied"),
    );

    let mut catalog = DriverCatalog::new();
    catalog
        .register(mysql::bundle().with_connector(Arc::new(ScriptedConnector::new(src))))
        .unwrap();
    catalog
        .register(postgres::bundle().with_connector(Arc::new(ScriptedConnector::new(dst.clone()))))
        .unwrap();
    let migrator = SchemaMigrator::new(Arc::new(catalog), Arc::new(ConnectionRegistry::new()));

    let err = migrator
        .run(&request(DialectTag::Mysql, DialectTag::Postgres, "shop"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, MigrateError::Ddl { ref table, .. } if table == "b"));
    let created: Vec<String> = dst
        .executed()
        .into_iter()
        .filter(|s| s.starts_with("CREATE TABLE"))
        .collect();
    // a ran, b failed, c never attempted
    assert_eq!(created.len(), 2);
    assert!(!created.iter().any(|s| s.contains("\"c\"")));
}

#[tokio::test]
async fn sqlite_file_to_sqlite_file() {
    let dir = tempfile::tempdir().unwrap();
    let src_path = dir.path().join("src.db");
    let dst_path = dir.path().join("dst.db");

    let mut src_cfg = DbConfig::new(DialectTag::Sqlite);
    src_cfg.database = src_path.to_string_lossy().into_owned();
    src_cfg.create_if_missing = true;
    let registry = Arc::new(ConnectionRegistry::new());
    let catalog = Arc::new(DriverCatalog::with_builtins());
    let seed = registry.open("seed", &src_cfg, &catalog).await.unwrap();
    seed.execute(
        "CREATE TABLE people (id INTEGER NOT NULL, email VARCHAR(120), born DATE, \
         PRIMARY KEY (id), UNIQUE (email))",
    )
    .await
    .unwrap();
    registry.close("seed").await;

    let mut req = request(DialectTag::Sqlite, DialectTag::Sqlite, "main");
    req.source.database = src_path.to_string_lossy().into_owned();
    req.target.database = dst_path.to_string_lossy().into_owned();
    req.target_schema = "main".into();

    let migrator = SchemaMigrator::new(catalog, registry.clone());
    let result = migrator.run(&req, None).await.unwrap();
    assert_eq!(result.tables, vec!["people"]);
    assert!(result.ddl.contains("\t\"email\" VARCHAR(120)"));
    assert!(result.ddl.contains("PRIMARY KEY (\"id\")"));
    assert!(result.ddl.contains("UNIQUE (\"email\")"));

    let rows = registry
        .query_rows("warehouse", "SELECT name FROM sqlite_master WHERE type = 'table'")
        .await
        .unwrap();
    assert_eq!(rows[0].get("name"), Some("people"));

    // Re-running is safe: every statement is guarded.
    migrator.run(&req, None).await.unwrap();
    registry.close_all().await;
}

#[tokio::test]
async fn mistyped_sqlite_source_is_not_created() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("legacy-typo.db");

    let mut req = request(DialectTag::Sqlite, DialectTag::Sqlite, "main");
    req.source.database = missing.to_string_lossy().into_owned();
    req.target.database = dir.path().join("dst.db").to_string_lossy().into_owned();
    req.target_schema = "main".into();

    let migrator = SchemaMigrator::with_builtins();
    assert!(migrator.run(&req, None).await.is_err());
    assert!(!missing.exists());
    migrator.registry().close_all().await;
}
