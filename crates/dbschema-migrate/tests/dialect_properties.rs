//! Translation and synthesis properties that must hold for every dialect.

use std::sync::Arc;

use dbschema_migrate::core::{FieldsByTable, PrimaryKeys, UniqueKeys};
use dbschema_migrate::dialect::UNPARSABLE;
use dbschema_migrate::testing::{ScriptedConnection, ScriptedConnector};
use dbschema_migrate::{
    CanonicalField, ConnectionRegistry, DbConfig, DialectTag, DriverCatalog, FieldKind,
};

#[test]
fn varchar_50_stays_bounded_across_every_pair() {
    let catalog = DriverCatalog::with_builtins();
    for from in DialectTag::ALL {
        let source = catalog.require(from).unwrap();
        let info = source.translator.to_canonical("varchar(50)");
        assert!(info.warning.is_none(), "{} warned on varchar(50)", from);
        assert!(info.field.is_bounded_string(), "{}: {:?}", from, info.field);
        assert_eq!(info.field.length, 50, "{}", from);

        for to in DialectTag::ALL {
            let target = catalog.require(to).unwrap();
            let native = target.translator.from_canonical(&info.field).native_type;
            let lower = native.to_lowercase();
            assert!(
                lower.contains("char") && lower.contains("(50"),
                "{} -> {} rendered {}",
                from,
                to,
                native
            );
        }
    }
}

#[test]
fn unparsable_qualifier_is_distinct_from_absent() {
    let catalog = DriverCatalog::with_builtins();
    for tag in DialectTag::ALL {
        let t = &catalog.require(tag).unwrap().translator;

        let bad = t.to_canonical("decimal(abc,2)").field;
        assert_eq!(bad.precision, UNPARSABLE, "{}", tag);
        assert_eq!(bad.scale, 2, "{}", tag);

        let bare = t.to_canonical("decimal").field;
        assert_eq!(bare.precision, 0, "{}", tag);
    }
}

#[test]
fn unknown_types_fall_back_to_text() {
    let catalog = DriverCatalog::with_builtins();
    for tag in DialectTag::ALL {
        let t = &catalog.require(tag).unwrap().translator;
        for nonsense in ["frobnicate", "no_such_type(3)", "", "((("] {
            let info = t.to_canonical(nonsense);
            assert_eq!(info.field.kind, FieldKind::String, "{} on {:?}", tag, nonsense);
            assert!(info.field.is_text, "{} on {:?}", tag, nonsense);
            assert!(info.warning.is_some(), "{} on {:?}", tag, nonsense);
        }
    }
}

#[test]
fn representative_types_round_trip() {
    let catalog = DriverCatalog::with_builtins();
    let cases: &[(DialectTag, &[&str])] = &[
        (DialectTag::Mysql, &["int(11)", "varchar(255)", "decimal(10,2)", "datetime(3)"]),
        (DialectTag::Postgres, &["integer", "varchar(50)", "decimal(12,4)", "timestamptz(3)"]),
        (DialectTag::SqlServer, &["int", "nvarchar(50)", "decimal(18,4)", "datetime2(3)"]),
        (DialectTag::Oracle, &["NUMBER(10)", "NUMBER(12,2)", "DATE", "TIMESTAMP(6)"]),
        (DialectTag::Sqlite, &["INTEGER", "VARCHAR(50)", "DECIMAL(10,2)", "DATETIME"]),
        (DialectTag::Dm, &["INT", "VARCHAR(50)", "DECIMAL(10,2)", "TIMESTAMP(6)"]),
    ];
    for (tag, types) in cases {
        let t = &catalog.require(*tag).unwrap().translator;
        for native in *types {
            let info = t.to_canonical(native);
            assert!(info.warning.is_none(), "{} warned on {}", tag, native);
            let back = t.from_canonical(&info.field);
            assert_eq!(back.native_type, *native, "{} round trip", tag);
        }
    }
}

#[test]
fn money_keeps_its_scale_on_every_target() {
    let catalog = DriverCatalog::with_builtins();
    let mssql = &catalog.require(DialectTag::SqlServer).unwrap().translator;
    for (native, digits) in [("money", "19"), ("smallmoney", "10")] {
        let field = mssql.to_canonical(native).field;
        for to in DialectTag::ALL {
            let rendered = catalog
                .require(to)
                .unwrap()
                .translator
                .from_canonical(&field);
            assert!(rendered.warning.is_none(), "{} -> {}", native, to);
            if to == DialectTag::Oracle {
                assert_eq!(rendered.native_type, format!("NUMBER({},4)", digits));
            } else {
                assert!(
                    rendered.native_type.ends_with(&format!("({},4)", digits)),
                    "{} -> {} rendered {}",
                    native,
                    to,
                    rendered.native_type
                );
            }
        }
    }
}

#[tokio::test]
async fn uuid_primary_key_is_bounded_on_every_target() {
    let catalog = DriverCatalog::with_builtins();
    let sources = [
        (DialectTag::Postgres, "uuid"),
        (DialectTag::SqlServer, "uniqueidentifier"),
    ];
    for (from, native) in sources {
        let info = catalog.require(from).unwrap().translator.to_canonical(native);
        assert!(info.warning.is_none(), "{} warned on {}", from, native);

        let mut fields = FieldsByTable::new();
        fields.insert(
            "sessions".to_string(),
            vec![info.field.with_column_name("id").with_nullable(false)],
        );
        let mut pks = PrimaryKeys::new();
        pks.insert("sessions".to_string(), vec!["id".to_string()]);

        for to in DialectTag::ALL {
            let bundle = catalog.require(to).unwrap();
            let conn = ScriptedConnection::new("dst", to.as_str());
            let ddl = bundle
                .synthesizer
                .build_and_apply(&conn, "app", &pks, &UniqueKeys::new(), &fields)
                .await
                .unwrap();
            let lower = ddl.sql.to_lowercase();
            assert!(lower.contains("(36"), "{} -> {}:\n{}", from, to, ddl.sql);
            for unbounded in ["longtext", "clob", "(max)"] {
                assert!(!lower.contains(unbounded), "{} -> {}:\n{}", from, to, ddl.sql);
            }
            assert!(ddl.sql.contains("PRIMARY KEY"), "{}", to);
        }
    }
}

#[tokio::test]
async fn composite_primary_key_keeps_declared_order() {
    let catalog = DriverCatalog::with_builtins();
    let mut fields = FieldsByTable::new();
    fields.insert(
        "pairs".to_string(),
        vec![
            CanonicalField::new(FieldKind::Int64)
                .with_column_name("a")
                .with_nullable(false),
            CanonicalField::new(FieldKind::Int64)
                .with_column_name("b")
                .with_nullable(false),
        ],
    );
    let mut pks = PrimaryKeys::new();
    pks.insert("pairs".to_string(), vec!["b".to_string(), "a".to_string()]);

    for tag in DialectTag::ALL {
        let bundle = catalog.require(tag).unwrap();
        let conn = ScriptedConnection::new("dst", tag.as_str());
        let ddl = bundle
            .synthesizer
            .build_and_apply(&conn, "app", &pks, &UniqueKeys::new(), &fields)
            .await
            .unwrap();
        let expected = format!(
            "PRIMARY KEY ({}, {})",
            bundle.dialect.quote_ident("b").unwrap(),
            bundle.dialect.quote_ident("a").unwrap()
        );
        assert!(ddl.sql.contains(&expected), "{}:\n{}", tag, ddl.sql);
        assert_eq!(conn.executed().len(), 1, "{}", tag);
    }
}

#[tokio::test]
async fn unique_keys_follow_the_primary_key() {
    let catalog = DriverCatalog::with_builtins();
    let bundle = catalog.require(DialectTag::Mysql).unwrap();
    let mut fields = FieldsByTable::new();
    fields.insert(
        "users".to_string(),
        vec![
            CanonicalField::new(FieldKind::Int64).with_column_name("id"),
            CanonicalField::varchar(100).with_column_name("email"),
            CanonicalField::varchar(30).with_column_name("tenant"),
        ],
    );
    let mut pks = PrimaryKeys::new();
    pks.insert("users".to_string(), vec!["id".to_string()]);
    let mut uks = UniqueKeys::new();
    uks.entry("users".to_string()).or_default().insert(
        "uk_tenant_email".to_string(),
        vec!["tenant".to_string(), "email".to_string()],
    );

    let conn = ScriptedConnection::new("dst", "mysql");
    let ddl = bundle
        .synthesizer
        .build_and_apply(&conn, "app", &pks, &uks, &fields)
        .await
        .unwrap();
    let pk_at = ddl.sql.find("PRIMARY KEY (`id`)").unwrap();
    let uk_at = ddl.sql.find("UNIQUE (`tenant`, `email`)").unwrap();
    assert!(pk_at < uk_at);
    assert!(!ddl.sql.contains("uk_tenant_email"));
}

#[tokio::test]
async fn empty_logical_name_is_rejected_by_every_synthesizer() {
    let catalog = DriverCatalog::with_builtins();
    let mut fields = FieldsByTable::new();
    fields.insert(
        "t".to_string(),
        vec![CanonicalField::text().with_column_name("c")],
    );
    for tag in DialectTag::ALL {
        let conn = ScriptedConnection::new("", tag.as_str());
        let result = catalog
            .require(tag)
            .unwrap()
            .synthesizer
            .build_and_apply(&conn, "app", &PrimaryKeys::new(), &UniqueKeys::new(), &fields)
            .await;
        assert!(result.is_err(), "{}", tag);
        assert!(conn.log().is_empty(), "{}", tag);
    }
}

#[test]
fn duplicate_registration_names_the_dialect() {
    let mut catalog = DriverCatalog::with_builtins();
    let err = catalog
        .register(dbschema_migrate::drivers::postgres::bundle())
        .unwrap_err();
    assert!(err.to_string().contains("'postgres'"), "{}", err);
    assert_eq!(catalog.tags().len(), 6);
}

#[tokio::test]
async fn open_twice_yields_one_handle() {
    let conn = Arc::new(ScriptedConnection::new("src", "postgres"));
    let connector = Arc::new(ScriptedConnector::new(conn));
    let mut catalog = DriverCatalog::with_builtins();
    catalog.replace(dbschema_migrate::drivers::postgres::bundle().with_connector(connector.clone()));
    let registry = ConnectionRegistry::new();
    let mut cfg = DbConfig::new(DialectTag::Postgres);
    cfg.host = "db".into();

    let first = registry.open("src", &cfg, &catalog).await.unwrap();
    let second = registry.open("src", &cfg, &catalog).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(connector.connects(), 1);
    assert_eq!(registry.names().len(), 1);
}
