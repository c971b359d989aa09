//! Discovery structures and the row grouping shared by all introspectors.
//!
//! Introspector queries alias their result columns to a fixed vocabulary
//! (`table_schema`, `table_name`, `comments`, `column_name`, `data_type`,
//! `is_nullable`, `ordinal_position`, `constraint_name`) so that one set of
//! grouping functions can build the structures below for every dialect.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::core::value::Row;
use crate::dialect::CanonicalField;
use crate::error::Result;

/// `table → ordered primary key columns`.
pub type PrimaryKeys = HashMap<String, Vec<String>>;

/// `table → constraint → ordered columns`.
pub type UniqueKeys = HashMap<String, BTreeMap<String, Vec<String>>>;

/// `table → canonical fields in column order`.
pub type FieldsByTable = BTreeMap<String, Vec<CanonicalField>>;

/// `schema → table → columns`.
pub type ColumnsBySchema = HashMap<String, HashMap<String, TableColInfo>>;

/// A table discovered in a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub table_name: String,
    pub comment: String,
}

/// All tables of one logical schema, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicDbInfo {
    pub schema_name: String,
    pub tables: Vec<TableInfo>,
}

impl LogicDbInfo {
    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.table_name.clone()).collect()
    }
}

/// One column as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub column_name: String,
    pub comment: String,
    /// Native type string, qualifier included (e.g. `varchar(100)`).
    pub data_type: String,
    pub is_nullable: bool,
    pub ordinal_position: i32,
}

/// Columns of one table, in ordinal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColInfo {
    pub table_name: String,
    pub columns: Vec<ColumnInfo>,
}

/// Group `(table_schema, table_name, comments)` rows into schemas.
///
/// Duplicate `(schema, table)` pairs keep their first occurrence.
pub fn group_tables(rows: &[Row]) -> Result<Vec<LogicDbInfo>> {
    let mut out: Vec<LogicDbInfo> = Vec::new();
    let mut seen = HashSet::new();

    for row in rows {
        let schema = row.require("table_schema")?;
        let table = row.require("table_name")?;
        if !seen.insert((schema.to_string(), table.to_string())) {
            continue;
        }
        let info = TableInfo {
            table_name: table.to_string(),
            comment: row.get_str("comments").to_string(),
        };
        match out.iter_mut().find(|db| db.schema_name == schema) {
            Some(db) => db.tables.push(info),
            None => out.push(LogicDbInfo {
                schema_name: schema.to_string(),
                tables: vec![info],
            }),
        }
    }

    Ok(out)
}

fn column_from_row(row: &Row) -> Result<ColumnInfo> {
    Ok(ColumnInfo {
        column_name: row.require("column_name")?.to_string(),
        comment: row.get_str("comments").to_string(),
        data_type: row.get_str("data_type").to_string(),
        is_nullable: row.get("is_nullable").is_none() || row.get_bool("is_nullable"),
        ordinal_position: row.get_i32("ordinal_position").unwrap_or(0),
    })
}

fn sort_columns(table: &mut TableColInfo) {
    // Stable: rows without an ordinal keep query order.
    table.columns.sort_by_key(|c| c.ordinal_position);
}

/// Group column rows by table.
pub fn group_columns(rows: &[Row]) -> Result<HashMap<String, TableColInfo>> {
    let mut out: HashMap<String, TableColInfo> = HashMap::new();
    for row in rows {
        let table = row.require("table_name")?;
        let column = column_from_row(row)?;
        out.entry(table.to_string())
            .or_insert_with(|| TableColInfo {
                table_name: table.to_string(),
                columns: Vec::new(),
            })
            .columns
            .push(column);
    }
    out.values_mut().for_each(sort_columns);
    Ok(out)
}

/// Group column rows by schema, then table.
pub fn group_columns_by_schema(rows: &[Row]) -> Result<ColumnsBySchema> {
    let mut out: ColumnsBySchema = HashMap::new();
    for row in rows {
        let schema = row.require("table_schema")?;
        let table = row.require("table_name")?;
        let column = column_from_row(row)?;
        out.entry(schema.to_string())
            .or_default()
            .entry(table.to_string())
            .or_insert_with(|| TableColInfo {
                table_name: table.to_string(),
                columns: Vec::new(),
            })
            .columns
            .push(column);
    }
    for tables in out.values_mut() {
        tables.values_mut().for_each(sort_columns);
    }
    Ok(out)
}

/// Group `(table_name, column_name)` rows; column order follows row order.
pub fn group_primary_keys(rows: &[Row]) -> Result<PrimaryKeys> {
    let mut out = PrimaryKeys::new();
    for row in rows {
        let table = row.require("table_name")?;
        let column = row.require("column_name")?;
        out.entry(table.to_string())
            .or_default()
            .push(column.to_string());
    }
    Ok(out)
}

/// Group `(table_name, constraint_name, column_name)` rows; column order follows row order.
pub fn group_unique_keys(rows: &[Row]) -> Result<UniqueKeys> {
    let mut out = UniqueKeys::new();
    for row in rows {
        let table = row.require("table_name")?;
        let constraint = row.require("constraint_name")?;
        let column = row.require("column_name")?;
        out.entry(table.to_string())
            .or_default()
            .entry(constraint.to_string())
            .or_default()
            .push(column.to_string());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Option<&str>)]) -> Row {
        Row::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn test_group_tables_preserves_order_and_dedups() {
        let rows = vec![
            row(&[("table_schema", Some("sales")), ("table_name", Some("orders")), ("comments", Some("o"))]),
            row(&[("table_schema", Some("sales")), ("table_name", Some("customers")), ("comments", None)]),
            row(&[("table_schema", Some("hr")), ("table_name", Some("staff")), ("comments", None)]),
            row(&[("table_schema", Some("sales")), ("table_name", Some("orders")), ("comments", None)]),
        ];
        let dbs = group_tables(&rows).unwrap();
        assert_eq!(dbs.len(), 2);
        assert_eq!(dbs[0].schema_name, "sales");
        assert_eq!(dbs[0].table_names(), vec!["orders", "customers"]);
        assert_eq!(dbs[0].tables[0].comment, "o");
        assert_eq!(dbs[1].table_names(), vec!["staff"]);
    }

    #[test]
    fn test_group_columns_sorts_by_ordinal() {
        let rows = vec![
            row(&[("table_name", Some("t")), ("column_name", Some("b")), ("data_type", Some("int")), ("is_nullable", Some("NO")), ("ordinal_position", Some("2"))]),
            row(&[("table_name", Some("t")), ("column_name", Some("a")), ("data_type", Some("varchar(10)")), ("is_nullable", Some("YES")), ("ordinal_position", Some("1"))]),
        ];
        let cols = group_columns(&rows).unwrap();
        let t = &cols["t"];
        assert_eq!(t.columns[0].column_name, "a");
        assert!(t.columns[0].is_nullable);
        assert_eq!(t.columns[1].column_name, "b");
        assert!(!t.columns[1].is_nullable);
    }

    #[test]
    fn test_group_columns_missing_column_name_is_error() {
        let rows = vec![row(&[("table_name", Some("t"))])];
        assert!(group_columns(&rows).is_err());
    }

    #[test]
    fn test_primary_key_keeps_declared_order() {
        let rows = vec![
            row(&[("table_name", Some("t")), ("column_name", Some("b"))]),
            row(&[("table_name", Some("t")), ("column_name", Some("a"))]),
        ];
        let pks = group_primary_keys(&rows).unwrap();
        assert_eq!(pks["t"], vec!["b", "a"]);
        assert!(!pks.contains_key("other"));
    }

    #[test]
    fn test_unique_keys_grouped_per_constraint() {
        let rows = vec![
            row(&[("table_name", Some("t")), ("constraint_name", Some("uk_email")), ("column_name", Some("email"))]),
            row(&[("table_name", Some("t")), ("constraint_name", Some("uk_pair")), ("column_name", Some("y"))]),
            row(&[("table_name", Some("t")), ("constraint_name", Some("uk_pair")), ("column_name", Some("x"))]),
        ];
        let uks = group_unique_keys(&rows).unwrap();
        assert_eq!(uks["t"]["uk_email"], vec!["email"]);
        assert_eq!(uks["t"]["uk_pair"], vec!["y", "x"]);
    }

    #[test]
    fn test_group_columns_by_schema() {
        let rows = vec![
            row(&[("table_schema", Some("s1")), ("table_name", Some("t")), ("column_name", Some("id"))]),
            row(&[("table_schema", Some("s2")), ("table_name", Some("t")), ("column_name", Some("id"))]),
        ];
        let by_schema = group_columns_by_schema(&rows).unwrap();
        assert_eq!(by_schema.len(), 2);
        assert!(by_schema["s1"]["t"].columns[0].is_nullable);
    }
}
