//! `CREATE TABLE` assembly shared by the six synthesizers.
//!
//! A dialect supplies its quoting, its type renderer and a statement
//! template; everything else (column clauses, key clauses, skipping bad
//! fields, executing table by table) lives here.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, warn};

use super::canonical::{CanonicalField, FromCanonical};
use crate::core::schema::{FieldsByTable, PrimaryKeys, UniqueKeys};
use crate::core::traits::{Connection, GeneratedDdl, SqlDialect};
use crate::error::{MigrateError, Result};

/// The per-dialect parts of table synthesis.
pub trait CreateTableTemplate: Send + Sync {
    fn sql_dialect(&self) -> &dyn SqlDialect;

    fn translator(&self) -> &dyn FromCanonical;

    /// Wrap a column/constraint body in the dialect's guarded `CREATE TABLE`.
    fn create_table(&self, schema: &str, table: &str, body: &str) -> Result<String>;
}

/// Column and constraint clauses of one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableBody {
    /// Clauses joined with `,\n`, each indented by a tab.
    pub body: String,
    /// Number of column clauses emitted.
    pub columns: usize,
    pub warnings: Vec<String>,
}

fn key_column_list(
    dialect: &dyn SqlDialect,
    columns: &[String],
    emitted: &HashSet<&str>,
) -> std::result::Result<String, String> {
    let mut quoted = Vec::with_capacity(columns.len());
    for col in columns {
        if !emitted.contains(col.as_str()) {
            return Err(format!("column {:?} is not part of the table", col));
        }
        quoted.push(dialect.quote_ident(col).map_err(|e| e.to_string())?);
    }
    Ok(quoted.join(", "))
}

/// Build the body of `table`: column clauses, then the primary key, then one
/// `UNIQUE` clause per distinct constraint column list.
///
/// A field whose name cannot be quoted is skipped; a key that references a
/// skipped or unknown column is dropped. Both leave a warning.
pub fn build_table_body(
    dialect: &dyn SqlDialect,
    translator: &dyn FromCanonical,
    table: &str,
    fields: &[CanonicalField],
    primary_key: Option<&Vec<String>>,
    unique_keys: Option<&BTreeMap<String, Vec<String>>>,
) -> TableBody {
    let mut clauses = Vec::new();
    let mut warnings = Vec::new();
    let mut emitted: HashSet<&str> = HashSet::new();

    for field in fields {
        let ident = match dialect.quote_ident(&field.column_name) {
            Ok(ident) => ident,
            Err(e) => {
                warnings.push(format!("{}: skipped column {:?}: {}", table, field.column_name, e));
                continue;
            }
        };
        let mapping = translator.from_canonical(field);
        if let Some(w) = mapping.warning {
            warnings.push(format!("{}.{}: {}", table, field.column_name, w));
        }
        let not_null = if field.nullable { "" } else { " NOT NULL" };
        clauses.push(format!("\t{} {}{}", ident, mapping.native_type, not_null));
        emitted.insert(field.column_name.as_str());
    }
    let columns = clauses.len();

    let mut key_sets: Vec<&[String]> = Vec::new();
    if let Some(pk) = primary_key.filter(|pk| !pk.is_empty()) {
        match key_column_list(dialect, pk, &emitted) {
            Ok(list) => {
                clauses.push(format!("\tPRIMARY KEY ({})", list));
                key_sets.push(pk.as_slice());
            }
            Err(reason) => warnings.push(format!("{}: primary key dropped: {}", table, reason)),
        }
    }

    for (name, cols) in unique_keys.into_iter().flatten() {
        if cols.is_empty() || key_sets.contains(&cols.as_slice()) {
            continue;
        }
        match key_column_list(dialect, cols, &emitted) {
            Ok(list) => {
                clauses.push(format!("\tUNIQUE ({})", list));
                key_sets.push(cols.as_slice());
            }
            Err(reason) => {
                warnings.push(format!("{}: unique key {} dropped: {}", table, name, reason))
            }
        }
    }

    TableBody {
        body: clauses.join(",\n"),
        columns,
        warnings,
    }
}

/// Synthesize and execute one statement per table, in table-name order.
///
/// Returns at the first execution failure with the table named in the
/// error; statements already executed stay applied.
pub async fn apply_tables(
    template: &dyn CreateTableTemplate,
    conn: &dyn Connection,
    target_schema: &str,
    primary_keys: &PrimaryKeys,
    unique_keys: &UniqueKeys,
    fields: &FieldsByTable,
) -> Result<GeneratedDdl> {
    if conn.name().is_empty() {
        return Err(MigrateError::Config(
            "logical database name is required to apply DDL".into(),
        ));
    }

    let mut out = GeneratedDdl::default();

    for (table, table_fields) in fields {
        let body = build_table_body(
            template.sql_dialect(),
            template.translator(),
            table,
            table_fields,
            primary_keys.get(table),
            unique_keys.get(table),
        );
        for w in &body.warnings {
            warn!("{}", w);
        }
        out.warnings.extend(body.warnings);

        if body.columns == 0 {
            let msg = format!("{}: no columns could be rendered, table skipped", table);
            warn!("{}", msg);
            out.warnings.push(msg);
            continue;
        }

        let statement = template
            .create_table(target_schema, table, &body.body)
            .map_err(|e| MigrateError::ddl(conn.name(), table, e))?;

        debug!("Executing on '{}':\n{}", conn.name(), statement);
        conn.execute(&statement)
            .await
            .map_err(|e| MigrateError::ddl(conn.name(), table, e))?;
        info!("Created table {}.{} on '{}'", target_schema, table, conn.name());

        out.sql.push_str(&statement);
        if !statement.trim_end().ends_with(';') {
            out.sql.push(';');
        }
        out.sql.push_str("\n\n");
        out.tables.push(table.clone());
    }

    Ok(out)
}
