//! Generic row map returned by catalog queries.
//!
//! Every driver decodes its result sets into [`Row`]s whose values are plain
//! text, so the introspectors can group rows without knowing anything about
//! the driver's native value types. Column labels are lower-cased on insert
//! because Oracle and DM upper-case unquoted aliases.

use serde_json::{Map, Value};

use crate::error::{MigrateError, Result};

/// One result row: ordered `(label, value)` pairs, `None` for SQL NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Option<String>>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from `(label, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut row = Self::new();
        for (k, v) in pairs {
            row.push(k, v.map(Into::into));
        }
        row
    }

    /// Append a column. The label is lower-cased.
    pub fn push(&mut self, column: impl Into<String>, value: Option<String>) {
        self.columns.push(column.into().to_lowercase());
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Value of `column`; `None` when the column is absent or NULL.
    pub fn get(&self, column: &str) -> Option<&str> {
        let column = column.to_lowercase();
        self.columns
            .iter()
            .position(|c| *c == column)
            .and_then(|i| self.values[i].as_deref())
    }

    /// Value of `column`, or an error when it is absent or NULL.
    pub fn require(&self, column: &str) -> Result<&str> {
        self.get(column).ok_or_else(|| {
            MigrateError::query(
                "catalog",
                format!("row is missing required column '{}'", column),
            )
        })
    }

    /// Value of `column` or the empty string.
    pub fn get_str(&self, column: &str) -> &str {
        self.get(column).unwrap_or_default()
    }

    /// Integer value of `column`. Decimal renderings such as `"3.0"` are truncated.
    pub fn get_i32(&self, column: &str) -> Option<i32> {
        let raw = self.get(column)?.trim();
        raw.parse::<i32>()
            .ok()
            .or_else(|| raw.parse::<f64>().ok().map(|f| f as i32))
    }

    /// 64-bit integer value of `column`, for counts.
    pub fn get_i64(&self, column: &str) -> Option<i64> {
        let raw = self.get(column)?.trim();
        raw.parse::<i64>()
            .ok()
            .or_else(|| raw.parse::<f64>().ok().map(|f| f as i64))
    }

    /// Drop `column` if present.
    pub fn remove(&mut self, column: &str) {
        let column = column.to_lowercase();
        if let Some(i) = self.columns.iter().position(|c| *c == column) {
            self.columns.remove(i);
            self.values.remove(i);
        }
    }

    /// Catalog-style truthiness: `1`, `y`, `yes`, `t`, `true`.
    pub fn get_bool(&self, column: &str) -> bool {
        matches!(
            self.get(column).map(|v| v.trim().to_lowercase()).as_deref(),
            Some("1" | "y" | "yes" | "t" | "true")
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Option::as_deref))
    }

    /// JSON object with NULLs as `null`.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (k, v) in self.iter() {
            let value = match v {
                Some(s) => Value::String(s.to_string()),
                None => Value::Null,
            };
            map.insert(k.to_string(), value);
        }
        Value::Object(map)
    }
}
