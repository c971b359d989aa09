//! Hub-and-spoke canonical field model.
//!
//! Every dialect converts its native type strings into a [`CanonicalField`]
//! and renders a [`CanonicalField`] back into its own syntax. Six dialects
//! therefore need twelve conversions instead of thirty direct mappers.
//!
//! ```text
//! Source DB      →  CanonicalField             →  Target DB
//!   int(11)      →  Int32 { precision: 11 }    →  integer
//!   NUMBER(10,2) →  Float64 fixed (10, 2)      →  decimal(10,2)
//! ```
//!
//! # Sentinels
//!
//! `length`, `precision` and `scale` share one convention: `0` means the
//! native string carried no value (use the dialect default, omit the
//! qualifier) and [`UNPARSABLE`] means a value was present but could not be
//! read as an integer (`max`, `*`, garbage). Renderers treat the two
//! differently.

use serde::{Deserialize, Serialize};

/// Sentinel for a qualifier that was present but not an integer.
pub const UNPARSABLE: i32 = -1;

/// Closed set of canonical value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Bytes,
    Runes,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Bool,
    String,
    Time,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldKind::Bytes => "bytes",
            FieldKind::Runes => "runes",
            FieldKind::Int8 => "int8",
            FieldKind::Int16 => "int16",
            FieldKind::Int32 => "int32",
            FieldKind::Int64 => "int64",
            FieldKind::Float32 => "float32",
            FieldKind::Float64 => "float64",
            FieldKind::Bool => "bool",
            FieldKind::String => "string",
            FieldKind::Time => "time",
        };
        f.write_str(name)
    }
}

/// Flavor of a temporal column. Only meaningful when the kind is [`FieldKind::Time`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSubtype {
    Date,
    Time,
    TimeTz,
    DateTime,
    Timestamp,
    TimestampTz,
    TimestampLtz,
    Year,
}

/// Dialect-neutral description of one column's type.
///
/// Structural equality. Built by a dialect's [`ToCanonical`] from a native
/// type string; only `column_name` and `nullable` are filled in afterwards by
/// the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalField {
    pub kind: FieldKind,
    /// Unbounded CLOB-like text rather than a bounded character type.
    pub is_text: bool,
    /// Exact decimal rather than binary floating point.
    pub is_fixed_point: bool,
    pub time_subtype: Option<TimeSubtype>,
    pub length: i32,
    pub precision: i32,
    pub scale: i32,
    pub column_name: String,
    pub nullable: bool,
}

impl CanonicalField {
    /// A bare field of the given kind with no qualifiers.
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            is_text: false,
            is_fixed_point: false,
            time_subtype: None,
            length: 0,
            precision: 0,
            scale: 0,
            column_name: String::new(),
            nullable: true,
        }
    }

    /// Unbounded text, also the fallback for unrecognized native types.
    pub fn text() -> Self {
        Self {
            is_text: true,
            ..Self::new(FieldKind::String)
        }
    }

    /// Bounded character string of `length` characters.
    pub fn varchar(length: i32) -> Self {
        Self {
            length,
            precision: length,
            ..Self::new(FieldKind::String)
        }
    }

    /// Exact decimal with precision and scale.
    pub fn decimal(precision: i32, scale: i32) -> Self {
        Self {
            is_fixed_point: true,
            precision,
            scale,
            ..Self::new(FieldKind::Float64)
        }
    }

    /// Temporal value of the given flavor.
    pub fn time(subtype: TimeSubtype) -> Self {
        Self {
            time_subtype: Some(subtype),
            ..Self::new(FieldKind::Time)
        }
    }

    pub fn with_column_name(mut self, name: impl Into<String>) -> Self {
        self.column_name = name.into();
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Copy length/precision/scale from a parsed native qualifier.
    pub fn with_qualifier(mut self, q: &Qualifier) -> Self {
        self.length = q.length;
        self.precision = q.precision;
        self.scale = q.scale;
        self
    }

    /// Bounded character string (not CLOB-like text).
    pub fn is_bounded_string(&self) -> bool {
        self.kind == FieldKind::String && !self.is_text
    }
}

/// Numeric qualifier parsed from a native `name(a[,b])` suffix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Qualifier {
    pub length: i32,
    pub precision: i32,
    pub scale: i32,
}

/// Result of converting a native type to canonical form.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalTypeInfo {
    pub field: CanonicalField,
    /// Non-fatal diagnostic, e.g. an unrecognized native type.
    pub warning: Option<String>,
}

impl CanonicalTypeInfo {
    pub fn exact(field: CanonicalField) -> Self {
        Self {
            field,
            warning: None,
        }
    }

    pub fn fallback(field: CanonicalField, warning: impl Into<String>) -> Self {
        Self {
            field,
            warning: Some(warning.into()),
        }
    }
}

/// Result of rendering a canonical field into a native type string.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeMapping {
    pub native_type: String,
    pub warning: Option<String>,
}

impl TypeMapping {
    pub fn exact(native_type: impl Into<String>) -> Self {
        Self {
            native_type: native_type.into(),
            warning: None,
        }
    }

    pub fn lossy(native_type: impl Into<String>, warning: impl Into<String>) -> Self {
        Self {
            native_type: native_type.into(),
            warning: Some(warning.into()),
        }
    }
}

/// Convert native type strings into canonical fields.
///
/// Never fails: unrecognized input falls back to unbounded text with a
/// warning so that an exotic column never aborts a migration.
pub trait ToCanonical: Send + Sync {
    /// Dialect tag, e.g. "mysql".
    fn dialect_name(&self) -> &str;

    /// Convert a catalog type string such as `numeric(10,2)`.
    fn to_canonical(&self, native_type: &str) -> CanonicalTypeInfo;
}

/// Render canonical fields as native type strings.
#[allow(clippy::wrong_self_convention)]
pub trait FromCanonical: Send + Sync {
    /// Dialect tag, e.g. "postgres".
    fn dialect_name(&self) -> &str;

    /// Render `field` using this dialect's keywords and qualifier syntax.
    fn from_canonical(&self, field: &CanonicalField) -> TypeMapping;
}

/// Both directions of a dialect's type translation.
pub trait TypeTranslator: ToCanonical + FromCanonical {}

impl<T: ToCanonical + FromCanonical> TypeTranslator for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_constructor() {
        let f = CanonicalField::text();
        assert_eq!(f.kind, FieldKind::String);
        assert!(f.is_text);
        assert_eq!(f.length, 0);
        assert!(f.nullable);
    }

    #[test]
    fn test_structural_equality_ignores_nothing() {
        let a = CanonicalField::decimal(10, 2).with_column_name("amount");
        let b = CanonicalField::decimal(10, 2).with_column_name("amount");
        assert_eq!(a, b);
        assert_ne!(a, b.clone().with_column_name("total"));
        assert_ne!(a, b.with_nullable(false));
    }

    #[test]
    fn test_bounded_string() {
        assert!(CanonicalField::varchar(50).is_bounded_string());
        assert!(!CanonicalField::text().is_bounded_string());
        assert!(!CanonicalField::new(FieldKind::Int32).is_bounded_string());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(FieldKind::Float64.to_string(), "float64");
        assert_eq!(FieldKind::Time.to_string(), "time");
    }
}
