//! SQLite ⇄ canonical type translation.
//!
//! SQLite only enforces storage classes, so declared type names are kept as
//! close to the source as the affinity rules allow.

use crate::dialect::{
    length_suffix, parse_native_type, precision_scale_suffix, unknown_native_type,
    CanonicalField, CanonicalTypeInfo, FieldKind, FromCanonical, TimeSubtype, ToCanonical,
    TypeMapping,
};

#[derive(Debug, Clone, Default)]
pub struct SqliteTypeTranslator;

impl SqliteTypeTranslator {
    pub fn new() -> Self {
        Self
    }
}

impl ToCanonical for SqliteTypeTranslator {
    fn dialect_name(&self) -> &str {
        "sqlite"
    }

    fn to_canonical(&self, native_type: &str) -> CanonicalTypeInfo {
        let parsed = parse_native_type(native_type);

        let field = match parsed.base.as_str() {
            "char" | "character" | "varchar" | "varying character" | "nchar"
            | "native character" | "nvarchar" => CanonicalField::new(FieldKind::String),
            "text" | "clob" | "tinytext" | "mediumtext" | "longtext" | "json" => {
                CanonicalField::text()
            }

            "date" => CanonicalField::time(TimeSubtype::Date),
            "time" => CanonicalField::time(TimeSubtype::Time),
            "datetime" => CanonicalField::time(TimeSubtype::DateTime),
            "timestamp" => CanonicalField::time(TimeSubtype::Timestamp),

            "tinyint" | "int1" => CanonicalField::new(FieldKind::Int8),
            "smallint" | "int2" => CanonicalField::new(FieldKind::Int16),
            "mediumint" | "int" | "int3" | "int4" => CanonicalField::new(FieldKind::Int32),
            // INTEGER columns hold 64-bit values (and back the rowid).
            "integer" | "bigint" | "int8" | "unsigned big int" => {
                CanonicalField::new(FieldKind::Int64)
            }

            "float" => CanonicalField::new(FieldKind::Float32),
            "real" | "double" | "double precision" => CanonicalField::new(FieldKind::Float64),
            "numeric" | "decimal" | "number" => CanonicalField {
                is_fixed_point: true,
                ..CanonicalField::new(FieldKind::Float64)
            },

            "boolean" | "bool" | "bit" => CanonicalField::new(FieldKind::Bool),

            "blob" | "tinyblob" | "mediumblob" | "longblob" | "binary" | "varbinary" => {
                CanonicalField::new(FieldKind::Bytes)
            }

            _ => return unknown_native_type("sqlite", native_type),
        };

        CanonicalTypeInfo::exact(field.with_qualifier(&parsed.qualifier))
    }
}

impl FromCanonical for SqliteTypeTranslator {
    fn dialect_name(&self) -> &str {
        "sqlite"
    }

    fn from_canonical(&self, field: &CanonicalField) -> TypeMapping {
        let precision = length_suffix(field.precision, None);
        match field.kind {
            FieldKind::Bytes => TypeMapping::exact("BLOB"),
            FieldKind::Int8 => TypeMapping::exact(format!("TINYINT{}", precision)),
            FieldKind::Int16 => TypeMapping::exact(format!("SMALLINT{}", precision)),
            FieldKind::Int32 => TypeMapping::exact(format!("INT{}", precision)),
            FieldKind::Int64 => TypeMapping::exact(format!("INTEGER{}", precision)),
            FieldKind::Float32 => TypeMapping::exact("FLOAT"),
            FieldKind::Float64 if field.is_fixed_point => TypeMapping::exact(format!(
                "DECIMAL{}",
                precision_scale_suffix(field.precision, field.scale, None)
            )),
            FieldKind::Float64 => TypeMapping::exact("REAL"),
            FieldKind::Bool => TypeMapping::exact("BOOLEAN"),
            FieldKind::String if field.is_text => TypeMapping::exact("TEXT"),
            FieldKind::String => {
                TypeMapping::exact(format!("VARCHAR{}", length_suffix(field.length, None)))
            }
            FieldKind::Time => TypeMapping::exact(match field.time_subtype {
                Some(TimeSubtype::Date) => "DATE",
                Some(TimeSubtype::Time) | Some(TimeSubtype::TimeTz) => "TIME",
                Some(TimeSubtype::DateTime) => "DATETIME",
                Some(TimeSubtype::Year) => "INTEGER",
                Some(TimeSubtype::Timestamp)
                | Some(TimeSubtype::TimestampTz)
                | Some(TimeSubtype::TimestampLtz)
                | None => "TIMESTAMP",
            }),
            FieldKind::Runes => {
                TypeMapping::lossy("TEXT", "runes kind has no SQLite equivalent, using TEXT")
            }
        }
    }
}
