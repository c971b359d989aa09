//! MySQL/MariaDB ⇄ canonical type translation.

use crate::dialect::{
    cap, length_suffix, parse_native_type, precision_scale_suffix, unknown_native_type,
    CanonicalField, CanonicalTypeInfo, FieldKind, FromCanonical, TimeSubtype, ToCanonical,
    TypeMapping, UNPARSABLE,
};

/// `varchar` length used when the canonical field carries none.
const DEFAULT_VARCHAR_LENGTH: i32 = 255;
const MAX_DECIMAL_PRECISION: i32 = 65;
const MAX_DECIMAL_SCALE: i32 = 30;
const MAX_FRACTIONAL_SECONDS: i32 = 6;

#[derive(Debug, Clone, Default)]
pub struct MysqlTypeTranslator;

impl MysqlTypeTranslator {
    pub fn new() -> Self {
        Self
    }
}

/// `int unsigned zerofill` → (`int`, unsigned).
fn strip_modifiers(base: &str) -> (String, bool) {
    let mut unsigned = false;
    let words: Vec<&str> = base
        .split_whitespace()
        .filter(|w| match *w {
            "unsigned" => {
                unsigned = true;
                false
            }
            "signed" | "zerofill" => false,
            _ => true,
        })
        .collect();
    (words.join(" "), unsigned)
}

/// Unsigned integers move up one width so every value still fits.
fn widen(kind: FieldKind) -> FieldKind {
    match kind {
        FieldKind::Int8 => FieldKind::Int16,
        FieldKind::Int16 => FieldKind::Int32,
        FieldKind::Int32 => FieldKind::Int64,
        other => other,
    }
}

impl ToCanonical for MysqlTypeTranslator {
    fn dialect_name(&self) -> &str {
        "mysql"
    }

    fn to_canonical(&self, native_type: &str) -> CanonicalTypeInfo {
        let parsed = parse_native_type(native_type);
        let (base, unsigned) = strip_modifiers(&parsed.base);

        let field = match base.as_str() {
            "char" | "varchar" | "tinytext" | "character" | "nchar" | "nvarchar" => {
                CanonicalField::new(FieldKind::String)
            }
            "mediumtext" | "text" | "longtext" | "json" | "enum" | "set" => CanonicalField::text(),

            "date" => CanonicalField::time(TimeSubtype::Date),
            "time" => CanonicalField::time(TimeSubtype::Time),
            "year" => CanonicalField::time(TimeSubtype::Year),
            "datetime" => CanonicalField::time(TimeSubtype::DateTime),
            // Stored as UTC, read back in the session zone.
            "timestamp" => CanonicalField::time(TimeSubtype::TimestampLtz),

            "tinyint" | "int1" => CanonicalField::new(FieldKind::Int8),
            "smallint" | "int2" => CanonicalField::new(FieldKind::Int16),
            "mediumint" | "int" | "integer" | "int3" | "int4" => CanonicalField::new(FieldKind::Int32),
            "bigint" | "int8" => CanonicalField::new(FieldKind::Int64),

            "float" | "float4" => CanonicalField::new(FieldKind::Float32),
            "double" | "double precision" | "float8" | "real" => {
                CanonicalField::new(FieldKind::Float64)
            }
            "numeric" | "decimal" | "dec" | "fixed" | "number" => CanonicalField {
                is_fixed_point: true,
                ..CanonicalField::new(FieldKind::Float64)
            },

            "boolean" | "bool" | "bit" => CanonicalField::new(FieldKind::Bool),

            "tinyblob" | "blob" | "mediumblob" | "longblob" | "binary" | "varbinary" => {
                CanonicalField::new(FieldKind::Bytes)
            }

            _ => return unknown_native_type("mysql", native_type),
        };

        let field = if unsigned {
            CanonicalField {
                kind: widen(field.kind),
                ..field
            }
        } else {
            field
        };

        CanonicalTypeInfo::exact(field.with_qualifier(&parsed.qualifier))
    }
}

fn time_type(field: &CanonicalField) -> TypeMapping {
    let (fsp, capped) = cap(field.length, MAX_FRACTIONAL_SECONDS);
    let fsp = length_suffix(fsp, None);
    let native = match field.time_subtype {
        Some(TimeSubtype::Date) => "date".to_string(),
        Some(TimeSubtype::Year) => "year".to_string(),
        Some(TimeSubtype::Time) | Some(TimeSubtype::TimeTz) => format!("time{}", fsp),
        Some(TimeSubtype::TimestampTz) | Some(TimeSubtype::TimestampLtz) => {
            format!("timestamp{}", fsp)
        }
        Some(TimeSubtype::DateTime) | Some(TimeSubtype::Timestamp) | None => {
            format!("datetime{}", fsp)
        }
    };
    if capped {
        TypeMapping::lossy(
            native,
            format!("fractional seconds {} reduced to {}", field.length, MAX_FRACTIONAL_SECONDS),
        )
    } else {
        TypeMapping::exact(native)
    }
}

fn decimal_type(field: &CanonicalField) -> TypeMapping {
    let (p, p_capped) = cap(field.precision, MAX_DECIMAL_PRECISION);
    let (s, s_capped) = if p > 0 {
        cap(field.scale, MAX_DECIMAL_SCALE.min(p))
    } else {
        (field.scale, false)
    };
    let native = format!("decimal{}", precision_scale_suffix(p, s, None));
    if p == UNPARSABLE && s > 0 {
        TypeMapping::lossy(
            native,
            format!("unparsable decimal precision, scale {} dropped", field.scale),
        )
    } else if p_capped || s_capped {
        TypeMapping::lossy(
            native,
            format!("decimal({},{}) exceeds MySQL limits", field.precision, field.scale),
        )
    } else {
        TypeMapping::exact(native)
    }
}

impl FromCanonical for MysqlTypeTranslator {
    fn dialect_name(&self) -> &str {
        "mysql"
    }

    fn from_canonical(&self, field: &CanonicalField) -> TypeMapping {
        let int_suffix = || length_suffix(field.precision, None);
        match field.kind {
            FieldKind::Bytes if field.length > 0 => {
                TypeMapping::exact(format!("varbinary({})", field.length))
            }
            FieldKind::Bytes => TypeMapping::exact("longblob"),
            FieldKind::Int8 => TypeMapping::exact(format!("tinyint{}", int_suffix())),
            FieldKind::Int16 => TypeMapping::exact(format!("smallint{}", int_suffix())),
            FieldKind::Int32 => TypeMapping::exact(format!("int{}", int_suffix())),
            FieldKind::Int64 => TypeMapping::exact(format!("bigint{}", int_suffix())),
            FieldKind::Float32 => TypeMapping::exact(format!(
                "float{}",
                precision_scale_suffix(field.precision, field.scale, None)
            )),
            FieldKind::Float64 if field.is_fixed_point => decimal_type(field),
            FieldKind::Float64 if field.precision > 0 && field.scale > 0 => {
                TypeMapping::exact(format!("double({},{})", field.precision, field.scale))
            }
            FieldKind::Float64 => TypeMapping::exact("double"),
            FieldKind::Bool => TypeMapping::exact("boolean"),
            FieldKind::String if field.is_text => TypeMapping::exact("longtext"),
            FieldKind::String if field.length == UNPARSABLE => TypeMapping::exact("longtext"),
            FieldKind::String if field.length > 0 => {
                TypeMapping::exact(format!("varchar({})", field.length))
            }
            FieldKind::String => {
                TypeMapping::exact(format!("varchar({})", DEFAULT_VARCHAR_LENGTH))
            }
            FieldKind::Time => time_type(field),
            FieldKind::Runes => TypeMapping::lossy(
                "longtext",
                "runes kind has no MySQL equivalent, using longtext",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(native: &str) -> String {
        let t = MysqlTypeTranslator::new();
        let info = t.to_canonical(native);
        assert!(info.warning.is_none(), "unexpected warning for {}", native);
        t.from_canonical(&info.field).native_type
    }

    #[test]
    fn test_to_canonical_grid() {
        let t = MysqlTypeTranslator::new();
        let cases = [
            ("varchar(100)", FieldKind::String, false),
            ("longtext", FieldKind::String, true),
            ("tinyint(4)", FieldKind::Int8, false),
            ("int(11)", FieldKind::Int32, false),
            ("bigint(20)", FieldKind::Int64, false),
            ("float", FieldKind::Float32, false),
            ("double", FieldKind::Float64, false),
            ("decimal(10,2)", FieldKind::Float64, false),
            ("bit(1)", FieldKind::Bool, false),
            ("mediumblob", FieldKind::Bytes, false),
            ("datetime", FieldKind::Time, false),
        ];
        for (native, kind, is_text) in cases {
            let f = t.to_canonical(native).field;
            assert_eq!(f.kind, kind, "{}", native);
            assert_eq!(f.is_text, is_text, "{}", native);
        }
    }

    #[test]
    fn test_int_precision_survives() {
        let f = MysqlTypeTranslator::new().to_canonical("int(11)").field;
        assert_eq!(f.kind, FieldKind::Int32);
        assert_eq!(f.precision, 11);
    }

    #[test]
    fn test_unsigned_widens() {
        let t = MysqlTypeTranslator::new();
        assert_eq!(t.to_canonical("int(10) unsigned").field.kind, FieldKind::Int64);
        assert_eq!(t.to_canonical("tinyint unsigned").field.kind, FieldKind::Int16);
        assert_eq!(t.to_canonical("bigint unsigned").field.kind, FieldKind::Int64);
    }

    #[test]
    fn test_roundtrip() {
        assert_eq!(roundtrip("int(11)"), "int(11)");
        assert_eq!(roundtrip("smallint(6)"), "smallint(6)");
        assert_eq!(roundtrip("tinyint(1)"), "tinyint(1)");
        assert_eq!(roundtrip("decimal(10,2)"), "decimal(10,2)");
        assert_eq!(roundtrip("varchar(50)"), "varchar(50)");
        assert_eq!(roundtrip("datetime(3)"), "datetime(3)");
        assert_eq!(roundtrip("timestamp"), "timestamp");
        assert_eq!(roundtrip("date"), "date");
        assert_eq!(roundtrip("varbinary(16)"), "varbinary(16)");
        assert_eq!(roundtrip("double"), "double");
    }

    #[test]
    fn test_string_sentinels() {
        let t = MysqlTypeTranslator::new();
        assert_eq!(t.from_canonical(&CanonicalField::varchar(0)).native_type, "varchar(255)");
        assert_eq!(t.from_canonical(&CanonicalField::varchar(UNPARSABLE)).native_type, "longtext");
    }

    #[test]
    fn test_decimal_is_capped() {
        let m = MysqlTypeTranslator::new().from_canonical(&CanonicalField::decimal(100, 40));
        assert_eq!(m.native_type, "decimal(65,30)");
        assert!(m.warning.is_some());
    }

    #[test]
    fn test_unparsable_precision_is_not_reported_as_capped() {
        let m = MysqlTypeTranslator::new().from_canonical(&CanonicalField::decimal(UNPARSABLE, 2));
        assert_eq!(m.native_type, "decimal");
        let warning = m.warning.unwrap();
        assert!(warning.contains("unparsable"), "{}", warning);
        assert!(!warning.contains("exceeds"), "{}", warning);

        let bare = MysqlTypeTranslator::new().from_canonical(&CanonicalField::decimal(0, 0));
        assert_eq!(bare.native_type, "decimal");
        assert!(bare.warning.is_none());
    }

    #[test]
    fn test_enum_with_parenthesized_members() {
        let info = MysqlTypeTranslator::new().to_canonical("enum('a(b)','c')");
        assert!(info.warning.is_none());
        assert_eq!(info.field, CanonicalField::text());
    }

    #[test]
    fn test_unknown_type_falls_back_to_text() {
        let info = MysqlTypeTranslator::new().to_canonical("geometry");
        assert_eq!(info.field, CanonicalField::text());
        assert!(info.warning.unwrap().contains("geometry"));
    }
}
