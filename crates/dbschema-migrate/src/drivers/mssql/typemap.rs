//! SQL Server ⇄ canonical type translation.

use crate::dialect::{
    cap, length_suffix, parse_native_type, precision_scale_suffix, unknown_native_type,
    CanonicalField, CanonicalTypeInfo, FieldKind, FromCanonical, TimeSubtype, ToCanonical,
    TypeMapping, UNPARSABLE,
};

const DEFAULT_NVARCHAR_LENGTH: i32 = 255;
const MAX_NVARCHAR_LENGTH: i32 = 4000;
const MAX_VARBINARY_LENGTH: i32 = 8000;
const MAX_DECIMAL_PRECISION: i32 = 38;
const MAX_FRACTIONAL_SECONDS: i32 = 7;

#[derive(Debug, Clone, Default)]
pub struct MssqlTypeTranslator;

impl MssqlTypeTranslator {
    pub fn new() -> Self {
        Self
    }
}

impl ToCanonical for MssqlTypeTranslator {
    fn dialect_name(&self) -> &str {
        "sqlserver"
    }

    fn to_canonical(&self, native_type: &str) -> CanonicalTypeInfo {
        let parsed = parse_native_type(native_type);

        let field = match parsed.base.as_str() {
            "char" | "varchar" | "nchar" | "nvarchar" => CanonicalField::new(FieldKind::String),
            "text" | "ntext" | "xml" | "sql_variant" | "sysname" => CanonicalField::text(),
            // Bounded so it can still take part in a key.
            "uniqueidentifier" => return CanonicalTypeInfo::exact(CanonicalField::varchar(36)),

            "date" => CanonicalField::time(TimeSubtype::Date),
            "time" => CanonicalField::time(TimeSubtype::Time),
            "datetime" | "smalldatetime" => CanonicalField::time(TimeSubtype::DateTime),
            "datetime2" => CanonicalField::time(TimeSubtype::Timestamp),
            "datetimeoffset" => CanonicalField::time(TimeSubtype::TimestampTz),

            "tinyint" => CanonicalField::new(FieldKind::Int8),
            "smallint" => CanonicalField::new(FieldKind::Int16),
            "int" => CanonicalField::new(FieldKind::Int32),
            "bigint" => CanonicalField::new(FieldKind::Int64),

            "real" => CanonicalField::new(FieldKind::Float32),
            "float" => CanonicalField::new(FieldKind::Float64),
            "decimal" | "numeric" => CanonicalField {
                is_fixed_point: true,
                ..CanonicalField::new(FieldKind::Float64)
            },
            "money" => return CanonicalTypeInfo::exact(CanonicalField::decimal(19, 4)),
            "smallmoney" => return CanonicalTypeInfo::exact(CanonicalField::decimal(10, 4)),

            "bit" => CanonicalField::new(FieldKind::Bool),

            // rowversion is an 8-byte counter, not a point in time
            "binary" | "varbinary" | "image" | "timestamp" | "rowversion" => {
                CanonicalField::new(FieldKind::Bytes)
            }

            _ => return unknown_native_type("sqlserver", native_type),
        };

        // float(n) is a mantissa width, not a decimal precision.
        let qualifier = if parsed.base == "float" {
            Default::default()
        } else {
            parsed.qualifier
        };
        CanonicalTypeInfo::exact(field.with_qualifier(&qualifier))
    }
}

fn time_type(field: &CanonicalField) -> TypeMapping {
    let (fsp, capped) = cap(field.length, MAX_FRACTIONAL_SECONDS);
    let fsp = length_suffix(fsp, None);
    let native = match field.time_subtype {
        Some(TimeSubtype::Date) => "date".to_string(),
        Some(TimeSubtype::Year) => "smallint".to_string(),
        Some(TimeSubtype::Time) | Some(TimeSubtype::TimeTz) => format!("time{}", fsp),
        Some(TimeSubtype::TimestampTz) | Some(TimeSubtype::TimestampLtz) => {
            format!("datetimeoffset{}", fsp)
        }
        Some(TimeSubtype::DateTime) | Some(TimeSubtype::Timestamp) | None => {
            format!("datetime2{}", fsp)
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

fn string_type(field: &CanonicalField) -> TypeMapping {
    match field.length {
        n if n > MAX_NVARCHAR_LENGTH || n == UNPARSABLE => TypeMapping::exact("nvarchar(max)"),
        n if n > 0 => TypeMapping::exact(format!("nvarchar({})", n)),
        _ => TypeMapping::exact(format!("nvarchar({})", DEFAULT_NVARCHAR_LENGTH)),
    }
}

impl FromCanonical for MssqlTypeTranslator {
    fn dialect_name(&self) -> &str {
        "sqlserver"
    }

    fn from_canonical(&self, field: &CanonicalField) -> TypeMapping {
        match field.kind {
            FieldKind::Bytes => match field.length {
                n if n > 0 && n <= MAX_VARBINARY_LENGTH => {
                    TypeMapping::exact(format!("varbinary({})", n))
                }
                _ => TypeMapping::exact("varbinary(max)"),
            },
            FieldKind::Int8 => TypeMapping::exact("tinyint"),
            FieldKind::Int16 => TypeMapping::exact("smallint"),
            FieldKind::Int32 => TypeMapping::exact("int"),
            FieldKind::Int64 => TypeMapping::exact("bigint"),
            FieldKind::Float32 => TypeMapping::exact("real"),
            FieldKind::Float64 if field.is_fixed_point => {
                let (p, p_capped) = cap(field.precision, MAX_DECIMAL_PRECISION);
                let (s, s_capped) = if p > 0 { cap(field.scale, p) } else { (field.scale, false) };
                let native = format!("decimal{}", precision_scale_suffix(p, s, None));
                if p == UNPARSABLE && s > 0 {
                    TypeMapping::lossy(
                        native,
                        format!("unparsable decimal precision, scale {} dropped", field.scale),
                    )
                } else if p_capped || s_capped {
                    TypeMapping::lossy(
                        native,
                        format!("decimal({},{}) exceeds SQL Server limits", field.precision, field.scale),
                    )
                } else {
                    TypeMapping::exact(native)
                }
            }
            FieldKind::Float64 => TypeMapping::exact("float"),
            FieldKind::Bool => TypeMapping::exact("bit"),
            FieldKind::String if field.is_text => TypeMapping::exact("nvarchar(max)"),
            FieldKind::String => string_type(field),
            FieldKind::Time => time_type(field),
            FieldKind::Runes => TypeMapping::lossy(
                "nvarchar(max)",
                "runes kind has no SQL Server equivalent, using nvarchar(max)",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(native: &str) -> String {
        let t = MssqlTypeTranslator::new();
        let info = t.to_canonical(native);
        assert!(info.warning.is_none(), "unexpected warning for {}", native);
        t.from_canonical(&info.field).native_type
    }

    #[test]
    fn test_roundtrip() {
        assert_eq!(roundtrip("int"), "int");
        assert_eq!(roundtrip("bit"), "bit");
        assert_eq!(roundtrip("nvarchar(50)"), "nvarchar(50)");
        assert_eq!(roundtrip("nvarchar(max)"), "nvarchar(max)");
        assert_eq!(roundtrip("decimal(18,4)"), "decimal(18,4)");
        assert_eq!(roundtrip("datetime2(3)"), "datetime2(3)");
        assert_eq!(roundtrip("datetimeoffset(7)"), "datetimeoffset(7)");
        assert_eq!(roundtrip("varbinary(max)"), "varbinary(max)");
        assert_eq!(roundtrip("float"), "float");
        assert_eq!(roundtrip("float(53)"), "float");
    }

    #[test]
    fn test_money_keeps_four_fractional_digits() {
        let t = MssqlTypeTranslator::new();
        let money = t.to_canonical("money");
        assert!(money.warning.is_none());
        assert_eq!((money.field.precision, money.field.scale), (19, 4));
        assert!(money.field.is_fixed_point);
        assert_eq!(roundtrip("money"), "decimal(19,4)");
        assert_eq!(roundtrip("smallmoney"), "decimal(10,4)");
    }

    #[test]
    fn test_uniqueidentifier_is_bounded() {
        let f = MssqlTypeTranslator::new().to_canonical("uniqueidentifier").field;
        assert!(f.is_bounded_string());
        assert_eq!(f.length, 36);
        assert_eq!(roundtrip("uniqueidentifier"), "nvarchar(36)");
    }

    #[test]
    fn test_unparsable_precision_warns_about_precision() {
        let m = MssqlTypeTranslator::new().from_canonical(&CanonicalField::decimal(UNPARSABLE, 2));
        assert_eq!(m.native_type, "decimal");
        assert!(m.warning.unwrap().contains("unparsable"));
    }

    #[test]
    fn test_rowversion_is_bytes() {
        let t = MssqlTypeTranslator::new();
        assert_eq!(t.to_canonical("timestamp").field.kind, FieldKind::Bytes);
        assert_eq!(t.to_canonical("rowversion").field.kind, FieldKind::Bytes);
    }

    #[test]
    fn test_long_strings_become_max() {
        let t = MssqlTypeTranslator::new();
        assert_eq!(t.from_canonical(&CanonicalField::varchar(10000)).native_type, "nvarchar(max)");
        assert_eq!(t.from_canonical(&CanonicalField::varchar(0)).native_type, "nvarchar(255)");
    }

    #[test]
    fn test_time_precision_is_capped() {
        let mut f = CanonicalField::time(TimeSubtype::Timestamp);
        f.length = 9;
        let m = MssqlTypeTranslator::new().from_canonical(&f);
        assert_eq!(m.native_type, "datetime2(7)");
        assert!(m.warning.is_some());
    }

    #[test]
    fn test_unknown_falls_back() {
        let info = MssqlTypeTranslator::new().to_canonical("geography");
        assert_eq!(info.field, CanonicalField::text());
        assert!(info.warning.is_some());
    }
}
