//! DM ⇄ canonical type translation.

use crate::dialect::{
    cap, length_suffix, parse_native_type, precision_scale_suffix, unknown_native_type,
    CanonicalField, CanonicalTypeInfo, FieldKind, FromCanonical, TimeSubtype, ToCanonical,
    TypeMapping, UNPARSABLE,
};

const MAX_VARCHAR_LENGTH: i32 = 8188;
const MAX_VARBINARY_LENGTH: i32 = 8188;
const MAX_DECIMAL_PRECISION: i32 = 38;
const MAX_FRACTIONAL_SECONDS: i32 = 6;

#[derive(Debug, Clone, Default)]
pub struct DmTypeTranslator;

impl DmTypeTranslator {
    pub fn new() -> Self {
        Self
    }
}

impl ToCanonical for DmTypeTranslator {
    fn dialect_name(&self) -> &str {
        "dm"
    }

    fn to_canonical(&self, native_type: &str) -> CanonicalTypeInfo {
        let parsed = parse_native_type(native_type);

        let field = match parsed.base.as_str() {
            "char" | "character" | "varchar" | "varchar2" | "nchar" | "nvarchar" => {
                CanonicalField::new(FieldKind::String)
            }
            "text" | "long" | "longvarchar" | "clob" => CanonicalField::text(),

            "date" => CanonicalField::time(TimeSubtype::Date),
            "time" => CanonicalField::time(TimeSubtype::Time),
            "time with time zone" => CanonicalField::time(TimeSubtype::TimeTz),
            "datetime" | "timestamp" => CanonicalField::time(TimeSubtype::Timestamp),
            "datetime with time zone" | "timestamp with time zone" => {
                CanonicalField::time(TimeSubtype::TimestampTz)
            }
            "timestamp with local time zone" => CanonicalField::time(TimeSubtype::TimestampLtz),

            "tinyint" | "byte" => CanonicalField::new(FieldKind::Int8),
            "smallint" => CanonicalField::new(FieldKind::Int16),
            "int" | "integer" | "pls_integer" => CanonicalField::new(FieldKind::Int32),
            "bigint" => CanonicalField::new(FieldKind::Int64),

            "real" => CanonicalField::new(FieldKind::Float32),
            "float" | "double" | "double precision" => {
                return CanonicalTypeInfo::exact(CanonicalField::new(FieldKind::Float64))
            }
            "decimal" | "dec" | "numeric" | "number" => CanonicalField {
                is_fixed_point: true,
                ..CanonicalField::new(FieldKind::Float64)
            },

            "bit" | "boolean" | "bool" => CanonicalField::new(FieldKind::Bool),

            "binary" | "varbinary" | "raw" | "blob" | "image" | "longvarbinary" | "bfile" => {
                CanonicalField::new(FieldKind::Bytes)
            }

            _ => return unknown_native_type("dm", native_type),
        };

        CanonicalTypeInfo::exact(field.with_qualifier(&parsed.qualifier))
    }
}

fn time_type(field: &CanonicalField) -> TypeMapping {
    let (fsp, capped) = cap(field.length, MAX_FRACTIONAL_SECONDS);
    let fsp = length_suffix(fsp, None);
    let native = match field.time_subtype {
        Some(TimeSubtype::Year) => return TypeMapping::exact("SMALLINT"),
        Some(TimeSubtype::Date) => return TypeMapping::exact("DATE"),
        Some(TimeSubtype::Time) => format!("TIME{}", fsp),
        Some(TimeSubtype::TimeTz) => format!("TIME{} WITH TIME ZONE", fsp),
        Some(TimeSubtype::TimestampTz) => format!("TIMESTAMP{} WITH TIME ZONE", fsp),
        Some(TimeSubtype::TimestampLtz) => format!("TIMESTAMP{} WITH LOCAL TIME ZONE", fsp),
        Some(TimeSubtype::DateTime) | Some(TimeSubtype::Timestamp) | None => {
            format!("TIMESTAMP{}", fsp)
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
        UNPARSABLE => TypeMapping::exact("CLOB"),
        n if n > MAX_VARCHAR_LENGTH => TypeMapping::lossy(
            "CLOB",
            format!("VARCHAR({}) exceeds {} bytes, using CLOB", n, MAX_VARCHAR_LENGTH),
        ),
        n => TypeMapping::exact(format!("VARCHAR{}", length_suffix(n, None))),
    }
}

impl FromCanonical for DmTypeTranslator {
    fn dialect_name(&self) -> &str {
        "dm"
    }

    fn from_canonical(&self, field: &CanonicalField) -> TypeMapping {
        match field.kind {
            FieldKind::Bytes => match field.length {
                n if n > 0 && n <= MAX_VARBINARY_LENGTH => {
                    TypeMapping::exact(format!("VARBINARY({})", n))
                }
                _ => TypeMapping::exact("BLOB"),
            },
            FieldKind::Int8 => TypeMapping::exact("TINYINT"),
            FieldKind::Int16 => TypeMapping::exact("SMALLINT"),
            FieldKind::Int32 => TypeMapping::exact("INT"),
            FieldKind::Int64 => TypeMapping::exact("BIGINT"),
            FieldKind::Float32 => TypeMapping::exact("REAL"),
            FieldKind::Float64 if field.is_fixed_point => {
                let (p, p_capped) = cap(field.precision, MAX_DECIMAL_PRECISION);
                let (s, s_capped) = if p > 0 { cap(field.scale, p) } else { (field.scale, false) };
                let native = format!("DECIMAL{}", precision_scale_suffix(p, s, None));
                if p == UNPARSABLE && s > 0 {
                    TypeMapping::lossy(
                        native,
                        format!("unparsable DECIMAL precision, scale {} dropped", field.scale),
                    )
                } else if p_capped || s_capped {
                    TypeMapping::lossy(
                        native,
                        format!("DECIMAL({},{}) exceeds DM limits", field.precision, field.scale),
                    )
                } else {
                    TypeMapping::exact(native)
                }
            }
            FieldKind::Float64 => TypeMapping::exact("DOUBLE"),
            FieldKind::Bool => TypeMapping::exact("BIT"),
            FieldKind::String if field.is_text => TypeMapping::exact("CLOB"),
            FieldKind::String => string_type(field),
            FieldKind::Time => time_type(field),
            FieldKind::Runes => {
                TypeMapping::lossy("CLOB", "runes kind has no DM equivalent, using CLOB")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(native: &str) -> String {
        let t = DmTypeTranslator::new();
        let info = t.to_canonical(native);
        assert!(info.warning.is_none(), "unexpected warning for {}", native);
        t.from_canonical(&info.field).native_type
    }

    #[test]
    fn test_roundtrip() {
        assert_eq!(roundtrip("INT"), "INT");
        assert_eq!(roundtrip("VARCHAR(50)"), "VARCHAR(50)");
        assert_eq!(roundtrip("DECIMAL(10,2)"), "DECIMAL(10,2)");
        assert_eq!(roundtrip("TIMESTAMP(6)"), "TIMESTAMP(6)");
        assert_eq!(roundtrip("TIME(3) WITH TIME ZONE"), "TIME(3) WITH TIME ZONE");
        assert_eq!(roundtrip("CLOB"), "CLOB");
        assert_eq!(roundtrip("BIT"), "BIT");
        assert_eq!(roundtrip("VARBINARY(64)"), "VARBINARY(64)");
    }

    #[test]
    fn test_bounds() {
        let t = DmTypeTranslator::new();
        assert_eq!(t.from_canonical(&CanonicalField::varchar(0)).native_type, "VARCHAR");
        assert_eq!(t.from_canonical(&CanonicalField::varchar(UNPARSABLE)).native_type, "CLOB");
        assert_eq!(t.from_canonical(&CanonicalField::decimal(65, 30)).native_type, "DECIMAL(38,30)");
        let mut ts = CanonicalField::time(TimeSubtype::TimestampTz);
        ts.length = 9;
        let m = t.from_canonical(&ts);
        assert_eq!(m.native_type, "TIMESTAMP(6) WITH TIME ZONE");
        assert!(m.warning.is_some());
    }
}
