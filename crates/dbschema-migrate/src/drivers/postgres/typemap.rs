//! PostgreSQL ⇄ canonical type translation.

use crate::dialect::{
    cap, length_suffix, parse_native_type, precision_scale_suffix, unknown_native_type,
    CanonicalField, CanonicalTypeInfo, FieldKind, FromCanonical, TimeSubtype, ToCanonical,
    TypeMapping,
};

const MAX_FRACTIONAL_SECONDS: i32 = 6;
const MAX_NUMERIC_PRECISION: i32 = 1000;

#[derive(Debug, Clone, Default)]
pub struct PostgresTypeTranslator;

impl PostgresTypeTranslator {
    pub fn new() -> Self {
        Self
    }
}

impl ToCanonical for PostgresTypeTranslator {
    fn dialect_name(&self) -> &str {
        "postgres"
    }

    fn to_canonical(&self, native_type: &str) -> CanonicalTypeInfo {
        let parsed = parse_native_type(native_type);

        let field = match parsed.base.as_str() {
            "char" | "character" | "bpchar" | "varchar" | "character varying" | "name" => {
                CanonicalField::new(FieldKind::String)
            }
            "text" | "json" | "jsonb" | "xml" | "citext" | "inet" | "cidr" | "macaddr"
            | "interval" => CanonicalField::text(),
            // Bounded so it can still take part in a key.
            "uuid" => return CanonicalTypeInfo::exact(CanonicalField::varchar(36)),

            "date" => CanonicalField::time(TimeSubtype::Date),
            "time" | "time without time zone" => CanonicalField::time(TimeSubtype::Time),
            "timetz" | "time with time zone" => CanonicalField::time(TimeSubtype::TimeTz),
            "timestamp" | "timestamp without time zone" => {
                CanonicalField::time(TimeSubtype::Timestamp)
            }
            "timestamptz" | "timestamp with time zone" => {
                CanonicalField::time(TimeSubtype::TimestampTz)
            }

            "smallint" | "int2" | "smallserial" | "serial2" => CanonicalField::new(FieldKind::Int16),
            "integer" | "int" | "int4" | "serial" | "serial4" => CanonicalField::new(FieldKind::Int32),
            "bigint" | "int8" | "bigserial" | "serial8" => CanonicalField::new(FieldKind::Int64),

            "real" | "float4" => CanonicalField::new(FieldKind::Float32),
            "double precision" | "float8" | "float" | "money" => {
                CanonicalField::new(FieldKind::Float64)
            }
            "numeric" | "decimal" => CanonicalField {
                is_fixed_point: true,
                ..CanonicalField::new(FieldKind::Float64)
            },

            "boolean" | "bool" => CanonicalField::new(FieldKind::Bool),
            "bytea" | "bit" | "bit varying" | "varbit" => CanonicalField::new(FieldKind::Bytes),

            _ => return unknown_native_type("postgres", native_type),
        };

        CanonicalTypeInfo::exact(field.with_qualifier(&parsed.qualifier))
    }
}

fn time_type(field: &CanonicalField) -> TypeMapping {
    let (fsp, capped) = cap(field.length, MAX_FRACTIONAL_SECONDS);
    let fsp = length_suffix(fsp, None);
    let native = match field.time_subtype {
        Some(TimeSubtype::Date) => "date".to_string(),
        Some(TimeSubtype::Year) => "smallint".to_string(),
        Some(TimeSubtype::Time) => format!("time{}", fsp),
        Some(TimeSubtype::TimeTz) => format!("timetz{}", fsp),
        Some(TimeSubtype::TimestampTz) | Some(TimeSubtype::TimestampLtz) => {
            format!("timestamptz{}", fsp)
        }
        Some(TimeSubtype::DateTime) | Some(TimeSubtype::Timestamp) | None => {
            format!("timestamp{}", fsp)
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

impl FromCanonical for PostgresTypeTranslator {
    fn dialect_name(&self) -> &str {
        "postgres"
    }

    fn from_canonical(&self, field: &CanonicalField) -> TypeMapping {
        match field.kind {
            FieldKind::Bytes => TypeMapping::exact("bytea"),
            FieldKind::Int8 | FieldKind::Int16 => TypeMapping::exact("smallint"),
            FieldKind::Int32 => TypeMapping::exact("integer"),
            FieldKind::Int64 => TypeMapping::exact("bigint"),
            FieldKind::Float32 => TypeMapping::exact("real"),
            FieldKind::Float64 if field.is_fixed_point => {
                let (p, capped) = cap(field.precision, MAX_NUMERIC_PRECISION);
                let native = format!("decimal{}", precision_scale_suffix(p, field.scale, None));
                if capped {
                    TypeMapping::lossy(native, format!("numeric precision {} reduced", field.precision))
                } else {
                    TypeMapping::exact(native)
                }
            }
            FieldKind::Float64 => TypeMapping::exact("double precision"),
            FieldKind::Bool => TypeMapping::exact("boolean"),
            FieldKind::String if field.is_text => TypeMapping::exact("text"),
            FieldKind::String => {
                TypeMapping::exact(format!("varchar{}", length_suffix(field.length, None)))
            }
            FieldKind::Time => time_type(field),
            FieldKind::Runes => {
                TypeMapping::lossy("text", "runes kind has no PostgreSQL equivalent, using text")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::UNPARSABLE;

    fn roundtrip(native: &str) -> String {
        let t = PostgresTypeTranslator::new();
        let info = t.to_canonical(native);
        assert!(info.warning.is_none(), "unexpected warning for {}", native);
        t.from_canonical(&info.field).native_type
    }

    #[test]
    fn test_to_canonical() {
        let t = PostgresTypeTranslator::new();
        assert_eq!(t.to_canonical("int4").field.kind, FieldKind::Int32);
        assert_eq!(t.to_canonical("bigserial").field.kind, FieldKind::Int64);
        assert!(t.to_canonical("jsonb").field.is_text);
        let f = t.to_canonical("timestamp(3) with time zone").field;
        assert_eq!(f.time_subtype, Some(TimeSubtype::TimestampTz));
        assert_eq!(f.length, 3);
        let f = t.to_canonical("numeric(12,4)").field;
        assert!(f.is_fixed_point);
        assert_eq!((f.precision, f.scale), (12, 4));
    }

    #[test]
    fn test_roundtrip() {
        assert_eq!(roundtrip("integer"), "integer");
        assert_eq!(roundtrip("bigint"), "bigint");
        assert_eq!(roundtrip("numeric(10,2)"), "decimal(10,2)");
        assert_eq!(roundtrip("numeric"), "decimal");
        assert_eq!(roundtrip("varchar(50)"), "varchar(50)");
        assert_eq!(roundtrip("text"), "text");
        assert_eq!(roundtrip("timestamptz(6)"), "timestamptz(6)");
        assert_eq!(roundtrip("date"), "date");
        assert_eq!(roundtrip("bytea"), "bytea");
        assert_eq!(roundtrip("boolean"), "boolean");
    }

    #[test]
    fn test_sentinels() {
        let t = PostgresTypeTranslator::new();
        assert_eq!(t.from_canonical(&CanonicalField::varchar(0)).native_type, "varchar");
        assert_eq!(t.from_canonical(&CanonicalField::varchar(UNPARSABLE)).native_type, "varchar");
        assert_eq!(t.from_canonical(&CanonicalField::decimal(UNPARSABLE, 2)).native_type, "decimal");
    }

    #[test]
    fn test_mysql_style_types() {
        let t = PostgresTypeTranslator::new();
        assert_eq!(t.from_canonical(&CanonicalField::new(FieldKind::Int8)).native_type, "smallint");
        assert_eq!(
            t.from_canonical(&CanonicalField::time(TimeSubtype::DateTime)).native_type,
            "timestamp"
        );
        assert_eq!(t.from_canonical(&CanonicalField::time(TimeSubtype::Year)).native_type, "smallint");
    }

    #[test]
    fn test_unknown_falls_back() {
        let info = PostgresTypeTranslator::new().to_canonical("tsvector");
        assert_eq!(info.field, CanonicalField::text());
        assert!(info.warning.is_some());
    }
}
