//! Oracle ⇄ canonical type translation.

use crate::dialect::{
    cap, length_suffix, parse_native_type, unknown_native_type, CanonicalField,
    CanonicalTypeInfo, FieldKind, FromCanonical, NativeType, TimeSubtype, ToCanonical,
    TypeMapping, UNPARSABLE,
};

/// `VARCHAR2` length used when the canonical field carries none.
const DEFAULT_VARCHAR2_LENGTH: i32 = 500;
const MAX_VARCHAR2_LENGTH: i32 = 4000;
const MAX_RAW_LENGTH: i32 = 2000;
const MAX_NUMBER_PRECISION: i32 = 38;
const MAX_FRACTIONAL_SECONDS: i32 = 9;

#[derive(Debug, Clone, Default)]
pub struct OracleTypeTranslator;

impl OracleTypeTranslator {
    pub fn new() -> Self {
        Self
    }
}

/// `NUMBER(p)` and `NUMBER(p,0)` narrow to an integer when `p` fits.
fn number_type(parsed: &NativeType) -> CanonicalField {
    let q = &parsed.qualifier;
    let integral = parsed.parts == 1 || (parsed.parts == 2 && q.scale == 0);
    if integral && q.precision > 0 {
        let kind = match q.precision {
            p if p <= 9 => Some(FieldKind::Int32),
            p if p <= 18 => Some(FieldKind::Int64),
            _ => None,
        };
        if let Some(kind) = kind {
            return CanonicalField {
                precision: q.precision,
                ..CanonicalField::new(kind)
            };
        }
    }
    CanonicalField::decimal(q.precision, q.scale)
}

impl ToCanonical for OracleTypeTranslator {
    fn dialect_name(&self) -> &str {
        "oracle"
    }

    fn to_canonical(&self, native_type: &str) -> CanonicalTypeInfo {
        let parsed = parse_native_type(native_type);

        let field = match parsed.base.as_str() {
            "number" => return CanonicalTypeInfo::exact(number_type(&parsed)),
            "char" | "nchar" | "varchar" | "varchar2" | "nvarchar2" => {
                CanonicalField::new(FieldKind::String)
            }
            "clob" | "nclob" | "long" | "xmltype" | "rowid" | "urowid" => CanonicalField::text(),

            // DATE carries a time of day down to the second.
            "date" => CanonicalField::time(TimeSubtype::DateTime),
            "timestamp" => CanonicalField::time(TimeSubtype::Timestamp),
            "timestamp with time zone" => CanonicalField::time(TimeSubtype::TimestampTz),
            "timestamp with local time zone" => CanonicalField::time(TimeSubtype::TimestampLtz),

            "smallint" => CanonicalField::new(FieldKind::Int16),
            "pls_integer" | "binary_integer" => CanonicalField::new(FieldKind::Int32),
            "int" | "integer" => CanonicalField::new(FieldKind::Int64),

            "binary_float" => CanonicalField::new(FieldKind::Float32),
            "binary_double" | "double precision" => CanonicalField::new(FieldKind::Float64),
            // FLOAT(b) counts binary digits.
            "float" => return CanonicalTypeInfo::exact(CanonicalField::new(FieldKind::Float64)),
            "decimal" | "numeric" | "dec" => CanonicalField {
                is_fixed_point: true,
                ..CanonicalField::new(FieldKind::Float64)
            },

            "boolean" | "bool" => CanonicalField::new(FieldKind::Bool),

            "raw" | "long raw" | "blob" | "bfile" => CanonicalField::new(FieldKind::Bytes),

            _ => return unknown_native_type("oracle", native_type),
        };

        CanonicalTypeInfo::exact(field.with_qualifier(&parsed.qualifier))
    }
}

fn number_with(precision: i32) -> String {
    format!("NUMBER({})", precision)
}

fn integer_type(field: &CanonicalField, default_precision: i32) -> TypeMapping {
    if field.precision <= 0 {
        return TypeMapping::exact(number_with(default_precision));
    }
    let (p, capped) = cap(field.precision, MAX_NUMBER_PRECISION);
    if capped {
        TypeMapping::lossy(
            number_with(p),
            format!("NUMBER precision {} reduced to {}", field.precision, p),
        )
    } else {
        TypeMapping::exact(number_with(p))
    }
}

fn decimal_type(field: &CanonicalField) -> TypeMapping {
    if field.precision == UNPARSABLE {
        return TypeMapping::exact(format!("NUMBER(*,{})", field.scale.max(0)));
    }
    if field.precision <= 0 {
        return TypeMapping::exact("NUMBER");
    }
    let (p, p_capped) = cap(field.precision, MAX_NUMBER_PRECISION);
    let (s, s_capped) = cap(field.scale.max(0), p);
    let native = if s > 0 {
        format!("NUMBER({},{})", p, s)
    } else {
        number_with(p)
    };
    if p_capped || s_capped {
        TypeMapping::lossy(
            native,
            format!("NUMBER({},{}) exceeds Oracle limits", field.precision, field.scale),
        )
    } else {
        TypeMapping::exact(native)
    }
}

fn string_type(field: &CanonicalField) -> TypeMapping {
    match field.length {
        0 => TypeMapping::exact(format!("VARCHAR2({} CHAR)", DEFAULT_VARCHAR2_LENGTH)),
        UNPARSABLE => TypeMapping::exact("CLOB"),
        n if n > MAX_VARCHAR2_LENGTH => TypeMapping::lossy(
            "CLOB",
            format!("VARCHAR2({}) exceeds {} characters, using CLOB", n, MAX_VARCHAR2_LENGTH),
        ),
        n => TypeMapping::exact(format!("VARCHAR2({} CHAR)", n)),
    }
}

fn time_type(field: &CanonicalField) -> TypeMapping {
    let (fsp, capped) = cap(field.length, MAX_FRACTIONAL_SECONDS);
    let fsp = length_suffix(fsp, None);
    let native = match field.time_subtype {
        Some(TimeSubtype::Year) => return TypeMapping::exact(number_with(4)),
        Some(TimeSubtype::Date) => return TypeMapping::exact("DATE"),
        Some(TimeSubtype::Time) | Some(TimeSubtype::TimeTz) => {
            return TypeMapping::lossy("DATE", "Oracle has no time-of-day type, using DATE")
        }
        // Without fractional seconds DATE holds the full value.
        Some(TimeSubtype::DateTime) | None if field.length <= 0 => "DATE".to_string(),
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

impl FromCanonical for OracleTypeTranslator {
    fn dialect_name(&self) -> &str {
        "oracle"
    }

    fn from_canonical(&self, field: &CanonicalField) -> TypeMapping {
        match field.kind {
            FieldKind::Bytes => match field.length {
                n if n > 0 && n <= MAX_RAW_LENGTH => TypeMapping::exact(format!("RAW({})", n)),
                _ => TypeMapping::exact("BLOB"),
            },
            FieldKind::Int8 => integer_type(field, 3),
            FieldKind::Int16 => integer_type(field, 5),
            FieldKind::Int32 => integer_type(field, 10),
            FieldKind::Int64 => integer_type(field, 19),
            FieldKind::Float32 => TypeMapping::exact("BINARY_FLOAT"),
            FieldKind::Float64 if field.is_fixed_point => decimal_type(field),
            FieldKind::Float64 => TypeMapping::exact("BINARY_DOUBLE"),
            FieldKind::Bool => TypeMapping::exact(number_with(1)),
            FieldKind::String if field.is_text => TypeMapping::exact("CLOB"),
            FieldKind::String => string_type(field),
            FieldKind::Time => time_type(field),
            FieldKind::Runes => {
                TypeMapping::lossy("CLOB", "runes kind has no Oracle equivalent, using CLOB")
            }
        }
    }
}
