//! Canonical type model and the dialect-independent halves of translation
//! and DDL synthesis.
//!
//! - [`canonical`]: [`CanonicalField`] and the [`ToCanonical`]/[`FromCanonical`] traits
//! - [`parse`]: native type string parsing and qualifier rendering
//! - [`ddl`]: table body assembly and table-by-table execution
//!
//! The per-dialect lookup tables live next to each driver in
//! `drivers/<dialect>/typemap.rs`.

pub mod canonical;
pub mod ddl;
pub mod parse;

pub use canonical::{
    CanonicalField, CanonicalTypeInfo, FieldKind, FromCanonical, Qualifier, TimeSubtype,
    ToCanonical, TypeMapping, TypeTranslator, UNPARSABLE,
};
pub use ddl::{apply_tables, build_table_body, CreateTableTemplate, TableBody};
pub use parse::{cap, length_suffix, parse_native_type, precision_scale_suffix, NativeType};

/// Fallback used by every `ToCanonical` for a base name missing from its table.
pub(crate) fn unknown_native_type(dialect: &str, raw: &str) -> CanonicalTypeInfo {
    CanonicalTypeInfo::fallback(
        CanonicalField::text(),
        format!(
            "{}: unrecognized type '{}' mapped to unbounded text",
            dialect, raw
        ),
    )
}
