//! Native type string parsing and qualifier rendering.

use super::canonical::{Qualifier, UNPARSABLE};

/// A catalog type string split into its base name and numeric qualifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeType {
    /// Lower-case base name with whitespace collapsed,
    /// e.g. `timestamp with time zone` for `TIMESTAMP(6) WITH TIME ZONE`.
    pub base: String,
    pub qualifier: Qualifier,
    /// Number of comma-separated parts inside the parentheses.
    pub parts: usize,
}

impl NativeType {
    /// Single parenthesized value (e.g. `NUMBER(10)`), if that is what was given.
    pub fn single_value(&self) -> Option<i32> {
        (self.parts == 1).then_some(self.qualifier.precision)
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Leading integer of a part; `50 char` reads as 50.
fn parse_part(part: &str) -> i32 {
    part.split_whitespace()
        .next()
        .and_then(|token| token.parse::<i32>().ok())
        .unwrap_or(UNPARSABLE)
}

/// Parse a native type string such as `numeric(10,2)` or `varchar(max)`.
///
/// One value sets both precision and length, two set precision and scale.
/// A value that is not an integer becomes [`UNPARSABLE`]; an absent
/// qualifier leaves everything at zero. The qualifier runs to the last
/// closing parenthesis; text after it stays part of the base name.
pub fn parse_native_type(raw: &str) -> NativeType {
    let lower = raw.trim().to_lowercase();

    let (open, close) = match (lower.find('('), lower.rfind(')')) {
        (Some(open), Some(close)) if open < close => (open, close),
        _ => {
            return NativeType {
                base: collapse_whitespace(&lower),
                qualifier: Qualifier::default(),
                parts: 0,
            }
        }
    };

    let base = collapse_whitespace(&format!("{} {}", &lower[..open], &lower[close + 1..]));
    let parts: Vec<&str> = lower[open + 1..close].split(',').collect();

    let mut qualifier = Qualifier::default();
    match parts.as_slice() {
        [single] => {
            let value = parse_part(single);
            qualifier.precision = value;
            qualifier.length = value;
        }
        [first, second, ..] => {
            qualifier.precision = parse_part(first);
            qualifier.scale = parse_part(second);
        }
        [] => {}
    }

    NativeType {
        base,
        qualifier,
        parts: parts.len(),
    }
}

/// `(n)` for a positive bound, `(unbounded)` for [`UNPARSABLE`] when the
/// dialect has such a literal, otherwise nothing.
pub fn length_suffix(n: i32, unbounded: Option<&str>) -> String {
    if n > 0 {
        format!("({})", n)
    } else if n == UNPARSABLE {
        unbounded.map(|u| format!("({})", u)).unwrap_or_default()
    } else {
        String::new()
    }
}

/// `(p,s)`, `(p)` or nothing, following the sentinel rules.
///
/// A scale without a usable precision is dropped unless the dialect has an
/// unbounded precision literal (Oracle's `*`).
pub fn precision_scale_suffix(precision: i32, scale: i32, unbounded: Option<&str>) -> String {
    let p = if precision > 0 {
        precision.to_string()
    } else if precision == UNPARSABLE {
        match unbounded {
            Some(u) => u.to_string(),
            None => return String::new(),
        }
    } else {
        return String::new();
    };

    if scale > 0 {
        format!("({},{})", p, scale)
    } else {
        format!("({})", p)
    }
}

/// Cap `value` at a dialect maximum. The flag reports whether it was reduced.
pub fn cap(value: i32, max: i32) -> (i32, bool) {
    if value > max {
        (max, true)
    } else {
        (value, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_qualifier() {
        let t = parse_native_type("  INTEGER ");
        assert_eq!(t.base, "integer");
        assert_eq!(t.qualifier, Qualifier::default());
        assert_eq!(t.parts, 0);
    }

    #[test]
    fn test_single_value_sets_length_and_precision() {
        let t = parse_native_type("VARCHAR(100)");
        assert_eq!(t.base, "varchar");
        assert_eq!(t.qualifier.length, 100);
        assert_eq!(t.qualifier.precision, 100);
        assert_eq!(t.qualifier.scale, 0);
        assert_eq!(t.single_value(), Some(100));
    }

    #[test]
    fn test_two_values_set_precision_and_scale() {
        let t = parse_native_type("numeric(10, 2)");
        assert_eq!(t.base, "numeric");
        assert_eq!(t.qualifier.precision, 10);
        assert_eq!(t.qualifier.scale, 2);
        assert_eq!(t.qualifier.length, 0);
        assert_eq!(t.single_value(), None);
    }

    #[test]
    fn test_unparsable_parts_become_sentinel() {
        let t = parse_native_type("decimal(abc,2)");
        assert_eq!(t.qualifier.precision, UNPARSABLE);
        assert_eq!(t.qualifier.scale, 2);

        let t = parse_native_type("varchar(max)");
        assert_eq!(t.qualifier.length, UNPARSABLE);
        assert_eq!(t.qualifier.precision, UNPARSABLE);

        let t = parse_native_type("NUMBER(*,0)");
        assert_eq!(t.qualifier.precision, UNPARSABLE);
        assert_eq!(t.qualifier.scale, 0);
    }

    #[test]
    fn test_char_semantics_suffix() {
        let t = parse_native_type("VARCHAR2(50 CHAR)");
        assert_eq!(t.base, "varchar2");
        assert_eq!(t.qualifier.length, 50);

        let t = parse_native_type("varchar()");
        assert_eq!(t.qualifier.length, UNPARSABLE);
    }

    #[test]
    fn test_cap() {
        assert_eq!(cap(40, 38), (38, true));
        assert_eq!(cap(10, 38), (10, false));
    }

    #[test]
    fn test_trailing_words_stay_in_base() {
        let t = parse_native_type("TIMESTAMP(6) WITH TIME ZONE");
        assert_eq!(t.base, "timestamp with time zone");
        assert_eq!(t.qualifier.length, 6);

        let t = parse_native_type("int(10) unsigned");
        assert_eq!(t.base, "int unsigned");
    }

    #[test]
    fn test_nested_parens_stay_in_qualifier() {
        let t = parse_native_type("enum('a(b)','c')");
        assert_eq!(t.base, "enum");
        assert_eq!(t.parts, 2);
    }

    #[test]
    fn test_unbalanced_parens_are_base_only() {
        let t = parse_native_type("varchar(10");
        assert_eq!(t.base, "varchar(10");
        assert_eq!(t.parts, 0);
    }

    #[test]
    fn test_length_suffix() {
        assert_eq!(length_suffix(50, None), "(50)");
        assert_eq!(length_suffix(0, Some("max")), "");
        assert_eq!(length_suffix(UNPARSABLE, Some("max")), "(max)");
        assert_eq!(length_suffix(UNPARSABLE, None), "");
    }

    #[test]
    fn test_precision_scale_suffix() {
        assert_eq!(precision_scale_suffix(10, 2, None), "(10,2)");
        assert_eq!(precision_scale_suffix(10, 0, None), "(10)");
        assert_eq!(precision_scale_suffix(10, UNPARSABLE, None), "(10)");
        assert_eq!(precision_scale_suffix(0, 2, None), "");
        assert_eq!(precision_scale_suffix(UNPARSABLE, 2, None), "");
        assert_eq!(precision_scale_suffix(UNPARSABLE, 2, Some("*")), "(*,2)");
        assert_eq!(precision_scale_suffix(UNPARSABLE, 0, Some("*")), "(*)");
    }
}
