//! DDL generation.
//!
//! Renders a [`Delta`](crate::delta::Delta) into executable statements.
//! The text helpers in this module are shared by every statement form.

mod mysql;

pub use mysql::MySqlDialect;

/// Base types whose default values are quoted string literals.
const STRING_TYPES: &[&str] = &[
    "char",
    "varchar",
    "tinytext",
    "text",
    "mediumtext",
    "longtext",
    "enum",
    "set",
    "binary",
    "varbinary",
    "tinyblob",
    "blob",
    "mediumblob",
    "longblob",
];

/// Marker newer servers add to `Extra` for expression defaults. It is not
/// part of the declared schema and is invalid in a column definition.
pub const SYNTHETIC_EXTRA: &str = "DEFAULT_GENERATED";

/// Escapes backslashes and single quotes for use inside a `'...'` literal.
#[must_use]
pub fn escape_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Quotes and escapes a string literal.
#[must_use]
pub fn quote_string(value: &str) -> String {
    format!("'{}'", escape_string(value))
}

/// Returns the character set of a collation: everything before the first `_`.
#[must_use]
pub fn charset_of(collation: &str) -> &str {
    collation.split('_').next().unwrap_or(collation)
}

/// Returns the base type name, without length/precision or modifiers.
///
/// `varchar(255)` gives `varchar`, `int(10) unsigned` gives `int`.
#[must_use]
pub fn base_type(column_type: &str) -> &str {
    let head = column_type.split('(').next().unwrap_or(column_type);
    head.split_whitespace().next().unwrap_or("")
}

/// Returns whether defaults of this column type must be quoted.
#[must_use]
pub fn is_string_type(column_type: &str) -> bool {
    let base = base_type(column_type);
    STRING_TYPES.iter().any(|t| t.eq_ignore_ascii_case(base))
}

/// Removes [`SYNTHETIC_EXTRA`] from an `Extra` attribute string.
#[must_use]
pub fn strip_synthetic_extra(extra: &str) -> String {
    extra
        .split_whitespace()
        .filter(|word| !word.eq_ignore_ascii_case(SYNTHETIC_EXTRA))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Upper-cases a type string, leaving quoted literals (enum/set members)
/// untouched.
#[must_use]
pub fn upper_type(column_type: &str) -> String {
    let mut out = String::with_capacity(column_type.len());
    let mut in_quote = false;
    let mut escaped = false;
    for c in column_type.chars() {
        if in_quote {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '\'' {
                in_quote = false;
            }
        } else {
            if c == '\'' {
                in_quote = true;
            }
            out.extend(c.to_uppercase());
        }
    }
    out
}
