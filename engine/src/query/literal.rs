use std::fmt::Write;

use super::Backend;

/// Bracketed, comma-separated decimal list: `[0.5, 1, -2.25]`.
///
/// Components use the shortest decimal form that reads back as the same
/// `f32`, never exponent notation.
pub fn vector_literal(vector: &[f32]) -> String {
    let mut out = String::with_capacity(vector.len() * 10 + 2);
    out.push('[');
    for (i, v) in vector.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{v}");
    }
    out.push(']');
    out
}

/// Quote an identifier for `backend`. Dotted names are quoted per part.
pub fn quote_ident(backend: Backend, name: &str) -> String {
    let (open, close) = match backend {
        Backend::MatrixOne => ('`', "``"),
        Backend::Postgres => ('"', "\"\""),
    };
    name.split('.')
        .map(|part| {
            let escaped = part.replace(open, close);
            format!("{open}{escaped}{open}")
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Single-quoted string literal for `backend`.
pub fn quote_str(backend: Backend, value: &str) -> String {
    let mut escaped = value.replace('\'', "''");
    if backend == Backend::MatrixOne {
        // MySQL-family servers treat backslash as an escape inside literals
        escaped = escaped.replace('\\', "\\\\");
    }
    format!("'{escaped}'")
}
