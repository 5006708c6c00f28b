//! Text normalization and numeric coercion for untyped sheet cells.
//!
//! Every identity or header comparison in the system goes through
//! [`normalize`]: lowercase, trim, strip diacritics, collapse whitespace
//! runs. Two strings are equivalent iff their normalized forms are equal.

use serde_json::Value;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization as _;

/// Normalizes a string for identity/header comparison.
///
/// Lowercases, trims, decomposes to NFD and drops combining marks (so
/// "Seuïl" and "seuil" compare equal), then collapses internal whitespace
/// runs to a single space. Idempotent.
pub fn normalize(s: &str) -> String {
    let lowered = s.trim().to_lowercase();
    let stripped = lowered.nfd().filter(|c| !is_combining_mark(*c));

    let mut out = String::with_capacity(s.len());
    let mut in_whitespace = false;
    for c in stripped {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push(' ');
            }
            in_whitespace = true;
        } else {
            out.push(c);
            in_whitespace = false;
        }
    }
    out
}

/// Returns true if `a` and `b` are equal under normalization.
pub fn eq_normalized(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Coerces arbitrary textual cell content to a number.
///
/// Empty or whitespace-only strings become 0. Otherwise everything but
/// digits, `.` and `-` is stripped (thousands separators, units, currency
/// signs) and the remainder parsed as f64; unparseable input becomes 0.
pub fn coerce_number_str(s: &str) -> f64 {
    if s.trim().is_empty() {
        return 0.0;
    }
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse().unwrap_or(0.0)
}

/// Coerces a JSON cell value to a number using the same rules as
/// [`coerce_number_str`]. Numbers pass through; anything non-numeric and
/// non-string becomes 0.
pub fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => coerce_number_str(s),
        _ => 0.0,
    }
}

/// Interprets a raw text cell as a JSON value: a cell that parses fully as
/// a number is exposed as a number, everything else stays text. Empty cells
/// become the empty string.
pub fn cell_to_value(cell: &str) -> Value {
    if !cell.is_empty() {
        if let Ok(n) = cell.parse::<f64>() {
            if let Some(num) = serde_json::Number::from_f64(n) {
                return Value::Number(num);
            }
        }
    }
    Value::String(cell.to_string())
}

/// Renders a JSON value back to a raw text cell.
pub fn value_to_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
