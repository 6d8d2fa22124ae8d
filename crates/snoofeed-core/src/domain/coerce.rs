//! Tolerant coercion of loosely-typed Reddit payload fields.
//!
//! Reddit transmits numbers inconsistently: a score may arrive as `42`, as
//! `"42"`, or as the decimal-formatted string `"42.0"`, and any field may be
//! absent outright. These helpers parse what is parseable and answer `None`
//! for everything else; callers substitute field-specific defaults instead of
//! propagating an error for this class of malformed-but-expected input.

use serde_json::Value;

/// Parse a decimal-formatted string, e.g. `"88"` or `"88.0"`.
pub fn numeric_str(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Coerce a native number or numeric string to a float.
pub fn coerce_float(raw: Option<&Value>) -> Option<f64> {
    match raw? {
        Value::Number(number) => number.as_f64().filter(|value| value.is_finite()),
        Value::String(text) => numeric_str(text),
        _ => None,
    }
}

/// Coerce a native number or numeric string to an integer, truncating any
/// fractional part (`"88.0"` becomes 88).
pub fn coerce_int(raw: Option<&Value>) -> Option<i64> {
    coerce_float(raw).map(|value| value as i64)
}

/// Non-negative integer variant used for counters that cannot go below zero.
pub fn coerce_uint(raw: Option<&Value>) -> Option<u64> {
    coerce_int(raw).filter(|value| *value >= 0).map(|value| value as u64)
}

/// Truthiness-style flag coercion. Reddit's `edited` field is either `false`
/// or the edit's epoch timestamp, so non-zero numbers count as `true`.
pub fn coerce_bool(raw: Option<&Value>) -> Option<bool> {
    match raw? {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => number.as_f64().map(|value| value != 0.0),
        _ => None,
    }
}

/// Borrow a string field, `None` for any other shape.
pub fn opt_string(raw: Option<&Value>) -> Option<String> {
    match raw? {
        Value::String(text) => Some(text.clone()),
        _ => None,
    }
}

/// String field with the empty-string default used by optional text fields.
pub fn string_or_default(raw: Option<&Value>) -> String {
    opt_string(raw).unwrap_or_default()
}
