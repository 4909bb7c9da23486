//! Property value semantics.
//!
//! Property values are plain JSON values. Container metadata was historically
//! authored against a loosely typed backend (checkboxes stored as `""`/`"1"`,
//! numeric ids stored as strings), so comparisons default to *loose* equality
//! and "truthiness" follows the same legacy rules. Strict comparison is opt-in
//! per condition.

use serde_json::Value;
use std::cmp::Ordering;

/// Legacy truthiness: `null`, `false`, `0`, `0.0`, `""`, `"0"`, `[]` and `{}`
/// are false; everything else is true. A missing value is false.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(false, |f| f != 0.0),
        Some(Value::String(s)) => !(s.is_empty() || s == "0"),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

/// Typed equality; a missing value equals `null`.
pub fn strict_eq(lhs: Option<&Value>, rhs: Option<&Value>) -> bool {
    lhs.unwrap_or(&Value::Null) == rhs.unwrap_or(&Value::Null)
}

/// Loose equality (`"1" == 1`, `"" == null`, `true == "yes"`).
pub fn loose_eq(lhs: Option<&Value>, rhs: Option<&Value>) -> bool {
    let lhs = lhs.unwrap_or(&Value::Null);
    let rhs = rhs.unwrap_or(&Value::Null);

    match (lhs, rhs) {
        (Value::Null, Value::Null) => true,
        (Value::Null, Value::String(s)) | (Value::String(s), Value::Null) => s.is_empty(),
        (Value::Null, other) | (other, Value::Null) => !is_truthy(Some(other)),
        (Value::Bool(b), other) | (other, Value::Bool(b)) => *b == is_truthy(Some(other)),
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            match parse_numeric(s) {
                Some(parsed) => n.as_f64() == Some(parsed),
                None => n.to_string() == *s,
            }
        }
        (Value::String(a), Value::String(b)) => match (parse_numeric(a), parse_numeric(b)) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| loose_eq(Some(x), Some(y)))
        }
        (a, b) => a == b,
    }
}

/// Ordering used by `>`/`<` filter rules: numeric when both sides are numeric
/// (numbers or numeric strings), lexicographic for strings, `None` otherwise.
pub fn compare_values(lhs: Option<&Value>, rhs: Option<&Value>) -> Option<Ordering> {
    let lhs = lhs?;
    let rhs = rhs?;
    if let (Some(a), Some(b)) = (as_numeric(lhs), as_numeric(rhs)) {
        return a.partial_cmp(&b);
    }
    match (lhs, rhs) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// SQL-style `LIKE` matching: `%` matches any run, `_` a single character.
/// Matching is case-insensitive.
pub fn like_matches(value: Option<&Value>, pattern: &str) -> bool {
    let Some(value) = value else {
        return false;
    };
    let text = display_value(value).to_lowercase();
    let pattern = pattern.to_lowercase();
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    like_rec(&text, &pattern)
}

fn like_rec(text: &[char], pattern: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('%', rest)) => (0..=text.len()).any(|skip| like_rec(&text[skip..], rest)),
        Some(('_', rest)) => !text.is_empty() && like_rec(&text[1..], rest),
        Some((c, rest)) => text.first() == Some(c) && like_rec(&text[1..], rest),
    }
}

/// Render a value the way it would appear in a form field (strings unquoted).
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric(s),
        _ => None,
    }
}

fn parse_numeric(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
}
