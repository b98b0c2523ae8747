//! Value comparison with known default-vs-absent equivalences collapsed.

use crate::schema::FieldType;
use serde_json::Value;

/// Deep structural equality where null and absent are interchangeable.
///
/// Arrays compare element-wise in order, objects by key set and per-key
/// equality, numbers by numeric value. Null never equals another falsy value.
pub fn are_values_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (non_null(a), non_null(b)) {
        (None, None) => true,
        (Some(a), Some(b)) => present_values_equal(a, b),
        _ => false,
    }
}

fn non_null(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn present_values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| are_values_equal(Some(a), Some(b)))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(key, a)| y.get(key).is_some_and(|b| are_values_equal(Some(a), Some(b))))
        }
        _ => a == b,
    }
}

/// Collapse an option value to absent when it equals the server default.
///
/// Setting an option explicitly to its default and leaving it unset must
/// compare equal, otherwise every run would report spurious changes.
pub fn normalize_option_value<'a>(key: &str, value: Option<&'a Value>, field_type: FieldType) -> Option<&'a Value> {
    let value = non_null(value)?;

    let is_default = match (field_type, key) {
        (FieldType::Select | FieldType::File, "maxSelect") => is_number(value, 1.0),
        (FieldType::File, "maxSize") => is_number(value, 0.0),
        (FieldType::Number, "min") => is_number(value, 1.0),
        (FieldType::File, "mimeTypes" | "thumbs") => value.as_array().is_some_and(Vec::is_empty),
        (FieldType::File, "protected") => value.as_bool() == Some(false),
        (FieldType::Autodate, "onCreate") => value.as_bool() == Some(true),
        (FieldType::Autodate, "onUpdate") => value.as_bool() == Some(false),
        _ => false,
    };

    if is_default { None } else { Some(value) }
}

fn is_number(value: &Value, expected: f64) -> bool {
    value.as_f64() == Some(expected)
}
