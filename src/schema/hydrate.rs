//! Field-level hydration helpers for untyped model output.
//!
//! Missing or `null` fields fall back to empty values. A field that is present
//! with the wrong type is an error, and so is a missing required field.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

/// Why a parsed payload could not be turned into a schema value.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct HydrationError(pub String);

impl HydrationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

pub type Fields = Map<String, Value>;

/// Borrow `value` as a JSON object.
pub fn object<'a>(value: &'a Value, what: &str) -> Result<&'a Fields, HydrationError> {
    value
        .as_object()
        .ok_or_else(|| HydrationError::new(format!("{} must be a JSON object", what)))
}

fn present<'a>(fields: &'a Fields, key: &str) -> Option<&'a Value> {
    fields.get(key).filter(|v| !v.is_null())
}

/// String field, empty when absent.
pub fn optional_string(fields: &Fields, key: &str) -> Result<String, HydrationError> {
    match present(fields, key) {
        None => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(type_error(key, "a string", other)),
    }
}

/// String field that must be present and non-blank.
pub fn required_string(fields: &Fields, key: &str) -> Result<String, HydrationError> {
    let value = optional_string(fields, key)?;
    if value.trim().is_empty() {
        return Err(HydrationError::new(format!("missing required field '{}'", key)));
    }
    Ok(value)
}

/// Non-negative integer field, zero when absent.
///
/// Integral floats and numeric strings are accepted.
pub fn optional_u32(fields: &Fields, key: &str) -> Result<u32, HydrationError> {
    let value = match present(fields, key) {
        None => return Ok(0),
        Some(v) => v,
    };

    let parsed = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    parsed
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| type_error(key, "a non-negative integer", value))
}

/// List-of-strings field, empty when absent.
pub fn optional_string_list(fields: &Fields, key: &str) -> Result<Vec<String>, HydrationError> {
    match present(fields, key) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(type_error(key, "a list of strings", other)),
            })
            .collect(),
        Some(other) => Err(type_error(key, "a list of strings", other)),
    }
}

/// Array field, empty when absent.
pub fn optional_array<'a>(fields: &'a Fields, key: &str) -> Result<&'a [Value], HydrationError> {
    match present(fields, key) {
        None => Ok(&[]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(other) => Err(type_error(key, "a list", other)),
    }
}

fn type_error(key: &str, expected: &str, got: &Value) -> HydrationError {
    let got = match got {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    };
    HydrationError::new(format!("field '{}' must be {}, got {}", key, expected, got))
}

/// Items of a sequence-shaped payload.
///
/// Accepts a bare array, an object wrapping a single array (`{"questions": [...]}`),
/// or a lone object, which counts as a one-item sequence.
///
/// A wrapper may carry extra scalar keys (`{"questions": [...], "count": 3}`)
/// as long as its only array holds objects. An object whose only array holds
/// strings, like a question with `options`, is an item, not a wrapper.
pub fn sequence_items(payload: &Value) -> Vec<&Value> {
    match payload {
        Value::Array(items) => items.iter().collect(),
        Value::Object(fields) => {
            let arrays: Vec<&Vec<Value>> = fields.values().filter_map(Value::as_array).collect();
            match arrays.as_slice() {
                [items] if fields.len() == 1 || is_object_list(items) => items.iter().collect(),
                _ => vec![payload],
            }
        }
        _ => vec![payload],
    }
}

fn is_object_list(items: &[Value]) -> bool {
    !items.is_empty() && items.iter().all(Value::is_object)
}

/// Hydrate every item of a sequence payload, dropping the ones that fail.
///
/// Returns the valid items in order and the number of dropped items.
pub fn hydrate_sequence<T, F>(payload: &Value, what: &str, mut hydrate: F) -> (Vec<T>, usize)
where
    F: FnMut(&Value) -> Result<T, HydrationError>,
{
    let mut items = Vec::new();
    let mut dropped = 0;

    for (index, raw) in sequence_items(payload).into_iter().enumerate() {
        match hydrate(raw) {
            Ok(item) => items.push(item),
            Err(e) => {
                warn!("Dropping {} #{}: {}", what, index + 1, e);
                dropped += 1;
            }
        }
    }

    (items, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_missing_fields_default() {
        let f = fields(json!({"other": 1, "nothing": null}));
        assert_eq!(optional_string(&f, "name").unwrap(), "");
        assert_eq!(optional_string(&f, "nothing").unwrap(), "");
        assert_eq!(optional_u32(&f, "count").unwrap(), 0);
        assert!(optional_string_list(&f, "tags").unwrap().is_empty());
        assert!(optional_array(&f, "items").unwrap().is_empty());
    }

    #[test]
    fn test_type_violations() {
        let f = fields(json!({"name": 5, "tags": ["a", 2], "count": -1, "items": "x"}));
        assert!(optional_string(&f, "name").is_err());
        assert!(optional_string_list(&f, "tags").is_err());
        assert!(optional_u32(&f, "count").is_err());
        assert!(optional_array(&f, "items").is_err());
    }

    #[test]
    fn test_lenient_integers() {
        let f = fields(json!({"a": 3, "b": 4.0, "c": "5", "d": 1.5}));
        assert_eq!(optional_u32(&f, "a").unwrap(), 3);
        assert_eq!(optional_u32(&f, "b").unwrap(), 4);
        assert_eq!(optional_u32(&f, "c").unwrap(), 5);
        assert!(optional_u32(&f, "d").is_err());
    }

    #[test]
    fn test_required_string() {
        let f = fields(json!({"question": "   ", "title": "Loops"}));
        assert!(required_string(&f, "question").is_err());
        assert!(required_string(&f, "missing").is_err());
        assert_eq!(required_string(&f, "title").unwrap(), "Loops");
    }

    #[test]
    fn test_sequence_items_shapes() {
        assert_eq!(sequence_items(&json!([1, 2, 3])).len(), 3);
        assert_eq!(sequence_items(&json!({"questions": [1, 2]})).len(), 2);
        assert_eq!(sequence_items(&json!({"question": "q", "options": []})).len(), 1);
        assert_eq!(sequence_items(&json!([])).len(), 0);
    }

    #[test]
    fn test_wrapper_with_extra_keys() {
        let payload = json!({
            "count": 2,
            "title": "Loops",
            "questions": [{"question": "a"}, {"question": "b"}]
        });
        assert_eq!(sequence_items(&payload).len(), 2);

        let problem = json!({"problem_statement": "Sum", "hints": ["one", "two"]});
        assert_eq!(sequence_items(&problem), vec![&problem]);

        let two_lists = json!({"a": [{"x": 1}], "b": [{"x": 2}]});
        assert_eq!(sequence_items(&two_lists).len(), 1);
    }

    #[test]
    fn test_hydrate_sequence_counts_drops() {
        let payload = json!([{"n": 1}, {"n": "x"}, {"n": 3}]);
        let (items, dropped) = hydrate_sequence(&payload, "item", |v| {
            let f = object(v, "item")?;
            optional_u32(f, "n")
        });
        assert_eq!(items, vec![1, 3]);
        assert_eq!(dropped, 1);
    }
}
