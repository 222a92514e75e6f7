//! Field Accessor
//!
//! Reads possibly-nested fields from heterogeneous records using a
//! dot-notation path (`shape_config.ocpus`, `launch_options.0`).

use serde_json::Value;
use std::borrow::Cow;

/// Named-field lookup on a record
///
/// JSON objects answer with their keys, typed records with their fields.
pub trait Attributes {
    fn attribute(&self, name: &str) -> Option<Cow<'_, Value>>;
}

impl Attributes for Value {
    fn attribute(&self, name: &str) -> Option<Cow<'_, Value>> {
        step(self, name).map(Cow::Borrowed)
    }
}

/// Descend one path segment into a JSON value
fn step<'a>(current: &'a Value, part: &str) -> Option<&'a Value> {
    match current {
        Value::Object(map) => map.get(part),
        Value::Array(arr) => part.parse::<usize>().ok().and_then(|idx| arr.get(idx)),
        _ => None,
    }
}

/// Look up a dotted path, returning `None` on any missing segment
pub fn try_get<R: Attributes + ?Sized>(record: &R, path: &str) -> Option<Value> {
    let mut parts = path.split('.');
    let first = parts.next()?;
    let root = record.attribute(first)?;

    let mut current: &Value = root.as_ref();
    for part in parts {
        current = step(current, part)?;
    }

    Some(current.clone())
}

/// Look up a dotted path and render it as text, falling back to `default`
pub fn get<R: Attributes + ?Sized>(record: &R, path: &str, default: &str) -> String {
    match try_get(record, path) {
        Some(value) => value_to_text(&value).unwrap_or_else(|| default.to_string()),
        None => default.to_string(),
    }
}

/// Native textual form of a JSON value; `null` has none
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => None,
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}
