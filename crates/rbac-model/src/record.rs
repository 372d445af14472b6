//! Record access helpers.

use serde_json::Value;

/// One data item shown in a table or edited by a form.
///
/// The shape is defined by the resource service; the engines only ever read
/// it through [`resolve_path`] and [`display_value`].
pub type Record = Value;

/// Resolve a dot-separated path (`"profile.name"`) inside a record.
///
/// Returns `None` when any segment is missing or an intermediate value is
/// not an object. Array elements can be addressed by numeric segments.
pub fn resolve_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }

    let mut current = record;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Coerce a resolved value into the text a table cell shows.
///
/// Absent and null values render as an empty string.
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| display_value(Some(item)))
            .collect::<Vec<_>>()
            .join(","),
        Some(other) => other.to_string(),
    }
}

/// Check whether a value counts as "empty" for required-field purposes.
///
/// Null, the empty string and the empty array are empty. `false` and `0`
/// are real values.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
