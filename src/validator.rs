use crate::error::WatchError;
use serde_json::Value;

/// Key under which the API lists changed records.
pub const RECORDS_KEY: &str = "homeworks";

/// Confirm the payload is a mapping with a `homeworks` array and return the records.
///
/// An empty array is a valid answer.
pub fn check_response(payload: &Value) -> Result<&[Value], WatchError> {
    let map = payload.as_object().ok_or(WatchError::SchemaType {
        expected: "object",
        actual: json_type_name(payload),
    })?;

    let records = map.get(RECORDS_KEY).ok_or_else(|| WatchError::SchemaKey {
        key: RECORDS_KEY,
        present: map.keys().cloned().collect(),
    })?;

    records
        .as_array()
        .map(Vec::as_slice)
        .ok_or(WatchError::SchemaType {
            expected: "array",
            actual: json_type_name(records),
        })
}

/// JSON type name of a value, as reported in schema diagnostics.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
