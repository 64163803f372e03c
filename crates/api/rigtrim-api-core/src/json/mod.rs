//! Shorthand JSON for [`Value`]s used in hand-written scene documents.

use serde_json::{json, Value as JsonValue};
use thiserror::Error;

use crate::Value;

#[derive(Debug, Error)]
pub enum JsonError {
    #[error("value json parse error: {0}")]
    ValueParse(#[from] serde_json::Error),
}

/// Normalize shorthand `Value` JSON into the canonical `{ "type": ..., "data": ... }`
/// representation understood by the serde derives on [`Value`]. Accepts primitive
/// aliases (`1.0`, `true`, `"text"`, `[x, y, z]`) and single-key objects such as
/// `{ "quat": [0, 0, 0, 1] }`, `{ "int": 2 }` or `{ "asset": "Body" }`.
pub fn normalize_value_json(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Number(n) => json!({ "type": "float", "data": n }),
        JsonValue::Bool(b) => json!({ "type": "bool", "data": b }),
        JsonValue::String(s) => json!({ "type": "text", "data": s }),
        JsonValue::Array(arr) if arr.len() == 3 && arr.iter().all(JsonValue::is_number) => {
            json!({ "type": "vec3", "data": arr })
        }
        JsonValue::Array(arr) if arr.len() == 4 && arr.iter().all(JsonValue::is_number) => {
            json!({ "type": "quat", "data": arr })
        }
        JsonValue::Object(obj) => {
            if obj.contains_key("type") && obj.contains_key("data") {
                return JsonValue::Object(obj);
            }
            for key in ["float", "bool", "int", "vec3", "quat", "text", "asset"] {
                if let Some(data) = obj.get(key) {
                    return json!({ "type": key, "data": data });
                }
            }
            JsonValue::Object(obj)
        }
        other => other,
    }
}

/// Normalize then deserialize into a strongly typed [`Value`].
pub fn parse_value(value: JsonValue) -> Result<Value, JsonError> {
    Ok(serde_json::from_value(normalize_value_json(value))?)
}
