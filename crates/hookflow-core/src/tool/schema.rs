//! Input validation against a tool's declared schema.
//!
//! Supports the subset of JSON Schema tools actually declare:
//! top-level `type`, `required`, and `properties.<name>.type` (a name or a
//! list of names). A null or empty schema accepts any input.

use serde_json::Value;

/// Check `input` against `schema`. The error is a human-readable reason.
pub fn validate_against_schema(schema: &Value, input: &Value) -> Result<(), String> {
    let Some(schema) = schema.as_object() else {
        return Ok(());
    };
    if schema.is_empty() {
        return Ok(());
    }

    if let Some(expected) = schema.get("type") {
        check_type("input", expected, input)?;
    }

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        let object = input.as_object();
        for name in required.iter().filter_map(Value::as_str) {
            if !object.is_some_and(|o| o.contains_key(name)) {
                return Err(format!("missing required field '{name}'"));
            }
        }
    }

    if let (Some(properties), Some(object)) = (
        schema.get("properties").and_then(Value::as_object),
        input.as_object(),
    ) {
        for (name, property) in properties {
            let (Some(value), Some(expected)) = (object.get(name), property.get("type")) else {
                continue;
            };
            check_type(name, expected, value)?;
        }
    }

    Ok(())
}

fn check_type(field: &str, expected: &Value, value: &Value) -> Result<(), String> {
    let names: Vec<&str> = match expected {
        Value::String(name) => vec![name.as_str()],
        Value::Array(names) => names.iter().filter_map(Value::as_str).collect(),
        _ => return Err(format!("schema for '{field}' has an invalid type declaration")),
    };

    for name in &names {
        if matches_type(name, value)? {
            return Ok(());
        }
    }
    Err(format!(
        "field '{field}' must be of type {}, got {}",
        names.join(" | "),
        type_name(value)
    ))
}

fn matches_type(name: &str, value: &Value) -> Result<bool, String> {
    Ok(match name {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.as_f64().is_some_and(|n| n.fract() == 0.0),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        other => return Err(format!("unsupported schema type '{other}'")),
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
