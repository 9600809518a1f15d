//! Argument validation against a tool's input schema
//!
//! Only what the catalogue declares is checked: required fields must be
//! present and not null, and every declared field that is present must
//! have the declared JSON type. Undeclared fields pass through.

use crate::error::DispatchError;
use crate::models::{JsonObject, ToolDescriptor};
use serde_json::Value;

fn matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        _ => true,
    }
}

pub fn validate_arguments(
    descriptor: &ToolDescriptor,
    arguments: &JsonObject,
) -> Result<(), DispatchError> {
    for field in descriptor.required_fields() {
        match arguments.get(field) {
            None | Some(Value::Null) => {
                return Err(DispatchError::Validation(format!(
                    "missing required field '{}'",
                    field
                )));
            }
            Some(_) => {}
        }
    }

    for (name, value) in arguments {
        if value.is_null() {
            continue;
        }
        if let Some(expected) = descriptor.property_type(name) {
            if !matches_type(value, expected) {
                return Err(DispatchError::Validation(format!(
                    "field '{}' must be of type {}",
                    name, expected
                )));
            }
        }
    }

    Ok(())
}
