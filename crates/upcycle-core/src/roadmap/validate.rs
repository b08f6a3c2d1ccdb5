//! Per-step schema validation for parsed model output.
//!
//! Checks, in order, that every required field is present with the right
//! JSON type:
//! - `step_number`: integer (value discarded, replaced by position)
//! - `title`, `description`: non-blank strings
//! - `estimated_time`: string
//! - `materials_needed`: array of strings

use serde_json::{Map, Value};
use thiserror::Error;

use super::types::RoadmapStep;

/// Why a step record was rejected. `index` is the 0-based array position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("step {index}: expected a JSON object, got {found}")]
    NotAnObject { index: usize, found: &'static str },

    #[error("step {index}: missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("step {index}: field `{field}` must be {expected}, got {found}")]
    WrongType {
        index: usize,
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("step {index}: materials_needed[{position}] must be a string, got {found}")]
    BadMaterials {
        index: usize,
        position: usize,
        found: &'static str,
    },

    #[error("step {index}: field `{field}` must not be empty")]
    EmptyField { index: usize, field: &'static str },
}

/// JSON type name used in error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validate one parsed record at array position `index` and assign its
/// step number (`index + 1`).
pub fn validate_step(record: &Value, index: usize) -> Result<RoadmapStep, SchemaError> {
    let Value::Object(fields) = record else {
        return Err(SchemaError::NotAnObject {
            index,
            found: json_type_name(record),
        });
    };

    let step_number = require(fields, index, "step_number")?;
    if !(step_number.is_i64() || step_number.is_u64()) {
        return Err(wrong_type(index, "step_number", "an integer", step_number));
    }

    let title = require_string(fields, index, "title")?;
    let description = require_string(fields, index, "description")?;
    let estimated_time = require_string(fields, index, "estimated_time")?;

    let materials = require(fields, index, "materials_needed")?;
    let Value::Array(items) = materials else {
        return Err(wrong_type(index, "materials_needed", "an array", materials));
    };
    let materials_needed = items
        .iter()
        .enumerate()
        .map(|(position, item)| match item {
            Value::String(s) => Ok(s.clone()),
            other => Err(SchemaError::BadMaterials {
                index,
                position,
                found: json_type_name(other),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    for (field, value) in [("title", title), ("description", description)] {
        if value.trim().is_empty() {
            return Err(SchemaError::EmptyField { index, field });
        }
    }

    Ok(RoadmapStep {
        step_number: u32::try_from(index + 1).unwrap_or(u32::MAX),
        title: title.to_owned(),
        description: description.to_owned(),
        estimated_time: estimated_time.to_owned(),
        materials_needed,
    })
}

/// Validate every record in order. The first failure rejects the whole
/// sequence; no partial result is returned.
pub fn validate_steps(records: &[Value]) -> Result<Vec<RoadmapStep>, SchemaError> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| validate_step(record, index))
        .collect()
}

fn require<'a>(
    fields: &'a Map<String, Value>,
    index: usize,
    field: &'static str,
) -> Result<&'a Value, SchemaError> {
    fields
        .get(field)
        .ok_or(SchemaError::MissingField { index, field })
}

fn require_string<'a>(
    fields: &'a Map<String, Value>,
    index: usize,
    field: &'static str,
) -> Result<&'a str, SchemaError> {
    let value = require(fields, index, field)?;
    value
        .as_str()
        .ok_or_else(|| wrong_type(index, field, "a string", value))
}

fn wrong_type(index: usize, field: &'static str, expected: &'static str, found: &Value) -> SchemaError {
    SchemaError::WrongType {
        index,
        field,
        expected,
        found: json_type_name(found),
    }
}
