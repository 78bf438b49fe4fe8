//! Request payload validation.
//!
//! # Responsibilities
//! - Decode the raw JSON body of create/update requests
//! - Require all five user attributes to be present and non-empty
//!
//! Email and phone formats are not checked, only presence.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// JSON keys of the user attributes, in the order they are checked.
pub const FIELDS: [&str; 5] = ["username", "firstName", "lastName", "email", "phone"];

/// A validated create/update payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

/// Why a payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The body is not a JSON object or a field has the wrong JSON type.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// A required field is absent, null or empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The body could not be buffered, e.g. it exceeds the size limit.
    #[error("unreadable payload: {0}")]
    Unreadable(String),
}

impl UserInput {
    /// Validate a raw request body.
    ///
    /// Reports the first offending field in [`FIELDS`] order.
    pub fn from_json_bytes(body: &[u8]) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| ValidationError::Malformed(e.to_string()))?;
        Self::from_json_value(value)
    }

    pub fn from_json_value(value: Value) -> Result<Self, ValidationError> {
        let Value::Object(mut object) = value else {
            return Err(ValidationError::Malformed(
                "expected a JSON object".to_string(),
            ));
        };

        Ok(Self {
            username: take_required(&mut object, "username")?,
            first_name: take_required(&mut object, "firstName")?,
            last_name: take_required(&mut object, "lastName")?,
            email: take_required(&mut object, "email")?,
            phone: take_required(&mut object, "phone")?,
        })
    }
}

fn take_required(
    object: &mut Map<String, Value>,
    field: &'static str,
) -> Result<String, ValidationError> {
    match object.remove(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
        Some(Value::String(s)) if s.is_empty() => Err(ValidationError::MissingField(field)),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ValidationError::Malformed(format!(
            "{} must be a string, got {}",
            field,
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
