//! Job envelope and input

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::request::ValidationError;

/// Untrusted job input: an arbitrary JSON object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobInput(Map<String, Value>);

impl JobInput {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Field lookup; JSON `null` counts as absent
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field names present, for logging
    pub fn field_names(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }
}

impl From<Map<String, Value>> for JobInput {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// A job as delivered by the runner: `{ "id"?: str, "input": {...} }`
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: Option<String>,
    pub input: JobInput,
}

impl Job {
    /// Parse an envelope without consuming it
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let envelope = value.as_object().ok_or(ValidationError::MissingInput)?;

        let input = match envelope.get("input") {
            Some(Value::Object(fields)) => JobInput::new(fields.clone()),
            _ => return Err(ValidationError::MissingInput),
        };

        let id = match envelope.get("id") {
            Some(Value::String(id)) => Some(id.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        Ok(Self { id, input })
    }
}
