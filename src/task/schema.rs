//! Input schema: defaults and required/type checks applied before a task runs.
//!
//! Understands the subset of the actor input-schema document the controller
//! needs: `properties.<name>.type`, `properties.<name>.default` and
//! `required`. Everything else in the document (titles, editors, prefill) is
//! ignored.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::task::types::{TaskError, TaskInput};

/// Checks a task input before it reaches the processor.
pub trait InputValidator: Send + Sync {
    /// Fill in fields the caller left out.
    fn apply_defaults(&self, input: TaskInput) -> TaskInput {
        input
    }

    /// Report every problem with `input`, not just the first.
    fn validate(&self, input: &TaskInput) -> Result<(), Vec<FieldError>>;
}

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("field `{0}` is required")]
    Missing(String),

    #[error("field `{field}` must be of type {expected}")]
    WrongType { field: String, expected: FieldType },
}

/// JSON type declared for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    #[serde(other)]
    Any,
}

impl FieldType {
    /// Whether `value` is acceptable for this type.
    ///
    /// Query-string input is untyped, so strings are accepted for scalar
    /// numeric and boolean fields as long as they parse.
    fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldType::Any, _) => true,
            (FieldType::String, Value::String(_)) => true,
            (FieldType::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (FieldType::Integer, Value::String(s)) => s.trim().parse::<i64>().is_ok(),
            (FieldType::Number, Value::Number(_)) => true,
            (FieldType::Number, Value::String(s)) => s.trim().parse::<f64>().is_ok(),
            (FieldType::Boolean, Value::Bool(_)) => true,
            (FieldType::Boolean, Value::String(s)) => matches!(s.as_str(), "true" | "false"),
            (FieldType::Object, Value::Object(_)) => true,
            (FieldType::Array, Value::Array(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
            FieldType::Array => "array",
            FieldType::Any => "any",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub field_type: Option<FieldType>,

    #[serde(default)]
    pub default: Option<Value>,
}

/// Parsed input schema document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputSchema {
    #[serde(default)]
    pub properties: BTreeMap<String, FieldSpec>,

    #[serde(default)]
    pub required: Vec<String>,
}

/// Error type for loading a schema document.
#[derive(Debug, Error)]
pub enum SchemaLoadError {
    #[error("failed to read input schema {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse input schema {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl InputSchema {
    /// Load a schema document from disk.
    pub fn from_file(path: &Path) -> Result<Self, SchemaLoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| SchemaLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| SchemaLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl InputValidator for InputSchema {
    fn apply_defaults(&self, mut input: TaskInput) -> TaskInput {
        for (name, spec) in &self.properties {
            if let Some(default) = &spec.default {
                let absent = input.get(name).map_or(true, Value::is_null);
                if absent {
                    input.insert(name.clone(), default.clone());
                }
            }
        }
        input
    }

    fn validate(&self, input: &TaskInput) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        for name in &self.required {
            if input.get(name).map_or(true, Value::is_null) {
                errors.push(FieldError::Missing(name.clone()));
            }
        }

        for (name, spec) in &self.properties {
            let (Some(expected), Some(value)) = (spec.field_type, input.get(name)) else {
                continue;
            };
            if !value.is_null() && !expected.accepts(value) {
                errors.push(FieldError::WrongType {
                    field: name.clone(),
                    expected,
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Apply defaults and validate, turning violations into one Validation error.
pub fn check_input(validator: &dyn InputValidator, input: TaskInput) -> Result<TaskInput, TaskError> {
    let input = validator.apply_defaults(input);
    match validator.validate(&input) {
        Ok(()) => Ok(input),
        Err(errors) => {
            let details = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            Err(TaskError::validation(format!("Invalid input: {}", details)).with_code("INVALID_INPUT"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::types::TaskErrorKind;
    use serde_json::json;

    fn schema() -> InputSchema {
        serde_json::from_value(json!({
            "title": "Scraper input",
            "type": "object",
            "schemaVersion": 1,
            "properties": {
                "url": { "title": "Start URL", "type": "string", "editor": "textfield" },
                "maxItems": { "type": "integer", "default": 10 },
                "proxy": { "type": "object" }
            },
            "required": ["url"]
        }))
        .unwrap()
    }

    fn input(value: Value) -> TaskInput {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let prepared = schema().apply_defaults(input(json!({"url": "https://example.com"})));
        assert_eq!(prepared.get("maxItems"), Some(&json!(10)));
    }

    #[test]
    fn defaults_do_not_override_caller_values() {
        let prepared = schema().apply_defaults(input(json!({"maxItems": 3})));
        assert_eq!(prepared.get("maxItems"), Some(&json!(3)));
    }

    #[test]
    fn reports_every_violation() {
        let errors = schema()
            .validate(&input(json!({"maxItems": "many", "proxy": []})))
            .unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&FieldError::Missing("url".into())));
    }

    #[test]
    fn numeric_strings_pass_integer_fields() {
        let ok = schema().validate(&input(json!({"url": "https://example.com", "maxItems": "5"})));
        assert!(ok.is_ok());
    }

    #[test]
    fn unknown_types_are_not_checked() {
        let schema: InputSchema = serde_json::from_value(json!({
            "properties": { "pages": { "type": "enum" } }
        }))
        .unwrap();
        assert!(schema.validate(&input(json!({"pages": 1}))).is_ok());
    }

    #[test]
    fn check_input_maps_to_validation_error() {
        let err = check_input(&schema(), input(json!({}))).unwrap_err();
        assert_eq!(err.kind, TaskErrorKind::Validation);
        assert_eq!(err.code.as_deref(), Some("INVALID_INPUT"));
        assert!(err.message.contains("`url` is required"));
    }
}
