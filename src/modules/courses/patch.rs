//! Interpreter for ordered patch documents applied to a course
//! representation.
//!
//! Operations follow the RFC 6902 vocabulary (`add`, `remove`, `replace`,
//! `move`, `copy`, `test`) but are interpreted over the representation's
//! known field set rather than a schemaless document: an operation that
//! addresses an unknown path, or carries a value the field cannot hold,
//! fails with a structured, path-addressed error.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::models::CourseForUpdate;

/// A single patch operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
    Move { from: String, path: String },
    Copy { from: String, path: String },
    Test { path: String, value: Value },
}

/// An ordered patch document.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct PatchDocument(pub Vec<PatchOperation>);

/// A field-addressed patch failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{detail} (at {path})")]
pub struct PatchError {
    pub path: String,
    pub detail: String,
}

impl PatchError {
    fn unknown_path(path: &str) -> Self {
        Self {
            path: path.to_string(),
            detail: format!("'{path}' is not a patchable field"),
        }
    }
}

impl PatchDocument {
    /// Apply every operation in order. The first failure aborts the
    /// application; the caller re-validates the result regardless.
    pub fn apply(&self, target: &mut CourseForUpdate) -> Result<(), PatchError> {
        for operation in &self.0 {
            apply_operation(operation, target)?;
        }
        Ok(())
    }
}

fn apply_operation(
    operation: &PatchOperation,
    target: &mut CourseForUpdate,
) -> Result<(), PatchError> {
    match operation {
        PatchOperation::Add { path, value } | PatchOperation::Replace { path, value } => {
            let text = string_value(path, value)?;
            set_field(target, path, text)
        }
        PatchOperation::Remove { path } => set_field(target, path, String::new()),
        PatchOperation::Move { from, path } => {
            let value = get_field(target, from)?;
            set_field(target, path, value)?;
            set_field(target, from, String::new())
        }
        PatchOperation::Copy { from, path } => {
            let value = get_field(target, from)?;
            set_field(target, path, value)
        }
        PatchOperation::Test { path, value } => {
            let expected = string_value(path, value)?;
            let actual = get_field(target, path)?;
            if actual == expected {
                Ok(())
            } else {
                Err(PatchError {
                    path: path.clone(),
                    detail: format!("test failed: expected '{expected}', found '{actual}'"),
                })
            }
        }
    }
}

fn get_field(target: &CourseForUpdate, path: &str) -> Result<String, PatchError> {
    match path {
        "/title" => Ok(target.title.clone()),
        "/description" => Ok(target.description.clone()),
        _ => Err(PatchError::unknown_path(path)),
    }
}

fn set_field(target: &mut CourseForUpdate, path: &str, value: String) -> Result<(), PatchError> {
    match path {
        "/title" => target.title = value,
        "/description" => target.description = value,
        _ => return Err(PatchError::unknown_path(path)),
    }
    Ok(())
}

fn string_value(path: &str, value: &Value) -> Result<String, PatchError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Null => Ok(String::new()),
        _ => Err(PatchError {
            path: path.to_string(),
            detail: "value must be a string or null".to_string(),
        }),
    }
}
