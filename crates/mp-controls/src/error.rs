//! Error types for control loop configuration and inspection.
//!
//! The control cycle itself never fails; these cover the surfaces around it.

use thiserror::Error;

/// Result type for control operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur while configuring or inspecting a control loop.
#[derive(Debug, Error)]
pub enum ControlError {
    /// No property with this key exists.
    #[error("Unknown property: {key}")]
    UnknownProperty { key: String },

    /// The property can be displayed but not edited.
    #[error("Property is read-only: {key}")]
    ReadOnlyProperty { key: &'static str },

    /// The written value has the wrong kind for this property.
    #[error("Property {key} expects a {expected} value")]
    PropertyType {
        key: &'static str,
        expected: &'static str,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
