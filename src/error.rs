//! Error types for process configuration.
//!
//! Library functions return [`ConfigError`]; the binary and file-loading
//! layer wrap these into `color_eyre` reports with context.

use thiserror::Error;

/// Errors raised while building, patching, validating or loading a process.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Label '{0}' is already declared on this process")]
    DuplicateLabel(String),

    #[error("Service '{0}' is already declared on this process")]
    DuplicateService(String),

    #[error("Label '{0}' is not declared on this process")]
    UnknownLabel(String),

    #[error("Unknown module implementation '{0}'")]
    UnknownModuleKind(String),

    #[error("Unknown service '{0}'")]
    UnknownService(String),

    #[error("Implementation '{implementation}' is a {actual}, not a {expected}")]
    KindMismatch {
        implementation: String,
        expected: String,
        actual: String,
    },

    #[error("Configuration template '{0}' not found")]
    UnknownTemplate(String),

    #[error("Parameter '{path}' has type {actual}, expected {expected}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("No parameter named '{0}'")]
    NoSuchParameter(String),

    #[error("Invalid label '{0}': labels must start with a letter and contain only ASCII letters and digits")]
    InvalidLabel(String),

    #[error("Path '{0}' has no modules")]
    EmptyPath(String),

    #[error("Module '{label}' appears more than once in path '{path}'")]
    DuplicateInPath { path: String, label: String },

    #[error("Module '{label}' ({implementation}) requires parameter '{parameter}'")]
    MissingParameter {
        label: String,
        implementation: String,
        parameter: String,
    },

    #[error("Parameter '{parameter}' of '{owner}' references undeclared module '{target}'")]
    DanglingReference {
        owner: String,
        parameter: String,
        target: String,
    },

    #[error("Invalid message severity '{0}' (expected DEBUG, INFO, WARNING or ERROR)")]
    InvalidSeverity(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed configuration: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
