//! Error types for taskflow
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, unknown option value, invalid config)
//! - 4: Operation failed (I/O, serialization, assistant transport)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the taskflow CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for taskflow operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown {kind} '{value}' (expected {expected})")]
    UnknownOption {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Ambiguous task id '{input}' matches {matches} tasks")]
    AmbiguousTaskId { input: String, matches: usize },

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Assistant request failed: {0}")]
    Assistant(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidConfig(_)
            | Error::ConfigNotFound(_)
            | Error::InvalidArgument(_)
            | Error::UnknownOption { .. }
            | Error::TaskNotFound(_)
            | Error::AmbiguousTaskId { .. } => exit_codes::USER_ERROR,

            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::Http(_)
            | Error::Assistant(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured fields for JSON error output.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::UnknownOption {
                kind,
                value,
                expected,
            } => Some(serde_json::json!({
                "kind": kind,
                "value": value,
                "expected": expected,
            })),
            Error::AmbiguousTaskId { input, matches } => Some(serde_json::json!({
                "input": input,
                "matches": matches,
            })),
            Error::TaskNotFound(id) => Some(serde_json::json!({ "id": id })),
            Error::ConfigNotFound(path) => {
                Some(serde_json::json!({ "path": path.to_string_lossy() }))
            }
            Error::InvalidConfig(message) | Error::InvalidArgument(message) => {
                Some(serde_json::json!({ "message": message }))
            }
            _ => None,
        }
    }
}

/// Result type alias for taskflow operations
pub type Result<T> = std::result::Result<T, Error>;
