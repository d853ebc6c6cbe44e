//! Error types shared by gateway crates

use thiserror::Error;

/// Result type alias for common gateway operations
pub type Result<T> = std::result::Result<T, CommonError>;

/// Errors raised while parsing shared value types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    #[error("Invalid run id '{0}': expected 1-128 characters of [A-Za-z0-9_-]")]
    InvalidRunId(String),

    #[error("Invalid log {setting}: {value}")]
    InvalidLogSetting { setting: &'static str, value: String },
}
