//! Unified error type for toolbox operations.

use serde::Serialize;
use thiserror::Error;

/// Toolbox error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum ToolboxError {
    /// Input rejected before any network call was made
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Connection, TLS or protocol failure
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The call did not complete within its budget
    #[error("Timed out after {0}s")]
    Timeout(u64),
}

impl ToolboxError {
    /// Whether the error describes an anticipated condition (bad input, an
    /// unreachable host) rather than a defect. Used to pick the log level.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::ValidationError(_) | Self::Timeout(_))
    }
}

/// Toolbox Result type alias
pub type ToolboxResult<T> = std::result::Result<T, ToolboxError>;
