//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

pub use site_inspector_toolbox::ToolboxError;

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum InspectorError {
    /// Rejected input (malformed domain, unknown plugin name)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Unusable configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Cache directory or cache file could not be used
    #[error("Cache error: {0}")]
    CacheError(String),

    /// Remote document unavailable
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Remote document did not have the expected shape
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A plugin exceeded its time budget
    #[error("Plugin {plugin} timed out after {seconds}s")]
    PluginTimeout { plugin: String, seconds: u64 },

    /// Error raised by a network collaborator
    #[error("{0}")]
    Toolbox(#[from] ToolboxError),
}

impl InspectorError {
    /// Whether the error describes an anticipated condition, used to pick the
    /// log level: `warn` when `true`, `error` otherwise.
    ///
    /// Keep in step with new variants.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::ValidationError(_) | Self::NetworkError(_) | Self::PluginTimeout { .. } => true,
            Self::Toolbox(e) => e.is_expected(),
            Self::ConfigError(_) | Self::CacheError(_) | Self::ParseError(_) => false,
        }
    }
}

/// Core layer Result type alias
pub type InspectorResult<T> = std::result::Result<T, InspectorError>;
