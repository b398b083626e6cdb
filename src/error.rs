//! Error types for the Check Point provider.

use thiserror::Error;

/// Errors that can occur while running provider hooks.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The management server rejected a command.
    ///
    /// The vendor message is surfaced verbatim.
    #[error("{message}")]
    Api {
        /// The vendor error code (e.g. `generic_err_object_not_found`), when returned.
        code: Option<String>,
        /// The vendor error message.
        message: String,
    },

    /// The HTTP request to the management server failed.
    #[error("Transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The requested object was not found.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource or data source type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// Operation not implemented for this resource type.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),

    /// The state or configuration handed to a hook is malformed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// Build an application-level error from a vendor code and message.
    pub fn api(code: Option<String>, message: impl Into<String>) -> Self {
        Self::Api {
            code,
            message: message.into(),
        }
    }

    /// Get the error message as a string.
    pub fn message(&self) -> &str {
        match self {
            Self::Api { message, .. } => message,
            Self::Http(_err) => "transport error (see Debug output)",
            Self::Serialization(_err) => "serialization error (see Debug output)",
            Self::NotFound(msg) => msg,
            Self::Validation(msg) => msg,
            Self::Configuration(msg) => msg,
            Self::UnknownResource(msg) => msg,
            Self::Unimplemented(msg) => msg,
            Self::InvalidRequest(msg) => msg,
        }
    }

    /// The vendor error code, for application-level failures.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Whether this error reports a missing object on the management server.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Api { code, .. } => code.as_deref() == Some(crate::client::OBJECT_NOT_FOUND_CODE),
            _ => false,
        }
    }
}
