//! Error types for the Snyk provider.

use thiserror::Error;

use crate::schema::Diagnostic;

/// Errors that can occur while talking to the Snyk API or handling a resource.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested resource was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A local validation check failed before any API call was made.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The client or provider configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A JSON body could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The HTTP request could not be completed.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a status code other than the one the operation expects.
    #[error("invalid status code: {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code returned by the API.
        status: u16,
        /// Raw response body, empty if none could be read.
        body: String,
    },

    /// Operation not supported by the remote API.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),

    /// Invalid request from the host.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// Get the error message as a string.
    pub fn message(&self) -> String {
        match self {
            Self::NotFound(msg)
            | Self::Validation(msg)
            | Self::Configuration(msg)
            | Self::UnknownResource(msg)
            | Self::Unimplemented(msg)
            | Self::InvalidRequest(msg) => msg.clone(),
            Self::Serialization(err) => err.to_string(),
            Self::Transport(err) => err.to_string(),
            Self::UnexpectedStatus { status, body } if body.is_empty() => {
                format!("invalid status code: {}", status)
            }
            Self::UnexpectedStatus { status, body } => {
                format!("invalid status code: {}: {}", status, body)
            }
        }
    }

    /// Returns `true` if the remote object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::UnexpectedStatus { status: 404, .. }
        )
    }

    /// Build an error diagnostic with the given summary and this error as detail.
    pub fn to_diagnostic(&self, summary: impl Into<String>) -> Diagnostic {
        Diagnostic::error(summary).with_detail(self.message())
    }
}

impl From<ProviderError> for Diagnostic {
    fn from(err: ProviderError) -> Self {
        let summary = match &err {
            ProviderError::Validation(_) | ProviderError::Configuration(_) => {
                "Configuration Error"
            }
            _ => "Client Error",
        };
        err.to_diagnostic(summary)
    }
}
