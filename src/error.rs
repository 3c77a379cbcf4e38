//! Gateway error taxonomy.
//!
//! Retryable transport and server conditions are retried inside the gateway
//! clients (see `graph`); everything that reaches a caller is either a typed
//! outcome value or one of these variants.

use thiserror::Error;

/// Errors surfaced by the directory, calendar, and oracle gateways.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Request timed out")]
    Timeout,
}

impl GatewayError {
    /// Returns true if the underlying condition is worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Http(err) => err.is_timeout() || err.is_connect(),
            GatewayError::Api { status, .. } => {
                *status == 408 || *status == 429 || *status >= 500
            }
            GatewayError::Timeout => true,
            GatewayError::Auth(_) | GatewayError::Decode(_) => false,
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Decode(err.to_string())
    }
}
