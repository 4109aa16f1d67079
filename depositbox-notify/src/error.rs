//! Error types for webhook notifications

use thiserror::Error;

/// Result type for notification operations
pub type Result<T> = std::result::Result<T, Error>;

/// Notification errors
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP client error (connect, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("Webhook returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Invalid header name or value in configuration
    #[error("Invalid header '{0}'")]
    InvalidHeader(String),

    /// No tokio runtime to submit requests on
    #[error("Runtime unavailable: {0}")]
    Runtime(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

