//! Error types for Mazda client operations

use thiserror::Error;

/// Result type alias for Mazda client operations
pub type Result<T> = std::result::Result<T, MazdaError>;

/// Errors that can occur during Mazda client operations
#[derive(Error, Debug)]
pub enum MazdaError {
    /// Missing or invalid configuration (raised before any I/O)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required element of a vendor payload is absent or unparsable
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Caller-supplied input violates the expected shape
    #[error("Input contract violated: {0}")]
    InputContract(String),

    /// Login failed or the session was rejected
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Server returned a non-success HTTP status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Server answered but the vendor result code signals failure
    #[error("API error {code}: {message}")]
    ApiError { code: String, message: String },

    /// Timeout
    #[error("Request timed out")]
    Timeout,
}

impl MazdaError {
    /// Create a server error from status code and message
    pub fn server_error(status: u16, message: impl Into<String>) -> Self {
        Self::ServerError {
            status,
            message: message.into(),
        }
    }

    /// Create a malformed-response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }
}
