//! Error types for appliance API operations

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur while talking to the appliance log API
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network/DNS/TLS failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Invalid appliance host or URL
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error (test server setup, socket binding)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unparseable response or missing expected field
    #[error("malformed response: {0}")]
    Protocol(String),

    /// Explicit error status reported by the appliance
    #[error("API error: {0}")]
    Api(String),

    /// Fetch initiation response carried no job identifier
    #[error("fetch initiation failed: response contained no job id")]
    MissingJobId,

    /// Keygen response carried no API key
    #[error("login failed: keygen response contained no API key")]
    MissingKey,
}

impl From<quick_xml::Error> for ClientError {
    fn from(err: quick_xml::Error) -> Self {
        ClientError::Protocol(err.to_string())
    }
}
