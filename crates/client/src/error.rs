use realtime_codec::RegistryError;
use realtime_transport::TransportError;
use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Client errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured URL could not be used.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The REST API answered with an error status.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status.
        status: u16,
        /// Error code from the body, if any.
        code: Option<String>,
        /// Error message from the body, or the raw body.
        message: String,
    },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A response body could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload registry could not be built.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Dialing the WebSocket failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A connection operation failed.
    #[error(transparent)]
    Connection(#[from] realtime_connection::Error),
}
