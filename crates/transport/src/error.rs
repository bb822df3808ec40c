//! Error types for transports

use std::io;

use thiserror::Error;

/// Transport operation errors
///
/// The variants double as structured markers: the connection layer decides
/// whether a read loop keeps going, stops quietly or fails based on which
/// variant a transport reports.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection was closed, either locally or by a normal close
    /// handshake from the peer
    #[error("Connection closed")]
    Closed,

    /// The peer reset the connection without a close handshake
    #[error("Connection reset by peer")]
    Reset,

    /// A receive or send did not complete within the configured interval
    #[error("Operation timed out")]
    Timeout,

    /// The caller's cancellation token fired while waiting
    #[error("Operation cancelled")]
    Cancelled,

    /// A failure the transport knows to be final for this connection
    #[error("Permanent transport failure: {0}")]
    Permanent(String),

    /// The remote API rejected the connection
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status returned by the server
        status: u16,
        /// Body or reason supplied with the rejection
        message: String,
    },

    /// Establishing the connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The address could not be used
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Underlying I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Anything the transport could not describe more precisely
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Whether the error carries a marker that already encodes a final
    /// decision (permanent failure or API rejection)
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent(_) | Self::Api { .. })
    }
}
