//! Error types for the connection layer.

use realtime_codec::{DecodeError, EncodeError};
use realtime_transport::{FrameKind, TransportError};
use thiserror::Error;

/// Result type alias for connection operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Connection errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The driver has already left the idle state.
    #[error("Driver already started")]
    AlreadyStarted,

    /// A driver owns the read side of this connection.
    #[error("Connection is being read by a driver")]
    ReaderInUse,

    /// A frame that cannot carry a message arrived.
    #[error("Unexpected {kind} frame")]
    UnexpectedFrame {
        /// Kind of the frame received.
        kind: FrameKind,
    },

    /// Transport failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The frame could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The message could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}
