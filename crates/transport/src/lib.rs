//! Generic transport abstraction for the realtime client
//!
//! This crate provides a transport-agnostic interface for a persistent,
//! frame-based duplex connection. Specific transport implementations
//! (WebSocket, in-memory) are provided in separate crates.
//!
//! Transports handle:
//! - Framing translation between the socket and [`Frame`]
//! - Internal synchronisation so one reader and many writers can share them
//! - Honouring cancellation tokens and receive timeouts

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
mod wait;

use std::fmt::{self, Debug};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;

pub use error::TransportError;
pub use error::TransportError as Error;
pub use wait::guarded;

/// Kind of a frame on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// UTF-8 text frame; the only kind carrying protocol messages
    Text,
    /// Opaque binary frame
    Binary,
    /// Close frame
    Close,
    /// Ping control frame
    Ping,
    /// Pong control frame
    Pong,
}

impl FrameKind {
    /// Lowercase name used in logs and errors
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Binary => "binary",
            Self::Close => "close",
            Self::Ping => "ping",
            Self::Pong => "pong",
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single unit of wire transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// What kind of frame this is
    pub kind: FrameKind,
    /// Raw payload
    pub payload: Bytes,
}

impl Frame {
    /// Create a frame of the given kind
    pub fn new(kind: FrameKind, payload: impl Into<Bytes>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// Create a text frame
    pub fn text(payload: impl Into<Bytes>) -> Self {
        Self::new(FrameKind::Text, payload)
    }

    /// Create a binary frame
    pub fn binary(payload: impl Into<Bytes>) -> Self {
        Self::new(FrameKind::Binary, payload)
    }

    /// Whether this frame may carry a protocol message
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.kind == FrameKind::Text
    }
}

/// Capability set the connection layer requires from the network
///
/// Implementations must tolerate one task calling [`Transport::receive`]
/// while any number of other tasks call [`Transport::send`] or
/// [`Transport::heartbeat`], without the caller adding locks. Every waiting
/// operation returns [`TransportError::Cancelled`] promptly once its token
/// fires.
#[async_trait]
pub trait Transport: Debug + Send + Sync + 'static {
    /// Send a single frame
    async fn send(&self, frame: Frame, token: &CancellationToken) -> Result<(), TransportError>;

    /// Wait for the next frame
    ///
    /// Returns [`TransportError::Timeout`] if the configured receive timeout
    /// elapses first.
    async fn receive(&self, token: &CancellationToken) -> Result<Frame, TransportError>;

    /// Close the connection
    ///
    /// Closing twice is not an error.
    async fn close(&self) -> Result<(), TransportError>;

    /// Send a keep-alive ping
    async fn heartbeat(&self, token: &CancellationToken) -> Result<(), TransportError>;
}

/// Configuration for transports
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum time a single receive waits before reporting a timeout
    /// (`None` waits until a frame arrives or the token fires)
    pub receive_timeout: Option<Duration>,
    /// Maximum time a single send may take
    pub send_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            receive_timeout: None,
            send_timeout: Some(Duration::from_secs(10)),
        }
    }
}
