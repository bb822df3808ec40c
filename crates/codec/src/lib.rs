//! JSON message codec for the realtime protocol.
//!
//! Every frame is a JSON object whose `type` field names its shape. Decoding
//! happens in two phases: the tag is peeked without touching the rest of the
//! body, then the body is decoded into the shape registered for that tag.
//! Tags with no registration fall back to the registry's error shape, since
//! the server reports failures under tags a client may not know about.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod message;
mod registry;

use std::sync::Arc;

use bytes::Bytes;
use serde::Deserialize;
use tracing::debug;

pub use error::{DecodeError, EncodeError, RegistryError};
pub use message::{InboundMessage, OutboundMessage, Tagged};
pub use registry::{Factory, Registry, RegistryBuilder};

/// Just enough of a frame to route it.
#[derive(Deserialize)]
struct Peek {
    #[serde(rename = "type")]
    tag: Option<String>,
    error: Option<serde_json::Value>,
}

impl Peek {
    fn correlation_id(&self) -> Option<String> {
        self.error
            .as_ref()
            .and_then(|error| error.get("event_id"))
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
    }
}

/// Decoder/encoder bound to a registry of inbound shapes.
pub struct Codec<P> {
    registry: Arc<Registry<P>>,
}

impl<P> Codec<P> {
    /// Create a codec over `registry`.
    pub const fn new(registry: Arc<Registry<P>>) -> Self {
        Self { registry }
    }

    /// The registry used for decoding.
    pub const fn registry(&self) -> &Arc<Registry<P>> {
        &self.registry
    }

    /// Decode a text frame into a typed payload.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::Malformed`] if the frame is not a JSON object
    /// - [`DecodeError::MissingTag`] if it has no `type`
    /// - [`DecodeError::Invalid`] if the body does not fit the registered shape
    /// - [`DecodeError::UnknownTag`] if the tag is unknown and the body is not
    ///   an error either
    pub fn decode(&self, bytes: &[u8]) -> Result<P, DecodeError> {
        let peek: Peek = serde_json::from_slice(bytes).map_err(DecodeError::Malformed)?;
        let tag = peek.tag.clone().ok_or(DecodeError::MissingTag)?;

        if let Some(factory) = self.registry.factory(&tag) {
            return factory.decode(bytes).map_err(|source| DecodeError::Invalid {
                correlation_id: peek.correlation_id(),
                tag,
                source,
            });
        }

        let fallback = self
            .registry
            .error_factory()
            .and_then(|factory| factory.decode(bytes).ok());

        match fallback {
            Some(payload) => {
                debug!("Decoded unregistered tag '{}' as an error message", tag);
                Ok(payload)
            }
            None => Err(DecodeError::UnknownTag { tag }),
        }
    }

    /// Serialize an outbound payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized.
    pub fn encode<M: OutboundMessage + ?Sized>(&self, message: &M) -> Result<Bytes, EncodeError> {
        encode(message)
    }
}

impl<P> Clone for Codec<P> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }
}

impl<P> std::fmt::Debug for Codec<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec")
            .field("registry", &self.registry)
            .finish()
    }
}

/// Serialize an outbound payload without a codec.
///
/// # Errors
///
/// Returns an error if the payload cannot be serialized.
pub fn encode<M: OutboundMessage + ?Sized>(message: &M) -> Result<Bytes, EncodeError> {
    serde_json::to_vec(message)
        .map(Bytes::from)
        .map_err(|source| EncodeError {
            tag: message.tag(),
            source,
        })
}
