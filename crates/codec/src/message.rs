//! Traits implemented by payload types.

use serde::Serialize;

/// A payload received from the server.
pub trait InboundMessage: Send + Sync + 'static {
    /// The wire tag of this payload.
    fn tag(&self) -> &'static str;

    /// Server-assigned event id.
    fn event_id(&self) -> Option<&str>;

    /// Id of the client event this payload answers, if any.
    fn correlation_id(&self) -> Option<&str> {
        None
    }
}

/// A payload sent to the server.
///
/// The serialized form must carry its own `type` field.
pub trait OutboundMessage: Serialize + Send + Sync {
    /// The wire tag of this payload.
    fn tag(&self) -> &'static str;

    /// Client-assigned event id.
    fn event_id(&self) -> Option<&str> {
        None
    }
}

/// A concrete shape with a fixed tag.
pub trait Tagged {
    /// The wire tag.
    const TAG: &'static str;
}
