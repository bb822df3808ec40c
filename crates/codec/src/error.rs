//! Error types for the codec.

use thiserror::Error;

/// Failure to turn a text frame into a typed payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The frame is not a JSON object.
    #[error("Malformed message: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The object has no string `type` field.
    #[error("Message has no type tag")]
    MissingTag,

    /// The tag is registered but the body does not fit its shape.
    #[error("Invalid '{tag}' message: {source}")]
    Invalid {
        /// Tag read from the frame.
        tag: String,
        /// Client event id the message refers to, when one could be read.
        correlation_id: Option<String>,
        /// The deserialization failure.
        #[source]
        source: serde_json::Error,
    },

    /// The tag is not registered and the body is not an error message either.
    #[error("Unknown message type '{tag}'")]
    UnknownTag {
        /// Tag read from the frame.
        tag: String,
    },
}

impl DecodeError {
    /// The tag read from the frame, if decoding got that far.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Invalid { tag, .. } | Self::UnknownTag { tag } => Some(tag),
            Self::Malformed(_) | Self::MissingTag => None,
        }
    }

    /// Client event id the failed message refers to.
    #[must_use]
    pub fn correlation_id(&self) -> Option<&str> {
        match self {
            Self::Invalid { correlation_id, .. } => correlation_id.as_deref(),
            _ => None,
        }
    }
}

/// Failure to serialize an outbound payload.
#[derive(Debug, Error)]
#[error("Failed to serialize '{tag}' message: {source}")]
pub struct EncodeError {
    /// Tag of the payload that failed.
    pub tag: &'static str,
    /// The serialization failure.
    #[source]
    pub source: serde_json::Error,
}

/// Registry construction errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A second factory was registered for a tag.
    #[error("Tag '{0}' is already registered")]
    DuplicateTag(&'static str),

    /// A second shape was designated as the error shape.
    #[error("Error shape already set to '{existing}', cannot also use '{requested}'")]
    ErrorShapeAlreadySet {
        /// Tag of the shape set first.
        existing: &'static str,
        /// Tag of the rejected shape.
        requested: &'static str,
    },
}
