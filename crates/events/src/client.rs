//! Events sent by the client.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use realtime_codec::{OutboundMessage, Tagged};
use serde::{Deserialize, Serialize};

use crate::types::{ClientSession, ClientTranscriptionSession, Item, ResponseConfig};

/// Update the session configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionUpdateEvent {
    /// Client-assigned id echoed in errors caused by this event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Settings to change
    pub session: ClientSession,
}

/// Update the transcription session configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionSessionUpdateEvent {
    /// Client-assigned id echoed in errors caused by this event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Settings to change
    pub session: ClientTranscriptionSession,
}

/// Append audio to the input buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAudioBufferAppendEvent {
    /// Client-assigned id echoed in errors caused by this event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Base64 audio in the session's input format
    pub audio: String,
}

impl InputAudioBufferAppendEvent {
    /// Build an append event from raw audio bytes.
    #[must_use]
    pub fn from_pcm(pcm: &[u8]) -> Self {
        Self {
            event_id: None,
            audio: STANDARD.encode(pcm),
        }
    }
}

/// Commit the input buffer as a user message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAudioBufferCommitEvent {
    /// Client-assigned id echoed in errors caused by this event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

/// Discard the input buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAudioBufferClearEvent {
    /// Client-assigned id echoed in errors caused by this event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

/// Add an item to the conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationItemCreateEvent {
    /// Client-assigned id echoed in errors caused by this event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Insert after this item; `None` appends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_item_id: Option<String>,
    /// The item to add
    pub item: Item,
}

/// Cut an assistant audio message short.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationItemTruncateEvent {
    /// Client-assigned id echoed in errors caused by this event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Item to act on
    pub item_id: String,
    /// Content part to truncate
    pub content_index: u32,
    /// Keep audio up to this point
    pub audio_end_ms: u32,
}

/// Remove an item from the conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationItemDeleteEvent {
    /// Client-assigned id echoed in errors caused by this event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Item to act on
    pub item_id: String,
}

/// Ask the model for a response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseCreateEvent {
    /// Client-assigned id echoed in errors caused by this event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Overrides for this response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseConfig>,
}

/// Cancel a response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseCancelEvent {
    /// Client-assigned id echoed in errors caused by this event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Response to cancel; `None` cancels the in-progress one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
}

macro_rules! client_events {
    ($($variant:ident($event:ident) => $tag:literal,)+) => {
        /// Every payload the client can send.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "type")]
        pub enum ClientEvent {
            $(
                #[doc = concat!("`", $tag, "`")]
                #[serde(rename = $tag)]
                $variant($event),
            )+
        }

        /// Tags of every client event.
        pub const CLIENT_EVENT_TAGS: &[&str] = &[$($tag),+];

        $(
            impl Tagged for $event {
                const TAG: &'static str = $tag;
            }

            impl From<$event> for ClientEvent {
                fn from(event: $event) -> Self {
                    Self::$variant(event)
                }
            }
        )+

        impl OutboundMessage for ClientEvent {
            fn tag(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => $tag,)+
                }
            }

            fn event_id(&self) -> Option<&str> {
                match self {
                    $(Self::$variant(event) => event.event_id.as_deref(),)+
                }
            }
        }
    };
}

client_events! {
    SessionUpdate(SessionUpdateEvent) => "session.update",
    TranscriptionSessionUpdate(TranscriptionSessionUpdateEvent) => "transcription_session.update",
    InputAudioBufferAppend(InputAudioBufferAppendEvent) => "input_audio_buffer.append",
    InputAudioBufferCommit(InputAudioBufferCommitEvent) => "input_audio_buffer.commit",
    InputAudioBufferClear(InputAudioBufferClearEvent) => "input_audio_buffer.clear",
    ConversationItemCreate(ConversationItemCreateEvent) => "conversation.item.create",
    ConversationItemTruncate(ConversationItemTruncateEvent) => "conversation.item.truncate",
    ConversationItemDelete(ConversationItemDeleteEvent) => "conversation.item.delete",
    ResponseCreate(ResponseCreateEvent) => "response.create",
    ResponseCancel(ResponseCancelEvent) => "response.cancel",
}
