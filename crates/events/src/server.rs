//! Events sent by the server.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use realtime_codec::{InboundMessage, Tagged};
use serde::{Deserialize, Serialize};

use crate::types::{
    ContentPart, Conversation, ErrorDetail, Item, LogProb, RateLimit, Response, ServerSession,
    ServerTranscriptionSession,
};

/// The server reports a failure, usually caused by a client event.
///
/// This is also the shape unknown tags fall back to, so the `error` body is
/// required: a frame without one is not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEvent {
    /// Server-assigned id of this event
    #[serde(default)]
    pub event_id: String,
    /// What went wrong
    pub error: ErrorDetail,
}

/// First event of every connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionCreatedEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// Session state
    pub session: ServerSession,
}

/// The session configuration changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionUpdatedEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// Session state
    pub session: ServerSession,
}

/// The transcription session configuration changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSessionUpdatedEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// Session state
    pub session: ServerTranscriptionSession,
}

/// A conversation was created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationCreatedEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// The new conversation
    pub conversation: Conversation,
}

/// An item was added to the conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationItemCreatedEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// Item this one follows; `None` for the first item
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_item_id: Option<String>,
    /// The item
    pub item: Item,
}

/// An item requested by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationItemRetrievedEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// The item
    pub item: Item,
}

/// Transcription of a user audio item finished.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationItemInputAudioTranscriptionCompletedEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// Item the event refers to
    pub item_id: String,
    /// Content part within the item
    pub content_index: u32,
    /// Transcribed text
    pub transcript: String,
    /// Token log probabilities, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<Vec<LogProb>>,
}

/// Partial transcription of a user audio item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationItemInputAudioTranscriptionDeltaEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// Item the event refers to
    pub item_id: String,
    /// Content part within the item
    pub content_index: u32,
    /// Incremental text
    pub delta: String,
    /// Token log probabilities, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<Vec<LogProb>>,
}

/// Transcription of a user audio item failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationItemInputAudioTranscriptionFailedEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// Item the event refers to
    pub item_id: String,
    /// Content part within the item
    pub content_index: u32,
    /// What went wrong
    pub error: ErrorDetail,
}

/// An assistant audio item was cut short.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationItemTruncatedEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// Item the event refers to
    pub item_id: String,
    /// Content part within the item
    pub content_index: u32,
    /// Milliseconds of audio kept
    pub audio_end_ms: u32,
}

/// An item was removed from the conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationItemDeletedEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// Item the event refers to
    pub item_id: String,
}

/// The input buffer became a user message item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputAudioBufferCommittedEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// Item this one follows; `None` for the first item
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_item_id: Option<String>,
    /// Item the event refers to
    pub item_id: String,
}

/// The input buffer was emptied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputAudioBufferClearedEvent {
    /// Server-assigned id of this event
    pub event_id: String,
}

/// Server VAD detected the start of speech.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputAudioBufferSpeechStartedEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// Milliseconds since the session started
    pub audio_start_ms: u32,
    /// Item the event refers to
    pub item_id: String,
}

/// Server VAD detected the end of speech.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputAudioBufferSpeechStoppedEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// Milliseconds of audio kept
    pub audio_end_ms: u32,
    /// Item the event refers to
    pub item_id: String,
}

/// A response started.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseCreatedEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// The response
    pub response: Response,
}

/// A response finished, successfully or not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseDoneEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// The response
    pub response: Response,
}

/// A response produced a new item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseOutputItemAddedEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// Response the event belongs to
    pub response_id: String,
    /// Output item within the response
    pub output_index: u32,
    /// The item
    pub item: Item,
}

/// A response item is complete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseOutputItemDoneEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// Response the event belongs to
    pub response_id: String,
    /// Output item within the response
    pub output_index: u32,
    /// The item
    pub item: Item,
}

/// A content part was added to a response item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseContentPartAddedEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// Response the event belongs to
    pub response_id: String,
    /// Item the event refers to
    pub item_id: String,
    /// Output item within the response
    pub output_index: u32,
    /// Content part within the item
    pub content_index: u32,
    /// The content part
    pub part: ContentPart,
}

/// A response content part is complete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseContentPartDoneEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// Response the event belongs to
    pub response_id: String,
    /// Item the event refers to
    pub item_id: String,
    /// Output item within the response
    pub output_index: u32,
    /// Content part within the item
    pub content_index: u32,
    /// The content part
    pub part: ContentPart,
}

/// A chunk of response text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseTextDeltaEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// Response the event belongs to
    pub response_id: String,
    /// Item the event refers to
    pub item_id: String,
    /// Output item within the response
    pub output_index: u32,
    /// Content part within the item
    pub content_index: u32,
    /// Incremental text
    pub delta: String,
}

/// Response text is complete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseTextDoneEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// Response the event belongs to
    pub response_id: String,
    /// Item the event refers to
    pub item_id: String,
    /// Output item within the response
    pub output_index: u32,
    /// Content part within the item
    pub content_index: u32,
    /// Final text
    pub text: String,
}

/// A chunk of the transcript of response audio.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseAudioTranscriptDeltaEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// Response the event belongs to
    pub response_id: String,
    /// Item the event refers to
    pub item_id: String,
    /// Output item within the response
    pub output_index: u32,
    /// Content part within the item
    pub content_index: u32,
    /// Incremental text
    pub delta: String,
}

/// The transcript of response audio is complete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseAudioTranscriptDoneEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// Response the event belongs to
    pub response_id: String,
    /// Item the event refers to
    pub item_id: String,
    /// Output item within the response
    pub output_index: u32,
    /// Content part within the item
    pub content_index: u32,
    /// Transcribed text
    pub transcript: String,
}

/// A chunk of model audio, base64 encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseAudioDeltaEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// Response the event belongs to
    pub response_id: String,
    /// Item the event refers to
    pub item_id: String,
    /// Output item within the response
    pub output_index: u32,
    /// Content part within the item
    pub content_index: u32,
    /// Base64 audio bytes
    pub delta: String,
}

impl ResponseAudioDeltaEvent {
    /// Decode the audio chunk.
    ///
    /// # Errors
    ///
    /// Returns an error if `delta` is not valid base64.
    pub fn pcm(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.delta)
    }
}

/// Response audio is complete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseAudioDoneEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// Response the event belongs to
    pub response_id: String,
    /// Item the event refers to
    pub item_id: String,
    /// Output item within the response
    pub output_index: u32,
    /// Content part within the item
    pub content_index: u32,
}

/// A chunk of function call arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseFunctionCallArgumentsDeltaEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// Response the event belongs to
    pub response_id: String,
    /// Item the event refers to
    pub item_id: String,
    /// Output item within the response
    pub output_index: u32,
    /// Id of the function call
    pub call_id: String,
    /// Next slice of the JSON arguments
    pub delta: String,
}

/// Function call arguments are complete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseFunctionCallArgumentsDoneEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// Response the event belongs to
    pub response_id: String,
    /// Item the event refers to
    pub item_id: String,
    /// Output item within the response
    pub output_index: u32,
    /// Id of the function call
    pub call_id: String,
    /// Function name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Complete arguments as a JSON string
    pub arguments: String,
}

/// Rate limits after a response was created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitsUpdatedEvent {
    /// Server-assigned id of this event
    pub event_id: String,
    /// Current state of every bucket
    pub rate_limits: Vec<RateLimit>,
}

macro_rules! server_events {
    ($($variant:ident($event:ident) => $tag:literal,)+) => {
        /// Every payload the server can send.
        ///
        /// Serializes with its `type` tag, so a mock server can write these
        /// straight to the wire.
        #[derive(Debug, Clone, PartialEq, Serialize)]
        #[serde(tag = "type")]
        pub enum ServerEvent {
            $(
                #[doc = concat!("`", $tag, "`")]
                #[serde(rename = $tag)]
                $variant($event),
            )+
        }

        /// Tags of every server event.
        pub const SERVER_EVENT_TAGS: &[&str] = &[$($tag),+];

        $(
            impl Tagged for $event {
                const TAG: &'static str = $tag;
            }

            impl From<$event> for ServerEvent {
                fn from(event: $event) -> Self {
                    Self::$variant(event)
                }
            }
        )+

        impl ServerEvent {
            fn raw_event_id(&self) -> &str {
                match self {
                    $(Self::$variant(event) => &event.event_id,)+
                }
            }

            /// Register every server event with `builder`, skipping the tag
            /// already taken by the error shape.
            pub(crate) fn register_all(
                builder: &mut realtime_codec::RegistryBuilder<Self>,
            ) -> Result<(), realtime_codec::RegistryError> {
                $(
                    if <$event as Tagged>::TAG != ErrorEvent::TAG {
                        builder.register_type::<$event>()?;
                    }
                )+
                Ok(())
            }
        }

        impl InboundMessage for ServerEvent {
            fn tag(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => $tag,)+
                }
            }

            fn event_id(&self) -> Option<&str> {
                Some(self.raw_event_id()).filter(|id| !id.is_empty())
            }

            fn correlation_id(&self) -> Option<&str> {
                match self {
                    Self::Error(event) => event.error.event_id.as_deref(),
                    _ => None,
                }
            }
        }
    };
}

server_events! {
    Error(ErrorEvent) => "error",
    SessionCreated(SessionCreatedEvent) => "session.created",
    SessionUpdated(SessionUpdatedEvent) => "session.updated",
    TranscriptionSessionUpdated(TranscriptionSessionUpdatedEvent) => "transcription_session.updated",
    ConversationCreated(ConversationCreatedEvent) => "conversation.created",
    ConversationItemCreated(ConversationItemCreatedEvent) => "conversation.item.created",
    ConversationItemRetrieved(ConversationItemRetrievedEvent) => "conversation.item.retrieved",
    ConversationItemInputAudioTranscriptionCompleted(ConversationItemInputAudioTranscriptionCompletedEvent)
        => "conversation.item.input_audio_transcription.completed",
    ConversationItemInputAudioTranscriptionDelta(ConversationItemInputAudioTranscriptionDeltaEvent)
        => "conversation.item.input_audio_transcription.delta",
    ConversationItemInputAudioTranscriptionFailed(ConversationItemInputAudioTranscriptionFailedEvent)
        => "conversation.item.input_audio_transcription.failed",
    ConversationItemTruncated(ConversationItemTruncatedEvent) => "conversation.item.truncated",
    ConversationItemDeleted(ConversationItemDeletedEvent) => "conversation.item.deleted",
    InputAudioBufferCommitted(InputAudioBufferCommittedEvent) => "input_audio_buffer.committed",
    InputAudioBufferCleared(InputAudioBufferClearedEvent) => "input_audio_buffer.cleared",
    InputAudioBufferSpeechStarted(InputAudioBufferSpeechStartedEvent) => "input_audio_buffer.speech_started",
    InputAudioBufferSpeechStopped(InputAudioBufferSpeechStoppedEvent) => "input_audio_buffer.speech_stopped",
    ResponseCreated(ResponseCreatedEvent) => "response.created",
    ResponseDone(ResponseDoneEvent) => "response.done",
    ResponseOutputItemAdded(ResponseOutputItemAddedEvent) => "response.output_item.added",
    ResponseOutputItemDone(ResponseOutputItemDoneEvent) => "response.output_item.done",
    ResponseContentPartAdded(ResponseContentPartAddedEvent) => "response.content_part.added",
    ResponseContentPartDone(ResponseContentPartDoneEvent) => "response.content_part.done",
    ResponseTextDelta(ResponseTextDeltaEvent) => "response.text.delta",
    ResponseTextDone(ResponseTextDoneEvent) => "response.text.done",
    ResponseAudioTranscriptDelta(ResponseAudioTranscriptDeltaEvent) => "response.audio_transcript.delta",
    ResponseAudioTranscriptDone(ResponseAudioTranscriptDoneEvent) => "response.audio_transcript.done",
    ResponseAudioDelta(ResponseAudioDeltaEvent) => "response.audio.delta",
    ResponseAudioDone(ResponseAudioDoneEvent) => "response.audio.done",
    ResponseFunctionCallArgumentsDelta(ResponseFunctionCallArgumentsDeltaEvent)
        => "response.function_call_arguments.delta",
    ResponseFunctionCallArgumentsDone(ResponseFunctionCallArgumentsDoneEvent)
        => "response.function_call_arguments.done",
    RateLimitsUpdated(RateLimitsUpdatedEvent) => "rate_limits.updated",
}
