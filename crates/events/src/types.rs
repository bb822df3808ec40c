//! Value objects shared by client and server events.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// Output modality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// Text output
    Text,
    /// Audio output
    Audio,
    /// A modality this client does not know yet
    #[serde(untagged)]
    Other(String),
}

/// Audio encoding for input or output audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    /// 16-bit PCM, 24kHz, mono, little-endian
    Pcm16,
    /// G.711 mu-law
    G711Ulaw,
    /// G.711 A-law
    G711Alaw,
    /// An encoding this client does not know yet
    #[serde(untagged)]
    Other(String),
}

/// Settings for transcribing input audio.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAudioTranscription {
    /// Transcription model, e.g. `whisper-1`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// ISO-639-1 language of the input audio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Text guiding the transcription
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// Kind of voice activity detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnDetectionType {
    /// Silence-based detection on the server
    ServerVad,
    /// Model-based end-of-turn detection
    SemanticVad,
    /// A detection mode this client does not know yet
    #[serde(untagged)]
    Other(String),
}

/// Voice activity detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnDetection {
    /// Detection mode
    #[serde(rename = "type")]
    pub kind: TurnDetectionType,
    /// Activation threshold between 0.0 and 1.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,
    /// Audio kept before detected speech
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_padding_ms: Option<u32>,
    /// Silence that ends a turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silence_duration_ms: Option<u32>,
    /// Whether a response starts automatically when a turn ends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_response: Option<bool>,
    /// Whether speech interrupts an in-progress response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interrupt_response: Option<bool>,
    /// Only used with semantic VAD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eagerness: Option<String>,
}

impl TurnDetection {
    /// Server-side VAD with the server's default thresholds.
    #[must_use]
    pub const fn server_vad() -> Self {
        Self {
            kind: TurnDetectionType::ServerVad,
            threshold: None,
            prefix_padding_ms: None,
            silence_duration_ms: None,
            create_response: None,
            interrupt_response: None,
            eagerness: None,
        }
    }
}

/// Microphone placement the noise filter is tuned for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseReductionType {
    /// Headsets and close-talking microphones
    NearField,
    /// Laptop or conference-room microphones
    FarField,
    /// A filter this client does not know yet
    #[serde(untagged)]
    Other(String),
}

/// Noise reduction applied to input audio before VAD and transcription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAudioNoiseReduction {
    /// Filter type
    #[serde(rename = "type")]
    pub kind: NoiseReductionType,
}

/// Kind of tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolType {
    /// A client-side function
    #[default]
    Function,
    /// A tool kind this client does not know yet
    #[serde(untagged)]
    Other(String),
}

/// A function the model may call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool kind
    #[serde(rename = "type", default)]
    pub kind: ToolType,
    /// Function name
    pub name: String,
    /// What the function does, shown to the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON schema of the arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

/// Tool selection mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoiceMode {
    /// The model decides
    Auto,
    /// No tools are called
    None,
    /// Some tool must be called
    Required,
    /// A mode this client does not know yet
    #[serde(untagged)]
    Other(String),
}

/// A tool choice naming one function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionToolChoice {
    /// Tool kind
    #[serde(rename = "type", default)]
    pub kind: ToolType,
    /// Function to call
    pub name: String,
}

/// How the model chooses tools: a mode, or one named function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolChoice {
    /// One of the named modes
    Mode(ToolChoiceMode),
    /// A specific function
    Function(FunctionToolChoice),
}

impl ToolChoice {
    /// Force a call to the named function.
    pub fn function(name: impl Into<String>) -> Self {
        Self::Function(FunctionToolChoice {
            kind: ToolType::Function,
            name: name.into(),
        })
    }
}

/// Output token limit. Serialized as a number or the string `"inf"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxTokens {
    /// At most this many tokens
    Limited(u32),
    /// The model's own maximum
    Infinite,
}

impl Serialize for MaxTokens {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Limited(n) => serializer.serialize_u32(*n),
            Self::Infinite => serializer.serialize_str("inf"),
        }
    }
}

impl<'de> Deserialize<'de> for MaxTokens {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MaxTokensVisitor;

        impl Visitor<'_> for MaxTokensVisitor {
            type Value = MaxTokens;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a token count or \"inf\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<MaxTokens, E> {
                u32::try_from(v)
                    .map(MaxTokens::Limited)
                    .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<MaxTokens, E> {
                u32::try_from(v)
                    .map(MaxTokens::Limited)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<MaxTokens, E> {
                if v == "inf" {
                    Ok(MaxTokens::Infinite)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }
        }

        deserializer.deserialize_any(MaxTokensVisitor)
    }
}

/// Session settings sent with `session.update`.
///
/// Unset fields are left out so the server keeps its current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientSession {
    /// Realtime model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Modalities the model may answer with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<Modality>>,
    /// System instructions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Voice used for audio output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    /// Encoding of input audio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_audio_format: Option<AudioFormat>,
    /// Encoding of output audio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_audio_format: Option<AudioFormat>,
    /// Transcription of input audio; `None` leaves it off
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<InputAudioTranscription>,
    /// Noise reduction of input audio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_audio_noise_reduction: Option<InputAudioNoiseReduction>,
    /// Voice activity detection; `None` leaves it off
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_detection: Option<TurnDetection>,
    /// Functions the model may call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// How the model picks tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Output token limit per response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_response_output_tokens: Option<MaxTokens>,
}

/// Session state reported by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSession {
    /// Server-assigned id
    pub id: String,
    /// Object kind reported by the server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    /// Realtime model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Modalities the model may answer with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<Modality>>,
    /// System instructions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Voice used for audio output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    /// Encoding of input audio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_format: Option<AudioFormat>,
    /// Encoding of output audio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_audio_format: Option<AudioFormat>,
    /// Transcription of input audio; `None` leaves it off
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<InputAudioTranscription>,
    /// Voice activity detection; `None` leaves it off
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_detection: Option<TurnDetection>,
    /// Functions the model may call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// How the model picks tools
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Output token limit per response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_response_output_tokens: Option<MaxTokens>,
    /// Unix timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

/// Settings sent with `transcription_session.update`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientTranscriptionSession {
    /// Encoding of input audio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_audio_format: Option<AudioFormat>,
    /// Transcription of input audio; `None` leaves it off
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<InputAudioTranscription>,
    /// Noise reduction of input audio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_audio_noise_reduction: Option<InputAudioNoiseReduction>,
    /// Voice activity detection; `None` leaves it off
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_detection: Option<TurnDetection>,
    /// Extra fields to include in transcription results, e.g. logprobs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,
}

/// Transcription session state reported by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerTranscriptionSession {
    /// Server-assigned id
    pub id: String,
    /// Object kind reported by the server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    /// Encoding of input audio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_format: Option<AudioFormat>,
    /// Transcription of input audio; `None` leaves it off
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<InputAudioTranscription>,
    /// Voice activity detection; `None` leaves it off
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_detection: Option<TurnDetection>,
    /// Unix time the session expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

/// A conversation as reported by `conversation.created`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conversation {
    /// Server-assigned id
    pub id: String,
    /// Object kind reported by the server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
}

/// Kind of conversation item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// A message from a role
    Message,
    /// A function call made by the model
    FunctionCall,
    /// The result of a function call
    FunctionCallOutput,
    /// An item kind this client does not know yet
    #[serde(untagged)]
    Other(String),
}

/// Progress of a conversation item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Finished
    Completed,
    /// Still being produced
    InProgress,
    /// Cut short
    Incomplete,
    /// A status this client does not know yet
    #[serde(untagged)]
    Other(String),
}

/// Author of a message item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions
    System,
    /// The user
    User,
    /// The model
    Assistant,
    /// A role this client does not know yet
    #[serde(untagged)]
    Other(String),
}

/// Kind of content part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Text from the user
    InputText,
    /// Audio from the user
    InputAudio,
    /// Reference to another item
    ItemReference,
    /// Text from the model
    Text,
    /// Audio from the model
    Audio,
    /// A content kind this client does not know yet
    #[serde(untagged)]
    Other(String),
}

/// One part of a message item's content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentPart {
    /// Type tag
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ContentType>,
    /// Text content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Base64 audio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    /// Transcript of audio content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    /// Referenced item, for `item_reference` parts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ContentPart {
    /// User text input.
    pub fn input_text(text: impl Into<String>) -> Self {
        Self {
            kind: Some(ContentType::InputText),
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Assistant text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: Some(ContentType::Text),
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

/// A conversation item: a message, a function call, or a function call output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    /// Server-assigned id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Object kind reported by the server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    /// Type tag
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ItemType>,
    /// Processing status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
    /// Author of a message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<MessageRole>,
    /// Message content
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<ContentPart>,
    /// Id of the function call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    /// Function name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Function call arguments as JSON text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
    /// Function output, or the items a response produced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl Item {
    /// A message item from `role` with the given content.
    #[must_use]
    pub fn message(role: MessageRole, content: Vec<ContentPart>) -> Self {
        Self {
            kind: Some(ItemType::Message),
            role: Some(role),
            content,
            ..Self::default()
        }
    }

    /// The result of a function call, sent back to the model.
    pub fn function_call_output(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            kind: Some(ItemType::FunctionCallOutput),
            call_id: Some(call_id.into()),
            output: Some(output.into()),
            ..Self::default()
        }
    }
}

/// Overrides for a single response, sent with `response.create`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseConfig {
    /// Modalities the model may answer with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<Modality>>,
    /// System instructions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Voice used for audio output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    /// Encoding of output audio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_audio_format: Option<AudioFormat>,
    /// Functions the model may call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// How the model picks tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Output token limit per response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_response_output_tokens: Option<MaxTokens>,
    /// `"auto"` or `"none"`; `"none"` creates an out-of-band response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<String>,
    /// Caller-supplied key/value metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    /// Items used as the response input instead of the conversation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Vec<Item>>,
}

/// Progress of a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    /// Still being produced
    InProgress,
    /// Finished normally
    Completed,
    /// Cancelled by the client or by new speech
    Cancelled,
    /// Ended by an error
    Failed,
    /// Cut short, e.g. by the token limit
    Incomplete,
    /// A status this client does not know yet
    #[serde(untagged)]
    Other(String),
}

/// Detail on how a response ended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseStatusDetails {
    /// Type tag
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Reason for an incomplete or cancelled response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Error of a failed response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

/// Breakdown of input tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputTokenDetails {
    /// Input tokens served from cache
    pub cached_tokens: u32,
    /// Text tokens
    pub text_tokens: u32,
    /// Audio tokens
    pub audio_tokens: u32,
}

/// Breakdown of output tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputTokenDetails {
    /// Text tokens
    pub text_tokens: u32,
    /// Audio tokens
    pub audio_tokens: u32,
}

/// Token accounting for a finished response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Usage {
    /// Input plus output tokens
    pub total_tokens: u32,
    /// Input tokens
    pub input_tokens: u32,
    /// Output tokens
    pub output_tokens: u32,
    /// Input token breakdown
    pub input_token_details: InputTokenDetails,
    /// Output token breakdown
    pub output_token_details: OutputTokenDetails,
}

/// A model response as reported by `response.created` and `response.done`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Response {
    /// Server-assigned id
    pub id: String,
    /// Object kind reported by the server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    /// Processing status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ResponseStatus>,
    /// Why the response ended as it did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_details: Option<ResponseStatusDetails>,
    /// Function output, or the items a response produced
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub output: Vec<Item>,
    /// Token usage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// Conversation the response belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// Caller-supplied key/value metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Error body carried by `error` events and failed transcriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorDetail {
    /// Type tag
    #[serde(rename = "type")]
    pub kind: String,
    /// Machine-readable error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Human-readable message
    pub message: String,
    /// Request parameter the error relates to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    /// Client event id that caused the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({}): {}", self.kind, code, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// Current state of one rate limit bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimit {
    /// `requests` or `tokens`
    pub name: String,
    /// Maximum allowed
    pub limit: u64,
    /// Left before the limit is hit
    pub remaining: u64,
    /// Seconds until the bucket resets
    pub reset_seconds: f64,
}

/// Log probability of one transcribed token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogProb {
    /// The token
    pub token: String,
    /// Natural log probability
    pub logprob: f64,
    /// UTF-8 bytes of the token
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_tokens_forms() {
        assert_eq!(serde_json::to_string(&MaxTokens::Limited(512)).unwrap(), "512");
        assert_eq!(serde_json::to_string(&MaxTokens::Infinite).unwrap(), "\"inf\"");

        let limited: MaxTokens = serde_json::from_str("4096").unwrap();
        assert_eq!(limited, MaxTokens::Limited(4096));
        let infinite: MaxTokens = serde_json::from_str("\"inf\"").unwrap();
        assert_eq!(infinite, MaxTokens::Infinite);

        assert!(serde_json::from_str::<MaxTokens>("\"lots\"").is_err());
        assert!(serde_json::from_str::<MaxTokens>("-1").is_err());
    }

    #[test]
    fn test_tool_choice_forms() {
        let auto: ToolChoice = serde_json::from_str("\"auto\"").unwrap();
        assert_eq!(auto, ToolChoice::Mode(ToolChoiceMode::Auto));

        let function = ToolChoice::function("lookup");
        let json = serde_json::to_value(&function).unwrap();
        assert_eq!(json, serde_json::json!({"type": "function", "name": "lookup"}));
        assert_eq!(serde_json::from_value::<ToolChoice>(json).unwrap(), function);
    }

    #[test]
    fn test_client_session_skips_unset_fields() {
        let session = ClientSession {
            model: Some("gpt-4o-realtime-preview".to_string()),
            ..ClientSession::default()
        };

        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json, serde_json::json!({"model": "gpt-4o-realtime-preview"}));
    }

    #[test]
    fn test_server_session_accepts_sparse_body() {
        let session: ServerSession = serde_json::from_str(r#"{"id":"sess_1"}"#).unwrap();
        assert_eq!(session.id, "sess_1");
        assert!(session.model.is_none());
    }

    #[test]
    fn test_unknown_enum_values_are_kept() {
        let item: Item =
            serde_json::from_str(r#"{"type":"mcp_call","status":"searching","role":"tool"}"#)
                .unwrap();
        assert_eq!(item.kind, Some(ItemType::Other("mcp_call".to_string())));
        assert_eq!(item.status, Some(ItemStatus::Other("searching".to_string())));
        assert_eq!(item.role, Some(MessageRole::Other("tool".to_string())));

        // Unknown values serialize back unchanged
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "mcp_call", "status": "searching", "role": "tool"})
        );

        let session: ServerSession = serde_json::from_str(
            r#"{"id":"sess_1","modalities":["text","video"],"output_audio_format":"opus"}"#,
        )
        .unwrap();
        assert_eq!(
            session.modalities,
            Some(vec![Modality::Text, Modality::Other("video".to_string())])
        );
        assert_eq!(
            session.output_audio_format,
            Some(AudioFormat::Other("opus".to_string()))
        );

        let choice: ToolChoice = serde_json::from_str("\"sometimes\"").unwrap();
        assert_eq!(
            choice,
            ToolChoice::Mode(ToolChoiceMode::Other("sometimes".to_string()))
        );
    }

    #[test]
    fn test_known_enum_values_keep_their_variant() {
        let status: ResponseStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, ResponseStatus::InProgress);
        assert_eq!(serde_json::to_string(&AudioFormat::G711Ulaw).unwrap(), "\"g711_ulaw\"");
    }

    #[test]
    fn test_error_detail_display() {
        let detail = ErrorDetail {
            kind: "invalid_request_error".to_string(),
            code: Some("missing_field".to_string()),
            message: "session is required".to_string(),
            ..ErrorDetail::default()
        };
        assert_eq!(
            detail.to_string(),
            "invalid_request_error (missing_field): session is required"
        );
    }
}
