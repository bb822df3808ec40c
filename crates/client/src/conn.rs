use realtime_connection::{Connection, Driver, DriverConfig};
use realtime_events::ClientEvent;
use realtime_events::ServerEvent;
use realtime_events::client::{
    ConversationItemCreateEvent, ConversationItemDeleteEvent, ConversationItemTruncateEvent,
    InputAudioBufferAppendEvent, InputAudioBufferClearEvent, InputAudioBufferCommitEvent,
    ResponseCancelEvent, ResponseCreateEvent, SessionUpdateEvent,
    TranscriptionSessionUpdateEvent,
};
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// A live realtime connection with one send method per client event.
#[derive(Debug, Clone)]
pub struct Conn {
    connection: Connection<ServerEvent>,
}

impl Conn {
    /// Wrap a generic connection.
    pub const fn new(connection: Connection<ServerEvent>) -> Self {
        Self { connection }
    }

    /// The underlying generic connection.
    pub const fn connection(&self) -> &Connection<ServerEvent> {
        &self.connection
    }

    /// Send any client event.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be encoded or sent.
    pub async fn send(&self, token: &CancellationToken, event: &ClientEvent) -> Result<()> {
        Ok(self.connection.send(token, event).await?)
    }

    async fn send_event(&self, token: &CancellationToken, event: impl Into<ClientEvent>) -> Result<()> {
        self.send(token, &event.into()).await
    }

    /// # Errors
    ///
    /// Returns an error if the event cannot be encoded or sent.
    pub async fn send_session_update(
        &self,
        token: &CancellationToken,
        event: SessionUpdateEvent,
    ) -> Result<()> {
        self.send_event(token, event).await
    }

    /// # Errors
    ///
    /// Returns an error if the event cannot be encoded or sent.
    pub async fn send_transcription_session_update(
        &self,
        token: &CancellationToken,
        event: TranscriptionSessionUpdateEvent,
    ) -> Result<()> {
        self.send_event(token, event).await
    }

    /// # Errors
    ///
    /// Returns an error if the event cannot be encoded or sent.
    pub async fn send_input_audio_buffer_append(
        &self,
        token: &CancellationToken,
        event: InputAudioBufferAppendEvent,
    ) -> Result<()> {
        self.send_event(token, event).await
    }

    /// # Errors
    ///
    /// Returns an error if the event cannot be encoded or sent.
    pub async fn send_input_audio_buffer_commit(
        &self,
        token: &CancellationToken,
        event: InputAudioBufferCommitEvent,
    ) -> Result<()> {
        self.send_event(token, event).await
    }

    /// # Errors
    ///
    /// Returns an error if the event cannot be encoded or sent.
    pub async fn send_input_audio_buffer_clear(
        &self,
        token: &CancellationToken,
        event: InputAudioBufferClearEvent,
    ) -> Result<()> {
        self.send_event(token, event).await
    }

    /// # Errors
    ///
    /// Returns an error if the event cannot be encoded or sent.
    pub async fn send_conversation_item_create(
        &self,
        token: &CancellationToken,
        event: ConversationItemCreateEvent,
    ) -> Result<()> {
        self.send_event(token, event).await
    }

    /// # Errors
    ///
    /// Returns an error if the event cannot be encoded or sent.
    pub async fn send_conversation_item_truncate(
        &self,
        token: &CancellationToken,
        event: ConversationItemTruncateEvent,
    ) -> Result<()> {
        self.send_event(token, event).await
    }

    /// # Errors
    ///
    /// Returns an error if the event cannot be encoded or sent.
    pub async fn send_conversation_item_delete(
        &self,
        token: &CancellationToken,
        event: ConversationItemDeleteEvent,
    ) -> Result<()> {
        self.send_event(token, event).await
    }

    /// # Errors
    ///
    /// Returns an error if the event cannot be encoded or sent.
    pub async fn send_response_create(
        &self,
        token: &CancellationToken,
        event: ResponseCreateEvent,
    ) -> Result<()> {
        self.send_event(token, event).await
    }

    /// # Errors
    ///
    /// Returns an error if the event cannot be encoded or sent.
    pub async fn send_response_cancel(
        &self,
        token: &CancellationToken,
        event: ResponseCancelEvent,
    ) -> Result<()> {
        self.send_event(token, event).await
    }

    /// Read the next server event directly.
    ///
    /// # Errors
    ///
    /// See [`Connection::read_message`].
    pub async fn read_message(&self, token: &CancellationToken) -> Result<ServerEvent> {
        Ok(self.connection.read_message(token).await?)
    }

    /// Send a WebSocket ping.
    ///
    /// # Errors
    ///
    /// Returns an error if the ping cannot be sent.
    pub async fn ping(&self, token: &CancellationToken) -> Result<()> {
        Ok(self.connection.ping(token).await?)
    }

    /// Close the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the close handshake fails.
    pub async fn close(&self) -> Result<()> {
        Ok(self.connection.close().await?)
    }

    /// Hand the read side to a driver.
    ///
    /// # Errors
    ///
    /// Returns an error if a driver was already created for this connection.
    pub fn driver(&self, config: DriverConfig) -> Result<Driver<ServerEvent>> {
        Ok(self.connection.driver(config)?)
    }
}
