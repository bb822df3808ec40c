use std::sync::Arc;

use realtime_codec::{Codec, Registry};
use realtime_connection::Connection;
use realtime_events::{
    ClientSession, ClientTranscriptionSession, ErrorDetail, ServerEvent, ServerSession,
    ServerTranscriptionSession, registry,
};
use realtime_transport_ws::{WsOptions, WsTransport};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{ApiType, ClientConfig, ConnectOptions};
use crate::conn::Conn;
use crate::error::{Error, Result};

/// Body of `POST /realtime/sessions`.
pub type SessionRequest = ClientSession;

/// Body of `POST /realtime/transcription_sessions`.
pub type TranscriptionSessionRequest = ClientTranscriptionSession;

/// Ephemeral key a browser or device can connect with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSecret {
    /// The key itself
    pub value: String,
    /// Unix timestamp
    pub expires_at: i64,
}

/// A session created over REST.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResponse {
    /// The session as created
    #[serde(flatten)]
    pub session: ServerSession,
    /// Key for connecting to it
    pub client_secret: ClientSecret,
}

/// A transcription session created over REST.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionSessionResponse {
    /// The session as created
    #[serde(flatten)]
    pub session: ServerTranscriptionSession,
    /// Key for connecting to it
    pub client_secret: ClientSecret,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ErrorDetail,
}

/// Entry point: dials realtime connections and creates sessions over REST.
#[derive(Debug, Clone)]
pub struct Client {
    config: ClientConfig,
    http: reqwest::Client,
    registry: Arc<Registry<ServerEvent>>,
}

impl Client {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the event registry cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            config,
            http: reqwest::Client::new(),
            registry: Arc::new(registry()?),
        })
    }

    /// The client configuration.
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Open a realtime WebSocket connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the handshake fails.
    pub async fn connect(&self, options: ConnectOptions) -> Result<Conn> {
        let model = options
            .model
            .as_deref()
            .unwrap_or(&self.config.default_model);
        let url = self.config.realtime_url(model)?;

        let mut headers = self.config.auth_headers();
        headers.extend(options.headers);

        info!("Connecting to realtime API with model {}", model);

        let transport = WsTransport::connect(
            url.as_str(),
            WsOptions {
                transport: options.transport,
                headers,
            },
        )
        .await?;

        let codec = Codec::new(self.registry.clone());
        Ok(Conn::new(Connection::new(Arc::new(transport), codec)))
    }

    /// Create a realtime session and its ephemeral client secret.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] for error responses, or an HTTP or JSON error.
    pub async fn create_session(&self, request: &SessionRequest) -> Result<SessionResponse> {
        self.post("realtime/sessions", request).await
    }

    /// Create a transcription-only session and its ephemeral client secret.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] for error responses, or an HTTP or JSON error.
    pub async fn create_transcription_session(
        &self,
        request: &TranscriptionSessionRequest,
    ) -> Result<TranscriptionSessionResponse> {
        self.post("realtime/transcription_sessions", request).await
    }

    async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R> {
        let url = format!("{}/{}", self.config.api_base_url.trim_end_matches('/'), path);
        debug!("POST {}", url);

        let response = self.authorize(self.http.post(&url)).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(api_error(status.as_u16(), &text));
        }

        Ok(serde_json::from_str(&text)?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.api_type {
            ApiType::OpenAi => request
                .bearer_auth(&self.config.auth_token)
                .header("OpenAI-Beta", "realtime=v1"),
            ApiType::Azure => request.header("api-key", &self.config.auth_token),
        }
    }
}

fn api_error(status: u16, body: &str) -> Error {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody { error }) => Error::Api {
            status,
            code: error.code,
            message: error.message,
        },
        Err(_) => Error::Api {
            status,
            code: None,
            message: body.to_string(),
        },
    }
}
