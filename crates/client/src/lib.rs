//! Client for the realtime voice API.
//!
//! [`Client::connect`] dials the WebSocket endpoint and returns a [`Conn`]
//! with one send method per client event. Server events are consumed either
//! with [`Conn::read_message`] or by a [`Driver`] that dispatches them to
//! observers.
//!
//! ```no_run
//! # async fn run() -> realtime_client::Result<()> {
//! use realtime_client::{Client, ClientConfig, ConnectOptions, DriverConfig};
//! use realtime_client::events::ClientSession;
//! use realtime_client::events::client::SessionUpdateEvent;
//! use tokio_util::sync::CancellationToken;
//!
//! let client = Client::new(ClientConfig::new("sk-..."))?;
//! let conn = client.connect(ConnectOptions::default()).await?;
//! let token = CancellationToken::new();
//!
//! let driver = conn.driver(DriverConfig::default())?;
//! driver.start()?;
//!
//! conn.send_session_update(
//!     &token,
//!     SessionUpdateEvent {
//!         event_id: None,
//!         session: ClientSession {
//!             instructions: Some("Answer briefly.".to_string()),
//!             ..ClientSession::default()
//!         },
//!     },
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod client;
mod config;
mod conn;
mod error;

pub use client::{
    Client, ClientSecret, SessionRequest, SessionResponse, TranscriptionSessionRequest,
    TranscriptionSessionResponse,
};
pub use config::{
    AZURE_API_VERSION, ApiType, ClientConfig, ConnectOptions, DEFAULT_MODEL, OPENAI_API_URL,
    OPENAI_REALTIME_URL,
};
pub use conn::Conn;
pub use error::{Error, Result};
pub use realtime_connection::{
    BoxError, Driver, DriverConfig, DriverStats, Exit, Observer, State, observer_fn,
};
pub use realtime_events as events;
