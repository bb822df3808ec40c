//! Text conversation with the realtime API.
//!
//! ```sh
//! OPENAI_API_KEY=sk-... cargo run -p realtime-client --example conversation
//! ```

use std::io::Write;

use async_trait::async_trait;
use realtime_client::events::client::{
    ConversationItemCreateEvent, ResponseCreateEvent, SessionUpdateEvent,
};
use realtime_client::events::{
    ClientSession, ContentPart, Item, MessageRole, Modality, ServerEvent,
};
use realtime_client::{BoxError, Client, ClientConfig, ConnectOptions, DriverConfig, Observer};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Prints text deltas and reports finished responses.
struct Printer {
    done: mpsc::UnboundedSender<()>,
}

#[async_trait]
impl Observer<ServerEvent> for Printer {
    async fn observe(&self, _token: &CancellationToken, event: &ServerEvent) -> Result<(), BoxError> {
        match event {
            ServerEvent::SessionCreated(created) => {
                info!("Session {} created", created.session.id);
            }
            ServerEvent::ResponseTextDelta(delta) => {
                print!("{}", delta.delta);
                std::io::stdout().flush()?;
            }
            ServerEvent::ResponseDone(done) => {
                println!();
                info!("Response {} finished: {:?}", done.response.id, done.response.status);
                self.done.send(())?;
            }
            ServerEvent::Error(event) => {
                error!("Server error: {}", event.error);
            }
            _ => {}
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let api_key = std::env::var("OPENAI_API_KEY")?;
    let client = Client::new(ClientConfig::new(api_key))?;
    let conn = client.connect(ConnectOptions::default()).await?;
    let token = CancellationToken::new();

    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    let mut driver = conn.driver(DriverConfig::default())?;
    driver.add_observer(Printer { done: done_tx })?;
    driver.start()?;

    conn.send_session_update(
        &token,
        SessionUpdateEvent {
            event_id: None,
            session: ClientSession {
                modalities: Some(vec![Modality::Text]),
                instructions: Some("You are a concise assistant.".to_string()),
                ..ClientSession::default()
            },
        },
    )
    .await?;

    for question in ["What is the capital of France?", "And of Italy?"] {
        info!("> {}", question);

        conn.send_conversation_item_create(
            &token,
            ConversationItemCreateEvent {
                item: Item::message(MessageRole::User, vec![ContentPart::input_text(question)]),
                ..ConversationItemCreateEvent::default()
            },
        )
        .await?;
        conn.send_response_create(&token, ResponseCreateEvent::default())
            .await?;

        if done_rx.recv().await.is_none() {
            break;
        }
    }

    conn.close().await?;
    let exit = driver.join().await;
    info!("Driver exited: {:?}", exit);

    Ok(())
}
