//! End-to-end tests against local mock servers.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::Query;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use realtime_client::events::client::SessionUpdateEvent;
use realtime_client::events::{ClientSession, ServerEvent};
use realtime_client::{
    Client, ClientConfig, ConnectOptions, DriverConfig, Error, Exit, observer_fn,
};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::info;

const MODEL: &str = "gpt-4o-realtime-preview";
const WAIT: Duration = Duration::from_secs(5);

async fn spawn_server(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");
    info!("Mock server listening on {}", addr);

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    addr
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("authorization").and_then(|v| v.to_str().ok()) == Some("Bearer test-key")
        && headers.get("openai-beta").and_then(|v| v.to_str().ok()) == Some("realtime=v1")
}

async fn realtime(
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if query.get("model").map(String::as_str) != Some(MODEL) {
        return StatusCode::BAD_REQUEST.into_response();
    }
    ws.on_upgrade(session_server)
}

/// Answers a `session.update` with a `session.created`, then waits for the
/// client to hang up.
async fn session_server(mut socket: WebSocket) {
    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else {
            continue;
        };

        let value: serde_json::Value = match serde_json::from_str(text.as_str()) {
            Ok(value) => value,
            Err(_) => continue,
        };

        if value["type"] == "session.update" && value["session"]["model"] == MODEL {
            let reply = serde_json::json!({
                "type": "session.created",
                "event_id": "event_1",
                "session": {"id": "sess_1"}
            });
            if socket
                .send(Message::Text(reply.to_string().into()))
                .await
                .is_err()
            {
                break;
            }
        }
    }
}

fn config(addr: SocketAddr) -> ClientConfig {
    ClientConfig {
        base_url: format!("ws://{addr}/v1/realtime"),
        api_base_url: format!("http://{addr}/v1"),
        default_model: MODEL.to_string(),
        ..ClientConfig::new("test-key")
    }
}

fn router() -> Router {
    Router::new()
        .route("/v1/realtime", get(realtime))
        .route("/v1/realtime/sessions", post(create_session))
        .route(
            "/v1/realtime/transcription_sessions",
            post(create_transcription_session),
        )
}

#[tokio::test]
async fn test_session_update_reaches_every_observer_once() {
    let _ = tracing_subscriber::fmt::try_init();

    let addr = spawn_server(router()).await;
    let client = Client::new(config(addr)).unwrap();
    let conn = client.connect(ConnectOptions::default()).await.unwrap();
    let token = CancellationToken::new();

    let mut driver = conn.driver(DriverConfig::default()).unwrap();
    let counts: Vec<Arc<AtomicUsize>> = (0..3).map(|_| Arc::new(AtomicUsize::new(0))).collect();
    let (tx, mut rx) = mpsc::unbounded_channel();

    for count in &counts {
        let count = count.clone();
        let tx = tx.clone();
        driver
            .add_observer(observer_fn(
                move |_: &CancellationToken, event: &ServerEvent| {
                    if let ServerEvent::SessionCreated(created) = event {
                        if created.session.id == "sess_1" {
                            count.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                    tx.send(())?;
                    Ok(())
                },
            ))
            .unwrap();
    }

    driver.start().unwrap();

    conn.send_session_update(
        &token,
        SessionUpdateEvent {
            event_id: None,
            session: ClientSession {
                model: Some(MODEL.to_string()),
                ..ClientSession::default()
            },
        },
    )
    .await
    .unwrap();

    for _ in 0..counts.len() {
        timeout(WAIT, rx.recv())
            .await
            .expect("Timed out waiting for session.created")
            .expect("Observer channel closed");
    }

    // Give a duplicate the chance to show up
    tokio::time::sleep(Duration::from_millis(100)).await;

    for count in &counts {
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
    assert_eq!(driver.stats().frames_dispatched, 1);

    conn.close().await.unwrap();
    let exit = timeout(WAIT, driver.join()).await.unwrap();
    assert!(matches!(exit, Exit::Closed | Exit::Cancelled), "{exit:?}");
}

#[tokio::test]
async fn test_read_message_without_driver() {
    let _ = tracing_subscriber::fmt::try_init();

    let addr = spawn_server(router()).await;
    let client = Client::new(config(addr)).unwrap();
    let conn = client
        .connect(ConnectOptions::default().with_model(MODEL))
        .await
        .unwrap();
    let token = CancellationToken::new();

    conn.send_session_update(
        &token,
        SessionUpdateEvent {
            event_id: Some("client_1".to_string()),
            session: ClientSession {
                model: Some(MODEL.to_string()),
                ..ClientSession::default()
            },
        },
    )
    .await
    .unwrap();

    let event = timeout(WAIT, conn.read_message(&token))
        .await
        .unwrap()
        .unwrap();
    match event {
        ServerEvent::SessionCreated(created) => assert_eq!(created.session.id, "sess_1"),
        other => panic!("unexpected event: {other:?}"),
    }

    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_bad_credentials_rejected_on_connect() {
    let _ = tracing_subscriber::fmt::try_init();

    let addr = spawn_server(router()).await;
    let client = Client::new(ClientConfig {
        auth_token: "wrong".to_string(),
        ..config(addr)
    })
    .unwrap();

    let result = client.connect(ConnectOptions::default()).await;
    match result {
        Err(Error::Transport(error)) => assert!(error.is_permanent(), "{error:?}"),
        Err(other) => panic!("unexpected error: {other:?}"),
        Ok(_) => panic!("connect should fail"),
    }
}

async fn create_session(headers: HeaderMap, Json(body): Json<serde_json::Value>) -> Response {
    if !authorized(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": {
                    "type": "invalid_request_error",
                    "code": "invalid_api_key",
                    "message": "Incorrect API key provided"
                }
            })),
        )
            .into_response();
    }

    Json(serde_json::json!({
        "id": "sess_rest",
        "object": "realtime.session",
        "model": body["model"],
        "client_secret": {"value": "ek_test", "expires_at": 1_700_000_000}
    }))
    .into_response()
}

async fn create_transcription_session(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    Json(serde_json::json!({
        "id": "sess_tr",
        "object": "realtime.transcription_session",
        "client_secret": {"value": "ek_tr", "expires_at": 1_700_000_000}
    }))
    .into_response()
}

#[tokio::test]
async fn test_create_session() {
    let _ = tracing_subscriber::fmt::try_init();

    let addr = spawn_server(router()).await;
    let client = Client::new(config(addr)).unwrap();

    let response = client
        .create_session(&ClientSession {
            model: Some(MODEL.to_string()),
            ..ClientSession::default()
        })
        .await
        .unwrap();

    assert_eq!(response.session.id, "sess_rest");
    assert_eq!(response.session.model.as_deref(), Some(MODEL));
    assert_eq!(response.client_secret.value, "ek_test");

    let response = client
        .create_transcription_session(&Default::default())
        .await
        .unwrap();
    assert_eq!(response.session.id, "sess_tr");
    assert_eq!(response.client_secret.value, "ek_tr");
}

#[tokio::test]
async fn test_create_session_api_error() {
    let _ = tracing_subscriber::fmt::try_init();

    let addr = spawn_server(router()).await;
    let client = Client::new(ClientConfig {
        auth_token: "wrong".to_string(),
        ..config(addr)
    })
    .unwrap();

    let result = client.create_session(&ClientSession::default()).await;
    match result {
        Err(Error::Api {
            status,
            code,
            message,
        }) => {
            assert_eq!(status, 401);
            assert_eq!(code.as_deref(), Some("invalid_api_key"));
            assert_eq!(message, "Incorrect API key provided");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
