//! WebSocket transport implementation
//!
//! Dials a WebSocket endpoint with tokio-tungstenite and exposes it through
//! the [`Transport`] capability set. The socket is split into its read and
//! write halves, each behind its own lock, so a single reader task and any
//! number of writers can use the transport at the same time.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use realtime_transport::{Config, Frame, FrameKind, Transport, TransportError, guarded};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue, Request};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message, Utf8Bytes};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Options for dialing a WebSocket transport
#[derive(Debug, Clone, Default)]
pub struct WsOptions {
    /// Generic transport configuration
    pub transport: Config,
    /// Extra headers sent with the upgrade request
    pub headers: Vec<(String, String)>,
}

impl WsOptions {
    /// Add a header to the upgrade request
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// WebSocket transport over a single client connection
pub struct WsTransport {
    url: Url,
    config: Config,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
    closed: AtomicBool,
}

impl WsTransport {
    /// Dial `url` and complete the WebSocket handshake
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidAddress`] for malformed URLs or
    /// headers, [`TransportError::Api`] when the server answers the upgrade
    /// with an HTTP error, and [`TransportError::ConnectionFailed`] otherwise.
    pub async fn connect(url: &str, options: WsOptions) -> Result<Self, TransportError> {
        let url = Url::parse(url)
            .map_err(|e| TransportError::InvalidAddress(format!("Invalid URL: {e}")))?;

        let request = build_request(&url, &options.headers)?;

        debug!("Connecting to WebSocket at {}", url);

        let (ws_stream, _) = connect_async(request).await.map_err(|e| match e {
            WsError::Http(response) => TransportError::Api {
                status: response.status().as_u16(),
                message: response
                    .status()
                    .canonical_reason()
                    .unwrap_or("upgrade rejected")
                    .to_string(),
            },
            other => TransportError::ConnectionFailed(format!("WebSocket connect failed: {other}")),
        })?;

        info!("WebSocket connected to {}", url);

        let (sink, stream) = ws_stream.split();

        Ok(Self {
            url,
            config: options.transport,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            closed: AtomicBool::new(false),
        })
    }

    /// The URL this transport is connected to
    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn write(&self, message: Message, token: &CancellationToken) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }

        let mut sink = guarded(token, None, self.sink.lock()).await?;
        guarded(token, self.config.send_timeout, sink.send(message))
            .await?
            .map_err(map_error)
    }
}

impl Debug for WsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsTransport")
            .field("url", &self.url.as_str())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&self, frame: Frame, token: &CancellationToken) -> Result<(), TransportError> {
        let message = match frame.kind {
            FrameKind::Text => Message::Text(utf8(frame.payload)?),
            FrameKind::Binary => Message::binary(frame.payload),
            FrameKind::Ping => Message::Ping(frame.payload),
            FrameKind::Pong => Message::Pong(frame.payload),
            FrameKind::Close => return self.close().await,
        };

        self.write(message, token).await
    }

    async fn receive(&self, token: &CancellationToken) -> Result<Frame, TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }

        let mut stream = guarded(token, None, self.stream.lock()).await?;

        loop {
            let next = guarded(token, self.config.receive_timeout, stream.next()).await?;

            match next {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Frame::text(Bytes::from(text)));
                }
                Some(Ok(Message::Binary(data))) => return Ok(Frame::binary(data)),
                Some(Ok(Message::Ping(data))) => return Ok(Frame::new(FrameKind::Ping, data)),
                Some(Ok(Message::Pong(data))) => return Ok(Frame::new(FrameKind::Pong, data)),
                Some(Ok(Message::Close(frame))) => {
                    self.closed.store(true, Ordering::Release);
                    return Err(close_error(frame.as_ref()));
                }
                Some(Ok(Message::Frame(_))) => {
                    // Raw frames only surface when reading unassembled frames
                    continue;
                }
                Some(Err(e)) => return Err(map_error(e)),
                None => {
                    self.closed.store(true, Ordering::Release);
                    return Err(TransportError::Closed);
                }
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        debug!("Closing WebSocket connection to {}", self.url);

        let mut sink = self.sink.lock().await;
        if let Err(e) = sink.close().await {
            match map_error(e) {
                TransportError::Closed | TransportError::Reset => {}
                other => warn!("Error while closing WebSocket: {}", other),
            }
        }

        Ok(())
    }

    async fn heartbeat(&self, token: &CancellationToken) -> Result<(), TransportError> {
        self.write(Message::Ping(Bytes::new()), token).await
    }
}

fn utf8(payload: Bytes) -> Result<Utf8Bytes, TransportError> {
    Utf8Bytes::try_from(payload)
        .map_err(|e| TransportError::Other(format!("Text frame is not valid UTF-8: {e}")))
}

fn build_request(url: &Url, headers: &[(String, String)]) -> Result<Request<()>, TransportError> {
    match url.scheme() {
        "ws" | "wss" => {}
        other => {
            return Err(TransportError::InvalidAddress(format!(
                "Unsupported scheme '{other}', expected ws or wss"
            )));
        }
    }

    let mut request = url
        .as_str()
        .into_client_request()
        .map_err(|e| TransportError::InvalidAddress(format!("Invalid request: {e}")))?;

    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| TransportError::InvalidAddress(format!("Invalid header '{name}': {e}")))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| {
            TransportError::InvalidAddress(format!("Invalid value for header '{name}': {e}"))
        })?;
        request.headers_mut().insert(header_name, header_value);
    }

    Ok(request)
}

/// Translate a close frame into the matching transport error
///
/// Normal closure and "going away" end the connection cleanly; every other
/// code means the server gave up on this connection for good.
fn close_error(frame: Option<&CloseFrame>) -> TransportError {
    match frame {
        None => TransportError::Closed,
        Some(frame) if matches!(frame.code, CloseCode::Normal | CloseCode::Away) => {
            TransportError::Closed
        }
        Some(frame) => TransportError::Permanent(format!(
            "WebSocket closed with code {}: {}",
            u16::from(frame.code),
            frame.reason.as_str()
        )),
    }
}

fn map_error(error: WsError) -> TransportError {
    match error {
        WsError::ConnectionClosed | WsError::AlreadyClosed => TransportError::Closed,
        WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake) => TransportError::Reset,
        WsError::Io(e) => match e.kind() {
            std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe => TransportError::Reset,
            std::io::ErrorKind::TimedOut => TransportError::Timeout,
            _ => TransportError::Io(e),
        },
        WsError::Http(response) => TransportError::Api {
            status: response.status().as_u16(),
            message: response
                .status()
                .canonical_reason()
                .unwrap_or("HTTP error")
                .to_string(),
        },
        other => TransportError::Other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_payload() {
        let text = utf8(Bytes::from_static(b"{\"type\":\"ping\"}")).unwrap();
        assert_eq!(text.as_str(), "{\"type\":\"ping\"}");

        let result = utf8(Bytes::from_static(&[0x7b, 0xff, 0x7d]));
        assert!(matches!(result, Err(TransportError::Other(_))));
    }

    #[test]
    fn test_build_request_adds_headers() {
        let url = Url::parse("wss://example.com/v1/realtime?model=m").unwrap();
        let headers = vec![
            ("Authorization".to_string(), "Bearer secret".to_string()),
            ("OpenAI-Beta".to_string(), "realtime=v1".to_string()),
        ];

        let request = build_request(&url, &headers).unwrap();

        assert_eq!(request.uri().to_string(), "wss://example.com/v1/realtime?model=m");
        assert_eq!(request.headers()["authorization"], "Bearer secret");
        assert_eq!(request.headers()["openai-beta"], "realtime=v1");
    }

    #[test]
    fn test_build_request_rejects_http_scheme() {
        let url = Url::parse("https://example.com/v1/realtime").unwrap();
        let result = build_request(&url, &[]);
        assert!(matches!(result, Err(TransportError::InvalidAddress(_))));
    }

    #[test]
    fn test_build_request_rejects_bad_header() {
        let url = Url::parse("ws://example.com/").unwrap();
        let headers = vec![("bad header".to_string(), "x".to_string())];
        let result = build_request(&url, &headers);
        assert!(matches!(result, Err(TransportError::InvalidAddress(_))));
    }

    #[test]
    fn test_close_codes() {
        assert!(matches!(close_error(None), TransportError::Closed));

        let normal = CloseFrame {
            code: CloseCode::Normal,
            reason: "done".into(),
        };
        assert!(matches!(close_error(Some(&normal)), TransportError::Closed));

        let away = CloseFrame {
            code: CloseCode::Away,
            reason: "".into(),
        };
        assert!(matches!(close_error(Some(&away)), TransportError::Closed));

        let policy = CloseFrame {
            code: CloseCode::Policy,
            reason: "invalid token".into(),
        };
        match close_error(Some(&policy)) {
            TransportError::Permanent(reason) => {
                assert!(reason.contains("1008"));
                assert!(reason.contains("invalid token"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_mapping() {
        assert!(matches!(
            map_error(WsError::ConnectionClosed),
            TransportError::Closed
        ));
        assert!(matches!(
            map_error(WsError::AlreadyClosed),
            TransportError::Closed
        ));
        assert!(matches!(
            map_error(WsError::Protocol(
                ProtocolError::ResetWithoutClosingHandshake
            )),
            TransportError::Reset
        ));
        assert!(matches!(
            map_error(WsError::Io(std::io::Error::from(
                std::io::ErrorKind::ConnectionReset
            ))),
            TransportError::Reset
        ));
        assert!(matches!(
            map_error(WsError::Io(std::io::Error::from(
                std::io::ErrorKind::TimedOut
            ))),
            TransportError::Timeout
        ));
    }
}
