//! Driver behaviour over an in-memory transport.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use realtime_codec::{Codec, InboundMessage};
use realtime_connection::{
    BoxError, Connection, Driver, DriverConfig, Error, Exit, Observer, State, observer_fn,
};
use realtime_events::{ServerEvent, registry};
use realtime_transport::{Frame, Transport, TransportError};
use realtime_transport_memory::{MemoryOptions, MemoryTransport};
use tokio::sync::{Mutex, mpsc};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(2);

fn session_created(id: &str) -> Frame {
    Frame::text(format!(
        r#"{{"type":"session.created","event_id":"ev_{id}","session":{{"id":"{id}"}}}}"#
    ))
}

fn setup() -> (Driver<ServerEvent>, MemoryTransport) {
    let (client, server) = MemoryTransport::pair(MemoryOptions::default());
    let codec = Codec::new(Arc::new(registry().unwrap()));
    let connection = Connection::new(Arc::new(client), codec);
    let driver = connection
        .driver(DriverConfig {
            transient_backoff: Duration::from_millis(1),
        })
        .unwrap();
    (driver, server)
}

/// Forwards every payload into a channel.
struct Forward(mpsc::UnboundedSender<ServerEvent>);

#[async_trait]
impl Observer<ServerEvent> for Forward {
    async fn observe(
        &self,
        _token: &CancellationToken,
        payload: &ServerEvent,
    ) -> Result<(), BoxError> {
        self.0.send(payload.clone())?;
        Ok(())
    }
}

fn forward() -> (Forward, mpsc::UnboundedReceiver<ServerEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Forward(tx), rx)
}

async fn next(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> ServerEvent {
    timeout(WAIT, rx.recv())
        .await
        .expect("Timed out waiting for payload")
        .expect("Observer channel closed")
}

#[tokio::test]
async fn test_observer_errors_and_panics_are_isolated() {
    let _ = tracing_subscriber::fmt::try_init();

    let (mut driver, server) = setup();
    let token = CancellationToken::new();

    driver
        .add_observer(observer_fn(|_: &CancellationToken, _: &ServerEvent| {
            Err::<(), BoxError>("observer failed".into())
        }))
        .unwrap();
    driver
        .add_observer(observer_fn(
            |_: &CancellationToken, _: &ServerEvent| -> Result<(), BoxError> {
                panic!("observer exploded")
            },
        ))
        .unwrap();
    let (healthy, mut rx) = forward();
    driver.add_observer(healthy).unwrap();

    driver.start().unwrap();

    server.send(session_created("a"), &token).await.unwrap();
    server.send(session_created("b"), &token).await.unwrap();

    assert_eq!(next(&mut rx).await.event_id(), Some("ev_a"));
    assert_eq!(next(&mut rx).await.event_id(), Some("ev_b"));

    assert_eq!(driver.state(), State::Running);
    assert!(driver.error().is_none());

    let stats = driver.stats();
    assert_eq!(stats.observer_failures, 4);

    driver.stop();
    assert!(matches!(timeout(WAIT, driver.join()).await.unwrap(), Exit::Cancelled));
}

/// Panics while building its future, before any of it is polled.
struct PanicsEagerly;

impl Observer<ServerEvent> for PanicsEagerly {
    fn observe<'life0, 'life1, 'life2, 'async_trait>(
        &'life0 self,
        _token: &'life1 CancellationToken,
        _payload: &'life2 ServerEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        'life2: 'async_trait,
        Self: 'async_trait,
    {
        panic!("observer exploded before returning a future")
    }
}

#[tokio::test]
async fn test_observer_panicking_outside_its_future_is_isolated() {
    let _ = tracing_subscriber::fmt::try_init();

    let (mut driver, server) = setup();
    let token = CancellationToken::new();

    driver.add_observer(PanicsEagerly).unwrap();
    let (healthy, mut rx) = forward();
    driver.add_observer(healthy).unwrap();

    driver.start().unwrap();

    server.send(session_created("a"), &token).await.unwrap();
    server.send(session_created("b"), &token).await.unwrap();

    assert_eq!(next(&mut rx).await.event_id(), Some("ev_a"));
    assert_eq!(next(&mut rx).await.event_id(), Some("ev_b"));

    assert_eq!(driver.state(), State::Running);
    assert_eq!(driver.stats().observer_failures, 2);

    driver.stop();
    assert!(matches!(timeout(WAIT, driver.join()).await.unwrap(), Exit::Cancelled));
}

/// Records start and end of every call, sleeping in between.
struct Slow {
    name: &'static str,
    delay: Duration,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Observer<ServerEvent> for Slow {
    async fn observe(
        &self,
        _token: &CancellationToken,
        payload: &ServerEvent,
    ) -> Result<(), BoxError> {
        let id = payload.event_id().unwrap_or_default().to_string();
        self.log.lock().await.push(format!("{} start {}", self.name, id));
        tokio::time::sleep(self.delay).await;
        self.log.lock().await.push(format!("{} end {}", self.name, id));
        Ok(())
    }
}

#[tokio::test]
async fn test_slow_observer_keeps_order() {
    let _ = tracing_subscriber::fmt::try_init();

    let (mut driver, server) = setup();
    let token = CancellationToken::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    driver
        .add_observer(Slow {
            name: "slow",
            delay: Duration::from_millis(30),
            log: log.clone(),
        })
        .unwrap();
    driver
        .add_observer(Slow {
            name: "fast",
            delay: Duration::ZERO,
            log: log.clone(),
        })
        .unwrap();
    let (tail, mut rx) = forward();
    driver.add_observer(tail).unwrap();

    driver.start().unwrap();

    for id in ["1", "2", "3"] {
        server.send(session_created(id), &token).await.unwrap();
    }

    for id in ["ev_1", "ev_2", "ev_3"] {
        assert_eq!(next(&mut rx).await.event_id(), Some(id));
    }

    let log = log.lock().await.clone();
    let expected: Vec<String> = ["1", "2", "3"]
        .iter()
        .flat_map(|id| {
            [
                format!("slow start ev_{id}"),
                format!("slow end ev_{id}"),
                format!("fast start ev_{id}"),
                format!("fast end ev_{id}"),
            ]
        })
        .collect();
    assert_eq!(log, expected);
}

#[tokio::test]
async fn test_stop_while_blocked_in_receive() {
    let _ = tracing_subscriber::fmt::try_init();

    let (mut driver, server) = setup();
    let token = CancellationToken::new();
    let (observer, mut rx) = forward();
    driver.add_observer(observer).unwrap();

    driver.start().unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    driver.stop();
    let exit = timeout(WAIT, driver.join())
        .await
        .expect("Driver did not stop");
    assert!(matches!(exit, Exit::Cancelled));
    assert_eq!(driver.state(), State::Stopped);

    // Nothing is dispatched once stopped
    server.send(session_created("late"), &token).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(driver.stats().frames_dispatched, 0);
}

#[tokio::test]
async fn test_unknown_tag_does_not_stop_driver() {
    let _ = tracing_subscriber::fmt::try_init();

    let (mut driver, server) = setup();
    let token = CancellationToken::new();
    let (observer, mut rx) = forward();
    driver.add_observer(observer).unwrap();
    driver.start().unwrap();

    server
        .send(Frame::text(r#"{"type":"totally.unknown"}"#), &token)
        .await
        .unwrap();
    server.send(Frame::text("not json"), &token).await.unwrap();
    server.send(session_created("after"), &token).await.unwrap();

    assert_eq!(next(&mut rx).await.event_id(), Some("ev_after"));
    assert_eq!(driver.state(), State::Running);

    let stats = driver.stats();
    assert_eq!(stats.decode_failures, 2);
    assert_eq!(stats.frames_received, 3);
}

#[tokio::test]
async fn test_unknown_tag_with_error_body_reaches_observers() {
    let _ = tracing_subscriber::fmt::try_init();

    let (mut driver, server) = setup();
    let token = CancellationToken::new();
    let (observer, mut rx) = forward();
    driver.add_observer(observer).unwrap();
    driver.start().unwrap();

    server
        .send(
            Frame::text(r#"{"type":"brand.new","error":{"type":"server_error","message":"x"}}"#),
            &token,
        )
        .await
        .unwrap();

    let event = next(&mut rx).await;
    assert!(matches!(event, ServerEvent::Error(_)));
}

#[tokio::test]
async fn test_non_text_frames_are_skipped() {
    let _ = tracing_subscriber::fmt::try_init();

    let (mut driver, server) = setup();
    let token = CancellationToken::new();
    let (observer, mut rx) = forward();
    driver.add_observer(observer).unwrap();
    driver.start().unwrap();

    server.send(Frame::binary(vec![1u8, 2, 3]), &token).await.unwrap();
    server.heartbeat(&token).await.unwrap();
    server.send(session_created("text"), &token).await.unwrap();

    assert_eq!(next(&mut rx).await.event_id(), Some("ev_text"));
    assert_eq!(driver.stats().frames_skipped, 2);
}

#[tokio::test]
async fn test_transient_error_keeps_reading() {
    let _ = tracing_subscriber::fmt::try_init();

    let (mut driver, server) = setup();
    let token = CancellationToken::new();
    let (observer, mut rx) = forward();
    driver.add_observer(observer).unwrap();
    driver.start().unwrap();

    server.inject_error(TransportError::Timeout).await.unwrap();
    server
        .inject_error(TransportError::Other("frame too large".to_string()))
        .await
        .unwrap();
    server.send(session_created("next"), &token).await.unwrap();

    assert_eq!(next(&mut rx).await.event_id(), Some("ev_next"));
    assert_eq!(driver.stats().transient_errors, 2);
    assert_eq!(driver.state(), State::Running);
}

#[tokio::test]
async fn test_peer_close_ends_cleanly() {
    let _ = tracing_subscriber::fmt::try_init();

    let (driver, server) = setup();
    driver.start().unwrap();

    server.close().await.unwrap();

    let exit = timeout(WAIT, driver.join()).await.unwrap();
    assert!(matches!(exit, Exit::Closed));
    assert!(driver.error().is_none());
    assert_eq!(driver.state(), State::Stopped);
}

#[tokio::test]
async fn test_reset_ends_cleanly() {
    let _ = tracing_subscriber::fmt::try_init();

    let (driver, server) = setup();
    driver.start().unwrap();

    server.inject_error(TransportError::Reset).await.unwrap();

    assert!(matches!(
        timeout(WAIT, driver.join()).await.unwrap(),
        Exit::Closed
    ));
}

#[tokio::test]
async fn test_permanent_error_is_surfaced() {
    let _ = tracing_subscriber::fmt::try_init();

    let (driver, server) = setup();
    driver.start().unwrap();

    server
        .inject_error(TransportError::Permanent(
            "WebSocket closed with code 4000: session expired".to_string(),
        ))
        .await
        .unwrap();

    let exit = timeout(WAIT, driver.join()).await.unwrap();
    let error = exit.error().expect("Expected a fatal error").clone();
    assert!(matches!(*error, TransportError::Permanent(_)));

    let reported = driver.error().expect("Error not recorded");
    assert!(Arc::ptr_eq(&reported, &error));
}

#[tokio::test]
async fn test_start_is_not_reentrant() {
    let _ = tracing_subscriber::fmt::try_init();

    let (mut driver, _server) = setup();
    driver.start().unwrap();

    assert!(matches!(driver.start(), Err(Error::AlreadyStarted)));
    assert_eq!(driver.state(), State::Running);

    let (observer, _rx) = forward();
    assert!(matches!(
        driver.add_observer(observer),
        Err(Error::AlreadyStarted)
    ));

    driver.stop();
    timeout(WAIT, driver.join()).await.unwrap();
    assert!(matches!(driver.start(), Err(Error::AlreadyStarted)));
}

#[tokio::test]
async fn test_stop_before_start() {
    let _ = tracing_subscriber::fmt::try_init();

    let (driver, _server) = setup();

    driver.stop();
    assert_eq!(driver.state(), State::Stopped);
    assert!(matches!(
        timeout(WAIT, driver.join()).await.unwrap(),
        Exit::Cancelled
    ));
    assert!(matches!(driver.start(), Err(Error::AlreadyStarted)));
}
