//! Connection driver.
//!
//! Runs a single background read task that receives frames, decodes them and
//! hands every payload to each registered observer in turn. Frames are
//! dispatched strictly in arrival order: the next frame is not read until
//! every observer has finished with the current one, so a slow observer
//! throttles the whole connection.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use realtime_codec::{Codec, InboundMessage};
use realtime_transport::{Transport, TransportError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::classify::{Disposition, classify};
use crate::error::{Error, Result};

/// Error type observers may return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Receives every decoded payload.
///
/// Errors and panics are contained: they are logged and counted, and the
/// remaining observers still run.
#[async_trait]
pub trait Observer<P: InboundMessage>: Send + Sync + 'static {
    /// Handle one payload.
    async fn observe(
        &self,
        token: &CancellationToken,
        payload: &P,
    ) -> std::result::Result<(), BoxError>;
}

/// Observer backed by a synchronous closure.
pub struct FnObserver<F>(F);

/// Wrap a closure as an [`Observer`].
pub const fn observer_fn<F>(f: F) -> FnObserver<F> {
    FnObserver(f)
}

#[async_trait]
impl<P, F> Observer<P> for FnObserver<F>
where
    P: InboundMessage,
    F: Fn(&CancellationToken, &P) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
{
    async fn observe(
        &self,
        token: &CancellationToken,
        payload: &P,
    ) -> std::result::Result<(), BoxError> {
        (self.0)(token, payload)
    }
}

/// Driver configuration.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Pause after a transient transport error before reading again
    pub transient_backoff: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            transient_backoff: Duration::from_millis(100),
        }
    }
}

/// Lifecycle of a driver. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Created, observers may still be added.
    Idle,
    /// The read task is running.
    Running,
    /// Stop was requested; the read task is winding down.
    Draining,
    /// The read task has exited.
    Stopped,
}

/// Why the read task exited.
#[derive(Debug, Clone)]
pub enum Exit {
    /// The driver was stopped.
    Cancelled,
    /// The peer closed the connection.
    Closed,
    /// A fatal transport error ended the connection.
    Failed(Arc<TransportError>),
}

impl Exit {
    /// The fatal error, if this exit was a failure.
    #[must_use]
    pub fn error(&self) -> Option<&Arc<TransportError>> {
        match self {
            Self::Failed(error) => Some(error),
            Self::Cancelled | Self::Closed => None,
        }
    }
}

#[derive(Debug)]
struct Lifecycle {
    state: State,
    exit: Option<Exit>,
}

#[derive(Debug, Default)]
struct Counters {
    frames_received: AtomicU64,
    frames_dispatched: AtomicU64,
    frames_skipped: AtomicU64,
    decode_failures: AtomicU64,
    transient_errors: AtomicU64,
    observer_failures: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time copy of a driver's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    /// Frames returned by the transport
    pub frames_received: u64,
    /// Payloads handed to the observers
    pub frames_dispatched: u64,
    /// Non-text frames ignored
    pub frames_skipped: u64,
    /// Text frames that failed to decode
    pub decode_failures: u64,
    /// Transport errors the loop read past
    pub transient_errors: u64,
    /// Observer calls that returned an error or panicked
    pub observer_failures: u64,
}

/// Owns the read side of a connection and fans payloads out to observers.
pub struct Driver<P: InboundMessage> {
    transport: Arc<dyn Transport>,
    codec: Codec<P>,
    config: DriverConfig,
    observers: Vec<Arc<dyn Observer<P>>>,
    shutdown_token: CancellationToken,
    task_tracker: TaskTracker,
    lifecycle: Arc<watch::Sender<Lifecycle>>,
    counters: Arc<Counters>,
}

impl<P: InboundMessage> Driver<P> {
    /// Create an idle driver over `transport`.
    pub fn new(transport: Arc<dyn Transport>, codec: Codec<P>, config: DriverConfig) -> Self {
        let (lifecycle, _) = watch::channel(Lifecycle {
            state: State::Idle,
            exit: None,
        });

        Self {
            transport,
            codec,
            config,
            observers: Vec::new(),
            shutdown_token: CancellationToken::new(),
            task_tracker: TaskTracker::new(),
            lifecycle: Arc::new(lifecycle),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Register an observer. Observers run in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyStarted`] once the driver has left the idle
    /// state.
    pub fn add_observer<O: Observer<P>>(&mut self, observer: O) -> Result<()> {
        if self.state() != State::Idle {
            return Err(Error::AlreadyStarted);
        }
        self.observers.push(Arc::new(observer));
        Ok(())
    }

    /// Spawn the read task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyStarted`] if the driver is not idle.
    pub fn start(&self) -> Result<()> {
        let started = self.lifecycle.send_if_modified(|lifecycle| {
            if lifecycle.state == State::Idle {
                lifecycle.state = State::Running;
                true
            } else {
                false
            }
        });

        if !started {
            return Err(Error::AlreadyStarted);
        }

        let reader = ReadLoop {
            transport: self.transport.clone(),
            codec: self.codec.clone(),
            observers: self.observers.clone().into(),
            token: self.shutdown_token.clone(),
            backoff: self.config.transient_backoff,
            counters: self.counters.clone(),
        };
        let lifecycle = self.lifecycle.clone();

        info!("Starting driver with {} observer(s)", self.observers.len());

        self.task_tracker.spawn(async move {
            let exit = reader.run().await;
            lifecycle.send_modify(|lifecycle| {
                lifecycle.state = State::Stopped;
                lifecycle.exit = Some(exit);
            });
        });
        self.task_tracker.close();

        Ok(())
    }

    /// Request the read task to stop. Does not wait and does not close the
    /// transport.
    pub fn stop(&self) {
        self.shutdown_token.cancel();
        self.task_tracker.close();

        self.lifecycle.send_if_modified(|lifecycle| match lifecycle.state {
            State::Idle => {
                lifecycle.state = State::Stopped;
                lifecycle.exit = Some(Exit::Cancelled);
                true
            }
            State::Running => {
                lifecycle.state = State::Draining;
                true
            }
            State::Draining | State::Stopped => false,
        });
    }

    /// Wait for the read task to exit.
    ///
    /// On a driver that was never started this waits until [`Driver::stop`]
    /// is called.
    pub async fn join(&self) -> Exit {
        let mut receiver = self.lifecycle.subscribe();
        let exit = match receiver
            .wait_for(|lifecycle| lifecycle.state == State::Stopped)
            .await
        {
            Ok(lifecycle) => lifecycle.exit.clone(),
            Err(_) => None,
        };
        self.task_tracker.wait().await;

        exit.unwrap_or(Exit::Cancelled)
    }

    /// The fatal error the read task exited with, if any.
    pub fn error(&self) -> Option<Arc<TransportError>> {
        self.lifecycle
            .borrow()
            .exit
            .as_ref()
            .and_then(Exit::error)
            .cloned()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.lifecycle.borrow().state
    }

    /// Snapshot of the loop counters.
    pub fn stats(&self) -> DriverStats {
        let c = &self.counters;
        DriverStats {
            frames_received: c.frames_received.load(Ordering::Relaxed),
            frames_dispatched: c.frames_dispatched.load(Ordering::Relaxed),
            frames_skipped: c.frames_skipped.load(Ordering::Relaxed),
            decode_failures: c.decode_failures.load(Ordering::Relaxed),
            transient_errors: c.transient_errors.load(Ordering::Relaxed),
            observer_failures: c.observer_failures.load(Ordering::Relaxed),
        }
    }
}

impl<P: InboundMessage> fmt::Debug for Driver<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("transport", &self.transport)
            .field("observers", &self.observers.len())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<P: InboundMessage> Drop for Driver<P> {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
    }
}

struct ReadLoop<P: InboundMessage> {
    transport: Arc<dyn Transport>,
    codec: Codec<P>,
    observers: Arc<[Arc<dyn Observer<P>>]>,
    token: CancellationToken,
    backoff: Duration,
    counters: Arc<Counters>,
}

impl<P: InboundMessage> ReadLoop<P> {
    async fn run(self) -> Exit {
        debug!("Read loop started");

        loop {
            if self.token.is_cancelled() {
                info!("Read loop cancelled");
                return Exit::Cancelled;
            }

            let received = tokio::select! {
                biased;

                () = self.token.cancelled() => {
                    info!("Read loop cancelled");
                    return Exit::Cancelled;
                }
                received = self.transport.receive(&self.token) => received,
            };

            let frame = match received {
                Ok(frame) => frame,
                Err(e) => match classify(&e) {
                    Disposition::Transient => {
                        warn!("Transient transport error: {}", e);
                        Counters::bump(&self.counters.transient_errors);
                        if !self.pause().await {
                            return Exit::Cancelled;
                        }
                        continue;
                    }
                    Disposition::Clean => {
                        if self.token.is_cancelled() {
                            return Exit::Cancelled;
                        }
                        info!("Connection closed: {}", e);
                        return Exit::Closed;
                    }
                    Disposition::Fatal => {
                        error!("Fatal transport error: {}", e);
                        return Exit::Failed(Arc::new(e));
                    }
                },
            };

            if self.token.is_cancelled() {
                debug!("Dropping {} frame received after cancellation", frame.kind);
                return Exit::Cancelled;
            }

            Counters::bump(&self.counters.frames_received);

            if !frame.is_text() {
                debug!("Skipping {} frame", frame.kind);
                Counters::bump(&self.counters.frames_skipped);
                continue;
            }

            let payload = match self.codec.decode(&frame.payload) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("Failed to decode message: {}", e);
                    Counters::bump(&self.counters.decode_failures);
                    continue;
                }
            };

            self.dispatch(&payload).await;
            Counters::bump(&self.counters.frames_dispatched);
        }
    }

    /// Returns false if cancelled during the pause.
    async fn pause(&self) -> bool {
        if self.backoff.is_zero() {
            return !self.token.is_cancelled();
        }

        tokio::select! {
            biased;

            () = self.token.cancelled() => false,
            () = tokio::time::sleep(self.backoff) => true,
        }
    }

    async fn dispatch(&self, payload: &P) {
        for (index, observer) in self.observers.iter().enumerate() {
            let call = async { observer.observe(&self.token, payload).await };
            let outcome = AssertUnwindSafe(call).catch_unwind().await;

            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Observer {} failed on '{}': {}", index, payload.tag(), e);
                    Counters::bump(&self.counters.observer_failures);
                }
                Err(panic) => {
                    error!(
                        "Observer {} panicked on '{}': {}",
                        index,
                        payload.tag(),
                        panic_message(panic.as_ref())
                    );
                    Counters::bump(&self.counters.observer_failures);
                }
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
