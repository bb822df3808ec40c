//! In-memory transport implementation for testing
//!
//! [`MemoryTransport::pair`] returns two connected ends. Whatever one end
//! sends, the other receives. Tests drive the far end by hand to script a
//! server, including injecting transport failures with
//! [`MemoryTransport::inject_error`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use std::fmt::Debug;

use async_trait::async_trait;
use realtime_transport::{Config, Frame, FrameKind, Transport, TransportError, guarded};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

type Item = Result<Frame, TransportError>;

/// Configuration for a memory transport pair
#[derive(Debug, Clone)]
pub struct MemoryOptions {
    /// Frames buffered in each direction before senders wait
    pub capacity: usize,
    /// Timeouts applied by both ends
    pub transport: Config,
}

impl Default for MemoryOptions {
    fn default() -> Self {
        Self {
            capacity: 100,
            transport: Config::default(),
        }
    }
}

/// One end of an in-process duplex connection
pub struct MemoryTransport {
    id: Uuid,
    config: Config,
    sender: flume::Sender<Item>,
    receiver: flume::Receiver<Item>,
    shutdown: CancellationToken,
}

impl MemoryTransport {
    /// Create two connected ends
    #[must_use]
    pub fn pair(options: MemoryOptions) -> (Self, Self) {
        let (a_tx, a_rx) = flume::bounded(options.capacity);
        let (b_tx, b_rx) = flume::bounded(options.capacity);
        let id = Uuid::new_v4();
        let shutdown = CancellationToken::new();

        debug!("Created memory transport pair {}", id);

        let left = Self {
            id,
            config: options.transport.clone(),
            sender: a_tx,
            receiver: b_rx,
            shutdown: shutdown.clone(),
        };
        let right = Self {
            id,
            config: options.transport,
            sender: b_tx,
            receiver: a_rx,
            shutdown,
        };

        (left, right)
    }

    /// Connection id shared by both ends
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Make the peer's next receive fail with `error`
    ///
    /// The error is queued behind any frames already sent.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] if the pair has been closed.
    pub async fn inject_error(&self, error: TransportError) -> Result<(), TransportError> {
        self.push(Err(error), &CancellationToken::new()).await
    }

    /// Whether either end has closed the pair
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    async fn push(&self, item: Item, token: &CancellationToken) -> Result<(), TransportError> {
        if self.shutdown.is_cancelled() {
            return Err(TransportError::Closed);
        }

        guarded(token, self.config.send_timeout, self.sender.send_async(item))
            .await?
            .map_err(|_| TransportError::Closed)
    }
}

impl Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("id", &self.id)
            .field("closed", &self.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, frame: Frame, token: &CancellationToken) -> Result<(), TransportError> {
        self.push(Ok(frame), token).await
    }

    async fn receive(&self, token: &CancellationToken) -> Result<Frame, TransportError> {
        let next = async {
            tokio::select! {
                biased;

                item = self.receiver.recv_async() => item.unwrap_or(Err(TransportError::Closed)),
                () = self.shutdown.cancelled() => {
                    // Frames queued before the close are still delivered
                    self.receiver.try_recv().unwrap_or(Err(TransportError::Closed))
                }
            }
        };

        guarded(token, self.config.receive_timeout, next).await?
    }

    async fn close(&self) -> Result<(), TransportError> {
        if !self.shutdown.is_cancelled() {
            debug!("Closing memory transport {}", self.id);
            self.shutdown.cancel();
        }
        Ok(())
    }

    async fn heartbeat(&self, token: &CancellationToken) -> Result<(), TransportError> {
        self.push(Ok(Frame::new(FrameKind::Ping, Vec::<u8>::new())), token)
            .await
    }
}
