//! Messaging facade over a transport.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use realtime_codec::{Codec, InboundMessage, OutboundMessage};
use realtime_transport::{Frame, Transport};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::driver::{Driver, DriverConfig};
use crate::error::{Error, Result};

/// A connection that sends typed messages and reads typed payloads.
///
/// Payloads can be consumed by calling [`Connection::read_message`]
/// directly, or by handing the read side to a [`Driver`]. The two styles are
/// exclusive: once a driver exists, direct reads fail with
/// [`Error::ReaderInUse`].
pub struct Connection<P: InboundMessage> {
    inner: Arc<Inner<P>>,
}

struct Inner<P> {
    transport: Arc<dyn Transport>,
    codec: Codec<P>,
    reader_claimed: AtomicBool,
}

impl<P: InboundMessage> Connection<P> {
    /// Wrap a connected transport.
    pub fn new(transport: Arc<dyn Transport>, codec: Codec<P>) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                codec,
                reader_claimed: AtomicBool::new(false),
            }),
        }
    }

    /// Encode `message` and send it as a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`] or [`Error::Transport`].
    pub async fn send<M: OutboundMessage + ?Sized>(
        &self,
        token: &CancellationToken,
        message: &M,
    ) -> Result<()> {
        let bytes = self.inner.codec.encode(message)?;
        debug!("Sending '{}' ({} bytes)", message.tag(), bytes.len());
        self.inner.transport.send(Frame::text(bytes), token).await?;
        Ok(())
    }

    /// Receive and decode the next message.
    ///
    /// Unlike the driver, every problem is returned to the caller, including
    /// timeouts and undecodable frames.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReaderInUse`] if a driver owns the read side,
    /// [`Error::UnexpectedFrame`] for non-text frames, and transport or
    /// decode errors as they occur.
    pub async fn read_message(&self, token: &CancellationToken) -> Result<P> {
        if self.inner.reader_claimed.load(Ordering::Acquire) {
            return Err(Error::ReaderInUse);
        }

        let frame = self.inner.transport.receive(token).await?;
        if !frame.is_text() {
            return Err(Error::UnexpectedFrame { kind: frame.kind });
        }

        Ok(self.inner.codec.decode(&frame.payload)?)
    }

    /// Send a keep-alive ping.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the ping cannot be sent.
    pub async fn ping(&self, token: &CancellationToken) -> Result<()> {
        self.inner.transport.heartbeat(token).await?;
        Ok(())
    }

    /// Close the underlying transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if closing fails.
    pub async fn close(&self) -> Result<()> {
        self.inner.transport.close().await?;
        Ok(())
    }

    /// Hand the read side to a new idle driver.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReaderInUse`] if a driver was already created.
    pub fn driver(&self, config: DriverConfig) -> Result<Driver<P>> {
        if self.inner.reader_claimed.swap(true, Ordering::AcqRel) {
            return Err(Error::ReaderInUse);
        }

        Ok(Driver::new(
            self.inner.transport.clone(),
            self.inner.codec.clone(),
            config,
        ))
    }

    /// The underlying transport.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    /// The codec used for this connection.
    pub fn codec(&self) -> &Codec<P> {
        &self.inner.codec
    }
}

impl<P: InboundMessage> Clone for Connection<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<P: InboundMessage> fmt::Debug for Connection<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("transport", &self.inner.transport)
            .field(
                "reader_claimed",
                &self.inner.reader_claimed.load(Ordering::Relaxed),
            )
            .finish_non_exhaustive()
    }
}
