//! Connection layer for the realtime client.
//!
//! Ties a [`Transport`](realtime_transport::Transport) to a
//! [`Codec`](realtime_codec::Codec) and offers two ways to consume payloads:
//! direct reads through [`Connection::read_message`], or a background
//! [`Driver`] that dispatches every payload to registered observers.
//!
//! The driver absorbs decode errors, transient transport errors and observer
//! failures. A cleanly closed connection ends it quietly; only a fatal
//! transport error is surfaced, through [`Driver::join`] and
//! [`Driver::error`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod classify;
mod connection;
mod driver;
mod error;

pub use classify::{Disposition, classify};
pub use connection::Connection;
pub use driver::{
    BoxError, Driver, DriverConfig, DriverStats, Exit, FnObserver, Observer, State, observer_fn,
};
pub use error::{Error, Result};
