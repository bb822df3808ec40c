//! Payload catalog for the realtime voice protocol.
//!
//! Server events decode through [`registry()`] and the generic codec; client
//! events serialize directly since each carries its own tag.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
mod registry;
pub mod server;
pub mod types;

pub use client::{CLIENT_EVENT_TAGS, ClientEvent};
pub use registry::registry;
pub use server::{SERVER_EVENT_TAGS, ServerEvent};
pub use types::*;
