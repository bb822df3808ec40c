//! Maps transport errors onto what the read loop should do next.

use std::io;

use realtime_transport::TransportError;

/// Outcome of classifying a transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Log and keep reading.
    Transient,
    /// The connection ended normally; stop without an error.
    Clean,
    /// Stop and report the error.
    Fatal,
}

/// Messages some platforms and libraries use for a socket that is gone.
const CLOSED_MARKERS: &[&str] = &[
    "use of closed network connection",
    "connection reset by peer",
    "already closed",
];

/// Classify a transport error.
///
/// Rules apply in order: explicit permanent markers are fatal, timeouts are
/// transient, closed or reset connections are clean, and anything else is
/// treated as transient.
#[must_use]
pub fn classify(error: &TransportError) -> Disposition {
    if error.is_permanent() {
        return Disposition::Fatal;
    }

    match error {
        TransportError::Timeout => Disposition::Transient,
        TransportError::Io(e) if e.kind() == io::ErrorKind::TimedOut => Disposition::Transient,
        TransportError::Closed | TransportError::Reset | TransportError::Cancelled => {
            Disposition::Clean
        }
        TransportError::Io(e) if is_gone(e.kind()) => Disposition::Clean,
        other if mentions_closed(&other.to_string()) => Disposition::Clean,
        _ => Disposition::Transient,
    }
}

const fn is_gone(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
    )
}

fn mentions_closed(text: &str) -> bool {
    let text = text.to_ascii_lowercase();
    CLOSED_MARKERS.iter().any(|marker| text.contains(marker))
}
