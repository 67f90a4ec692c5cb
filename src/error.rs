//! Error types for the actuator link.

use std::time::Duration;
use thiserror::Error;

use crate::session::LinkState;

/// Main error type for all link operations.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The serial port could not be opened.
    #[error("Failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: tokio_serial::Error,
    },

    /// I/O error while reading from or writing to the transport.
    #[error("Transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation requires a link that finished its handshake.
    #[error("Link is {0}, expected ready")]
    NotReady(LinkState),

    /// Handshake requested on a link that already completed it.
    #[error("Handshake already completed")]
    AlreadyReady,

    /// A previous command was abandoned before its reply arrived.
    #[error("A reply is still outstanding for an earlier command")]
    ReplyOutstanding,

    /// Opt-in timeout elapsed.
    #[error("Timed out after {waited:?} waiting for {waiting_for}")]
    Timeout {
        waited: Duration,
        waiting_for: &'static str,
    },

    /// Strict command construction with a speed outside [-255, 255].
    #[error("Speed {0} is outside the range [-255, 255]")]
    SpeedOutOfRange(i64),

    /// Frame markers that could be confused with each other or with payload bytes.
    #[error("Invalid frame markers {start:?} / {end:?}")]
    InvalidMarkers { start: char, end: char },

    /// Axis name that is neither RA nor DEC.
    #[error("Unknown axis {0:?} (expected RA or DEC)")]
    UnknownAxis(String),
}

impl LinkError {
    /// Whether the session can no longer be used after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LinkError::Open { .. }
                | LinkError::Io(_)
                | LinkError::ReplyOutstanding
                | LinkError::Timeout { .. }
        )
    }
}

/// Result type alias using LinkError.
pub type Result<T> = std::result::Result<T, LinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let io = LinkError::Io(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "unplugged",
        ));
        assert!(io.is_fatal());
        assert!(LinkError::ReplyOutstanding.is_fatal());
        assert!(!LinkError::SpeedOutOfRange(300).is_fatal());
        assert!(!LinkError::NotReady(LinkState::AwaitingReady).is_fatal());
    }

    #[test]
    fn test_display_mentions_state() {
        let err = LinkError::NotReady(LinkState::Closed);
        assert_eq!(err.to_string(), "Link is closed, expected ready");
    }
}
