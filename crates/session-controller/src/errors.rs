//! Session controller error types.
//!
//! Errors fall into four families:
//!
//! - **Precondition** (`NotReady`): the session is released, not connected,
//!   or has no local stream. The caller may retry once the precondition holds.
//! - **Resolution** (`TargetNotFound`, `ParticipantNotFound`, `SessionNotFound`):
//!   a caller-supplied identifier did not resolve.
//! - **Delivery** (`SinkNotAttached`, `Delivery`): no consumer, or the consumer
//!   refused the event. Best-effort notifications log and drop these.
//! - **Engine** (`Engine`, `ConnectTimeout`): the communication engine
//!   refused a request or never answered.
//!
//! None of these is fatal to the controller; `release()` succeeds regardless.

use crate::engine::RenderTargetId;
use thiserror::Error;

/// Session controller error type.
///
/// Maps to host-facing error codes:
/// - `NotReady`: `PRECONDITION` (1)
/// - `TargetNotFound`, `ParticipantNotFound`, `SessionNotFound`: `NOT_FOUND` (2)
/// - `SinkNotAttached`, `Delivery`: `DELIVERY` (3)
/// - `Engine`, `ConnectTimeout`: `ENGINE` (4)
/// - `InvalidRoomMode`, `InvalidApiKey`: `INVALID_ARGUMENT` (5)
/// - `Internal`: `INTERNAL_ERROR` (6)
#[derive(Debug, Error)]
pub enum SessionError {
    /// A state precondition does not hold (released, not connected, no local stream).
    #[error("Not ready: {0}")]
    NotReady(String),

    /// The host registry could not resolve a render target.
    #[error("Render target not found: {0}")]
    TargetNotFound(RenderTargetId),

    /// No remote participant is tracked for the identifier.
    #[error("Participant not found: {0}")]
    ParticipantNotFound(String),

    /// No session is registered for the local identifier.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// No event sink is attached, or it was already released.
    #[error("Event sink not attached")]
    SinkNotAttached,

    /// The attached sink refused the event.
    #[error("Event delivery failed: {0}")]
    Delivery(String),

    /// Room mode ordinal outside the known modes.
    #[error("Invalid room mode: {0}")]
    InvalidRoomMode(i32),

    /// Connect requested without an API key.
    #[error("Invalid API key")]
    InvalidApiKey,

    /// The engine refused a request or reported an error.
    #[error("Engine error: {0}")]
    Engine(String),

    /// The engine did not open the peer in time.
    #[error("Timed out waiting for the peer to open")]
    ConnectTimeout,

    /// Internal error (host mailbox closed, reply dropped).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SessionError {
    /// Returns the host-facing error code for this error.
    #[must_use]
    pub fn error_code(&self) -> i32 {
        match self {
            SessionError::NotReady(_) => 1, // PRECONDITION
            SessionError::TargetNotFound(_)
            | SessionError::ParticipantNotFound(_)
            | SessionError::SessionNotFound(_) => 2, // NOT_FOUND
            SessionError::SinkNotAttached | SessionError::Delivery(_) => 3, // DELIVERY
            SessionError::Engine(_) | SessionError::ConnectTimeout => 4, // ENGINE
            SessionError::InvalidRoomMode(_) | SessionError::InvalidApiKey => 5, // INVALID_ARGUMENT
            SessionError::Internal(_) => 6, // INTERNAL_ERROR
        }
    }

    /// Returns a host-safe error message (no engine or channel internals).
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            SessionError::NotReady(_) => {
                "Already released or local stream not started".to_string()
            }
            SessionError::TargetNotFound(id) => format!("Render target {id} not found"),
            SessionError::ParticipantNotFound(_) => "Remote peer not found".to_string(),
            SessionError::SessionNotFound(_) => "Session not found".to_string(),
            SessionError::SinkNotAttached | SessionError::Delivery(_) => {
                "Event channel not ready or already released".to_string()
            }
            SessionError::InvalidRoomMode(mode) => format!("Invalid mode({mode})"),
            SessionError::InvalidApiKey => "Invalid apiKey".to_string(),
            SessionError::Engine(_) => "The communication engine reported an error".to_string(),
            SessionError::ConnectTimeout => "Timed out connecting to the engine".to_string(),
            SessionError::Internal(_) => "An internal error occurred".to_string(),
        }
    }

    /// Whether the caller may retry after satisfying a precondition.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, SessionError::Internal(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        assert_eq!(SessionError::NotReady("no stream".to_string()).error_code(), 1);

        assert_eq!(
            SessionError::TargetNotFound(RenderTargetId(7)).error_code(),
            2
        );
        assert_eq!(
            SessionError::ParticipantNotFound("peerB".to_string()).error_code(),
            2
        );
        assert_eq!(
            SessionError::SessionNotFound("peerA".to_string()).error_code(),
            2
        );

        assert_eq!(SessionError::SinkNotAttached.error_code(), 3);
        assert_eq!(
            SessionError::Delivery("channel full".to_string()).error_code(),
            3
        );

        assert_eq!(SessionError::Engine("refused".to_string()).error_code(), 4);
        assert_eq!(SessionError::ConnectTimeout.error_code(), 4);

        assert_eq!(SessionError::InvalidRoomMode(9).error_code(), 5);
        assert_eq!(SessionError::InvalidApiKey.error_code(), 5);

        assert_eq!(SessionError::Internal("closed".to_string()).error_code(), 6);
    }

    #[test]
    fn test_client_messages_hide_internal_details() {
        let engine_err = SessionError::Engine("signaling 10.0.0.12:443 refused".to_string());
        assert!(!engine_err.client_message().contains("10.0.0.12"));

        let internal = SessionError::Internal("mailbox send failed: closed".to_string());
        assert_eq!(internal.client_message(), "An internal error occurred");

        let mode = SessionError::InvalidRoomMode(3);
        assert_eq!(mode.client_message(), "Invalid mode(3)");
    }

    #[test]
    fn test_display_formatting() {
        assert_eq!(
            format!("{}", SessionError::TargetNotFound(RenderTargetId(42))),
            "Render target not found: 42"
        );
        assert_eq!(
            format!("{}", SessionError::ParticipantNotFound("peerC".to_string())),
            "Participant not found: peerC"
        );
        assert_eq!(
            format!("{}", SessionError::SinkNotAttached),
            "Event sink not attached"
        );
    }

    #[test]
    fn test_only_internal_errors_are_unrecoverable() {
        assert!(SessionError::NotReady("x".to_string()).is_recoverable());
        assert!(SessionError::ConnectTimeout.is_recoverable());
        assert!(!SessionError::Internal("x".to_string()).is_recoverable());
    }
}
