//! Normalized session event schema and the consumer-side sink.
//!
//! Every engine callback and local state transition the host cares about is
//! reduced to one [`SessionEvent`]. On the wire (JSON) an event looks like:
//!
//! ```text
//! {"version":1,"event":"RemoteStreamAdded","peerId":"alice","remotePeerId":"bob"}
//! ```
//!
//! Optional fields are omitted when absent.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Version of the event schema carried in every event.
pub const EVENT_SCHEMA_VERSION: u16 = 1;

/// Kinds of session events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A sink was attached.
    Connected,
    /// The signaling connection or a direct call dropped.
    Disconnected,
    /// An inbound direct call was auto-answered.
    IncomingCall,
    RemoteStreamAdded,
    RemoteStreamRemoved,
    RoomOpened,
    RoomClosed,
    PeerJoined,
    PeerLeft,
    /// Engine-reported error (non-fatal).
    Error,
    /// The session was released; last event before the sink is detached.
    Released,
}

impl EventKind {
    /// Returns the kind as a string for logs and metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventKind::Connected => "connected",
            EventKind::Disconnected => "disconnected",
            EventKind::IncomingCall => "incoming_call",
            EventKind::RemoteStreamAdded => "remote_stream_added",
            EventKind::RemoteStreamRemoved => "remote_stream_removed",
            EventKind::RoomOpened => "room_opened",
            EventKind::RoomClosed => "room_closed",
            EventKind::PeerJoined => "peer_joined",
            EventKind::PeerLeft => "peer_left",
            EventKind::Error => "error",
            EventKind::Released => "released",
        }
    }
}

/// One normalized event delivered to the attached sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEvent {
    pub version: u16,
    #[serde(rename = "event")]
    pub kind: EventKind,
    /// Local identifier of the session that produced the event.
    pub peer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_peer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SessionEvent {
    /// Create an event with no optional fields.
    #[must_use]
    pub fn new(kind: EventKind, peer_id: impl Into<String>) -> Self {
        Self {
            version: EVENT_SCHEMA_VERSION,
            kind,
            peer_id: peer_id.into(),
            remote_peer_id: None,
            room: None,
            error: None,
        }
    }

    #[must_use]
    pub fn with_remote(mut self, remote_peer_id: impl Into<String>) -> Self {
        self.remote_peer_id = Some(remote_peer_id.into());
        self
    }

    #[must_use]
    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Serialize to the JSON wire form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Failure reported by a sink.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SinkError {
    /// The consumer is gone.
    #[error("sink closed")]
    Closed,
    /// The consumer is not keeping up.
    #[error("sink full")]
    Full,
}

/// The single external consumer of session events.
///
/// `deliver` is called with the bridge lock held and must not call back
/// into the controller.
pub trait EventSink: Send + Sync {
    fn deliver(&self, event: &SessionEvent) -> Result<(), SinkError>;
}

/// Sink backed by a bounded `tokio::sync::mpsc` channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::Sender<SessionEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver the consumer reads from.
    #[must_use]
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelSink {
    fn deliver(&self, event: &SessionEvent) -> Result<(), SinkError> {
        self.sender.try_send(event.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SinkError::Full,
            mpsc::error::TrySendError::Closed(_) => SinkError::Closed,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_omits_absent_fields() {
        let event = SessionEvent::new(EventKind::Connected, "alice");
        let json = event.to_json().unwrap();

        assert_eq!(json, r#"{"version":1,"event":"Connected","peerId":"alice"}"#);
    }

    #[test]
    fn test_event_json_field_names() {
        let event = SessionEvent::new(EventKind::PeerLeft, "alice")
            .with_remote("bob")
            .with_room("room1");
        let value: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();

        assert_eq!(value["event"], "PeerLeft");
        assert_eq!(value["peerId"], "alice");
        assert_eq!(value["remotePeerId"], "bob");
        assert_eq!(value["room"], "room1");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_event_parses_from_wire_form() {
        let json = r#"{"version":1,"event":"Error","peerId":"alice","error":"ice failed"}"#;
        let event: SessionEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.kind, EventKind::Error);
        assert_eq!(event.error.as_deref(), Some("ice failed"));
        assert!(event.remote_peer_id.is_none());
    }

    #[tokio::test]
    async fn test_channel_sink_delivers_in_order() {
        let (sink, mut rx) = ChannelSink::channel(8);

        sink.deliver(&SessionEvent::new(EventKind::Connected, "alice"))
            .unwrap();
        sink.deliver(&SessionEvent::new(EventKind::Released, "alice"))
            .unwrap();

        assert_eq!(rx.recv().await.unwrap().kind, EventKind::Connected);
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::Released);
    }

    #[test]
    fn test_channel_sink_reports_full_and_closed() {
        let (sink, rx) = ChannelSink::channel(1);
        let event = SessionEvent::new(EventKind::PeerJoined, "alice");

        assert!(sink.deliver(&event).is_ok());
        assert_eq!(sink.deliver(&event), Err(SinkError::Full));

        drop(rx);
        assert_eq!(sink.deliver(&event), Err(SinkError::Closed));
    }
}
