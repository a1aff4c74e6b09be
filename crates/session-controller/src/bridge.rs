//! `EventBridge` - delivers normalized events to the single attached sink.
//!
//! The bridge is a replaceable single-subscriber slot. Attach, detach and
//! emit all serialize on one mutex, so events reach the sink in the order
//! they were emitted and never after a detach.

use crate::errors::SessionError;
use crate::events::{EventKind, EventSink, SessionEvent};
use crate::observability::metrics;

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct EventBridge {
    local_id: String,
    sink: Mutex<Option<Arc<dyn EventSink>>>,
}

impl EventBridge {
    #[must_use]
    pub fn new(local_id: impl Into<String>) -> Self {
        Self {
            local_id: local_id.into(),
            sink: Mutex::new(None),
        }
    }

    /// Local identifier stamped on every event.
    #[must_use]
    pub fn local_id(&self) -> &str {
        &self.local_id
    }

    /// Build an event for this session.
    #[must_use]
    pub fn event(&self, kind: EventKind) -> SessionEvent {
        SessionEvent::new(kind, self.local_id.clone())
    }

    /// Make `sink` the sole consumer and send it `Connected`.
    ///
    /// Any previously attached sink is dropped silently. The error, if any,
    /// is the delivery result of the `Connected` handshake.
    pub fn attach(&self, sink: Arc<dyn EventSink>) -> Result<(), SessionError> {
        let mut slot = self.sink.lock();
        if slot.is_some() {
            debug!(
                target: "session.bridge",
                peer_id = %self.local_id,
                "Replacing attached sink"
            );
        }
        let sink = slot.insert(sink);
        Self::deliver(sink.as_ref(), &self.event(EventKind::Connected))
    }

    /// Clear the consumer. No event is sent. Returns whether one was attached.
    pub fn detach(&self) -> bool {
        self.sink.lock().take().is_some()
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.sink.lock().is_some()
    }

    /// Deliver an event, failing if no sink is attached or delivery fails.
    pub fn emit(&self, event: SessionEvent) -> Result<(), SessionError> {
        let slot = self.sink.lock();
        match slot.as_ref() {
            Some(sink) => Self::deliver(sink.as_ref(), &event),
            None => {
                metrics::record_event_dropped(event.kind);
                Err(SessionError::SinkNotAttached)
            }
        }
    }

    /// Best-effort delivery for asynchronous notifications.
    pub fn notify(&self, event: SessionEvent) {
        let kind = event.kind;
        if let Err(e) = self.emit(event) {
            debug!(
                target: "session.bridge",
                peer_id = %self.local_id,
                kind = kind.as_str(),
                error = %e,
                "Dropped session event"
            );
        }
    }

    /// Deliver a final event, then detach, without letting another event in
    /// between. Returns whether a sink was attached.
    pub fn finish(&self, event: SessionEvent) -> bool {
        let mut slot = self.sink.lock();
        match slot.take() {
            Some(sink) => {
                if let Err(e) = Self::deliver(sink.as_ref(), &event) {
                    debug!(
                        target: "session.bridge",
                        peer_id = %self.local_id,
                        kind = event.kind.as_str(),
                        error = %e,
                        "Final event not delivered"
                    );
                }
                true
            }
            None => false,
        }
    }

    fn deliver(sink: &dyn EventSink, event: &SessionEvent) -> Result<(), SessionError> {
        match sink.deliver(event) {
            Ok(()) => {
                metrics::record_event_delivered(event.kind);
                Ok(())
            }
            Err(e) => {
                warn!(
                    target: "session.bridge",
                    peer_id = %event.peer_id,
                    kind = event.kind.as_str(),
                    error = %e,
                    "Sink refused event"
                );
                metrics::record_event_dropped(event.kind);
                Err(SessionError::Delivery(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::events::ChannelSink;

    #[test]
    fn test_attach_sends_connected() {
        let bridge = EventBridge::new("alice");
        let (sink, mut rx) = ChannelSink::channel(8);

        bridge.attach(Arc::new(sink)).unwrap();

        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind, EventKind::Connected);
        assert_eq!(event.peer_id, "alice");
        assert!(bridge.is_attached());
    }

    #[test]
    fn test_emit_without_sink_fails_sink_not_attached() {
        let bridge = EventBridge::new("alice");

        let result = bridge.emit(bridge.event(EventKind::PeerJoined));
        assert!(matches!(result, Err(SessionError::SinkNotAttached)));

        // Best-effort path swallows the same failure.
        bridge.notify(bridge.event(EventKind::PeerJoined));
    }

    #[test]
    fn test_detach_is_silent() {
        let bridge = EventBridge::new("alice");
        let (sink, mut rx) = ChannelSink::channel(8);
        bridge.attach(Arc::new(sink)).unwrap();
        let _connected = rx.try_recv().unwrap();

        assert!(bridge.detach());
        assert!(!bridge.detach());
        assert!(rx.try_recv().is_err());

        bridge.notify(bridge.event(EventKind::PeerLeft));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_new_attach_replaces_previous_sink() {
        let bridge = EventBridge::new("alice");
        let (first, mut first_rx) = ChannelSink::channel(8);
        let (second, mut second_rx) = ChannelSink::channel(8);

        bridge.attach(Arc::new(first)).unwrap();
        bridge.attach(Arc::new(second)).unwrap();
        bridge
            .emit(bridge.event(EventKind::RoomOpened).with_room("room1"))
            .unwrap();

        assert_eq!(first_rx.try_recv().unwrap().kind, EventKind::Connected);
        assert!(first_rx.try_recv().is_err());

        assert_eq!(second_rx.try_recv().unwrap().kind, EventKind::Connected);
        let opened = second_rx.try_recv().unwrap();
        assert_eq!(opened.kind, EventKind::RoomOpened);
        assert_eq!(opened.room.as_deref(), Some("room1"));
    }

    #[test]
    fn test_finish_delivers_then_detaches() {
        let bridge = EventBridge::new("alice");
        let (sink, mut rx) = ChannelSink::channel(8);
        bridge.attach(Arc::new(sink)).unwrap();

        assert!(bridge.finish(bridge.event(EventKind::Released)));
        assert!(!bridge.finish(bridge.event(EventKind::Released)));

        assert_eq!(rx.try_recv().unwrap().kind, EventKind::Connected);
        assert_eq!(rx.try_recv().unwrap().kind, EventKind::Released);
        assert!(rx.try_recv().is_err());
        assert!(!bridge.is_attached());
    }

    #[test]
    fn test_delivery_failure_is_reported() {
        let bridge = EventBridge::new("alice");
        let (sink, rx) = ChannelSink::channel(8);
        bridge.attach(Arc::new(sink)).unwrap();
        drop(rx);

        let result = bridge.emit(bridge.event(EventKind::Error).with_error("boom"));
        assert!(matches!(result, Err(SessionError::Delivery(_))));
    }
}
