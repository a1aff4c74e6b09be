//! Event sink that keeps every delivered event for later assertions.

use session_controller::events::{EventKind, EventSink, SessionEvent, SinkError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SessionEvent>>,
    refuse: AtomicBool,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make later deliveries fail as if the consumer were gone.
    pub fn refuse(&self) {
        self.refuse.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().unwrap().clone()
    }

    #[must_use]
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().iter().map(|e| e.kind).collect()
    }

    /// Events of `kind`, in delivery order.
    #[must_use]
    pub fn of_kind(&self, kind: EventKind) -> Vec<SessionEvent> {
        self.events().into_iter().filter(|e| e.kind == kind).collect()
    }

    #[must_use]
    pub fn count(&self, kind: EventKind) -> usize {
        self.of_kind(kind).len()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl EventSink for RecordingSink {
    fn deliver(&self, event: &SessionEvent) -> Result<(), SinkError> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(SinkError::Closed);
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}
