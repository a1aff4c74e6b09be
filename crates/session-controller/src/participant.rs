//! `RemoteParticipant` - one remote stream and its optional render binding.
//!
//! The participant owns the bind/unbind discipline for its stream: a target
//! is always unbound before another is bound, and before the stream is
//! closed, so nothing renders into a disposed target.

use crate::bridge::EventBridge;
use crate::engine::{MediaStream, RenderTarget, RenderTargetId};
use crate::events::EventKind;

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

pub struct RemoteParticipant {
    remote_id: String,
    stream: Arc<dyn MediaStream>,
    target: Mutex<Option<Arc<dyn RenderTarget>>>,
    released: AtomicBool,
    bridge: Arc<EventBridge>,
}

impl RemoteParticipant {
    #[must_use]
    pub fn new(
        remote_id: impl Into<String>,
        stream: Arc<dyn MediaStream>,
        bridge: Arc<EventBridge>,
    ) -> Self {
        Self {
            remote_id: remote_id.into(),
            stream,
            target: Mutex::new(None),
            released: AtomicBool::new(false),
            bridge,
        }
    }

    #[must_use]
    pub fn remote_id(&self) -> &str {
        &self.remote_id
    }

    #[must_use]
    pub fn stream(&self) -> &Arc<dyn MediaStream> {
        &self.stream
    }

    /// Id of the currently bound target, if any.
    #[must_use]
    pub fn bound_target(&self) -> Option<RenderTargetId> {
        self.target.lock().as_ref().map(|t| t.id())
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Render the stream into `target`.
    ///
    /// No-op if `target` is already bound or the participant was released.
    /// Returns whether any renderer was attached.
    pub fn bind(&self, target: Arc<dyn RenderTarget>) -> bool {
        let mut slot = self.target.lock();
        if self.is_released() {
            debug!(
                target: "session.participant",
                remote_peer_id = %self.remote_id,
                "Bind ignored, participant already released"
            );
            return false;
        }
        if slot.as_ref().is_some_and(|current| current.id() == target.id()) {
            return false;
        }
        if let Some(previous) = slot.take() {
            self.stream.remove_renderer(&previous);
        }
        self.stream.add_renderer(&target);
        trace!(
            target: "session.participant",
            remote_peer_id = %self.remote_id,
            render_target = %target.id(),
            "Bound render target"
        );
        *slot = Some(target);
        true
    }

    /// Unbind, close the stream and announce `RemoteStreamRemoved`.
    ///
    /// Idempotent; returns `false` if already released.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::SeqCst) {
            return false;
        }

        if let Some(target) = self.target.lock().take() {
            self.stream.remove_renderer(&target);
        }
        self.stream.close();

        debug!(
            target: "session.participant",
            remote_peer_id = %self.remote_id,
            "Remote participant released"
        );

        self.bridge.notify(
            self.bridge
                .event(EventKind::RemoteStreamRemoved)
                .with_remote(self.remote_id.clone()),
        );
        true
    }
}
