//! `SessionDirectory` - live session controllers keyed by local identifier.
//!
//! `connect` creates a peer through the [`PeerFactory`] and waits for the
//! engine to open it. Only then is a [`SessionController`] built and
//! registered under the identifier the engine assigned. A later peer
//! `Close` removes and releases that session.
//!
//! Controllers are always released after they have been taken out of the
//! map, never under the map lock: release calls back into the engine, and
//! the engine may call back into the directory.

use crate::config::Config;
use crate::controller::SessionController;
use crate::engine::{
    EngineError, Peer, PeerEvent, PeerEventHandler, PeerEventKind, PeerFactory, PeerOptions,
    RenderTargetRegistry, SubscriptionId,
};
use crate::errors::SessionError;
use crate::events::{ChannelSink, SessionEvent};
use crate::observability::metrics;

use parking_lot::Mutex;
use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

struct SessionEntry {
    controller: Arc<SessionController>,
    peer: Arc<dyn Peer>,
    close_subscription: SubscriptionId,
}

impl SessionEntry {
    fn release(self) {
        self.peer.unsubscribe(self.close_subscription);
        self.controller.release();
    }
}

type SessionMap = Mutex<HashMap<String, SessionEntry>>;

/// Connect-time state shared with the peer handler.
#[derive(Default)]
struct PendingPeer {
    reply: Option<oneshot::Sender<Result<String, EngineError>>>,
    controller: Option<Weak<SessionController>>,
    /// `Close` arrived after `Open` but before the controller was stored.
    closed: bool,
}

pub struct SessionDirectory {
    factory: Arc<dyn PeerFactory>,
    targets: Arc<dyn RenderTargetRegistry>,
    config: Config,
    sessions: Arc<SessionMap>,
}

impl SessionDirectory {
    #[must_use]
    pub fn new(
        factory: Arc<dyn PeerFactory>,
        targets: Arc<dyn RenderTargetRegistry>,
        config: Config,
    ) -> Self {
        Self {
            factory,
            targets,
            config,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Open a peer and register a controller for it.
    ///
    /// Returns the local identifier the engine assigned.
    ///
    /// # Errors
    ///
    /// - `InvalidApiKey` if the API key is empty
    /// - `Engine` if the factory refuses, or the peer errors or closes
    ///   before its session is registered
    /// - `ConnectTimeout` if the peer does not open in time; the half-open
    ///   peer is destroyed
    #[instrument(skip_all, name = "session.connect", fields(domain = %options.domain))]
    pub async fn connect(&self, options: PeerOptions) -> Result<String, SessionError> {
        if options.api_key.expose_secret().trim().is_empty() {
            return Err(SessionError::InvalidApiKey);
        }

        let peer = self.factory.create_peer(&options)?;

        let (reply_tx, reply_rx) = oneshot::channel();
        let pending = Arc::new(Mutex::new(PendingPeer {
            reply: Some(reply_tx),
            controller: None,
            closed: false,
        }));
        let handler = Self::peer_handler(&pending, Arc::downgrade(&self.sessions));

        let open_subscription = peer.subscribe(PeerEventKind::Open, Arc::clone(&handler));
        let error_subscription = peer.subscribe(PeerEventKind::Error, Arc::clone(&handler));
        let close_subscription = peer.subscribe(PeerEventKind::Close, handler);

        let outcome = tokio::time::timeout(self.config.connect_timeout(), reply_rx).await;

        peer.unsubscribe(open_subscription);
        peer.unsubscribe(error_subscription);

        let local_id = match outcome {
            Ok(Ok(Ok(local_id))) => local_id,
            Ok(Ok(Err(e))) => {
                warn!(target: "session.directory", error = %e, "Peer failed to open");
                Self::abandon(&peer, close_subscription);
                return Err(e.into());
            }
            Ok(Err(_)) => {
                Self::abandon(&peer, close_subscription);
                return Err(SessionError::Engine(
                    "peer dropped before opening".to_string(),
                ));
            }
            Err(_) => {
                warn!(
                    target: "session.directory",
                    timeout_seconds = self.config.connect_timeout_seconds,
                    "Peer did not open in time"
                );
                Self::abandon(&peer, close_subscription);
                return Err(SessionError::ConnectTimeout);
            }
        };

        let capture = self.factory.media_capture(&peer);
        let controller = SessionController::new(
            local_id.clone(),
            Arc::clone(&peer),
            capture,
            Arc::clone(&self.targets),
            self.config.media_constraints(),
        );
        let weak_controller = Arc::downgrade(&controller);

        let entry = SessionEntry {
            controller: Arc::clone(&controller),
            peer,
            close_subscription,
        };
        let (replaced, count) = {
            let mut sessions = self.sessions.lock();
            let replaced = sessions.insert(local_id.clone(), entry);
            (replaced, sessions.len())
        };
        if let Some(replaced) = replaced {
            warn!(
                target: "session.directory",
                peer_id = %local_id,
                "Replacing existing session with the same identifier"
            );
            replaced.release();
        }
        metrics::set_sessions_active(count);

        // Registered first, so a close seen from here on finds the entry.
        let closed_early = {
            let mut state = pending.lock();
            if state.closed {
                true
            } else {
                state.controller = Some(weak_controller);
                false
            }
        };
        if closed_early {
            warn!(
                target: "session.directory",
                peer_id = %local_id,
                "Peer closed while the session was being registered"
            );
            Self::remove_session(&self.sessions, &controller);
            return Err(SessionError::Engine(
                "peer closed while connecting".to_string(),
            ));
        }

        info!(
            target: "session.directory",
            peer_id = %local_id,
            active_sessions = count,
            "Session connected"
        );
        Ok(local_id)
    }

    /// Remove and release a session. Unknown identifiers are ignored.
    ///
    /// Returns whether a session was removed.
    #[instrument(skip_all, name = "session.disconnect", fields(peer_id = %local_id))]
    pub fn disconnect(&self, local_id: &str) -> bool {
        let (removed, count) = {
            let mut sessions = self.sessions.lock();
            let removed = sessions.remove(local_id);
            (removed, sessions.len())
        };
        match removed {
            Some(entry) => {
                entry.release();
                metrics::set_sessions_active(count);
                info!(
                    target: "session.directory",
                    peer_id = %local_id,
                    active_sessions = count,
                    "Session disconnected"
                );
                true
            }
            None => {
                debug!(
                    target: "session.directory",
                    peer_id = %local_id,
                    "Disconnect for unknown session"
                );
                false
            }
        }
    }

    #[must_use]
    pub fn get(&self, local_id: &str) -> Option<Arc<SessionController>> {
        self.sessions
            .lock()
            .get(local_id)
            .map(|entry| Arc::clone(&entry.controller))
    }

    /// Look up a session or fail with `SessionNotFound`.
    pub fn require(&self, local_id: &str) -> Result<Arc<SessionController>, SessionError> {
        self.get(local_id)
            .ok_or_else(|| SessionError::SessionNotFound(local_id.to_string()))
    }

    #[must_use]
    pub fn session_ids(&self) -> Vec<String> {
        self.sessions.lock().keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Attach a fresh channel consumer to a session.
    ///
    /// The receiver first yields `Connected`. Any previously attached
    /// consumer receives nothing more.
    pub fn subscribe_events(
        &self,
        local_id: &str,
    ) -> Result<mpsc::Receiver<SessionEvent>, SessionError> {
        let controller = self.require(local_id)?;
        let (sink, receiver) = ChannelSink::channel(self.config.event_buffer);
        controller.attach_sink(Arc::new(sink))?;
        Ok(receiver)
    }

    /// Release every session. Returns how many were released.
    pub fn release_all(&self) -> usize {
        let drained = std::mem::take(&mut *self.sessions.lock());
        let count = drained.len();
        for entry in drained.into_values() {
            entry.release();
        }
        metrics::set_sessions_active(0);
        if count > 0 {
            info!(
                target: "session.directory",
                released = count,
                "Released all sessions"
            );
        }
        count
    }

    fn abandon(peer: &Arc<dyn Peer>, close_subscription: SubscriptionId) {
        peer.unsubscribe(close_subscription);
        if !peer.is_destroyed() {
            peer.destroy();
        }
    }

    /// One handler for `Open`, `Error` and `Close`.
    ///
    /// Until the peer opens, the first of these completes the pending
    /// connect. Afterwards only `Close` matters: it removes the session,
    /// provided the map still holds this peer's controller.
    fn peer_handler(pending: &Arc<Mutex<PendingPeer>>, sessions: Weak<SessionMap>) -> PeerEventHandler {
        let pending = Arc::clone(pending);
        Arc::new(move |event| {
            let mut state = pending.lock();
            if let Some(reply) = state.reply.take() {
                let result = match event {
                    PeerEvent::Open(local_id) => Ok(local_id),
                    PeerEvent::Error(e) => Err(e),
                    PeerEvent::Close => Err(EngineError("peer closed before opening".to_string())),
                    PeerEvent::Call(_) | PeerEvent::Disconnected => {
                        state.reply = Some(reply);
                        return;
                    }
                };
                // The connect future may already have timed out.
                let _ = reply.send(result);
                return;
            }

            if !matches!(event, PeerEvent::Close) {
                return;
            }
            let Some(weak) = state.controller.take() else {
                // Opened but not yet registered; connect() sees the flag.
                state.closed = true;
                return;
            };
            drop(state);

            let (Some(controller), Some(sessions)) = (weak.upgrade(), sessions.upgrade()) else {
                return;
            };
            if Self::remove_session(&sessions, &controller) {
                info!(
                    target: "session.directory",
                    peer_id = %controller.local_id(),
                    "Peer closed, releasing session"
                );
            }
        })
    }

    /// Remove and release the entry for `controller`, provided the map still
    /// holds that controller and not a replacement.
    fn remove_session(sessions: &SessionMap, controller: &Arc<SessionController>) -> bool {
        let local_id = controller.local_id();
        let (removed, count) = {
            let mut map = sessions.lock();
            let is_ours = map
                .get(local_id)
                .is_some_and(|entry| Arc::ptr_eq(&entry.controller, controller));
            let removed = if is_ours { map.remove(local_id) } else { None };
            (removed, map.len())
        };
        match removed {
            Some(entry) => {
                entry.release();
                metrics::set_sessions_active(count);
                true
            }
            None => false,
        }
    }
}
