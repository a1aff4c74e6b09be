//! `SessionController` - per-identity call/room state machine.
//!
//! Owns the local capture stream, at most one direct connection or one room
//! (never both), the remote participant registry and the event bridge.
//!
//! # Concurrency
//!
//! Engine callbacks arrive on threads we do not control, possibly while a
//! host command is running. The call state sits behind one mutex that is
//! never held across an engine call, a participant release or an event
//! emission: state is taken out under the lock and acted on after it is
//! dropped. State-mutating commands are expected to be serialized by the
//! host (see [`crate::host`]).
//!
//! Every direct connection and room gets a fresh token. Handlers carry the
//! token they were registered with and drop events whose token is no longer
//! current, and the old connection/room is always unsubscribed before its
//! replacement is created.

use crate::bridge::EventBridge;
use crate::engine::{
    MediaCapture, MediaConnection, MediaConstraints, MediaEvent, MediaEventHandler,
    MediaEventKind, MediaStream, Peer, PeerEvent, PeerEventHandler, PeerEventKind, RenderTarget,
    RenderTargetId, RenderTargetRegistry, Room, RoomEvent, RoomEventHandler, RoomEventKind,
    RoomMode, RoomOptions, SubscriptionId,
};
use crate::errors::SessionError;
use crate::events::{EventKind, EventSink};
use crate::participant::RemoteParticipant;
use crate::registry::ParticipantRegistry;

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};

const MEDIA_EVENT_KINDS: [MediaEventKind; 3] = [
    MediaEventKind::Stream,
    MediaEventKind::Close,
    MediaEventKind::Error,
];

const ROOM_EVENT_KINDS: [RoomEventKind; 7] = [
    RoomEventKind::Open,
    RoomEventKind::Close,
    RoomEventKind::Error,
    RoomEventKind::PeerJoin,
    RoomEventKind::PeerLeave,
    RoomEventKind::Stream,
    RoomEventKind::RemoveStream,
];

const PEER_EVENT_KINDS: [PeerEventKind; 3] = [
    PeerEventKind::Disconnected,
    PeerEventKind::Call,
    PeerEventKind::Error,
];

/// Current call mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    None,
    DirectCall,
    Room,
}

struct ActiveConnection {
    connection: Arc<dyn MediaConnection>,
    token: u64,
    subscriptions: Vec<SubscriptionId>,
}

impl ActiveConnection {
    /// Unsubscribe first so no late callback sees the close.
    fn teardown(self) {
        for id in self.subscriptions {
            self.connection.unsubscribe(id);
        }
        if self.connection.is_open() {
            self.connection.close();
        }
    }
}

struct ActiveRoom {
    room: Arc<dyn Room>,
    token: u64,
    subscriptions: Vec<SubscriptionId>,
    name: String,
    mode: RoomMode,
    /// `leave` closed the room; waiting for the engine's close event.
    leaving: bool,
}

impl ActiveRoom {
    fn teardown(self) {
        for id in self.subscriptions {
            self.room.unsubscribe(id);
        }
        if !self.leaving {
            self.room.close();
        }
    }
}

/// Which connection or room delivered a remote stream.
#[derive(Debug, Clone, Copy)]
enum StreamSource {
    Direct(u64),
    Room(u64),
}

#[derive(Default)]
struct CallState {
    local_stream: Option<Arc<dyn MediaStream>>,
    local_target: Option<Arc<dyn RenderTarget>>,
    direct: Option<ActiveConnection>,
    room: Option<ActiveRoom>,
}

pub struct SessionController {
    local_id: String,
    peer: Arc<dyn Peer>,
    capture: Arc<dyn MediaCapture>,
    targets: Arc<dyn RenderTargetRegistry>,
    constraints: MediaConstraints,
    bridge: Arc<EventBridge>,
    registry: ParticipantRegistry,
    state: Mutex<CallState>,
    peer_subscriptions: Mutex<Vec<SubscriptionId>>,
    next_token: AtomicU64,
    released: AtomicBool,
    weak_self: Weak<SessionController>,
}

impl SessionController {
    /// Create a controller over an already-open peer and subscribe to its
    /// call and disconnect events.
    pub fn new(
        local_id: impl Into<String>,
        peer: Arc<dyn Peer>,
        capture: Arc<dyn MediaCapture>,
        targets: Arc<dyn RenderTargetRegistry>,
        constraints: MediaConstraints,
    ) -> Arc<Self> {
        let local_id = local_id.into();
        let bridge = Arc::new(EventBridge::new(local_id.clone()));

        let controller = Arc::new_cyclic(|weak_self| Self {
            local_id,
            peer,
            capture,
            targets,
            constraints,
            registry: ParticipantRegistry::new(Arc::clone(&bridge)),
            bridge,
            state: Mutex::new(CallState::default()),
            peer_subscriptions: Mutex::new(Vec::new()),
            next_token: AtomicU64::new(1),
            released: AtomicBool::new(false),
            weak_self: weak_self.clone(),
        });

        let ids: Vec<SubscriptionId> = PEER_EVENT_KINDS
            .into_iter()
            .map(|kind| controller.peer.subscribe(kind, controller.peer_handler()))
            .collect();
        *controller.peer_subscriptions.lock() = ids;

        info!(
            target: "session.controller",
            peer_id = %controller.local_id,
            "Session controller created"
        );
        controller
    }

    // ------------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------------

    #[must_use]
    pub fn local_id(&self) -> &str {
        &self.local_id
    }

    #[must_use]
    pub fn call_mode(&self) -> CallMode {
        let state = self.state.lock();
        if state.direct.is_some() {
            CallMode::DirectCall
        } else if state.room.as_ref().is_some_and(|r| !r.leaving) {
            CallMode::Room
        } else {
            CallMode::None
        }
    }

    #[must_use]
    pub fn has_local_stream(&self) -> bool {
        self.state.lock().local_stream.is_some()
    }

    #[must_use]
    pub fn local_target(&self) -> Option<RenderTargetId> {
        self.state.lock().local_target.as_ref().map(|t| t.id())
    }

    /// Name of the joined room; `None` after `leave`.
    #[must_use]
    pub fn room_name(&self) -> Option<String> {
        self.state
            .lock()
            .room
            .as_ref()
            .filter(|r| !r.leaving)
            .map(|r| r.name.clone())
    }

    #[must_use]
    pub fn room_mode(&self) -> Option<RoomMode> {
        self.state
            .lock()
            .room
            .as_ref()
            .filter(|r| !r.leaving)
            .map(|r| r.mode)
    }

    /// Identifier of the remote side of the active direct connection.
    #[must_use]
    pub fn direct_remote(&self) -> Option<String> {
        self.state
            .lock()
            .direct
            .as_ref()
            .map(|d| d.connection.remote_identifier())
    }

    #[must_use]
    pub fn participant(&self, remote_id: &str) -> Option<Arc<RemoteParticipant>> {
        self.registry.lookup(remote_id)
    }

    #[must_use]
    pub fn remote_ids(&self) -> Vec<String> {
        self.registry.remote_ids()
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Whether the underlying peer is live and the session not released.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        !self.is_released() && self.peer.is_connected()
    }

    // ------------------------------------------------------------------------
    // Consumer attachment
    // ------------------------------------------------------------------------

    /// Attach the sole event consumer; it immediately receives `Connected`.
    pub fn attach_sink(&self, sink: Arc<dyn EventSink>) -> Result<(), SessionError> {
        if self.is_released() {
            return Err(SessionError::NotReady("session already released".to_string()));
        }
        self.bridge.attach(sink)
    }

    /// Detach the consumer without sending anything.
    pub fn detach_sink(&self) -> bool {
        self.bridge.detach()
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Start local capture (if needed) and render it into `target_id`.
    ///
    /// Same target again is a no-op; a different target rebinds without
    /// re-acquiring the stream.
    #[instrument(skip_all, name = "session.start_local_stream", fields(peer_id = %self.local_id, render_target = %target_id))]
    pub fn start_local_stream(&self, target_id: RenderTargetId) -> Result<(), SessionError> {
        if self.is_released() {
            return Err(SessionError::NotReady("session already released".to_string()));
        }

        let existing = {
            let state = self.state.lock();
            if state.local_stream.is_some()
                && state.local_target.as_ref().is_some_and(|t| t.id() == target_id)
            {
                return Ok(());
            }
            state.local_stream.clone()
        };

        let stream = match existing {
            Some(stream) => stream,
            None => {
                let acquired = self.capture.acquire(&self.constraints)?;
                info!(
                    target: "session.controller",
                    peer_id = %self.local_id,
                    max_width = self.constraints.max_width,
                    max_height = self.constraints.max_height,
                    "Local stream acquired"
                );
                self.state
                    .lock()
                    .local_stream
                    .get_or_insert(acquired)
                    .clone()
            }
        };

        let target = self
            .targets
            .resolve(target_id)
            .ok_or(SessionError::TargetNotFound(target_id))?;

        let previous = self.state.lock().local_target.replace(Arc::clone(&target));
        if let Some(previous) = previous {
            stream.remove_renderer(&previous);
        }
        stream.add_renderer(&target);
        Ok(())
    }

    /// Render the stream of `remote_id` into `target_id`.
    #[instrument(skip_all, name = "session.start_remote_stream", fields(peer_id = %self.local_id, remote_peer_id = %remote_id))]
    pub fn start_remote_stream(
        &self,
        target_id: RenderTargetId,
        remote_id: &str,
    ) -> Result<(), SessionError> {
        let participant = self
            .registry
            .lookup(remote_id)
            .ok_or_else(|| SessionError::ParticipantNotFound(remote_id.to_string()))?;
        let target = self
            .targets
            .resolve(target_id)
            .ok_or(SessionError::TargetNotFound(target_id))?;

        participant.bind(target);
        Ok(())
    }

    /// Place a direct call, tearing down any active call or room first.
    #[instrument(skip_all, name = "session.start_call", fields(peer_id = %self.local_id, remote_peer_id = %remote_id))]
    pub fn start_call(&self, remote_id: &str) -> Result<(), SessionError> {
        let local_stream = self.ready_stream()?;

        self.teardown_active();

        let connection = self
            .peer
            .call(remote_id, local_stream)
            .ok_or_else(|| SessionError::Engine(format!("call to {remote_id} was refused")))?;
        self.install_connection(connection);

        info!(
            target: "session.controller",
            peer_id = %self.local_id,
            remote_peer_id = %remote_id,
            "Direct call started"
        );
        Ok(())
    }

    /// Join `room_name` in `mode`. No-op if already there in the same mode.
    #[instrument(skip_all, name = "session.join", fields(peer_id = %self.local_id, room = %room_name, mode = mode.as_str()))]
    pub fn join(&self, room_name: &str, mode: RoomMode) -> Result<(), SessionError> {
        let local_stream = self.ready_stream()?;

        let already_joined = self
            .state
            .lock()
            .room
            .as_ref()
            .is_some_and(|r| !r.leaving && r.name == room_name && r.mode == mode);
        if already_joined {
            debug!(
                target: "session.controller",
                peer_id = %self.local_id,
                room = %room_name,
                "Already in room"
            );
            return Ok(());
        }

        self.teardown_active();

        let room = self
            .peer
            .join_room(
                room_name,
                RoomOptions {
                    mode,
                    stream: Some(local_stream),
                },
            )
            .ok_or_else(|| SessionError::Engine(format!("join of {room_name} was refused")))?;
        self.install_room(room, room_name, mode);

        info!(
            target: "session.controller",
            peer_id = %self.local_id,
            room = %room_name,
            mode = mode.as_str(),
            "Joined room"
        );
        Ok(())
    }

    /// Close the active room, if connected.
    ///
    /// Only one room is ever active, so `room_name` is not used to select
    /// one. Cleanup finishes when the engine reports the room closed.
    #[instrument(skip_all, name = "session.leave", fields(peer_id = %self.local_id, room = %room_name))]
    pub fn leave(&self, room_name: &str) {
        if !self.is_connected() {
            return;
        }
        let room = {
            let mut state = self.state.lock();
            match state.room.as_mut() {
                Some(active) if !active.leaving => {
                    active.leaving = true;
                    Some(Arc::clone(&active.room))
                }
                _ => None,
            }
        };
        if let Some(room) = room {
            debug!(
                target: "session.controller",
                peer_id = %self.local_id,
                "Leaving room"
            );
            room.close();
        }
    }

    /// End the call or leave the room. Local capture keeps running.
    #[instrument(skip_all, name = "session.hang_up", fields(peer_id = %self.local_id))]
    pub fn hang_up(&self) {
        let direct = self.state.lock().direct.take();
        if let Some(direct) = direct {
            direct.teardown();
        }
        self.registry.drain_all();

        if let Some(room_name) = self.room_name() {
            self.leave(&room_name);
        }
    }

    /// Asynchronously list every known identity except our own.
    ///
    /// Not connected means an empty list, delivered immediately.
    pub fn list_all_peers<F>(&self, callback: F)
    where
        F: FnOnce(Vec<String>) + Send + 'static,
    {
        if !self.is_connected() {
            callback(Vec::new());
            return;
        }
        let local_id = self.local_id.clone();
        self.peer.list_all_peers(Box::new(move |ids: Vec<String>| {
            callback(ids.into_iter().filter(|id| *id != local_id).collect());
        }));
    }

    /// Async form of [`Self::list_all_peers`].
    ///
    /// An engine that drops the callback yields an empty list.
    pub async fn fetch_all_peers(&self) -> Vec<String> {
        let (tx, rx) = oneshot::channel();
        self.list_all_peers(move |ids| {
            let _ = tx.send(ids);
        });
        rx.await.unwrap_or_default()
    }

    /// Tear everything down. Idempotent and safe from any state.
    #[instrument(skip_all, name = "session.release", fields(peer_id = %self.local_id))]
    pub fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            debug!(
                target: "session.controller",
                peer_id = %self.local_id,
                "Already released"
            );
            return;
        }

        let remotes = self.registry.drain_all();

        let (local_stream, local_target, direct, room) = {
            let mut state = self.state.lock();
            (
                state.local_stream.take(),
                state.local_target.take(),
                state.direct.take(),
                state.room.take(),
            )
        };

        if let Some(stream) = local_stream {
            if let Some(target) = local_target {
                stream.remove_renderer(&target);
            }
            stream.close();
        }
        if let Some(direct) = direct {
            direct.teardown();
        }
        if let Some(room) = room {
            room.teardown();
        }

        self.capture.terminate();

        let peer_subscriptions = std::mem::take(&mut *self.peer_subscriptions.lock());
        for id in peer_subscriptions {
            self.peer.unsubscribe(id);
        }
        if !self.peer.is_disconnected() {
            self.peer.disconnect();
        }
        if !self.peer.is_destroyed() {
            self.peer.destroy();
        }

        self.bridge.finish(self.bridge.event(EventKind::Released));

        info!(
            target: "session.controller",
            peer_id = %self.local_id,
            remote_participants = remotes,
            "Session released"
        );
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    /// Check the call preconditions and return the local stream.
    fn ready_stream(&self) -> Result<Arc<dyn MediaStream>, SessionError> {
        if self.is_released() {
            return Err(SessionError::NotReady("session already released".to_string()));
        }
        if !self.peer.is_connected() {
            return Err(SessionError::NotReady("peer not connected".to_string()));
        }
        self.state
            .lock()
            .local_stream
            .clone()
            .ok_or_else(|| SessionError::NotReady("local stream not started".to_string()))
    }

    fn next_token(&self) -> u64 {
        self.next_token.fetch_add(1, Ordering::Relaxed)
    }

    /// Unsubscribe and close the active connection and room, then release
    /// their remote participants.
    fn teardown_active(&self) {
        let (direct, room) = {
            let mut state = self.state.lock();
            (state.direct.take(), state.room.take())
        };
        let had_active = direct.is_some() || room.is_some();

        if let Some(direct) = direct {
            debug!(
                target: "session.controller",
                peer_id = %self.local_id,
                "Tearing down direct connection"
            );
            direct.teardown();
        }
        if let Some(room) = room {
            debug!(
                target: "session.controller",
                peer_id = %self.local_id,
                room = %room.name,
                "Tearing down room"
            );
            room.teardown();
        }
        if had_active {
            self.registry.drain_all();
        }
    }

    /// Make `connection` the active direct connection and subscribe to it.
    fn install_connection(&self, connection: Arc<dyn MediaConnection>) {
        let token = self.next_token();
        self.state.lock().direct = Some(ActiveConnection {
            connection: Arc::clone(&connection),
            token,
            subscriptions: Vec::new(),
        });

        let ids: Vec<SubscriptionId> = MEDIA_EVENT_KINDS
            .into_iter()
            .map(|kind| connection.subscribe(kind, self.media_handler(token)))
            .collect();

        let stale = {
            let mut state = self.state.lock();
            match state.direct.as_mut() {
                Some(active) if active.token == token => {
                    active.subscriptions = ids;
                    None
                }
                _ => Some(ids),
            }
        };
        // Superseded while subscribing.
        if let Some(ids) = stale {
            for id in ids {
                connection.unsubscribe(id);
            }
        }
    }

    /// Make `room` the active room and subscribe to it.
    fn install_room(&self, room: Arc<dyn Room>, name: &str, mode: RoomMode) {
        let token = self.next_token();
        self.state.lock().room = Some(ActiveRoom {
            room: Arc::clone(&room),
            token,
            subscriptions: Vec::new(),
            name: name.to_string(),
            mode,
            leaving: false,
        });

        let ids: Vec<SubscriptionId> = ROOM_EVENT_KINDS
            .into_iter()
            .map(|kind| room.subscribe(kind, self.room_handler(token)))
            .collect();

        let stale = {
            let mut state = self.state.lock();
            match state.room.as_mut() {
                Some(active) if active.token == token => {
                    active.subscriptions = ids;
                    None
                }
                _ => Some(ids),
            }
        };
        if let Some(ids) = stale {
            for id in ids {
                room.unsubscribe(id);
            }
        }
    }

    fn peer_handler(&self) -> PeerEventHandler {
        let weak = self.weak_self.clone();
        Arc::new(move |event| {
            if let Some(controller) = weak.upgrade() {
                controller.on_peer_event(event);
            }
        })
    }

    fn media_handler(&self, token: u64) -> MediaEventHandler {
        let weak = self.weak_self.clone();
        Arc::new(move |event| {
            if let Some(controller) = weak.upgrade() {
                controller.on_media_event(token, event);
            }
        })
    }

    fn room_handler(&self, token: u64) -> RoomEventHandler {
        let weak = self.weak_self.clone();
        Arc::new(move |event| {
            if let Some(controller) = weak.upgrade() {
                controller.on_room_event(token, event);
            }
        })
    }

    fn is_current_direct(&self, token: u64) -> bool {
        self.state
            .lock()
            .direct
            .as_ref()
            .is_some_and(|d| d.token == token)
    }

    fn is_current_room(&self, token: u64) -> bool {
        self.state
            .lock()
            .room
            .as_ref()
            .is_some_and(|r| r.token == token)
    }

    fn is_current(&self, source: StreamSource) -> bool {
        match source {
            StreamSource::Direct(token) => self.is_current_direct(token),
            StreamSource::Room(token) => self.is_current_room(token),
        }
    }

    /// Register a remote stream delivered by `source`.
    ///
    /// The source is checked again after the insert: a teardown that ran
    /// while the callback was in flight has already drained the registry.
    fn track_remote_stream(&self, source: StreamSource, stream: Arc<dyn MediaStream>) {
        let remote_id = stream.peer_identifier();
        let participant = self.registry.upsert(&remote_id, stream);
        if self.is_released() || !self.is_current(source) {
            debug!(
                target: "session.controller",
                peer_id = %self.local_id,
                remote_peer_id = %remote_id,
                "Dropping stream from superseded connection"
            );
            self.registry.withdraw(&participant);
        }
    }

    fn on_peer_event(&self, event: PeerEvent) {
        if self.is_released() {
            return;
        }
        match event {
            PeerEvent::Disconnected => {
                info!(
                    target: "session.controller",
                    peer_id = %self.local_id,
                    "Peer disconnected"
                );
                self.bridge.notify(self.bridge.event(EventKind::Disconnected));
            }
            PeerEvent::Call(connection) => self.on_incoming_call(connection),
            PeerEvent::Error(e) => {
                warn!(
                    target: "session.controller",
                    peer_id = %self.local_id,
                    error = %e,
                    "Peer error"
                );
                self.bridge
                    .notify(self.bridge.event(EventKind::Error).with_error(e.0));
            }
            PeerEvent::Open(_) | PeerEvent::Close => {}
        }
    }

    /// Auto-answer an inbound call with the local stream.
    ///
    /// Without a local stream the answer is receive-only, so the session is
    /// in `DirectCall` while `has_local_stream()` is false.
    fn on_incoming_call(&self, connection: Arc<dyn MediaConnection>) {
        let remote_id = connection.remote_identifier();
        info!(
            target: "session.controller",
            peer_id = %self.local_id,
            remote_peer_id = %remote_id,
            "Incoming call, answering"
        );

        self.teardown_active();
        self.install_connection(Arc::clone(&connection));

        let local_stream = self.state.lock().local_stream.clone();
        connection.answer(local_stream);

        self.bridge.notify(
            self.bridge
                .event(EventKind::IncomingCall)
                .with_remote(remote_id),
        );
    }

    fn on_media_event(&self, token: u64, event: MediaEvent) {
        if self.is_released() || !self.is_current_direct(token) {
            debug!(
                target: "session.controller",
                peer_id = %self.local_id,
                kind = ?event.kind(),
                "Ignoring event from superseded connection"
            );
            return;
        }
        match event {
            MediaEvent::Stream(stream) => {
                self.track_remote_stream(StreamSource::Direct(token), stream);
            }
            MediaEvent::Close(remote_id) => {
                self.registry.remove(&remote_id);
                let closed = {
                    let mut state = self.state.lock();
                    if state.direct.as_ref().is_some_and(|d| d.token == token) {
                        state.direct.take()
                    } else {
                        None
                    }
                };
                if let Some(closed) = closed {
                    closed.teardown();
                }
                info!(
                    target: "session.controller",
                    peer_id = %self.local_id,
                    remote_peer_id = %remote_id,
                    "Direct call closed"
                );
                self.bridge.notify(self.bridge.event(EventKind::Disconnected));
            }
            MediaEvent::Error(e) => {
                warn!(
                    target: "session.controller",
                    peer_id = %self.local_id,
                    error = %e,
                    "Media connection error"
                );
                self.bridge
                    .notify(self.bridge.event(EventKind::Error).with_error(e.0));
            }
        }
    }

    fn on_room_event(&self, token: u64, event: RoomEvent) {
        if self.is_released() || !self.is_current_room(token) {
            debug!(
                target: "session.controller",
                peer_id = %self.local_id,
                kind = ?event.kind(),
                "Ignoring event from superseded room"
            );
            return;
        }
        match event {
            RoomEvent::Open(name) => {
                self.bridge
                    .notify(self.bridge.event(EventKind::RoomOpened).with_room(name));
            }
            RoomEvent::Close(name) => {
                self.registry.drain_all();
                let closed = {
                    let mut state = self.state.lock();
                    if state.room.as_ref().is_some_and(|r| r.token == token) {
                        state.room.take()
                    } else {
                        None
                    }
                };
                if let Some(mut closed) = closed {
                    // The engine already closed it.
                    closed.leaving = true;
                    closed.teardown();
                }
                info!(
                    target: "session.controller",
                    peer_id = %self.local_id,
                    room = %name,
                    "Room closed"
                );
                self.bridge
                    .notify(self.bridge.event(EventKind::RoomClosed).with_room(name));
            }
            RoomEvent::Error(e) => {
                warn!(
                    target: "session.controller",
                    peer_id = %self.local_id,
                    error = %e,
                    "Room error"
                );
                self.bridge
                    .notify(self.bridge.event(EventKind::Error).with_error(e.0));
            }
            RoomEvent::PeerJoin(remote_id) => {
                self.bridge.notify(
                    self.bridge
                        .event(EventKind::PeerJoined)
                        .with_remote(remote_id),
                );
            }
            RoomEvent::PeerLeave(remote_id) => {
                self.bridge.notify(
                    self.bridge
                        .event(EventKind::PeerLeft)
                        .with_remote(remote_id.clone()),
                );
                self.registry.remove(&remote_id);
            }
            RoomEvent::Stream(stream) => {
                self.track_remote_stream(StreamSource::Room(token), stream);
            }
            RoomEvent::RemoveStream(stream) => {
                self.registry.remove(&stream.peer_identifier());
            }
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if !self.released.load(Ordering::SeqCst) {
            warn!(
                target: "session.controller",
                peer_id = %self.local_id,
                "Session controller dropped without release"
            );
        }
    }
}
