//! In-memory communication engine for session controller tests.
//!
//! Every mock records the calls made on it and lets the test fire engine
//! events by hand. Handlers are always invoked with no mock lock held, so a
//! handler may call straight back into the mock (unsubscribe, close, ...).
//!
//! Some engine behavior is reproduced because the controller relies on it:
//! - `MockPeer::disconnect` fires `Disconnected`, `destroy` fires `Close`
//! - `MockRoom::close` fires `Close(name)` (disable with `set_silent_close`)
//! - a `MockPeer` opens itself as soon as something subscribes to `Open`
//!   (see [`ConnectBehavior`])
//!
//! # Example
//!
//! ```rust,ignore
//! use session_test_utils::{MockPeer, MockStream};
//!
//! let peer = MockPeer::new("alice");
//! let connection = peer.incoming_call("bob");
//! connection.fire(MediaEvent::Stream(MockStream::new("bob")));
//! ```

use session_controller::engine::{
    EngineError, ListPeersCallback, MediaCapture, MediaConnection, MediaConstraints, MediaEvent,
    MediaEventHandler, MediaEventKind, MediaStream, Peer, PeerEvent, PeerEventHandler,
    PeerEventKind, PeerFactory, PeerOptions, RenderTarget, RenderTargetId, Room, RoomEvent,
    RoomEventHandler, RoomEventKind, RoomMode, RoomOptions, SubscriptionId,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ----------------------------------------------------------------------------
// Subscriptions
// ----------------------------------------------------------------------------

/// Per-kind handler list shared by all mocks.
pub struct Subscribers<K, E> {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(SubscriptionId, K, Arc<dyn Fn(E) + Send + Sync>)>>,
}

impl<K: Copy + PartialEq, E: Clone> Subscribers<K, E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            handlers: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, kind: K, handler: Arc<dyn Fn(E) + Send + Sync>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.lock().unwrap().push((id, kind, handler));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.handlers.lock().unwrap().retain(|(sid, _, _)| *sid != id);
    }

    /// Deliver `event` to every handler registered for `kind`.
    pub fn emit(&self, kind: K, event: E) {
        let handlers: Vec<_> = self
            .handlers
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, h)| Arc::clone(h))
            .collect();
        for handler in handlers {
            handler(event.clone());
        }
    }

    /// Number of live subscriptions for `kind`.
    #[must_use]
    pub fn count(&self, kind: K) -> usize {
        self.handlers
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }

    /// Number of live subscriptions of any kind.
    #[must_use]
    pub fn total(&self) -> usize {
        self.handlers.lock().unwrap().len()
    }
}

impl<K: Copy + PartialEq, E: Clone> Default for Subscribers<K, E> {
    fn default() -> Self {
        Self::new()
    }
}

// ----------------------------------------------------------------------------
// Render targets
// ----------------------------------------------------------------------------

#[derive(Debug)]
pub struct MockRenderTarget {
    id: RenderTargetId,
}

impl RenderTarget for MockRenderTarget {
    fn id(&self) -> RenderTargetId {
        self.id
    }
}

/// Host render target registry. Targets can be registered and disposed
/// while a test runs.
#[derive(Default)]
pub struct MockTargetRegistry {
    targets: Mutex<Vec<Arc<MockRenderTarget>>>,
}

impl MockTargetRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the given target ids.
    #[must_use]
    pub fn with_targets(ids: impl IntoIterator<Item = i64>) -> Self {
        let registry = Self::new();
        for id in ids {
            registry.register(id);
        }
        registry
    }

    pub fn register(&self, id: i64) {
        let mut targets = self.targets.lock().unwrap();
        if !targets.iter().any(|t| t.id == RenderTargetId(id)) {
            targets.push(Arc::new(MockRenderTarget {
                id: RenderTargetId(id),
            }));
        }
    }

    /// Simulate the host disposing a target.
    pub fn unregister(&self, id: i64) {
        self.targets
            .lock()
            .unwrap()
            .retain(|t| t.id != RenderTargetId(id));
    }
}

impl session_controller::engine::RenderTargetRegistry for MockTargetRegistry {
    fn resolve(&self, id: RenderTargetId) -> Option<Arc<dyn RenderTarget>> {
        self.targets
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .map(|t| Arc::clone(t) as Arc<dyn RenderTarget>)
    }
}

// ----------------------------------------------------------------------------
// Streams
// ----------------------------------------------------------------------------

/// Media stream that records renderer and close calls.
pub struct MockStream {
    peer: String,
    renderers: Mutex<Vec<RenderTargetId>>,
    add_calls: AtomicUsize,
    remove_calls: AtomicUsize,
    close_calls: AtomicUsize,
}

impl MockStream {
    #[must_use]
    pub fn new(peer: &str) -> Arc<Self> {
        Arc::new(Self {
            peer: peer.to_string(),
            renderers: Mutex::new(Vec::new()),
            add_calls: AtomicUsize::new(0),
            remove_calls: AtomicUsize::new(0),
            close_calls: AtomicUsize::new(0),
        })
    }

    /// Targets currently rendering this stream.
    #[must_use]
    pub fn rendering(&self) -> Vec<RenderTargetId> {
        self.renderers.lock().unwrap().clone()
    }

    #[must_use]
    pub fn add_count(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn remove_count(&self) -> usize {
        self.remove_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn close_count(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.close_count() > 0
    }
}

impl MediaStream for MockStream {
    fn peer_identifier(&self) -> String {
        self.peer.clone()
    }

    fn add_renderer(&self, target: &Arc<dyn RenderTarget>) {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        self.renderers.lock().unwrap().push(target.id());
    }

    fn remove_renderer(&self, target: &Arc<dyn RenderTarget>) {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        let id = target.id();
        self.renderers.lock().unwrap().retain(|r| *r != id);
    }

    fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
    }
}

// ----------------------------------------------------------------------------
// Direct calls
// ----------------------------------------------------------------------------

pub struct MockMediaConnection {
    remote: String,
    open: AtomicBool,
    close_calls: AtomicUsize,
    /// `Some(answer)` once answered; the inner value is the local stream's owner.
    answered: Mutex<Option<Option<String>>>,
    subscribers: Subscribers<MediaEventKind, MediaEvent>,
}

impl MockMediaConnection {
    #[must_use]
    pub fn new(remote: &str) -> Arc<Self> {
        Arc::new(Self {
            remote: remote.to_string(),
            open: AtomicBool::new(true),
            close_calls: AtomicUsize::new(0),
            answered: Mutex::new(None),
            subscribers: Subscribers::new(),
        })
    }

    /// Fire an engine event at the current subscribers.
    pub fn fire(&self, event: MediaEvent) {
        self.subscribers.emit(event.kind(), event);
    }

    /// Deliver the remote side's stream.
    pub fn deliver_stream(&self) -> Arc<MockStream> {
        let stream = MockStream::new(&self.remote);
        self.fire(MediaEvent::Stream(Arc::clone(&stream) as Arc<dyn MediaStream>));
        stream
    }

    /// Simulate the remote side hanging up.
    pub fn remote_close(&self) {
        self.open.store(false, Ordering::SeqCst);
        self.fire(MediaEvent::Close(self.remote.clone()));
    }

    #[must_use]
    pub fn close_count(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    /// `None` if never answered, else the owner of the stream sent back.
    #[must_use]
    pub fn answered_with(&self) -> Option<Option<String>> {
        self.answered.lock().unwrap().clone()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.total()
    }
}

impl MediaConnection for MockMediaConnection {
    fn remote_identifier(&self) -> String {
        self.remote.clone()
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn answer(&self, stream: Option<Arc<dyn MediaStream>>) {
        *self.answered.lock().unwrap() = Some(stream.map(|s| s.peer_identifier()));
    }

    fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.open.store(false, Ordering::SeqCst);
    }

    fn subscribe(&self, kind: MediaEventKind, handler: MediaEventHandler) -> SubscriptionId {
        self.subscribers.subscribe(kind, handler)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.unsubscribe(id);
    }
}

// ----------------------------------------------------------------------------
// Rooms
// ----------------------------------------------------------------------------

pub struct MockRoom {
    name: String,
    mode: RoomMode,
    /// Owner of the stream published on join.
    published: Option<String>,
    close_calls: AtomicUsize,
    silent_close: AtomicBool,
    subscribers: Subscribers<RoomEventKind, RoomEvent>,
}

impl MockRoom {
    #[must_use]
    pub fn new(name: &str, mode: RoomMode, published: Option<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            mode,
            published,
            close_calls: AtomicUsize::new(0),
            silent_close: AtomicBool::new(false),
            subscribers: Subscribers::new(),
        })
    }

    /// Stop `close()` from firing the `Close` event.
    pub fn set_silent_close(&self) {
        self.silent_close.store(true, Ordering::SeqCst);
    }

    pub fn fire(&self, event: RoomEvent) {
        self.subscribers.emit(event.kind(), event);
    }

    /// A remote member publishes a stream.
    pub fn publish(&self, remote: &str) -> Arc<MockStream> {
        let stream = MockStream::new(remote);
        self.fire(RoomEvent::Stream(Arc::clone(&stream) as Arc<dyn MediaStream>));
        stream
    }

    #[must_use]
    pub fn mode(&self) -> RoomMode {
        self.mode
    }

    #[must_use]
    pub fn published(&self) -> Option<String> {
        self.published.clone()
    }

    #[must_use]
    pub fn close_count(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.total()
    }
}

impl Room for MockRoom {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        if !self.silent_close.load(Ordering::SeqCst) {
            self.fire(RoomEvent::Close(self.name.clone()));
        }
    }

    fn subscribe(&self, kind: RoomEventKind, handler: RoomEventHandler) -> SubscriptionId {
        self.subscribers.subscribe(kind, handler)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.unsubscribe(id);
    }
}

// ----------------------------------------------------------------------------
// Peers
// ----------------------------------------------------------------------------

/// What a peer does when the directory waits for it to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectBehavior {
    /// Fire `Open(identity)` as soon as `Open` is subscribed.
    Open,
    /// Fire `Error` as soon as `Error` is subscribed.
    Fail(String),
    /// Never fire anything.
    Silent,
}

/// How `list_all_peers` answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListBehavior {
    /// Invoke the callback synchronously.
    Immediate,
    /// Keep callbacks until [`MockPeer::complete_listings`].
    Deferred,
    /// Drop the callback without calling it.
    Drop,
}

pub struct MockPeer {
    identity: String,
    connect: ConnectBehavior,
    list: Mutex<ListBehavior>,
    known_peers: Mutex<Vec<String>>,
    pending_listings: Mutex<Vec<ListPeersCallback>>,
    refuse_calls: AtomicBool,
    refuse_joins: AtomicBool,
    disconnected: AtomicBool,
    destroyed: AtomicBool,
    disconnect_calls: AtomicUsize,
    destroy_calls: AtomicUsize,
    calls: Mutex<Vec<(Arc<MockMediaConnection>, String)>>,
    rooms: Mutex<Vec<Arc<MockRoom>>>,
    subscribers: Subscribers<PeerEventKind, PeerEvent>,
}

impl MockPeer {
    /// A peer that opens as `identity`.
    #[must_use]
    pub fn new(identity: &str) -> Arc<Self> {
        Self::with_behavior(identity, ConnectBehavior::Open)
    }

    #[must_use]
    pub fn with_behavior(identity: &str, connect: ConnectBehavior) -> Arc<Self> {
        Arc::new(Self {
            identity: identity.to_string(),
            connect,
            list: Mutex::new(ListBehavior::Immediate),
            known_peers: Mutex::new(Vec::new()),
            pending_listings: Mutex::new(Vec::new()),
            refuse_calls: AtomicBool::new(false),
            refuse_joins: AtomicBool::new(false),
            disconnected: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
            disconnect_calls: AtomicUsize::new(0),
            destroy_calls: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            rooms: Mutex::new(Vec::new()),
            subscribers: Subscribers::new(),
        })
    }

    /// Identities the signaling server reports (the peer's own included).
    pub fn set_known_peers(&self, peers: &[&str]) {
        *self.known_peers.lock().unwrap() = peers.iter().map(|p| (*p).to_string()).collect();
    }

    pub fn set_list_behavior(&self, behavior: ListBehavior) {
        *self.list.lock().unwrap() = behavior;
    }

    /// Answer every deferred `list_all_peers` request.
    pub fn complete_listings(&self) {
        let pending = std::mem::take(&mut *self.pending_listings.lock().unwrap());
        let peers = self.known_peers.lock().unwrap().clone();
        for callback in pending {
            callback(peers.clone());
        }
    }

    pub fn refuse_calls(&self) {
        self.refuse_calls.store(true, Ordering::SeqCst);
    }

    pub fn refuse_joins(&self) {
        self.refuse_joins.store(true, Ordering::SeqCst);
    }

    pub fn fire(&self, event: PeerEvent) {
        self.subscribers.emit(event.kind(), event);
    }

    /// Simulate an inbound call from `remote`.
    pub fn incoming_call(&self, remote: &str) -> Arc<MockMediaConnection> {
        let connection = MockMediaConnection::new(remote);
        self.fire(PeerEvent::Call(
            Arc::clone(&connection) as Arc<dyn MediaConnection>
        ));
        connection
    }

    /// Simulate the signaling link dropping without a local request.
    pub fn drop_signaling(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
        self.fire(PeerEvent::Disconnected);
    }

    /// Outgoing connections, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<Arc<MockMediaConnection>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(c, _)| Arc::clone(c))
            .collect()
    }

    #[must_use]
    pub fn last_call(&self) -> Option<Arc<MockMediaConnection>> {
        self.calls().pop()
    }

    /// Owner of the stream sent with each outgoing call.
    #[must_use]
    pub fn call_streams(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, s)| s.clone())
            .collect()
    }

    #[must_use]
    pub fn rooms(&self) -> Vec<Arc<MockRoom>> {
        self.rooms.lock().unwrap().clone()
    }

    #[must_use]
    pub fn last_room(&self) -> Option<Arc<MockRoom>> {
        self.rooms().pop()
    }

    #[must_use]
    pub fn disconnect_count(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn destroy_count(&self) -> usize {
        self.destroy_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn subscriber_count(&self, kind: PeerEventKind) -> usize {
        self.subscribers.count(kind)
    }

    #[must_use]
    pub fn total_subscribers(&self) -> usize {
        self.subscribers.total()
    }
}

impl Peer for MockPeer {
    fn identity(&self) -> String {
        self.identity.clone()
    }

    fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    fn disconnect(&self) {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        if !self.disconnected.swap(true, Ordering::SeqCst) {
            self.fire(PeerEvent::Disconnected);
        }
    }

    fn destroy(&self) {
        self.destroy_calls.fetch_add(1, Ordering::SeqCst);
        self.disconnected.store(true, Ordering::SeqCst);
        if !self.destroyed.swap(true, Ordering::SeqCst) {
            self.fire(PeerEvent::Close);
        }
    }

    fn call(&self, remote: &str, stream: Arc<dyn MediaStream>) -> Option<Arc<dyn MediaConnection>> {
        if self.refuse_calls.load(Ordering::SeqCst) {
            return None;
        }
        let connection = MockMediaConnection::new(remote);
        self.calls
            .lock()
            .unwrap()
            .push((Arc::clone(&connection), stream.peer_identifier()));
        Some(connection)
    }

    fn join_room(&self, name: &str, options: RoomOptions) -> Option<Arc<dyn Room>> {
        if self.refuse_joins.load(Ordering::SeqCst) {
            return None;
        }
        let room = MockRoom::new(
            name,
            options.mode,
            options.stream.map(|s| s.peer_identifier()),
        );
        self.rooms.lock().unwrap().push(Arc::clone(&room));
        Some(room)
    }

    fn list_all_peers(&self, callback: ListPeersCallback) {
        let behavior = *self.list.lock().unwrap();
        match behavior {
            ListBehavior::Immediate => {
                let peers = self.known_peers.lock().unwrap().clone();
                callback(peers);
            }
            ListBehavior::Deferred => self.pending_listings.lock().unwrap().push(callback),
            ListBehavior::Drop => drop(callback),
        }
    }

    fn subscribe(&self, kind: PeerEventKind, handler: PeerEventHandler) -> SubscriptionId {
        let id = self.subscribers.subscribe(kind, Arc::clone(&handler));
        match (&self.connect, kind) {
            (ConnectBehavior::Open, PeerEventKind::Open) => {
                handler(PeerEvent::Open(self.identity.clone()));
            }
            (ConnectBehavior::Fail(message), PeerEventKind::Error) => {
                handler(PeerEvent::Error(EngineError(message.clone())));
            }
            _ => {}
        }
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.unsubscribe(id);
    }
}

// ----------------------------------------------------------------------------
// Capture and factory
// ----------------------------------------------------------------------------

pub struct MockMediaCapture {
    owner: String,
    fail: AtomicBool,
    constraints: Mutex<Vec<MediaConstraints>>,
    streams: Mutex<Vec<Arc<MockStream>>>,
    terminate_calls: AtomicUsize,
}

impl MockMediaCapture {
    /// Capture whose streams belong to `owner`.
    #[must_use]
    pub fn new(owner: &str) -> Arc<Self> {
        Arc::new(Self {
            owner: owner.to_string(),
            fail: AtomicBool::new(false),
            constraints: Mutex::new(Vec::new()),
            streams: Mutex::new(Vec::new()),
            terminate_calls: AtomicUsize::new(0),
        })
    }

    /// Make every later `acquire` fail (camera permission denied).
    pub fn fail_acquire(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn acquire_count(&self) -> usize {
        self.constraints.lock().unwrap().len()
    }

    #[must_use]
    pub fn last_constraints(&self) -> Option<MediaConstraints> {
        self.constraints.lock().unwrap().last().copied()
    }

    #[must_use]
    pub fn streams(&self) -> Vec<Arc<MockStream>> {
        self.streams.lock().unwrap().clone()
    }

    #[must_use]
    pub fn last_stream(&self) -> Option<Arc<MockStream>> {
        self.streams().pop()
    }

    #[must_use]
    pub fn terminate_count(&self) -> usize {
        self.terminate_calls.load(Ordering::SeqCst)
    }
}

impl MediaCapture for MockMediaCapture {
    fn acquire(&self, constraints: &MediaConstraints) -> Result<Arc<dyn MediaStream>, EngineError> {
        self.constraints.lock().unwrap().push(*constraints);
        if self.fail.load(Ordering::SeqCst) {
            return Err(EngineError("camera permission denied".to_string()));
        }
        let stream = MockStream::new(&self.owner);
        self.streams.lock().unwrap().push(Arc::clone(&stream));
        Ok(stream)
    }

    fn terminate(&self) {
        self.terminate_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Factory handing out prepared peers in order.
///
/// When the queue is empty a fresh opening peer named `peer-N` is created.
#[derive(Default)]
pub struct MockPeerFactory {
    queued: Mutex<VecDeque<Arc<MockPeer>>>,
    created: Mutex<Vec<Arc<MockPeer>>>,
    captures: Mutex<Vec<(String, Arc<MockMediaCapture>)>>,
    options: Mutex<Vec<PeerOptions>>,
    refuse: AtomicBool,
}

impl MockPeerFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `peer` for the next `create_peer`.
    #[must_use]
    pub fn with_peer(self, peer: Arc<MockPeer>) -> Self {
        self.queued.lock().unwrap().push_back(peer);
        self
    }

    pub fn refuse(&self) {
        self.refuse.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn created(&self) -> Vec<Arc<MockPeer>> {
        self.created.lock().unwrap().clone()
    }

    /// Capture handed to the controller for `identity`.
    #[must_use]
    pub fn capture(&self, identity: &str) -> Option<Arc<MockMediaCapture>> {
        self.captures
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(owner, _)| owner == identity)
            .map(|(_, c)| Arc::clone(c))
    }

    #[must_use]
    pub fn options(&self) -> Vec<PeerOptions> {
        self.options.lock().unwrap().clone()
    }
}

impl PeerFactory for MockPeerFactory {
    fn create_peer(&self, options: &PeerOptions) -> Result<Arc<dyn Peer>, EngineError> {
        self.options.lock().unwrap().push(options.clone());
        if self.refuse.load(Ordering::SeqCst) {
            return Err(EngineError("invalid api key".to_string()));
        }
        let queued = self.queued.lock().unwrap().pop_front();
        let peer = queued.unwrap_or_else(|| {
            let n = self.created.lock().unwrap().len() + 1;
            MockPeer::new(&format!("peer-{n}"))
        });
        self.created.lock().unwrap().push(Arc::clone(&peer));
        Ok(peer)
    }

    fn media_capture(&self, peer: &Arc<dyn Peer>) -> Arc<dyn MediaCapture> {
        let identity = peer.identity();
        let capture = MockMediaCapture::new(&identity);
        self.captures
            .lock()
            .unwrap()
            .push((identity, Arc::clone(&capture)));
        capture
    }
}
