//! In-crate fakes for unit tests.
//!
//! Integration tests use `session-test-utils`; unit tests cannot, because the
//! dev-dependency links a second copy of this crate's traits.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::engine::{
    EngineError, MediaCapture, MediaStream, Peer, PeerFactory, PeerOptions, RenderTarget,
    RenderTargetId, RenderTargetRegistry,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub struct FakeTarget(pub RenderTargetId);

impl RenderTarget for FakeTarget {
    fn id(&self) -> RenderTargetId {
        self.0
    }
}

pub fn target(id: i64) -> Arc<dyn RenderTarget> {
    Arc::new(FakeTarget(RenderTargetId(id)))
}

/// Stream that records renderer attach/detach and close calls.
pub struct FakeStream {
    peer: String,
    pub renderers: Mutex<Vec<RenderTargetId>>,
    pub adds: AtomicUsize,
    pub removes: AtomicUsize,
    pub closes: AtomicUsize,
}

impl FakeStream {
    pub fn new(peer: &str) -> Arc<Self> {
        Arc::new(Self {
            peer: peer.to_string(),
            renderers: Mutex::new(Vec::new()),
            adds: AtomicUsize::new(0),
            removes: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        })
    }

    pub fn rendering(&self) -> Vec<RenderTargetId> {
        self.renderers.lock().unwrap().clone()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl MediaStream for FakeStream {
    fn peer_identifier(&self) -> String {
        self.peer.clone()
    }

    fn add_renderer(&self, target: &Arc<dyn RenderTarget>) {
        self.adds.fetch_add(1, Ordering::SeqCst);
        self.renderers.lock().unwrap().push(target.id());
    }

    fn remove_renderer(&self, target: &Arc<dyn RenderTarget>) {
        self.removes.fetch_add(1, Ordering::SeqCst);
        let id = target.id();
        self.renderers.lock().unwrap().retain(|r| *r != id);
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Registry that resolves nothing.
pub struct NoTargets;

impl RenderTargetRegistry for NoTargets {
    fn resolve(&self, _id: RenderTargetId) -> Option<Arc<dyn RenderTarget>> {
        None
    }
}

/// Factory whose engine refuses every peer.
pub struct RefusingFactory;

impl PeerFactory for RefusingFactory {
    fn create_peer(&self, _options: &PeerOptions) -> Result<Arc<dyn Peer>, EngineError> {
        Err(EngineError("engine unavailable".to_string()))
    }

    fn media_capture(&self, _peer: &Arc<dyn Peer>) -> Arc<dyn MediaCapture> {
        Arc::new(NoCapture)
    }
}

pub struct NoCapture;

impl MediaCapture for NoCapture {
    fn acquire(
        &self,
        _constraints: &crate::engine::MediaConstraints,
    ) -> Result<Arc<dyn MediaStream>, EngineError> {
        Err(EngineError("no camera".to_string()))
    }

    fn terminate(&self) {}
}
