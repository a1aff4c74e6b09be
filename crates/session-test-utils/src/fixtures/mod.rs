//! Pre-wired test fixtures.
//!
//! - [`test_config`] / [`test_peer_options`] - configuration with a dummy key
//! - [`SessionHarness`] - a controller over mock collaborators with a
//!   recording sink attached
//! - [`next_event`] - bounded wait on an event channel
//! - [`init_test_tracing`] - log output captured per test

use crate::mock_engine::{MockMediaCapture, MockPeer, MockTargetRegistry};
use crate::recording_sink::RecordingSink;

use secrecy::SecretString;
use session_controller::config::Config;
use session_controller::controller::SessionController;
use session_controller::engine::{MediaConstraints, PeerOptions, RenderTargetId};
use session_controller::events::{EventSink, SessionEvent};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// API key accepted by the mock engine.
pub const TEST_API_KEY: &str = "test-api-key-0123456789";

/// Render target ids the harness registers up front.
pub const TEST_TARGETS: [i64; 4] = [1, 2, 3, 4];

/// Config loaded through the normal env path with only the API key set.
#[must_use]
pub fn test_config() -> Config {
    let vars = HashMap::from([("SESSION_API_KEY".to_string(), TEST_API_KEY.to_string())]);
    Config::from_vars(&vars).expect("test config should load")
}

#[must_use]
pub fn test_peer_options() -> PeerOptions {
    test_config().peer_options()
}

/// Options with a caller-chosen API key.
#[must_use]
pub fn peer_options_with_key(api_key: &str) -> PeerOptions {
    let mut options = test_peer_options();
    options.api_key = SecretString::from(api_key.to_string());
    options
}

/// Install a test-writer subscriber. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Receive the next event or fail the test after one second.
pub async fn next_event(rx: &mut mpsc::Receiver<SessionEvent>) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for session event")
        .expect("event channel closed")
}

/// A `SessionController` wired to mocks, with a `RecordingSink` attached
/// and the initial `Connected` event cleared.
pub struct SessionHarness {
    pub peer: Arc<MockPeer>,
    pub capture: Arc<MockMediaCapture>,
    pub targets: Arc<MockTargetRegistry>,
    pub sink: Arc<RecordingSink>,
    pub controller: Arc<SessionController>,
}

impl SessionHarness {
    #[must_use]
    pub fn new(local_id: &str) -> Self {
        Self::over_peer(MockPeer::new(local_id))
    }

    #[must_use]
    pub fn over_peer(peer: Arc<MockPeer>) -> Self {
        let local_id = session_controller::engine::Peer::identity(peer.as_ref());
        let capture = MockMediaCapture::new(&local_id);
        let targets = Arc::new(MockTargetRegistry::with_targets(TEST_TARGETS));
        let controller = SessionController::new(
            local_id,
            Arc::clone(&peer) as _,
            Arc::clone(&capture) as _,
            Arc::clone(&targets) as _,
            MediaConstraints::default(),
        );
        let sink = Arc::new(RecordingSink::new());
        controller
            .attach_sink(Arc::clone(&sink) as Arc<dyn EventSink>)
            .expect("sink should attach");
        sink.clear();

        Self {
            peer,
            capture,
            targets,
            sink,
            controller,
        }
    }

    /// Start the local stream on target 1.
    #[must_use]
    pub fn with_local_stream(self) -> Self {
        self.controller
            .start_local_stream(RenderTargetId(1))
            .expect("local stream should start");
        self
    }
}
