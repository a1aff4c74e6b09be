//! End-to-end tests through the session host actor.
//!
//! Drives the full command surface over the mock engine the way a host
//! application would: connect, subscribe, call, join, hang up, disconnect.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use session_controller::engine::{RenderTargetId, RoomMode};
use session_controller::{EventKind, SessionDirectory, SessionError, SessionHostHandle};
use session_test_utils::{
    init_test_tracing, next_event, test_config, test_peer_options, ListBehavior, MockPeer,
    MockPeerFactory, MockTargetRegistry, TEST_TARGETS,
};
use tokio::task::JoinHandle;

struct Host {
    handle: SessionHostHandle,
    task: JoinHandle<()>,
    peer: Arc<MockPeer>,
    factory: Arc<MockPeerFactory>,
}

fn spawn_host(identity: &str) -> Host {
    init_test_tracing();
    let peer = MockPeer::new(identity);
    let factory = Arc::new(MockPeerFactory::new().with_peer(Arc::clone(&peer)));
    let directory = SessionDirectory::new(
        Arc::clone(&factory) as _,
        Arc::new(MockTargetRegistry::with_targets(TEST_TARGETS)),
        test_config(),
    );
    let (handle, task) = SessionHostHandle::spawn(directory);
    Host {
        handle,
        task,
        peer,
        factory,
    }
}

// ============================================================================
// Direct calls
// ============================================================================

#[tokio::test]
async fn test_connect_call_and_hang_up() {
    let host = spawn_host("alice");

    let local_id = host.handle.connect(test_peer_options()).await.unwrap();
    assert_eq!(local_id, "alice");
    let mut events = host.handle.subscribe_events("alice").await.unwrap();
    assert_eq!(next_event(&mut events).await.kind, EventKind::Connected);

    host.handle
        .start_local_stream("alice", RenderTargetId(1))
        .await
        .unwrap();
    host.handle.call("alice", "bob").await.unwrap();

    let connection = host.peer.last_call().unwrap();
    let bob_stream = connection.deliver_stream();
    let added = next_event(&mut events).await;
    assert_eq!(added.kind, EventKind::RemoteStreamAdded);
    assert_eq!(added.remote_peer_id.as_deref(), Some("bob"));

    host.handle
        .start_remote_stream("alice", RenderTargetId(2), "bob")
        .await
        .unwrap();
    assert_eq!(bob_stream.rendering(), vec![RenderTargetId(2)]);

    host.handle.hang_up("alice").await.unwrap();
    assert_eq!(
        next_event(&mut events).await.kind,
        EventKind::RemoteStreamRemoved
    );
    assert_eq!(connection.close_count(), 1);
    assert!(bob_stream.is_closed());

    let capture = host.factory.capture("alice").unwrap();
    assert_eq!(capture.terminate_count(), 0);
}

#[tokio::test]
async fn test_call_before_local_stream_is_not_ready() {
    let host = spawn_host("alice");
    host.handle.connect(test_peer_options()).await.unwrap();

    let result = host.handle.call("alice", "bob").await;

    assert!(matches!(result, Err(SessionError::NotReady(_))));
    assert_eq!(result.unwrap_err().error_code(), 1);
}

#[tokio::test]
async fn test_unknown_render_target_is_not_found() {
    let host = spawn_host("alice");
    host.handle.connect(test_peer_options()).await.unwrap();

    let result = host
        .handle
        .start_local_stream("alice", RenderTargetId(77))
        .await;

    assert!(matches!(result, Err(SessionError::TargetNotFound(_))));
}

// ============================================================================
// Rooms
// ============================================================================

#[tokio::test]
async fn test_join_and_leave_room() {
    let host = spawn_host("alice");
    host.handle.connect(test_peer_options()).await.unwrap();
    let mut events = host.handle.subscribe_events("alice").await.unwrap();
    next_event(&mut events).await;
    host.handle
        .start_local_stream("alice", RenderTargetId(1))
        .await
        .unwrap();

    host.handle.join("alice", "standup", 1).await.unwrap();
    let room = host.peer.last_room().unwrap();
    assert_eq!(room.mode(), RoomMode::Sfu);

    room.publish("carol");
    assert_eq!(
        next_event(&mut events).await.kind,
        EventKind::RemoteStreamAdded
    );

    host.handle.leave("alice", "standup").await.unwrap();
    assert_eq!(
        next_event(&mut events).await.kind,
        EventKind::RemoteStreamRemoved
    );
    let closed = next_event(&mut events).await;
    assert_eq!(closed.kind, EventKind::RoomClosed);
    assert_eq!(closed.room.as_deref(), Some("standup"));
}

#[tokio::test]
async fn test_join_with_unknown_mode_ordinal() {
    let host = spawn_host("alice");
    host.handle.connect(test_peer_options()).await.unwrap();
    host.handle
        .start_local_stream("alice", RenderTargetId(1))
        .await
        .unwrap();

    let result = host.handle.join("alice", "standup", 7).await;

    assert!(matches!(result, Err(SessionError::InvalidRoomMode(7))));
    assert!(host.peer.rooms().is_empty());
}

// ============================================================================
// Peer listing
// ============================================================================

#[tokio::test]
async fn test_list_all_peers_excludes_caller() {
    let host = spawn_host("alice");
    host.handle.connect(test_peer_options()).await.unwrap();
    host.peer.set_known_peers(&["alice", "bob"]);

    let peers = host.handle.list_all_peers("alice").await.unwrap();

    assert_eq!(peers, vec!["bob".to_string()]);
}

#[tokio::test]
async fn test_pending_listing_does_not_block_mailbox() {
    let host = spawn_host("alice");
    host.handle.connect(test_peer_options()).await.unwrap();
    host.peer.set_known_peers(&["alice", "bob", "carol"]);
    host.peer.set_list_behavior(ListBehavior::Deferred);

    let handle = host.handle.clone();
    let listing = tokio::spawn(async move { handle.list_all_peers("alice").await });
    tokio::task::yield_now().await;

    // A later command completes while the listing is still outstanding.
    tokio::time::timeout(
        Duration::from_secs(1),
        host.handle.start_local_stream("alice", RenderTargetId(1)),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(!listing.is_finished());

    host.peer.complete_listings();
    let peers = listing.await.unwrap().unwrap();
    assert_eq!(peers, vec!["bob".to_string(), "carol".to_string()]);
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test]
async fn test_disconnect_releases_session() {
    let host = spawn_host("alice");
    host.handle.connect(test_peer_options()).await.unwrap();
    let mut events = host.handle.subscribe_events("alice").await.unwrap();
    next_event(&mut events).await;

    host.handle.disconnect("alice").await.unwrap();

    assert_eq!(next_event(&mut events).await.kind, EventKind::Released);
    assert_eq!(host.peer.destroy_count(), 1);
    assert!(matches!(
        host.handle.hang_up("alice").await,
        Err(SessionError::SessionNotFound(_))
    ));
}

#[tokio::test]
async fn test_cancel_releases_every_session() {
    let host = spawn_host("alice");
    host.handle.connect(test_peer_options()).await.unwrap();
    host.handle.connect(test_peer_options()).await.unwrap();
    let mut events = host.handle.subscribe_events("alice").await.unwrap();
    next_event(&mut events).await;

    host.handle.cancel();
    tokio::time::timeout(Duration::from_secs(1), host.task)
        .await
        .unwrap()
        .unwrap();

    assert!(host.handle.is_cancelled());
    assert_eq!(next_event(&mut events).await.kind, EventKind::Released);
    for peer in host.factory.created() {
        assert_eq!(peer.destroy_count(), 1);
        assert_eq!(peer.total_subscribers(), 0);
    }
    assert!(matches!(
        host.handle.connect(test_peer_options()).await,
        Err(SessionError::Internal(_))
    ));
}
