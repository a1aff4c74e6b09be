//! `ParticipantRegistry` - thread-safe map of remote identifier to participant.
//!
//! Engine callbacks hit the registry from arbitrary threads. Every mutation
//! holds the mutex only for the map swap/remove; releasing a participant
//! (stream close, event emission) always runs after the lock is dropped, so
//! a release that triggers further registry calls cannot deadlock.

use crate::bridge::EventBridge;
use crate::engine::MediaStream;
use crate::events::EventKind;
use crate::observability::metrics;
use crate::participant::RemoteParticipant;

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub struct ParticipantRegistry {
    participants: Mutex<HashMap<String, Arc<RemoteParticipant>>>,
    bridge: Arc<EventBridge>,
}

impl ParticipantRegistry {
    #[must_use]
    pub fn new(bridge: Arc<EventBridge>) -> Self {
        Self {
            participants: Mutex::new(HashMap::new()),
            bridge,
        }
    }

    /// Track `stream` for `remote_id`, releasing any participant it replaces.
    ///
    /// Announces `RemoteStreamAdded` after the previous entry (if any) has
    /// been released.
    pub fn upsert(&self, remote_id: &str, stream: Arc<dyn MediaStream>) -> Arc<RemoteParticipant> {
        let participant = Arc::new(RemoteParticipant::new(
            remote_id,
            stream,
            Arc::clone(&self.bridge),
        ));

        let (previous, count) = {
            let mut map = self.participants.lock();
            let previous = map.insert(remote_id.to_string(), Arc::clone(&participant));
            (previous, map.len())
        };

        if let Some(previous) = previous {
            debug!(
                target: "session.registry",
                remote_peer_id = %remote_id,
                "Replacing existing remote stream"
            );
            previous.release();
        }
        metrics::set_remote_participants(count);

        self.bridge.notify(
            self.bridge
                .event(EventKind::RemoteStreamAdded)
                .with_remote(remote_id),
        );
        participant
    }

    /// Remove and release the participant for `remote_id`, if present.
    pub fn remove(&self, remote_id: &str) -> bool {
        let (removed, count) = {
            let mut map = self.participants.lock();
            let removed = map.remove(remote_id);
            (removed, map.len())
        };

        match removed {
            Some(participant) => {
                participant.release();
                metrics::set_remote_participants(count);
                true
            }
            None => false,
        }
    }

    /// Remove `participant` only if it is still the entry for its identifier,
    /// then release it. A newer entry under the same identifier is kept.
    pub fn withdraw(&self, participant: &Arc<RemoteParticipant>) -> bool {
        let remote_id = participant.remote_id();
        let (removed, count) = {
            let mut map = self.participants.lock();
            let is_current = map
                .get(remote_id)
                .is_some_and(|current| Arc::ptr_eq(current, participant));
            let removed = if is_current { map.remove(remote_id) } else { None };
            (removed, map.len())
        };
        if removed.is_some() {
            metrics::set_remote_participants(count);
        }
        // Already released if it was replaced or drained.
        participant.release();
        removed.is_some()
    }

    /// Swap the whole map for an empty one and release every removed entry.
    ///
    /// Returns the number of participants released.
    pub fn drain_all(&self) -> usize {
        let drained = std::mem::take(&mut *self.participants.lock());
        let count = drained.len();

        for participant in drained.into_values() {
            participant.release();
        }

        if count > 0 {
            debug!(
                target: "session.registry",
                peer_id = %self.bridge.local_id(),
                released = count,
                "Released all remote participants"
            );
            metrics::set_remote_participants(0);
        }
        count
    }

    #[must_use]
    pub fn lookup(&self, remote_id: &str) -> Option<Arc<RemoteParticipant>> {
        self.participants.lock().get(remote_id).cloned()
    }

    #[must_use]
    pub fn remote_ids(&self) -> Vec<String> {
        self.participants.lock().keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.lock().is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::events::{ChannelSink, SessionEvent};
    use crate::test_support::{target, FakeStream};
    use tokio::sync::mpsc;

    fn registry_with_sink() -> (ParticipantRegistry, mpsc::Receiver<SessionEvent>) {
        let bridge = Arc::new(EventBridge::new("alice"));
        let (sink, mut rx) = ChannelSink::channel(64);
        bridge.attach(Arc::new(sink)).unwrap();
        let _connected = rx.try_recv().unwrap();
        (ParticipantRegistry::new(bridge), rx)
    }

    fn kinds(rx: &mut mpsc::Receiver<SessionEvent>) -> Vec<(EventKind, Option<String>)> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push((event.kind, event.remote_peer_id));
        }
        out
    }

    #[test]
    fn test_upsert_announces_stream() {
        let (registry, mut rx) = registry_with_sink();
        let stream = FakeStream::new("bob");

        registry.upsert("bob", stream);

        assert_eq!(registry.len(), 1);
        assert!(registry.lookup("bob").is_some());
        assert_eq!(
            kinds(&mut rx),
            vec![(EventKind::RemoteStreamAdded, Some("bob".to_string()))]
        );
    }

    #[test]
    fn test_upsert_replaces_and_releases_previous() {
        let (registry, mut rx) = registry_with_sink();
        let first = FakeStream::new("bob");
        let second = FakeStream::new("bob");

        registry.upsert("bob", first.clone());
        registry.lookup("bob").unwrap().bind(target(3));
        registry.upsert("bob", second.clone());

        assert_eq!(registry.len(), 1);
        assert_eq!(first.close_count(), 1);
        assert!(first.rendering().is_empty());
        assert_eq!(second.close_count(), 0);
        assert_eq!(
            kinds(&mut rx),
            vec![
                (EventKind::RemoteStreamAdded, Some("bob".to_string())),
                (EventKind::RemoteStreamRemoved, Some("bob".to_string())),
                (EventKind::RemoteStreamAdded, Some("bob".to_string())),
            ]
        );
    }

    #[test]
    fn test_remove_releases_once() {
        let (registry, _rx) = registry_with_sink();
        let stream = FakeStream::new("carol");
        registry.upsert("carol", stream.clone());

        assert!(registry.remove("carol"));
        assert!(!registry.remove("carol"));

        assert_eq!(stream.close_count(), 1);
        assert!(registry.lookup("carol").is_none());
    }

    #[test]
    fn test_withdraw_keeps_newer_entry_for_same_identifier() {
        let (registry, _rx) = registry_with_sink();
        let old_stream = FakeStream::new("bob");
        let new_stream = FakeStream::new("bob");
        let old = registry.upsert("bob", old_stream.clone());
        let new = registry.upsert("bob", new_stream.clone());

        assert!(!registry.withdraw(&old));
        assert_eq!(old_stream.close_count(), 1);
        assert_eq!(new_stream.close_count(), 0);
        assert!(registry.lookup("bob").is_some());

        assert!(registry.withdraw(&new));
        assert_eq!(new_stream.close_count(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_drain_all_releases_every_entry_exactly_once() {
        let (registry, mut rx) = registry_with_sink();
        let streams: Vec<_> = ["bob", "carol", "dave"]
            .iter()
            .map(|id| {
                let s = FakeStream::new(id);
                registry.upsert(id, s.clone());
                s
            })
            .collect();
        let _added = kinds(&mut rx);

        assert_eq!(registry.drain_all(), 3);
        assert_eq!(registry.drain_all(), 0);

        assert!(registry.is_empty());
        for stream in &streams {
            assert_eq!(stream.close_count(), 1);
        }
        let removed = kinds(&mut rx);
        assert_eq!(removed.len(), 3);
        assert!(removed
            .iter()
            .all(|(kind, _)| *kind == EventKind::RemoteStreamRemoved));
    }

    #[test]
    fn test_registry_never_holds_a_closed_stream() {
        let (registry, _rx) = registry_with_sink();
        let mut streams = Vec::new();

        // Interleave upserts, removes and drains.
        for round in 0..4 {
            for id in ["bob", "carol"] {
                let s = FakeStream::new(id);
                registry.upsert(id, s.clone());
                streams.push(s);
            }
            if round % 2 == 0 {
                registry.remove("bob");
            } else {
                registry.drain_all();
            }
            for id in registry.remote_ids() {
                let participant = registry.lookup(&id).unwrap();
                assert!(!participant.is_released());
            }
        }

        registry.drain_all();
        assert!(streams.iter().all(|s| s.close_count() == 1));
    }

    #[test]
    fn test_concurrent_upsert_and_drain() {
        let bridge = Arc::new(EventBridge::new("alice"));
        let registry = Arc::new(ParticipantRegistry::new(bridge));
        let streams: Arc<std::sync::Mutex<Vec<Arc<FakeStream>>>> = Arc::default();

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let registry = Arc::clone(&registry);
                let streams = Arc::clone(&streams);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let id = format!("peer-{}", (worker + i) % 5);
                        let s = FakeStream::new(&id);
                        streams.lock().unwrap().push(s.clone());
                        registry.upsert(&id, s);
                        if i % 7 == 0 {
                            registry.drain_all();
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        registry.drain_all();

        let streams = streams.lock().unwrap();
        assert_eq!(streams.len(), 200);
        assert!(streams.iter().all(|s| s.close_count() == 1));
    }
}
