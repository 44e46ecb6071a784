use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

use crate::models::{SendMessage, UsersMessage};
use super::broadcast::{BroadcastSink, Topic};

/// Set of connected session ids.
///
/// The user count is the cardinality of the set, so a duplicate disconnect or
/// a disconnect for an unknown id cannot push it below the real number.
pub struct SessionRegistry {
    sessions: RwLock<HashSet<String>>,
    sink: Arc<dyn BroadcastSink>,
}

impl SessionRegistry {
    pub fn new(sink: Arc<dyn BroadcastSink>) -> Self {
        Self {
            sessions: RwLock::new(HashSet::new()),
            sink,
        }
    }

    /// Register a session and broadcast the new count.
    pub fn connect(&self, session_id: &str) -> usize {
        let count = {
            let mut sessions = self.sessions.write().unwrap_or_else(|p| p.into_inner());
            if !sessions.insert(session_id.to_string()) {
                warn!("Session {} connected twice", session_id);
            }
            sessions.len()
        };
        debug!("Session {} connected, {} active", session_id, count);
        self.broadcast_count(count);
        count
    }

    /// Remove a session and broadcast the new count.
    pub fn disconnect(&self, session_id: &str) -> usize {
        let count = {
            let mut sessions = self.sessions.write().unwrap_or_else(|p| p.into_inner());
            sessions.remove(session_id);
            sessions.len()
        };
        debug!("Session {} disconnected, {} active", session_id, count);
        self.broadcast_count(count);
        count
    }

    /// Re-broadcast the current count without changing anything.
    pub fn request_count(&self) -> usize {
        let count = self.count();
        self.broadcast_count(count);
        count
    }

    pub fn count(&self) -> usize {
        self.sessions.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    fn broadcast_count(&self, count: usize) {
        self.sink.publish(&Topic::Users, SendMessage::Users(UsersMessage { count }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::broadcast::testing::RecordingSink;
    use pretty_assertions::assert_eq;

    fn registry() -> (SessionRegistry, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        (SessionRegistry::new(sink.clone()), sink)
    }

    fn counts(sink: &RecordingSink) -> Vec<usize> {
        sink.on(&Topic::Users)
            .into_iter()
            .map(|m| match m {
                SendMessage::Users(UsersMessage { count }) => count,
                other => panic!("unexpected message: {:?}", other),
            })
            .collect()
    }

    #[test]
    fn every_change_broadcasts_the_count() {
        let (registry, sink) = registry();
        registry.connect("a");
        registry.connect("b");
        registry.disconnect("a");
        registry.request_count();
        assert_eq!(counts(&sink), vec![1, 2, 1, 1]);
    }

    #[test]
    fn stray_disconnects_never_go_negative() {
        let (registry, _sink) = registry();
        assert_eq!(registry.disconnect("ghost"), 0);
        registry.connect("a");
        registry.disconnect("a");
        assert_eq!(registry.disconnect("a"), 0);
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn duplicate_connect_counts_once() {
        let (registry, _sink) = registry();
        registry.connect("a");
        assert_eq!(registry.connect("a"), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn count_matches_connected_ids_under_interleaving() {
        let (registry, _sink) = registry();
        let registry = Arc::new(registry);
        let mut handles = Vec::new();
        for i in 0..64 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                let id = format!("session-{}", i);
                registry.connect(&id);
                tokio::task::yield_now().await;
                // odd sessions leave, some of them twice
                if i % 2 == 1 {
                    registry.disconnect(&id);
                    if i % 3 == 0 {
                        registry.disconnect(&id);
                    }
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(registry.count(), 32);
    }
}
