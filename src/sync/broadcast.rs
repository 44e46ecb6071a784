use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, error};

use crate::models::SendMessage;

/// Capacity of each topic channel. Receivers that fall behind skip messages.
const TOPIC_CAPACITY: usize = 256;

/// Destination of a broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Everyone viewing one document.
    Document(String),
    /// Replies addressed to one sender.
    History(String),
    /// Global active user count.
    Users,
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Document(doc_id) => write!(f, "/topic/document/{}", doc_id),
            Topic::History(sender) => write!(f, "/topic/history/{}", sender),
            Topic::Users => write!(f, "/topic/users"),
        }
    }
}

/// Fan-out notification channel to subscribed clients.
pub trait BroadcastSink: Send + Sync {
    fn publish(&self, topic: &Topic, message: SendMessage);
}

/// In-process topic hub backed by one tokio broadcast channel per topic.
#[derive(Default)]
pub struct BroadcastHub {
    topics: Mutex<HashMap<Topic, broadcast::Sender<Arc<SendMessage>>>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a topic, opening it if needed.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Arc<SendMessage>> {
        let mut topics = match self.topics.lock() {
            Ok(topics) => topics,
            Err(poisoned) => poisoned.into_inner(),
        };
        topics
            .entry(topic)
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .subscribe()
    }

    /// Number of open topics.
    pub fn topic_count(&self) -> usize {
        match self.topics.lock() {
            Ok(topics) => topics.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

impl BroadcastSink for BroadcastHub {
    fn publish(&self, topic: &Topic, message: SendMessage) {
        let mut topics = match self.topics.lock() {
            Ok(topics) => topics,
            Err(poisoned) => {
                error!("Broadcast hub lock poisoned, recovering");
                poisoned.into_inner()
            }
        };
        let Some(sender) = topics.get(topic) else {
            debug!("No subscribers on {}", topic);
            return;
        };
        // send() only fails when every receiver is gone; drop the topic then
        if sender.send(Arc::new(message)).is_err() {
            debug!("Closing topic {} without subscribers", topic);
            topics.remove(topic);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UsersMessage;

    fn users(count: usize) -> SendMessage {
        SendMessage::Users(UsersMessage { count })
    }

    #[test]
    fn topics_render_as_paths() {
        assert_eq!(Topic::Document("doc1".into()).to_string(), "/topic/document/doc1");
        assert_eq!(Topic::History("alice".into()).to_string(), "/topic/history/alice");
        assert_eq!(Topic::Users.to_string(), "/topic/users");
    }

    #[tokio::test]
    async fn subscribers_only_see_their_topic() {
        let hub = BroadcastHub::new();
        let mut doc_rx = hub.subscribe(Topic::Document("doc1".into()));
        let mut users_rx = hub.subscribe(Topic::Users);

        hub.publish(&Topic::Users, users(2));

        let got = users_rx.recv().await.unwrap();
        assert!(matches!(*got, SendMessage::Users(UsersMessage { count: 2 })));
        assert!(doc_rx.try_recv().is_err());
    }

    #[test]
    fn topic_without_receivers_is_dropped_on_publish() {
        let hub = BroadcastHub::new();
        drop(hub.subscribe(Topic::Users));
        assert_eq!(hub.topic_count(), 1);

        hub.publish(&Topic::Users, users(0));
        assert_eq!(hub.topic_count(), 0);
    }
}
