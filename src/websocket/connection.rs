use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::models::SendMessage;
use crate::sync::{BroadcastHub, CollabEngine, Topic};

/// Outgoing frames of one connection, drained by its writer task.
pub type Outbox = UnboundedSender<Arc<SendMessage>>;

/// Per-connection context passed to the message handlers.
pub struct Connection {
    pub session_id: String,
    pub engine: Arc<CollabEngine>,
    pub outbox: Outbox,
    pub subscriptions: Subscriptions,
}

impl Connection {
    /// Queue a frame for this client only.
    pub fn reply(&self, message: SendMessage) {
        if self.outbox.send(Arc::new(message)).is_err() {
            debug!("Connection {} closed before reply", self.session_id);
        }
    }
}

/// Topics this connection listens to, each forwarded into the outbox.
pub struct Subscriptions {
    hub: Arc<BroadcastHub>,
    outbox: Outbox,
    forwarders: HashMap<Topic, JoinHandle<()>>,
}

impl Subscriptions {
    pub fn new(hub: Arc<BroadcastHub>, outbox: Outbox) -> Self {
        Self {
            hub,
            outbox,
            forwarders: HashMap::new(),
        }
    }

    /// Start forwarding a topic. Following a topic twice is a no-op.
    pub fn follow(&mut self, topic: Topic) {
        if self.forwarders.contains_key(&topic) {
            return;
        }
        let mut rx = self.hub.subscribe(topic.clone());
        let outbox = self.outbox.clone();
        let name = topic.to_string();
        let forwarder = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(message) => {
                        if outbox.send(message).is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Subscriber on {} lagged, skipped {} messages", name, skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        self.forwarders.insert(topic, forwarder);
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        for (_, forwarder) in self.forwarders.drain() {
            forwarder.abort();
        }
    }
}

/// Removes the session from the registry however the connection ends.
pub struct SessionGuard {
    engine: Arc<CollabEngine>,
    session_id: String,
}

impl SessionGuard {
    pub fn connect(engine: Arc<CollabEngine>, session_id: String) -> Self {
        engine.connect(&session_id);
        Self { engine, session_id }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.engine.disconnect(&self.session_id);
    }
}
