use std::sync::Arc;

use crate::sync::{BroadcastHub, CollabEngine};

/// Shared state handed to every HTTP and WebSocket handler.
pub struct AppState {
    pub engine: Arc<CollabEngine>,
    pub hub: Arc<BroadcastHub>,
}
