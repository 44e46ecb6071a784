use std::sync::Arc;
use std::time::Duration;

use colabri_editor::config::EngineSettings;
use colabri_editor::db::MemoryStore;
use colabri_editor::state::AppState;
use colabri_editor::sync::{BroadcastHub, CollabEngine};

pub fn test_settings() -> EngineSettings {
    EngineSettings {
        backup_interval: Duration::from_secs(3600),
        lock_timeout: Duration::from_secs(2),
        shutdown_timeout: Duration::from_secs(1),
        persist_concurrency: 4,
    }
}

/// App state over an in-memory store, plus a handle on that store.
pub fn test_state() -> (Arc<AppState>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let hub = Arc::new(BroadcastHub::new());
    let engine = Arc::new(CollabEngine::start(store.clone(), hub.clone(), test_settings()));
    (Arc::new(AppState { engine, hub }), store)
}
