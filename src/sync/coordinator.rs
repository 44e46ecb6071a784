use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::db::DocumentStore;
use crate::models::{Document, JoinReply, DEFAULT_TITLE};
use super::lock::TimedMutex;
use super::SyncError;

/// In-memory view of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentState {
    pub content: String,
    pub title: String,
    pub owner: Option<String>,
}

impl DocumentState {
    fn blank() -> Self {
        Self {
            content: String::new(),
            title: DEFAULT_TITLE.to_string(),
            owner: None,
        }
    }

    fn to_document(&self, doc_id: &str) -> Document {
        Document {
            doc_id: doc_id.to_string(),
            title: self.title.clone(),
            content: self.content.clone(),
            owner: self.owner.clone(),
        }
    }
}

impl From<Document> for DocumentState {
    fn from(doc: Document) -> Self {
        Self {
            content: doc.content,
            title: doc.title,
            owner: doc.owner,
        }
    }
}

/// Everything guarded by the coordinator lock.
#[derive(Debug, Default)]
pub struct SharedState {
    docs: HashMap<String, DocumentState>,
    dirty: HashSet<String>,
}

/// Counts reported for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorStats {
    pub cached: usize,
    pub dirty: usize,
}

/// Owner of the shared document cache and the dirty set.
///
/// A single coarse lock serializes every read and write of both, and every
/// acquisition is bounded by the lock timeout.
pub struct Coordinator {
    state: TimedMutex<SharedState>,
    store: Arc<dyn DocumentStore>,
}

impl Coordinator {
    pub fn new(store: Arc<dyn DocumentStore>, lock_timeout: Duration) -> Self {
        Self {
            state: TimedMutex::new(SharedState::default(), lock_timeout),
            store,
        }
    }

    pub(crate) fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Replace the content of a document and mark it dirty.
    pub async fn apply_edit(&self, doc_id: &str, content: &str) -> Result<(), SyncError> {
        let mut state = self.state.lock().await.map_err(|e| {
            warn!("Dropping edit for document {}: {}", doc_id, e);
            e
        })?;
        let SharedState { docs, dirty } = &mut *state;
        docs.entry(doc_id.to_string())
            .or_insert_with(DocumentState::blank)
            .content = content.to_string();
        dirty.insert(doc_id.to_string());
        debug!("Applied edit to document {} ({} bytes)", doc_id, content.len());
        Ok(())
    }

    /// Return the cached document, loading it from the store on first use.
    ///
    /// The store read happens under the lock, so concurrent first joins on the
    /// same document cost a single load. A store error leaves the cache
    /// untouched so the next join retries.
    pub async fn load_or_get(&self, doc_id: &str) -> Result<JoinReply, SyncError> {
        let mut state = self.state.lock().await.map_err(|e| {
            warn!("Join on document {} abandoned: {}", doc_id, e);
            e
        })?;

        if let Some(doc) = state.docs.get(doc_id) {
            return Ok(reply(doc_id, doc));
        }

        let loaded = match self.store.load(doc_id).await {
            Ok(Some(doc)) => {
                info!("Loaded document {} from store", doc_id);
                DocumentState::from(doc)
            }
            Ok(None) => {
                info!("Document {} not found in store, starting empty", doc_id);
                DocumentState::blank()
            }
            Err(e) => {
                error!("Failed to load document {}: {}", doc_id, e);
                return Err(e.into());
            }
        };
        let joined = reply(doc_id, &loaded);
        state.docs.insert(doc_id.to_string(), loaded);
        Ok(joined)
    }

    /// Take the current dirty set and clear exactly those entries.
    ///
    /// Anything marked dirty after the swap stays for the next cycle.
    pub async fn snapshot_and_clear_dirty(&self) -> Result<HashSet<String>, SyncError> {
        let mut state = self.state.lock().await?;
        let snapshot = state.dirty.clone();
        for doc_id in &snapshot {
            state.dirty.remove(doc_id);
        }
        Ok(snapshot)
    }

    /// Mark documents dirty again, e.g. after their save failed.
    pub async fn mark_dirty<I>(&self, doc_ids: I) -> Result<(), SyncError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut state = self.state.lock().await?;
        state.dirty.extend(doc_ids);
        Ok(())
    }

    /// Current cached records of the given documents. Unknown ids are skipped.
    pub async fn documents<'a, I>(&self, doc_ids: I) -> Result<Vec<Document>, SyncError>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let state = self.state.lock().await?;
        Ok(doc_ids
            .into_iter()
            .filter_map(|id| state.docs.get(id).map(|doc| doc.to_document(id)))
            .collect())
    }

    pub async fn content(&self, doc_id: &str) -> Result<Option<String>, SyncError> {
        let state = self.state.lock().await?;
        Ok(state.docs.get(doc_id).map(|doc| doc.content.clone()))
    }

    pub async fn is_dirty(&self, doc_id: &str) -> Result<bool, SyncError> {
        Ok(self.state.lock().await?.dirty.contains(doc_id))
    }

    pub async fn stats(&self) -> Result<CoordinatorStats, SyncError> {
        let state = self.state.lock().await?;
        Ok(CoordinatorStats {
            cached: state.docs.len(),
            dirty: state.dirty.len(),
        })
    }

    #[cfg(test)]
    pub(crate) async fn hold_lock_for(&self, hold: Duration) {
        let _guard = self.state.lock().await.unwrap();
        tokio::time::sleep(hold).await;
    }
}

fn reply(doc_id: &str, doc: &DocumentState) -> JoinReply {
    JoinReply {
        doc_id: doc_id.to_string(),
        content: doc.content.clone(),
        title: doc.title.clone(),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::db::{DocumentStore, MemoryStore, SaveOutcome, StoreError};
    use crate::models::Document;

    /// Store wrapper that counts calls, can delay loads and saves, and can fail them.
    #[derive(Default)]
    pub struct ProbeStore {
        pub inner: MemoryStore,
        pub loads: AtomicUsize,
        pub saves: Mutex<Vec<Document>>,
        pub load_delay: Option<Duration>,
        pub failing: Mutex<Vec<String>>,
        pub fail_loads: AtomicBool,
        pub save_delay: Option<Duration>,
        pub saving: AtomicUsize,
        pub peak_saving: AtomicUsize,
    }

    impl ProbeStore {
        pub fn with_documents(docs: impl IntoIterator<Item = Document>) -> Self {
            Self { inner: MemoryStore::with_documents(docs), ..Self::default() }
        }

        pub fn fail_saves_for(&self, doc_id: &str) {
            self.failing.lock().unwrap().push(doc_id.to_string());
        }

        pub fn heal(&self) {
            self.failing.lock().unwrap().clear();
        }

        pub fn load_count(&self) -> usize {
            self.loads.load(Ordering::SeqCst)
        }

        pub fn saved(&self) -> Vec<Document> {
            self.saves.lock().unwrap().clone()
        }

        /// Most saves that were ever in flight at once.
        pub fn peak_saving(&self) -> usize {
            self.peak_saving.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DocumentStore for ProbeStore {
        async fn load(&self, doc_id: &str) -> Result<Option<Document>, StoreError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.load_delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_loads.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable(format!("cannot load {}", doc_id)));
            }
            self.inner.load(doc_id).await
        }

        async fn save(&self, doc: &Document) -> Result<SaveOutcome, StoreError> {
            self.saves.lock().unwrap().push(doc.clone());
            let now = self.saving.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_saving.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.save_delay {
                tokio::time::sleep(delay).await;
            }
            self.saving.fetch_sub(1, Ordering::SeqCst);
            if self.failing.lock().unwrap().contains(&doc.doc_id) {
                return Err(StoreError::Unavailable(format!("refusing {}", doc.doc_id)));
            }
            self.inner.save(doc).await
        }

        async fn list(&self, owner: Option<&str>) -> Result<Vec<Document>, StoreError> {
            self.inner.list(owner).await
        }
    }
}
