use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::db::{SaveOutcome, StoreError};
use super::coordinator::Coordinator;
use super::task::TaskHandle;
use super::SyncError;

/// Outcome of one flush cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub attempted: usize,
    pub created: usize,
    pub updated: usize,
    pub failed: Vec<String>,
}

impl FlushReport {
    pub fn saved(&self) -> usize {
        self.created + self.updated
    }

    pub fn is_empty(&self) -> bool {
        self.attempted == 0
    }
}

/// Persists dirty documents to the store.
///
/// Ids taken from the dirty set stay pending here until their save is
/// confirmed or they are marked dirty again, so a cycle that is cut short
/// leaves them for the next one. Cycles never overlap.
pub struct Flusher {
    coordinator: Arc<Coordinator>,
    concurrency: usize,
    pending: Mutex<HashSet<String>>,
    cycle: tokio::sync::Mutex<()>,
}

impl Flusher {
    pub fn new(coordinator: Arc<Coordinator>, concurrency: usize) -> Self {
        Self {
            coordinator,
            concurrency: concurrency.max(1),
            pending: Mutex::new(HashSet::new()),
            cycle: tokio::sync::Mutex::new(()),
        }
    }

    fn pending_ids(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.pending.lock().unwrap_or_else(|p| p.into_inner())
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> HashSet<String> {
        self.pending_ids().clone()
    }

    /// Run one flush cycle: snapshot the dirty set and save every document in it.
    ///
    /// Fails without touching the store when the coordinator lock cannot be
    /// taken in time. Nothing is lost in that case.
    pub async fn flush(&self) -> Result<FlushReport, SyncError> {
        let _cycle = self.cycle.lock().await;

        let snapshot = self.coordinator.snapshot_and_clear_dirty().await?;
        let batch = {
            let mut pending = self.pending_ids();
            pending.extend(snapshot);
            pending.clone()
        };
        if batch.is_empty() {
            return Ok(FlushReport::default());
        }

        let docs = self.coordinator.documents(&batch).await?;

        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut saves = JoinSet::new();
        for doc in docs {
            let store = self.coordinator.store().clone();
            let permits = permits.clone();
            saves.spawn(async move {
                let outcome = match permits.acquire_owned().await {
                    Ok(_permit) => store.save(&doc).await,
                    Err(e) => Err(StoreError::Unavailable(e.to_string())),
                };
                (doc.doc_id, outcome)
            });
        }

        let mut report = FlushReport { attempted: batch.len(), ..FlushReport::default() };
        let mut persisted = HashSet::new();
        while let Some(joined) = saves.join_next().await {
            match joined {
                Ok((doc_id, Ok(outcome))) => {
                    match outcome {
                        SaveOutcome::Created => report.created += 1,
                        SaveOutcome::Updated => report.updated += 1,
                    }
                    debug!("Persisted document {} ({:?})", doc_id, outcome);
                    self.pending_ids().remove(&doc_id);
                    persisted.insert(doc_id);
                }
                Ok((doc_id, Err(e))) => {
                    error!("Failed to persist document {}: {}", doc_id, e);
                }
                Err(e) => {
                    error!("Persist task failed: {}", e);
                }
            }
        }

        // anything not confirmed saved is still dirty, panicked tasks included
        report.failed = batch.into_iter().filter(|id| !persisted.contains(id)).collect();
        report.failed.sort();
        if !report.failed.is_empty() {
            match self.coordinator.mark_dirty(report.failed.iter().cloned()).await {
                Ok(()) => {
                    let mut pending = self.pending_ids();
                    for doc_id in &report.failed {
                        pending.remove(doc_id);
                    }
                }
                Err(e) => warn!("Keeping {} failed documents for next cycle: {}", report.failed.len(), e),
            }
        }

        info!(
            "Backup cycle: {} attempted, {} created, {} updated, {} failed",
            report.attempted,
            report.created,
            report.updated,
            report.failed.len()
        );
        Ok(report)
    }
}

/// Spawn the periodic backup task.
pub fn spawn_backup_scheduler(flusher: Arc<Flusher>, every: Duration, parent: &CancellationToken) -> TaskHandle {
    TaskHandle::spawn("backup", parent, move |cancel| async move {
        let mut ticker = interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Backup scheduler interrupted");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = flusher.flush().await {
                        warn!("Skipping backup cycle: {}", e);
                    }
                }
            }
        }
    })
}
