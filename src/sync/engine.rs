use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::EngineSettings;
use crate::db::DocumentStore;
use crate::models::{Document, Edit, JoinReply, SendMessage};
use super::backup::{spawn_backup_scheduler, FlushReport, Flusher};
use super::broadcast::{BroadcastSink, Topic};
use super::coordinator::Coordinator;
use super::queue::{edit_queue, EditQueue};
use super::sessions::SessionRegistry;
use super::task::{StopOutcome, TaskHandle};
use super::worker::spawn_worker;
use super::SyncError;

/// Tries the final flush gets before giving up on the dirty set.
const FINAL_FLUSH_ATTEMPTS: u32 = 3;

/// Result of the flush run at shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalFlush {
    Completed(FlushReport),
    /// The dirty set could not be read on any attempt. Nothing was saved.
    Unreadable { attempts: u32 },
}

impl FinalFlush {
    pub fn report(&self) -> Option<&FlushReport> {
        match self {
            FinalFlush::Completed(report) => Some(report),
            FinalFlush::Unreadable { .. } => None,
        }
    }
}

/// What happened during [`CollabEngine::shutdown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    pub worker: StopOutcome,
    pub backup: StopOutcome,
    pub final_flush: FinalFlush,
}

struct BackgroundTasks {
    worker: TaskHandle,
    backup: TaskHandle,
}

/// The edit pipeline: queue, worker, coordinator, backup scheduler and
/// session registry, started together and stopped together.
pub struct CollabEngine {
    coordinator: Arc<Coordinator>,
    sessions: SessionRegistry,
    queue: EditQueue,
    sink: Arc<dyn BroadcastSink>,
    flusher: Arc<Flusher>,
    running: CancellationToken,
    settings: EngineSettings,
    tasks: Mutex<Option<BackgroundTasks>>,
}

impl CollabEngine {
    /// Build the pipeline and spawn its worker and backup tasks.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(store: Arc<dyn DocumentStore>, sink: Arc<dyn BroadcastSink>, settings: EngineSettings) -> Self {
        let coordinator = Arc::new(Coordinator::new(store, settings.lock_timeout));
        let flusher = Arc::new(Flusher::new(coordinator.clone(), settings.persist_concurrency));
        let (queue, receiver) = edit_queue();
        let running = CancellationToken::new();

        let worker = spawn_worker(coordinator.clone(), sink.clone(), receiver, &running);
        let backup = spawn_backup_scheduler(flusher.clone(), settings.backup_interval, &running);
        info!(
            "Edit pipeline started (backup every {:?}, lock timeout {:?})",
            settings.backup_interval, settings.lock_timeout
        );

        Self {
            coordinator,
            sessions: SessionRegistry::new(sink.clone()),
            queue,
            sink,
            flusher,
            running,
            settings,
            tasks: Mutex::new(Some(BackgroundTasks { worker, backup })),
        }
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn is_running(&self) -> bool {
        !self.running.is_cancelled()
    }

    /// Queue an edit. Its broadcast happens once the worker applies it.
    pub fn submit_edit(&self, edit: Edit) -> Result<(), SyncError> {
        self.queue.enqueue(edit).map_err(|e| {
            warn!("Edit rejected, pipeline is shutting down");
            e
        })
    }

    /// Load or fetch a document for `sender` and answer on its history topic.
    ///
    /// Joining also refreshes the user count for everyone.
    pub async fn join(&self, doc_id: &str, sender: &str) -> Result<JoinReply, SyncError> {
        let reply = self.coordinator.load_or_get(doc_id).await?;
        self.sink.publish(&Topic::History(sender.to_string()), SendMessage::History(reply.clone()));
        self.sessions.request_count();
        Ok(reply)
    }

    /// Documents already persisted, optionally only those of `owner`.
    ///
    /// Edits not yet flushed are not reflected here.
    pub async fn list_documents(&self, owner: Option<&str>) -> Result<Vec<Document>, SyncError> {
        Ok(self.coordinator.store().list(owner).await?)
    }

    pub fn connect(&self, session_id: &str) -> usize {
        self.sessions.connect(session_id)
    }

    pub fn disconnect(&self, session_id: &str) -> usize {
        self.sessions.disconnect(session_id)
    }

    pub fn request_count(&self) -> usize {
        self.sessions.request_count()
    }

    /// Run a flush cycle now, outside the schedule. Waits for a scheduled
    /// cycle already in progress.
    #[cfg(test)]
    pub(crate) async fn flush_now(&self) -> Result<FlushReport, SyncError> {
        self.flusher.flush().await
    }

    /// Stop the background tasks, then persist whatever is still dirty.
    ///
    /// The final flush runs even if a task had to be aborted. Returns `None`
    /// when the engine was already shut down.
    pub async fn shutdown(&self) -> Option<ShutdownReport> {
        let tasks = self.tasks.lock().await.take()?;
        info!("Shutting down edit pipeline");
        self.running.cancel();

        let timeout = self.settings.shutdown_timeout;
        let (worker, backup) = tokio::join!(tasks.worker.stop(timeout), tasks.backup.stop(timeout));
        if !worker.is_clean() || !backup.is_clean() {
            warn!("Background tasks did not stop cleanly (worker {:?}, backup {:?})", worker, backup);
        }

        let final_flush = self.final_flush().await;
        Some(ShutdownReport { worker, backup, final_flush })
    }

    async fn final_flush(&self) -> FinalFlush {
        for attempt in 1..=FINAL_FLUSH_ATTEMPTS {
            match self.flusher.flush().await {
                Ok(report) => {
                    if report.failed.is_empty() {
                        info!("Final flush persisted {} documents", report.saved());
                    } else {
                        warn!("Final flush left {} documents unsaved: {:?}", report.failed.len(), report.failed);
                    }
                    return FinalFlush::Completed(report);
                }
                Err(e) => warn!("Final flush attempt {}/{} failed: {}", attempt, FINAL_FLUSH_ATTEMPTS, e),
            }
        }
        error!("Final flush could not snapshot dirty documents, unsaved edits are lost");
        FinalFlush::Unreadable { attempts: FINAL_FLUSH_ATTEMPTS }
    }
}
