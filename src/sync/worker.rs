use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::models::{Edit, SendMessage};
use super::broadcast::{BroadcastSink, Topic};
use super::coordinator::Coordinator;
use super::queue::EditReceiver;
use super::task::TaskHandle;

/// Spawn the single consumer of the edit queue.
pub fn spawn_worker(
    coordinator: Arc<Coordinator>,
    sink: Arc<dyn BroadcastSink>,
    queue: EditReceiver,
    parent: &CancellationToken,
) -> TaskHandle {
    TaskHandle::spawn("worker", parent, move |cancel| run(coordinator, sink, queue, cancel))
}

async fn run(
    coordinator: Arc<Coordinator>,
    sink: Arc<dyn BroadcastSink>,
    mut queue: EditReceiver,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = queue.dequeue() => match next {
                Some(edit) => process(&coordinator, sink.as_ref(), edit).await,
                None => {
                    info!("Edit queue closed, worker exiting");
                    return;
                }
            },
        }
    }

    // Stop intake, then apply what producers already handed over. The
    // shutdown join bounds how long this may take.
    queue.close();
    let pending = queue.len();
    if pending > 0 {
        info!("Worker draining {} queued edits", pending);
    }
    while let Some(edit) = queue.dequeue().await {
        process(&coordinator, sink.as_ref(), edit).await;
    }
    info!("Worker interrupted, queue drained");
}

async fn process(coordinator: &Coordinator, sink: &dyn BroadcastSink, edit: Edit) {
    match coordinator.apply_edit(&edit.doc_id, &edit.content).await {
        Ok(()) => {
            debug!("Broadcasting edit on {} from {}", edit.doc_id, edit.sender);
            let topic = Topic::Document(edit.doc_id.clone());
            sink.publish(&topic, SendMessage::Update(edit));
        }
        Err(e) => warn!("Edit on {} from {} dropped: {}", edit.doc_id, edit.sender, e),
    }
}
