use tokio::sync::mpsc;

use crate::models::Edit;
use super::SyncError;

/// Producer side of the edit ingestion queue. Cheap to clone.
#[derive(Clone, Debug)]
pub struct EditQueue {
    tx: mpsc::UnboundedSender<Edit>,
}

/// Consumer side, owned by the worker.
#[derive(Debug)]
pub struct EditReceiver {
    rx: mpsc::UnboundedReceiver<Edit>,
}

/// Create an unbounded FIFO edit queue.
pub fn edit_queue() -> (EditQueue, EditReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EditQueue { tx }, EditReceiver { rx })
}

impl EditQueue {
    /// Append an edit. Only fails once the consumer has closed the queue.
    pub fn enqueue(&self, edit: Edit) -> Result<(), SyncError> {
        self.tx.send(edit).map_err(|_| SyncError::QueueClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl EditReceiver {
    /// Wait for the next edit. `None` once the queue is closed and drained.
    pub async fn dequeue(&mut self) -> Option<Edit> {
        self.rx.recv().await
    }

    /// Refuse further edits. Already queued edits can still be dequeued.
    pub fn close(&mut self) {
        self.rx.close();
    }

    pub(crate) fn len(&self) -> usize {
        self.rx.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn preserves_global_arrival_order() {
        let (queue, mut rx) = edit_queue();
        queue.enqueue(Edit::new("a", "1", "alice")).unwrap();
        queue.enqueue(Edit::new("b", "1", "bob")).unwrap();
        queue.enqueue(Edit::new("a", "2", "alice")).unwrap();

        let order: Vec<(String, String)> = [
            rx.dequeue().await.unwrap(),
            rx.dequeue().await.unwrap(),
            rx.dequeue().await.unwrap(),
        ]
        .into_iter()
        .map(|e| (e.doc_id, e.content))
        .collect();
        assert_eq!(order, vec![("a".into(), "1".into()), ("b".into(), "1".into()), ("a".into(), "2".into())]);
    }

    #[tokio::test]
    async fn close_rejects_new_edits_but_drains_queued_ones() {
        let (queue, mut rx) = edit_queue();
        queue.enqueue(Edit::new("a", "kept", "alice")).unwrap();
        rx.close();

        assert!(queue.is_closed());
        assert!(matches!(queue.enqueue(Edit::new("a", "late", "bob")), Err(SyncError::QueueClosed)));
        assert_eq!(rx.dequeue().await.unwrap().content, "kept");
        assert!(rx.dequeue().await.is_none());
    }
}
