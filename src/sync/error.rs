use std::time::Duration;
use thiserror::Error;

use crate::db::StoreError;

/// Failures of the edit pipeline. None of them are fatal to the process.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("coordinator lock not acquired within {waited:?}")]
    LockTimeout { waited: Duration },

    #[error("edit queue is closed")]
    QueueClosed,

    #[error("document store failure: {0}")]
    Store(#[from] StoreError),
}
