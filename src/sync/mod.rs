//! The edit pipeline.
//!
//! Producers push [`Edit`](crate::models::Edit)s onto an unbounded queue. A
//! single worker applies them to the shared cache through the
//! [`Coordinator`], whose one lock is always taken with a timeout, and
//! broadcasts each applied edit. A backup task periodically takes the dirty
//! set and persists those documents concurrently. [`CollabEngine`] starts
//! both tasks and owns the shutdown sequence.

pub mod backup;
pub mod broadcast;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod lock;
pub mod queue;
pub mod sessions;
pub mod task;
pub mod worker;

pub use backup::{FlushReport, Flusher};
pub use broadcast::{BroadcastHub, BroadcastSink, Topic};
pub use coordinator::{Coordinator, CoordinatorStats};
pub use engine::{CollabEngine, FinalFlush, ShutdownReport};
pub use error::SyncError;
pub use queue::{edit_queue, EditQueue, EditReceiver};
pub use sessions::SessionRegistry;
pub use task::{StopOutcome, TaskHandle};
