use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// How a background task ended when it was asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The task returned on its own within the deadline.
    Stopped,
    /// The deadline passed and the task was aborted.
    TimedOut,
    /// The task had already died from a panic.
    Panicked,
}

impl StopOutcome {
    pub fn is_clean(self) -> bool {
        self == StopOutcome::Stopped
    }
}

/// A spawned background task with an explicit stop contract.
pub struct TaskHandle {
    name: &'static str,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl TaskHandle {
    /// Spawn `run` with a child of `parent`, so cancelling the parent stops
    /// the task too.
    pub fn spawn<F, Fut>(name: &'static str, parent: &CancellationToken, run: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = parent.child_token();
        let join = tokio::spawn(run(cancel.clone()));
        info!("Started {} task", name);
        Self { name, cancel, join }
    }

    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Signal the task and wait up to `timeout` for it to return.
    pub async fn stop(self, timeout: Duration) -> StopOutcome {
        self.cancel.cancel();
        let mut join = self.join;
        match tokio::time::timeout(timeout, &mut join).await {
            Ok(Ok(())) => {
                info!("{} task stopped", self.name);
                StopOutcome::Stopped
            }
            Ok(Err(e)) if e.is_panic() => {
                error!("{} task panicked: {}", self.name, e);
                StopOutcome::Panicked
            }
            Ok(Err(e)) => {
                warn!("{} task ended abnormally: {}", self.name, e);
                StopOutcome::Stopped
            }
            Err(_) => {
                warn!("{} task did not stop within {:?}, aborting", self.name, timeout);
                join.abort();
                StopOutcome::TimedOut
            }
        }
    }
}
