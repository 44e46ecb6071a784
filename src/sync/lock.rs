use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};

use super::SyncError;

/// A mutex that is only ever acquired with a bounded wait.
///
/// Every caller either gets the guard within `timeout` or a
/// [`SyncError::LockTimeout`], so contention can delay a caller but never
/// park it forever.
#[derive(Debug)]
pub struct TimedMutex<T> {
    inner: Mutex<T>,
    timeout: Duration,
}

impl<T> TimedMutex<T> {
    pub fn new(value: T, timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(value),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Acquire the lock, giving up after the configured timeout.
    pub async fn lock(&self) -> Result<MutexGuard<'_, T>, SyncError> {
        tokio::time::timeout(self.timeout, self.inner.lock())
            .await
            .map_err(|_| SyncError::LockTimeout { waited: self.timeout })
    }
}
