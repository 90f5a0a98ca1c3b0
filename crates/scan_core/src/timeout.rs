//! Scanner-inactivity countdown.

use std::{
    future::Future,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use tokio::{task::JoinHandle, time};

/// How long the initial order-assignment scan may sit idle before the
/// "no scan detected" state fires.
pub const ASSIGNMENT_SCAN_TIMEOUT: Duration = Duration::from_secs(15);
/// Shorter window for secondary confirmation scans.
pub const CONFIRMATION_SCAN_TIMEOUT: Duration = Duration::from_secs(4);

/// Single-shot inactivity timer. At most one countdown is pending at a time:
/// starting a new one always aborts the previous one, so a stale timer can
/// never fire after the workflow has moved on.
pub struct TimeoutSupervisor {
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl TimeoutSupervisor {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(None),
        }
    }

    /// Arms the countdown. `on_timeout` runs once after `delay` unless the
    /// timer is cancelled or replaced first.
    pub fn start<F>(&self, delay: Duration, on_timeout: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            time::sleep(delay).await;
            on_timeout.await;
        });
        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Cancel-and-start. Equivalent to `start`, named for call sites that
    /// rearm after a dismissed modal.
    pub fn reset<F>(&self, delay: Duration, on_timeout: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.start(delay, on_timeout);
    }

    /// Drops any pending countdown without firing it.
    pub fn cancel(&self) {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(pending) = pending {
            pending.abort();
        }
    }
}

impl Default for TimeoutSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TimeoutSupervisor {
    fn drop(&mut self) {
        self.cancel();
    }
}
