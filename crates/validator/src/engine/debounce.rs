//! Keyed debouncing
//!
//! At most one pending task per key. Scheduling a key again aborts the
//! previous task before its timer fires, so a burst of changes runs the
//! work once, with the last input.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Returned when there is no tokio runtime to spawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("debounced work must be scheduled from inside a tokio runtime")]
pub struct NoRuntime;

#[derive(Debug, Default)]
pub struct Debouncer {
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `work` after `delay` unless `key` is scheduled or cancelled again first.
    pub fn schedule<F>(&self, key: &str, delay: Duration, work: F) -> Result<(), NoRuntime>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| NoRuntime)?;
        let task = runtime.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            work.await;
        });

        let mut tasks = self.tasks.lock();
        tasks.retain(|_, handle| !handle.is_finished());
        if let Some(previous) = tasks.insert(key.to_string(), task) {
            previous.abort();
            tracing::trace!(key, "debounced task restarted");
        }
        Ok(())
    }

    /// Aborts the pending task for `key`. Returns true if one was pending.
    pub fn cancel(&self, key: &str) -> bool {
        match self.tasks.lock().remove(key) {
            Some(handle) => {
                let pending = !handle.is_finished();
                handle.abort();
                pending
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        for (_, handle) in self.tasks.lock().drain() {
            handle.abort();
        }
    }

    /// Number of tasks that have not finished yet.
    pub fn pending(&self) -> usize {
        self.tasks
            .lock()
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.tasks
            .lock()
            .get(key)
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.get_mut().drain() {
            handle.abort();
        }
    }
}
