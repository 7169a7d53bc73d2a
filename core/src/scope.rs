//! Task ownership for controllers.
//!
//! A controller spawns all of its work through a [`TaskScope`]; dropping the
//! scope aborts whatever is still running so nothing publishes after the
//! controller is gone.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::AbortHandle;

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) struct TaskScope {
    runtime: Handle,
    tasks: Mutex<Vec<AbortHandle>>,
}

impl TaskScope {
    /// Bind to the runtime of the caller. Panics outside a Tokio runtime,
    /// like `tokio::spawn`.
    pub(crate) fn current() -> Self {
        Self {
            runtime: Handle::current(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn runtime(&self) -> &Handle {
        &self.runtime
    }

    pub(crate) fn spawn<F>(&self, future: F) -> AbortHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = self.runtime.spawn(future).abort_handle();
        let mut tasks = lock(&self.tasks);
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle.clone());
        handle
    }
}

impl Drop for TaskScope {
    fn drop(&mut self) {
        for task in lock(&self.tasks).drain(..) {
            task.abort();
        }
    }
}

/// Lets only the most recently started job publish its outcome.
#[derive(Debug, Default)]
pub(crate) struct Latest {
    generation: AtomicU64,
}

impl Latest {
    /// Start a new job, superseding every earlier ticket.
    pub(crate) fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Replace the state if `ticket` is still current. The check runs under
    /// the channel's write lock, so a superseded job can never land after
    /// the state its successor published.
    pub(crate) fn publish<S>(&self, ticket: u64, sender: &watch::Sender<S>, next: S) -> bool {
        sender.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != ticket {
                return false;
            }
            *state = next;
            true
        })
    }
}
