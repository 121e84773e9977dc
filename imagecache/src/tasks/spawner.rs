//! Detached background task spawning.
//!
//! [`TaskSpawner`] is the execution context handed to the cache. Every task
//! it spawns is detached (the caller never awaits it) but tracked, so the
//! owner can drain in-flight work with [`TaskSpawner::flush`] or
//! [`TaskSpawner::shutdown`].
//!
//! # Supervision
//!
//! Each task is supervised on its own. Its `Result` is logged when it
//! finishes and a panic is caught and logged. Nothing is propagated: one
//! failing task never cancels its siblings or reaches the code that
//! spawned it.
//!
//! # Shutdown
//!
//! A spawn holds the `accepting` read lock from its check until the task is
//! registered with the tracker, and shutdown flips the flag under the write
//! lock. Every task that was accepted is therefore visible to the drain.

use std::any::Any;
use std::fmt::{Debug, Display};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::cache::CacheError;

/// Spawner for detached, supervised background tasks.
///
/// Cheap to clone; clones share the same tracker and shutdown state.
#[derive(Clone)]
pub struct TaskSpawner {
    handle: Handle,
    tracker: TaskTracker,
    accepting: Arc<RwLock<bool>>,
    drain_lock: Arc<Mutex<()>>,
}

impl TaskSpawner {
    /// Create a spawner that runs tasks on the given runtime.
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            tracker: TaskTracker::new(),
            accepting: Arc::new(RwLock::new(true)),
            drain_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Create a spawner on the runtime of the calling thread.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NoRuntime`] outside a tokio runtime.
    pub fn current() -> Result<Self, CacheError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| CacheError::NoRuntime(e.to_string()))
    }

    /// Runtime handle tasks are spawned on.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Whether new tasks are still accepted.
    pub fn is_accepting(&self) -> bool {
        *self.accepting.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of tasks currently running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Spawn a detached task and log its outcome.
    ///
    /// Returns `false` without running anything once the spawner has been
    /// shut down.
    pub fn spawn_supervised<F, T, E>(&self, name: &'static str, future: F) -> bool
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Debug + Send + 'static,
        E: Display + Send + 'static,
    {
        let accepting = self.accepting.read().unwrap_or_else(|e| e.into_inner());
        if !*accepting {
            debug!(task = name, "Spawner shut down, task not started");
            return false;
        }

        let supervised = async move {
            match AssertUnwindSafe(future).catch_unwind().await {
                Ok(Ok(outcome)) => {
                    debug!(task = name, outcome = ?outcome, "Background task finished");
                }
                Ok(Err(e)) => {
                    warn!(task = name, error = %e, "Background task failed");
                }
                Err(panic) => {
                    error!(
                        task = name,
                        panic = %panic_message(panic.as_ref()),
                        "Background task panicked"
                    );
                }
            }
        };

        self.tracker.spawn_on(supervised, &self.handle);
        drop(accepting);
        true
    }

    /// Wait until every task spawned so far (and any spawned meanwhile)
    /// has finished. The spawner keeps accepting work afterwards.
    pub async fn flush(&self) {
        let _guard = self.drain_lock.lock().await;
        self.tracker.close();
        self.tracker.wait().await;
        if self.is_accepting() {
            self.tracker.reopen();
        }
    }

    /// Stop accepting new tasks and wait for in-flight ones to finish.
    pub async fn shutdown(&self) {
        info!(in_flight = self.in_flight(), "Task spawner shutting down");
        *self.accepting.write().unwrap_or_else(|e| e.into_inner()) = false;

        let _guard = self.drain_lock.lock().await;
        self.tracker.close();
        self.tracker.wait().await;

        info!("Task spawner shutdown complete");
    }
}

impl Debug for TaskSpawner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskSpawner")
            .field("in_flight", &self.in_flight())
            .field("accepting", &self.is_accepting())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
