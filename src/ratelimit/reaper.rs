//! Background eviction of expired windows.
//!
//! Without eviction the window store grows with every client and route
//! ever seen. The reaper sweeps the store on a fixed interval and drops
//! windows whose reset instant has passed. Sweeping is purely an
//! optimization for memory: decisions re-check expiry themselves, so a
//! window the reaper has not collected yet still resets on time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::clock::Clock;

use super::store::WindowStore;

/// Periodically removes expired windows from a store.
pub struct Reaper {
    /// Store to sweep
    store: Arc<WindowStore>,
    /// Time source for expiry checks
    clock: Arc<dyn Clock>,
    /// Time between sweeps
    sweep_interval: Duration,
}

impl Reaper {
    /// Create a reaper for the given store.
    pub fn new(store: Arc<WindowStore>, clock: Arc<dyn Clock>, sweep_interval: Duration) -> Self {
        Self {
            store,
            clock,
            sweep_interval,
        }
    }

    /// Run a single sweep, returning the number of windows evicted.
    ///
    /// Only windows whose reset instant is at or before the current time
    /// are removed. A window that expires while the sweep runs is picked
    /// up by the next one.
    pub fn sweep(&self) -> usize {
        self.store.evict_expired(self.clock.now())
    }

    /// Spawn the reaper as a background task.
    ///
    /// The task sweeps once per interval until the returned handle shuts
    /// it down or is dropped.
    pub fn spawn(self) -> ReaperHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.sweep_interval);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        let evicted = self.sweep();
                        if evicted > 0 {
                            debug!(evicted, "Evicted expired windows");
                        } else {
                            trace!("Sweep found no expired windows");
                        }
                    }
                }
            }
        });

        ReaperHandle {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Handle to a running reaper task.
///
/// Dropping the handle aborts the task; [`ReaperHandle::shutdown`] stops
/// it cleanly instead.
pub struct ReaperHandle {
    /// Signals the task to stop
    shutdown: Option<oneshot::Sender<()>>,
    /// The running sweep task
    task: Option<JoinHandle<()>>,
}

impl ReaperHandle {
    /// Stop the reaper and wait for its task to finish.
    pub async fn shutdown(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ReaperHandle {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}
