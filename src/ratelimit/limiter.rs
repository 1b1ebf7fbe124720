//! Core rate limiter implementation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};

use super::key::RateKey;
use super::policy::Policy;
use super::reaper::{Reaper, ReaperHandle};
use super::store::{Window, WindowStore};

/// Outcome of a rate limit decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The request is within the limit and has been counted.
    Allowed {
        /// Requests left in the current window after this one
        remaining: u64,
    },
    /// The request exceeds the limit and was not counted.
    Denied {
        /// Time until the current window expires
        retry_after: Duration,
    },
}

impl Verdict {
    /// Whether the request was allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed { .. })
    }

    /// Time until the window expires, for denied requests.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Verdict::Denied { retry_after } => Some(*retry_after),
            Verdict::Allowed { .. } => None,
        }
    }

    /// Retry delay in whole seconds, rounded up and never below one.
    ///
    /// This is the value callers put in a `Retry-After` header: a client
    /// that waits this long lands at or past the window's reset instant.
    pub fn retry_after_secs(&self) -> Option<u64> {
        self.retry_after().map(|delay| {
            let mut secs = delay.as_secs();
            if delay.subsec_nanos() > 0 {
                secs += 1;
            }
            secs.max(1)
        })
    }
}

/// The core rate limiter: a window store, a clock, and an optional
/// background reaper.
///
/// This struct is thread-safe and can be shared across multiple tasks.
pub struct RateLimiter {
    /// Window state per rate key
    store: Arc<WindowStore>,
    /// Time source for decisions and sweeps
    clock: Arc<dyn Clock>,
    /// Handle to the background reaper, when one is running
    reaper: Mutex<Option<ReaperHandle>>,
}

impl RateLimiter {
    /// Create a rate limiter backed by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a rate limiter reading time from the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Arc::new(WindowStore::new()),
            clock,
            reaper: Mutex::new(None),
        }
    }

    /// Decide whether a request identified by `key` passes `policy`.
    ///
    /// Allowed requests are counted against the key's current window.
    /// Denied requests leave the window untouched and report how long the
    /// client must wait. The whole decision runs under the key's entry
    /// lock, so concurrent requests for one key serialize and the limit
    /// holds exactly.
    pub fn decide(&self, key: RateKey, policy: &Policy) -> Verdict {
        self.decide_at(key, policy, self.clock.now())
    }

    /// Decide at an explicit instant instead of the limiter's clock.
    ///
    /// Decisions never fail and never block on anything beyond the key's
    /// entry lock.
    pub fn decide_at(&self, key: RateKey, policy: &Policy, now: Instant) -> Verdict {
        self.store.read_modify_write(key, |current| match current {
            Some(window) if window.is_live(now) => {
                if window.count < policy.limit() {
                    let window = Window {
                        count: window.count + 1,
                        ..window
                    };
                    (
                        window,
                        Verdict::Allowed {
                            remaining: policy.limit() - window.count,
                        },
                    )
                } else {
                    (
                        window,
                        Verdict::Denied {
                            retry_after: window.reset_at - now,
                        },
                    )
                }
            }
            // No window tracked yet, or the previous one has expired.
            _ => (
                Window::open(now, policy),
                Verdict::Allowed {
                    remaining: policy.limit() - 1,
                },
            ),
        })
    }

    /// Start the background reaper, sweeping expired windows at the given
    /// interval. Does nothing if a reaper is already running.
    pub fn start_reaper(&self, sweep_interval: Duration) {
        let mut reaper = self.reaper.lock();
        if reaper.is_some() {
            debug!("Window reaper is already running");
            return;
        }

        *reaper = Some(
            Reaper::new(
                Arc::clone(&self.store),
                Arc::clone(&self.clock),
                sweep_interval,
            )
            .spawn(),
        );
        info!(
            sweep_interval_secs = sweep_interval.as_secs(),
            "Started window reaper"
        );
    }

    /// Stop the background reaper and wait for it to finish.
    ///
    /// Does nothing if no reaper is running.
    pub async fn stop_reaper(&self) {
        let handle = self.reaper.lock().take();
        if let Some(handle) = handle {
            handle.shutdown().await;
            info!("Stopped window reaper");
        }
    }

    /// Get the number of keys with tracked windows.
    pub fn tracked_keys(&self) -> usize {
        self.store.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
