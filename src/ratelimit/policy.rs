//! Rate limit policies.

use std::time::Duration;

use crate::error::{Result, TollgateError};

/// A fixed-window rate limit: at most `limit` requests per `window`.
///
/// Policies are validated at construction, so every `Policy` the decision
/// engine sees is well-formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    /// Length of the counting window
    window: Duration,
    /// Maximum requests allowed within one window
    limit: u64,
}

impl Policy {
    /// Longest accepted window: one year. The bound keeps
    /// `reset_at = now + window` inside the range `Instant` arithmetic
    /// supports, whatever the configuration says.
    pub const MAX_WINDOW: Duration = Duration::from_secs(365 * 24 * 60 * 60);

    /// Create a new policy.
    ///
    /// Returns a configuration error if the window is zero or longer than
    /// [`Policy::MAX_WINDOW`], or if the limit is zero.
    pub fn new(window: Duration, limit: u64) -> Result<Self> {
        if window.is_zero() {
            return Err(TollgateError::Config(
                "rate limit window must be greater than zero".to_string(),
            ));
        }
        if window > Self::MAX_WINDOW {
            return Err(TollgateError::Config(format!(
                "rate limit window must not exceed {} seconds",
                Self::MAX_WINDOW.as_secs()
            )));
        }
        if limit == 0 {
            return Err(TollgateError::Config(
                "rate limit must be greater than zero".to_string(),
            ));
        }

        Ok(Self { window, limit })
    }

    /// Create a policy counting requests per minute.
    pub fn per_minute(limit: u64) -> Result<Self> {
        Self::new(Duration::from_secs(60), limit)
    }

    /// Get the window duration.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Get the request limit.
    pub fn limit(&self) -> u64 {
        self.limit
    }
}
