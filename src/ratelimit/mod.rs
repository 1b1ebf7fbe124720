//! Rate limiting logic and state management.

mod key;
mod limiter;
mod policy;
mod reaper;
mod store;

pub use key::RateKey;
pub use limiter::{RateLimiter, Verdict};
pub use policy::Policy;
pub use reaper::{Reaper, ReaperHandle};
pub use store::{Window, WindowStore};
