//! Rate limiting logic and state management.

mod limiter;
mod window;

pub use limiter::{FixedWindowLimiter, DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW};
pub use window::{RateLimitDecision, WindowState};
