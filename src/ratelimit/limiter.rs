//! Fixed-window rate limiter.

use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use super::window::{RateLimitDecision, WindowState};
use crate::config::RateLimitingConfig;

/// Default number of requests a client may make per window.
pub const DEFAULT_MAX_REQUESTS: u64 = 2;
/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// A fixed-window counter keyed by client.
///
/// Every client shares one window. The first request arriving after the
/// window expired starts a new one for everybody. The whole
/// check-reset-increment sequence runs under one lock, so concurrent callers
/// can never push a client past `max_requests_per_window`.
///
/// This struct is thread-safe and can be shared across multiple tasks.
pub struct FixedWindowLimiter {
    /// Requests allowed per client per window
    max_requests_per_window: u64,
    /// Length of a window
    window_duration: Duration,
    /// Counts and window start, guarded together
    state: Mutex<WindowState>,
}

impl FixedWindowLimiter {
    /// Create a limiter whose first window starts now.
    pub fn new(max_requests_per_window: u64, window_duration: Duration) -> Self {
        Self::starting_at(max_requests_per_window, window_duration, Instant::now())
    }

    /// Create a limiter whose first window starts at `start`.
    pub fn starting_at(max_requests_per_window: u64, window_duration: Duration, start: Instant) -> Self {
        Self {
            max_requests_per_window,
            window_duration,
            state: Mutex::new(WindowState::new(start)),
        }
    }

    /// Create a limiter from the service configuration.
    pub fn from_config(config: &RateLimitingConfig) -> Self {
        Self::new(config.max_requests_per_window, config.window_duration())
    }

    /// Decide whether `client_key` may make a request at `now`.
    ///
    /// Admitted requests are counted; rejected ones leave the state untouched
    /// apart from a possible window rollover.
    pub fn admit(&self, client_key: &str, now: Instant) -> RateLimitDecision {
        let mut state = self.state.lock();

        if state.roll_over_if_expired(now, self.window_duration) {
            debug!(
                window_secs = self.window_duration.as_secs(),
                "Rate limit window rolled over"
            );
        }

        let decision = state.try_increment(client_key, self.max_requests_per_window);

        trace!(
            client = %client_key,
            count = state.count(client_key),
            limit = self.max_requests_per_window,
            decision = ?decision,
            "Checked rate limit"
        );

        decision
    }

    /// Decide whether `client_key` may make a request right now.
    pub fn check(&self, client_key: &str) -> RateLimitDecision {
        self.admit(client_key, Instant::now())
    }

    /// Requests admitted for `client_key` in the current window.
    ///
    /// Does not roll the window over.
    pub fn count(&self, client_key: &str) -> u64 {
        self.state.lock().count(client_key)
    }

    /// Number of clients counted in the current window.
    pub fn tracked_clients(&self) -> usize {
        self.state.lock().tracked_clients()
    }

    pub fn max_requests_per_window(&self) -> u64 {
        self.max_requests_per_window
    }

    pub fn window_duration(&self) -> Duration {
        self.window_duration
    }
}

impl Default for FixedWindowLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }
}
