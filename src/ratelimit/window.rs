//! Fixed-window counter state.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Outcome of an admission check. Derived on every call, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// The request is within the client's quota and has been counted.
    Admit,
    /// The client has used its quota for the current window.
    Reject,
}

impl RateLimitDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, RateLimitDecision::Admit)
    }
}

/// Per-client request counts for the single active window.
///
/// All counts pertain to the window that began at `window_start`. A rollover
/// clears the counts and moves `window_start` in the same call, so the map
/// never holds counts from an earlier window.
#[derive(Debug)]
pub struct WindowState {
    /// Requests admitted per client key in the current window
    counts: HashMap<String, u64>,
    /// When the current window began
    window_start: Instant,
}

impl WindowState {
    /// Create an empty window starting at `now`.
    pub fn new(now: Instant) -> Self {
        Self {
            counts: HashMap::new(),
            window_start: now,
        }
    }

    /// Start a fresh window at `now` if the current one is older than `window`.
    ///
    /// Returns `true` when a rollover happened. A `now` earlier than the
    /// window start counts as zero elapsed time.
    pub fn roll_over_if_expired(&mut self, now: Instant, window: Duration) -> bool {
        if now.saturating_duration_since(self.window_start) > window {
            self.counts.clear();
            self.window_start = now;
            true
        } else {
            false
        }
    }

    /// Count a request for `client_key` unless it already reached `limit`.
    pub fn try_increment(&mut self, client_key: &str, limit: u64) -> RateLimitDecision {
        let count = self.count(client_key);
        if count >= limit {
            return RateLimitDecision::Reject;
        }

        // Only admitted requests create an entry.
        *self.counts.entry(client_key.to_string()).or_insert(0) = count + 1;
        RateLimitDecision::Admit
    }

    /// Requests admitted for `client_key` in the current window.
    pub fn count(&self, client_key: &str) -> u64 {
        self.counts.get(client_key).copied().unwrap_or(0)
    }

    /// Number of clients with at least one admitted request in this window.
    pub fn tracked_clients(&self) -> usize {
        self.counts.len()
    }

    pub fn window_start(&self) -> Instant {
        self.window_start
    }
}
