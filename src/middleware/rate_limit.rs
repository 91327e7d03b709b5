//! Rate limiting stage.

use async_trait::async_trait;
use axum::http::StatusCode;
use std::sync::Arc;
use tracing::debug;

use super::handler::{write_error, Handler, HttpRequest, ResponseSink};
use crate::ratelimit::{FixedWindowLimiter, RateLimitDecision};

/// Body sent with a `429 Too Many Requests` rejection.
pub const RATE_LIMIT_EXCEEDED: &str = "Rate limit exceeded";

/// Forwards requests to the inner handler while the caller is within its
/// quota, and answers `429 Too Many Requests` otherwise.
///
/// A rejected request never reaches the inner handler.
pub struct RateLimit<H> {
    inner: H,
    limiter: Arc<FixedWindowLimiter>,
}

impl<H: Handler> RateLimit<H> {
    pub fn new(inner: H, limiter: Arc<FixedWindowLimiter>) -> Self {
        Self { inner, limiter }
    }

    pub fn limiter(&self) -> &Arc<FixedWindowLimiter> {
        &self.limiter
    }
}

#[async_trait]
impl<H: Handler> Handler for RateLimit<H> {
    async fn handle(&self, request: &HttpRequest, response: &mut dyn ResponseSink) {
        match self.limiter.check(request.client_key()) {
            RateLimitDecision::Admit => self.inner.handle(request, response).await,
            RateLimitDecision::Reject => {
                debug!(
                    client = %request.client_key(),
                    limit = self.limiter.max_requests_per_window(),
                    "Rate limit exceeded"
                );
                write_error(response, StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_EXCEEDED);
            }
        }
    }
}
