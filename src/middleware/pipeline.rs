//! Static composition of the middleware stages.

use std::sync::Arc;

use super::cors::Cors;
use super::handler::Handler;
use super::logger::RequestLogger;
use super::rate_limit::RateLimit;
use crate::config::CodepulseConfig;
use crate::error::Result;
use crate::ratelimit::FixedWindowLimiter;

/// The core pipeline: the limiter outside the logger, so rejected requests
/// never reach the logger or the terminal handler.
pub type Pipeline<H> = RateLimit<RequestLogger<H>>;

/// Wrap `terminal` in the rate limiter and the request logger.
pub fn build<H: Handler>(terminal: H, limiter: Arc<FixedWindowLimiter>) -> Pipeline<H> {
    RateLimit::new(RequestLogger::new(terminal), limiter)
}

/// Build the full pipeline for `terminal` as configured, with CORS as the
/// outermost stage when enabled.
pub fn from_config<H: Handler + 'static>(
    terminal: H,
    config: &CodepulseConfig,
    limiter: Arc<FixedWindowLimiter>,
) -> Result<Arc<dyn Handler>> {
    let core = build(terminal, limiter);

    if config.cors.enabled {
        Ok(Arc::new(Cors::new(core, &config.cors)?))
    } else {
        Ok(Arc::new(core))
    }
}
