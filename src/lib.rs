//! Codepulse - HTTP backend with a composable middleware pipeline
//!
//! Requests flow through a static chain of stages wrapped around a terminal
//! handler: CORS, a fixed-window per-client rate limiter and a request logger.
//! The rate limiter owns its window state and guards it with a single lock.

pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod ratelimit;
pub mod store;
pub mod welcome;
