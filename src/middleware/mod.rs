//! Middleware stages and their composition.
//!
//! Every stage implements [`Handler`] and is constructed around another
//! `Handler`, so the pipeline is a nest of decorators fixed at startup.

mod cors;
mod handler;
mod logger;
pub mod pipeline;
mod rate_limit;

pub use cors::Cors;
pub use handler::{write_error, BufferedResponse, Handler, HttpRequest, ResponseSink};
pub use logger::{RequestLogger, StatusRecorder};
pub use pipeline::Pipeline;
pub use rate_limit::{RateLimit, RATE_LIMIT_EXCEEDED};
