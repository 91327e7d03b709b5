//! HTTP server and routing.

mod server;
mod service;

pub use server::HttpServer;
pub use service::{app, router};
