//! CORS stage.

use async_trait::async_trait;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::{HeaderValue, Method, StatusCode};

use super::handler::{Handler, HttpRequest, ResponseSink};
use crate::config::CorsConfig;
use crate::error::{CodepulseError, Result};

/// Adds CORS headers to every response and answers preflight `OPTIONS`
/// requests itself.
pub struct Cors<H> {
    inner: H,
    allow_origin: HeaderValue,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
}

impl<H: Handler> Cors<H> {
    pub fn new(inner: H, config: &CorsConfig) -> Result<Self> {
        Ok(Self {
            inner,
            allow_origin: header_value("allow_origin", &config.allow_origin)?,
            allow_methods: header_value("allow_methods", &config.allow_methods)?,
            allow_headers: header_value("allow_headers", &config.allow_headers)?,
        })
    }
}

fn header_value(field: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| CodepulseError::Config(format!("Invalid cors.{}: {}", field, e)))
}

#[async_trait]
impl<H: Handler> Handler for Cors<H> {
    async fn handle(&self, request: &HttpRequest, response: &mut dyn ResponseSink) {
        let headers = response.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());

        if request.method() == Method::OPTIONS {
            response.write_status(StatusCode::OK);
            return;
        }

        self.inner.handle(request, response).await
    }
}
