//! Request logging stage.

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use std::time::Instant;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use super::handler::{Handler, HttpRequest, ResponseSink};

/// Sink wrapper that remembers the first status the inner handler writes.
///
/// All writes are forwarded unchanged.
pub struct StatusRecorder<'a> {
    inner: &'a mut dyn ResponseSink,
    status: Option<StatusCode>,
}

impl<'a> StatusRecorder<'a> {
    pub fn new(inner: &'a mut dyn ResponseSink) -> Self {
        Self {
            inner,
            status: None,
        }
    }

    /// The intercepted status, `200 OK` when the handler never set one.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }
}

impl ResponseSink for StatusRecorder<'_> {
    fn write_status(&mut self, status: StatusCode) {
        if self.status.is_none() {
            self.status = Some(status);
        }
        self.inner.write_status(status);
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_body(&mut self, chunk: &[u8]) {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.inner.write_body(chunk);
    }
}

/// Logs every request that reaches it: method and URI before dispatch,
/// status and elapsed time after.
pub struct RequestLogger<H> {
    inner: H,
}

impl<H: Handler> RequestLogger<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

#[async_trait]
impl<H: Handler> Handler for RequestLogger<H> {
    async fn handle(&self, request: &HttpRequest, response: &mut dyn ResponseSink) {
        let span = info_span!(
            "http_request",
            request_id = %Uuid::new_v4(),
            client = %request.client_key(),
        );

        async move {
            info!(
                method = %request.method(),
                uri = %request.uri(),
                "Incoming request"
            );

            let mut recorder = StatusRecorder::new(response);
            let start = Instant::now();
            self.inner.handle(request, &mut recorder).await;
            let elapsed = start.elapsed();

            let status = recorder.status();
            info!(
                status = status.as_u16(),
                status_text = status.canonical_reason().unwrap_or("Unknown"),
                elapsed = ?elapsed,
                "Response"
            );
        }
        .instrument(span)
        .await
    }
}
