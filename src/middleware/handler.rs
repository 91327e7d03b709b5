//! The request-handling capability every pipeline stage implements.

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::Query;
use axum::http::header::{CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// An inbound request as seen by pipeline stages.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    /// Remote address of the caller, used verbatim as the rate-limit key
    client_key: String,
}

impl HttpRequest {
    pub fn new(method: Method, uri: Uri, client_key: impl Into<String>) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            client_key: client_key.into(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn client_key(&self) -> &str {
        &self.client_key
    }

    /// Look up a decoded query-string parameter.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let Query(mut params) = Query::<HashMap<String, String>>::try_from_uri(&self.uri).ok()?;
        params.remove(name)
    }
}

/// Destination a handler writes its response into.
///
/// The status is write-once: the first `write_status` call wins, and writing
/// body bytes before any status implies `200 OK`.
pub trait ResponseSink: Send {
    fn write_status(&mut self, status: StatusCode);

    fn headers_mut(&mut self) -> &mut HeaderMap;

    fn write_body(&mut self, chunk: &[u8]);
}

/// A response collected in memory, turned into an HTTP response once the
/// pipeline returns.
#[derive(Debug, Default)]
pub struct BufferedResponse {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status written so far, `200 OK` if none was.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl ResponseSink for BufferedResponse {
    fn write_status(&mut self, status: StatusCode) {
        match self.status {
            None => self.status = Some(status),
            Some(current) => warn!(
                current = current.as_u16(),
                ignored = status.as_u16(),
                "Superfluous status write"
            ),
        }
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_body(&mut self, chunk: &[u8]) {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(chunk);
    }
}

impl IntoResponse for BufferedResponse {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, self.headers, self.body).into_response()
    }
}

/// Write a plain-text error response.
pub fn write_error(response: &mut dyn ResponseSink, status: StatusCode, message: &str) {
    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    response.write_status(status);
    response.write_body(message.as_bytes());
    response.write_body(b"\n");
}

/// Something that can handle a request.
///
/// Pipeline stages implement this trait and are built around an inner
/// implementor, so stages compose by nesting.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, request: &HttpRequest, response: &mut dyn ResponseSink);
}

#[async_trait]
impl<H: Handler + ?Sized> Handler for Arc<H> {
    async fn handle(&self, request: &HttpRequest, response: &mut dyn ResponseSink) {
        (**self).handle(request, response).await
    }
}
