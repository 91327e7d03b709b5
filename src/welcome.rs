//! The welcome endpoint: the terminal handler of the pipeline.

use async_trait::async_trait;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

use crate::middleware::{Handler, HttpRequest, ResponseSink};
use crate::store::RequestStore;

const APP_NAME: &str = "CodePulse";
const DEFAULT_NAME: &str = "anonymous";
/// JSON-encoded body of every 500 answer.
const INTERNAL_ERROR_BODY: &[u8] = b"\"[Internal-Error]\"";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WelcomeBody<'a> {
    app: &'a str,
    name: &'a str,
    remote_address: &'a str,
    uri: String,
}

/// Greets the caller and records the visit.
pub struct WelcomeHandler {
    store: Arc<dyn RequestStore>,
}

impl WelcomeHandler {
    pub fn new(store: Arc<dyn RequestStore>) -> Self {
        Self { store }
    }
}

fn write_json(response: &mut dyn ResponseSink, status: StatusCode, body: &[u8]) {
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response.write_status(status);
    response.write_body(body);
}

#[async_trait]
impl Handler for WelcomeHandler {
    async fn handle(&self, request: &HttpRequest, response: &mut dyn ResponseSink) {
        let name = request
            .query_param("name")
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_NAME.to_string());

        if let Err(e) = self.store.record_visit(&name, request.client_key()).await {
            error!(error = %e, "Failed to record visit");
            write_json(response, StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY);
            return;
        }

        let body = WelcomeBody {
            app: APP_NAME,
            name: &name,
            remote_address: request.client_key(),
            uri: request.uri().to_string(),
        };

        match serde_json::to_vec_pretty(&body) {
            Ok(json) => write_json(response, StatusCode::OK, &json),
            Err(e) => {
                error!(error = %e, "Failed to encode welcome response");
                write_json(response, StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY);
            }
        }
    }
}
