//! Routes and the adapter running the middleware pipeline inside axum.

use axum::body::to_bytes;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::warn;

use crate::config::CodepulseConfig;
use crate::error::Result;
use crate::middleware::{pipeline, write_error, BufferedResponse, Handler, HttpRequest};
use crate::ratelimit::FixedWindowLimiter;
use crate::store::RequestStore;
use crate::welcome::WelcomeHandler;

#[derive(Clone)]
struct AppState {
    pipeline: Arc<dyn Handler>,
    max_body_bytes: usize,
}

/// Build the application router from configuration.
///
/// `/welcome` runs through the configured pipeline; `/health` does not.
pub fn app(config: &CodepulseConfig, store: Arc<dyn RequestStore>) -> Result<Router> {
    let limiter = Arc::new(FixedWindowLimiter::from_config(&config.rate_limiting));
    let pipeline = pipeline::from_config(WelcomeHandler::new(store), config, limiter)?;
    Ok(router(pipeline, config.server.max_body_bytes))
}

/// Route `/welcome` to `pipeline` and serve `/health`.
///
/// Requires the connecting peer address as `ConnectInfo<SocketAddr>`.
pub fn router(pipeline: Arc<dyn Handler>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/welcome", any(dispatch))
        .route("/health", get(health))
        .with_state(AppState {
            pipeline,
            max_body_bytes,
        })
}

async fn dispatch(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
) -> Response {
    let (parts, body) = request.into_parts();

    let body = match to_bytes(body, state.max_body_bytes).await {
        Ok(body) => body,
        Err(e) => {
            warn!(client = %peer, error = %e, "Unable to read request body");
            let mut response = BufferedResponse::new();
            write_error(&mut response, StatusCode::BAD_REQUEST, "Unable to read request body");
            return response.into_response();
        }
    };

    let request = HttpRequest::new(parts.method, parts.uri, peer.to_string())
        .with_headers(parts.headers)
        .with_body(body);

    let mut response = BufferedResponse::new();
    state.pipeline.handle(&request, &mut response).await;
    response.into_response()
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use axum::body::Body;
    use axum::http::Method;
    use tower::ServiceExt;

    fn request(method: Method, uri: &str, peer: &str) -> Request {
        let peer: SocketAddr = peer.parse().unwrap();
        axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .extension(ConnectInfo(peer))
            .body(Body::empty())
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_welcome_until_rate_limited() {
        let store = Arc::new(MemoryStore::new());
        let app = app(&CodepulseConfig::default(), store.clone()).unwrap();

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(request(Method::GET, "/welcome?name=ada", "10.1.1.1:7000"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/welcome?name=ada", "10.1.1.1:7000"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body_text(response).await, "Rate limit exceeded\n");

        // Another client still has its own quota
        let response = app
            .oneshot(request(Method::GET, "/welcome", "10.1.1.2:7000"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        assert_eq!(store.visits().len(), 3);
    }

    #[tokio::test]
    async fn test_welcome_body_reports_peer() {
        let app = app(&CodepulseConfig::default(), Arc::new(MemoryStore::new())).unwrap();

        let response = app
            .oneshot(request(Method::GET, "/welcome", "172.16.0.9:443"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["remoteAddress"], "172.16.0.9:443");
        assert_eq!(body["name"], "anonymous");
    }

    #[tokio::test]
    async fn test_health_not_rate_limited() {
        let mut config = CodepulseConfig::default();
        config.rate_limiting.max_requests_per_window = 0;
        let app = app(&config, Arc::new(MemoryStore::new())).unwrap();

        for _ in 0..5 {
            let response = app
                .clone()
                .oneshot(request(Method::GET, "/health", "10.0.0.1:1"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body: serde_json::Value =
                serde_json::from_str(&body_text(response).await).unwrap();
            assert_eq!(body["status"], "healthy");
        }
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let store = Arc::new(MemoryStore::new());
        let mut config = CodepulseConfig::default();
        config.server.max_body_bytes = 4;
        let app = app(&config, store.clone()).unwrap();

        let peer: SocketAddr = "10.0.0.1:1".parse().unwrap();
        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/welcome")
            .extension(ConnectInfo(peer))
            .body(Body::from("far too long"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(store.visits().is_empty());
    }

    #[tokio::test]
    async fn test_many_distinct_clients_keep_store_bounded() {
        let store = Arc::new(MemoryStore::with_capacity(50));
        let app = app(&CodepulseConfig::default(), store.clone()).unwrap();

        for i in 0..500u32 {
            let peer = format!("10.9.{}.{}:8000", i / 256, i % 256);
            let response = app
                .clone()
                .oneshot(request(Method::GET, "/welcome", &peer))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let visits = store.visits();
        assert_eq!(visits.len(), 50);
        assert_eq!(visits[49].remote_addr, "10.9.1.243:8000");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = app(&CodepulseConfig::default(), Arc::new(MemoryStore::new())).unwrap();
        let response = app
            .oneshot(request(Method::GET, "/compare", "10.0.0.1:1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
