//! HTTP server implementation.

use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::{CodepulseError, Result};

/// HTTP server for the Codepulse routes.
pub struct HttpServer {
    /// Bound listener
    listener: TcpListener,
    /// Application routes
    router: Router,
}

impl HttpServer {
    /// Bind the listen address.
    pub async fn bind(addr: SocketAddr, router: Router) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            error!(addr = %addr, error = %e, "Failed to bind HTTP listener");
            CodepulseError::Io(e)
        })?;
        Ok(Self { listener, router })
    }

    /// The address actually bound, useful when binding port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Start the HTTP server.
    ///
    /// This method will block until the server is shut down.
    pub async fn serve(self) -> Result<()> {
        self.serve_with_shutdown(std::future::pending::<()>()).await
    }

    /// Start the HTTP server with graceful shutdown.
    ///
    /// The server will shut down when the provided signal resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(addr = %self.local_addr()?, "Starting HTTP server");

        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(signal)
        .await
        .map_err(|e| {
            error!(error = %e, "HTTP server failed");
            CodepulseError::Server(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodepulseConfig;
    use crate::http::app;
    use crate::store::MemoryStore;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    async fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
            path
        );
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();
        raw
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let server = HttpServer::bind(addr, Router::new()).await.unwrap();
        assert_ne!(server.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_serves_welcome_over_tcp() {
        let store = Arc::new(MemoryStore::new());
        let router = app(&CodepulseConfig::default(), store.clone()).unwrap();
        let server = HttpServer::bind("127.0.0.1:0".parse().unwrap(), router)
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve_with_shutdown(async move {
            let _ = shutdown_rx.await;
        }));

        let response = get(addr, "/welcome?name=ada").await;
        assert!(response.starts_with("HTTP/1.1 200 OK"), "{}", response);
        assert!(response.contains("\"name\": \"ada\""));

        let visits = store.visits();
        assert_eq!(visits.len(), 1);
        assert!(visits[0].remote_addr.starts_with("127.0.0.1:"));

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
