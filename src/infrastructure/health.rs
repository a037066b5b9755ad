//! Liveness endpoint for container orchestrators.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

/// Health endpoint failure.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum HealthError {
    #[error("failed to bind health endpoint on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("health endpoint failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// `/health_check` is kept for deployments probing the older path.
#[must_use]
pub fn router() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health_check", get(health_check))
}

async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// Binds `addr` and serves until `shutdown` resolves.
///
/// # Errors
///
/// Returns `HealthError` if the address cannot be bound or the server fails.
pub async fn serve(
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), HealthError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| HealthError::Bind { addr, source })?;
    serve_on(listener, shutdown).await
}

/// Serves on an already bound listener until `shutdown` resolves.
///
/// # Errors
///
/// Returns `HealthError` if the server fails.
pub async fn serve_on(
    listener: TcpListener,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), HealthError> {
    if let Ok(addr) = listener.local_addr() {
        info!(address = %addr, "Health endpoint listening");
    }

    axum::serve(listener, router())
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(HealthError::Serve)?;

    info!("Health endpoint stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use tokio::sync::oneshot;

    use super::*;

    async fn spawn_server() -> (SocketAddr, oneshot::Sender<()>, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            serve_on(listener, async {
                let _ = stop_rx.await;
            })
            .await
            .unwrap();
        });

        (addr, stop_tx, handle)
    }

    #[tokio::test]
    async fn test_health_paths_report_ok() {
        let (addr, stop, handle) = spawn_server().await;

        for path in ["/health", "/health_check"] {
            let response = reqwest::get(format!("http://{addr}{path}")).await.unwrap();
            assert_eq!(response.status(), reqwest::StatusCode::OK);
            assert_eq!(response.text().await.unwrap(), "OK");
        }

        let missing = reqwest::get(format!("http://{addr}/nope")).await.unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

        stop.send(()).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_bind_conflict_is_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let result = serve(addr, std::future::pending()).await;

        assert!(matches!(result, Err(HealthError::Bind { .. })));
    }
}
