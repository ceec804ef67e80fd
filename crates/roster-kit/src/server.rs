//! Serving with graceful shutdown.

use crate::ServerConfig;
use axum::Router;
use std::future::Future;
use std::{fmt, io};
use tokio::net::TcpListener;

/// Error type for server operations.
#[derive(Debug)]
pub enum ServerError {
    /// Failed to bind to address.
    Bind(io::Error),
    /// Server runtime error.
    Runtime(io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind(e) => write!(f, "Failed to bind to address: {}", e),
            Self::Runtime(e) => write!(f, "Server error: {}", e),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bind(e) | Self::Runtime(e) => Some(e),
        }
    }
}

/// Bind `config.addr()` and serve until SIGINT or SIGTERM.
pub async fn serve_router(
    router: Router,
    config: &(impl AsRef<ServerConfig> + Sync),
) -> Result<(), ServerError> {
    let addr = config.as_ref().addr();
    let listener = TcpListener::bind(&addr).await.map_err(ServerError::Bind)?;

    tracing::info!(%addr, "server listening");
    serve_with_shutdown(router, listener, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves, then drain
/// in-flight requests.
pub(crate) async fn serve_with_shutdown(
    router: Router,
    listener: TcpListener,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Runtime)?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn serves_until_shutdown_is_signalled() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();

        let router = Router::new().route("/ping", get(|| async { "pong" }));
        let server = tokio::spawn(serve_with_shutdown(router, listener, async {
            let _ = rx.await;
        }));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /ping HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();
        assert!(raw.starts_with("HTTP/1.1 200"));
        assert!(raw.ends_with("pong"));

        tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }

    #[test]
    fn bind_error_exposes_source() {
        use std::error::Error;

        let err = ServerError::Bind(io::Error::new(io::ErrorKind::AddrInUse, "in use"));
        assert!(err.to_string().contains("in use"));
        assert!(err.source().is_some());
    }
}
