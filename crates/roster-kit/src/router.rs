//! Chainable router extensions.

use axum::Router;

use crate::routes::{fallback_handler, health_routes};
use crate::ServerConfig;

/// Extension trait adding the roster conventions to an axum `Router`.
///
/// # Example
///
/// ```rust,ignore
/// use roster_kit::RouterExt;
///
/// api_routes(state)
///     .with_health_check()
///     .with_fallback()
///     .with_default_layers(&config.server)
///     .serve(&config.server)
///     .await?;
/// ```
pub trait RouterExt: Sized {
    /// Adds `GET /health`.
    fn with_health_check(self) -> Self;

    /// Adds a JSON 404 fallback handler for unmatched routes.
    fn with_fallback(self) -> Self;

    /// Applies the default middleware stack.
    ///
    /// Layers applied (innermost to outermost):
    /// - `CatchPanicLayer` - Converts panics to 500 responses
    /// - request id propagation, tracing, request id generation
    /// - `TimeoutLayer` - Request timeout from config
    /// - `CompressionLayer` - Response compression (feature: `compression`)
    /// - `CorsLayer` - CORS support (feature: `cors`, when origins configured)
    /// - `JsonErrorLayer` - Converts error responses to JSON (outermost)
    fn with_default_layers(self, config: &impl AsRef<ServerConfig>) -> Self;

    /// Serve with graceful shutdown on `SIGINT`/`SIGTERM`.
    fn serve(
        self,
        config: &(impl AsRef<ServerConfig> + Sync),
    ) -> impl std::future::Future<Output = Result<(), crate::ServerError>> + Send;
}

impl RouterExt for Router {
    fn with_health_check(self) -> Self {
        self.merge(health_routes())
    }

    fn with_fallback(self) -> Self {
        self.fallback(fallback_handler)
    }

    fn with_default_layers(self, config: &impl AsRef<ServerConfig>) -> Self {
        crate::layer::default_layers(self, config.as_ref())
    }

    async fn serve(
        self,
        config: &(impl AsRef<ServerConfig> + Sync),
    ) -> Result<(), crate::ServerError> {
        crate::server::serve_router(self, config).await
    }
}
