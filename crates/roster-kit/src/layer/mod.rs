mod json_error;
mod trace;

use axum::http::StatusCode;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;

#[cfg(feature = "compression")]
use tower_http::compression::CompressionLayer;

#[cfg(feature = "cors")]
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::ServerConfig;
use trace::RequestTraceLayer;

pub use json_error::JsonErrorLayer;

/// Applies the default middleware stack to a router.
///
/// The last layer added is the outermost, so `JsonErrorLayer` sees every
/// error response, including panics, timeouts and CORS rejections.
pub(crate) fn default_layers(router: Router, config: &ServerConfig) -> Router {
    let router = router
        .layer(CatchPanicLayer::new())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestTraceLayer)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout(),
        ));

    #[cfg(feature = "compression")]
    let router = router.layer(CompressionLayer::new());

    #[cfg(feature = "cors")]
    let router = match cors_layer(&config.cors_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.layer(JsonErrorLayer::new(config.environment))
}

#[cfg(feature = "cors")]
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }
    if origins.iter().any(|o| o == "*") {
        return Some(CorsLayer::permissive());
    }

    let origins: Vec<_> = origins.iter().filter_map(|s| s.parse().ok()).collect();
    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_headers(tower_http::cors::Any)
            .allow_methods(tower_http::cors::Any),
    )
}
