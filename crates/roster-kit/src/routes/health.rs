use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

/// Returns a router with a `GET /health` liveness endpoint.
///
/// Generic over the router state so it can be merged before or after
/// `with_state`.
pub fn health_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}
