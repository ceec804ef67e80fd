//! # roster-api
//!
//! REST backend for user registration, login, profiles and administration,
//! with every request routed through the roster-auth policy.

pub mod config;
pub mod error;
pub mod response;
pub mod routes;
pub mod state;
pub mod users;

use axum::Router;
use roster_auth::{AuthExt, TokenSigner};
use roster_kit::{ConfigError, Environment, RouterExt};
use std::sync::Arc;

pub use config::{AppConfig, AuthSettings};
pub use error::ApiError;
pub use state::AppState;

use users::{UserService, UserStore};

/// Assemble the application: API routes under the prefix, health check,
/// authentication policy and the default layer stack.
pub fn build_app(config: &AppConfig, store: Arc<dyn UserStore>) -> Result<Router, ConfigError> {
    let mut signer = TokenSigner::from_secret(config.auth.secret.as_bytes(), config.auth.token_ttl());
    if let Some(algorithm) = config.auth.algorithms.first() {
        signer = signer.with_algorithm(*algorithm);
    }
    let state = AppState::new(UserService::new(store.clone(), signer, config.password_cost));
    let policy = routes::auth_policy(config, store)?;

    let mut server = config.server.clone();
    if server.environment == Environment::Development && server.cors_origins.is_empty() {
        server.cors_origins = vec!["*".to_string()];
    }

    Ok(Router::new()
        .nest(&config.api_prefix(), routes::api_routes().with_state(state))
        .with_health_check()
        .with_fallback()
        .with_auth(policy, server.environment)
        .with_default_layers(&server))
}
