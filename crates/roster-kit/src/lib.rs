//! # roster-kit
//!
//! Shared server utilities for the roster crates.
//!
//! Covers the pieces every roster binary needs around its handlers:
//! configuration loading, the application environment, logging setup,
//! the JSON error contract, the default tower layer stack and graceful
//! serving.
//!
//! ## Features
//!
//! - `tracing` - Enable logging initialization with tracing-subscriber
//! - `compression` - Response compression in the default layer stack
//! - `cors` - CORS support driven by `ServerConfig::cors_origins`

mod config;
mod environment;
mod error;
mod layer;
mod logging;
mod router;
mod routes;
mod server;

pub use config::{ConfigBuilder, ConfigError, ConfigFormat, ServerConfig};
pub use environment::Environment;
pub use error::{ErrorResponse, HttpError};
pub use layer::JsonErrorLayer;
pub use logging::{LogFormat, DEFAULT_FILTER};
pub use router::RouterExt;
pub use routes::{fallback_handler, health_routes};
pub use server::{serve_router, ServerError};

pub use axum::http::StatusCode;

#[cfg(feature = "tracing")]
pub use logging::{init_logging, init_logging_from_env};
