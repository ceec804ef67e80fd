mod fallback;
mod health;

pub use fallback::fallback_handler;
pub use health::health_routes;
