//! Logging initialization.

use std::{env, str::FromStr};

/// Output format of the log subscriber, read from `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Text,
        })
    }
}

impl LogFormat {
    pub fn from_env() -> Self {
        env::var("LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `filter` when set.
///
/// Calling this more than once is harmless; later calls are ignored.
#[cfg(feature = "tracing")]
pub fn init_logging(format: LogFormat, filter: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let _ = match format {
        LogFormat::Text => fmt().with_env_filter(env_filter).try_init(),
        LogFormat::Compact => fmt()
            .compact()
            .with_target(false)
            .with_env_filter(env_filter)
            .try_init(),
        LogFormat::Json => fmt()
            .json()
            .with_current_span(false)
            .with_env_filter(env_filter)
            .try_init(),
    };
}

/// Directive used when neither `RUST_LOG` nor `LOG_LEVEL` is set.
pub const DEFAULT_FILTER: &str = "info,tower_http=warn";

/// Format from `LOG_FORMAT`, filter from `RUST_LOG`, then `LOG_LEVEL`, then
/// [`DEFAULT_FILTER`].
#[cfg(feature = "tracing")]
pub fn init_logging_from_env() {
    let filter = env::var("LOG_LEVEL").unwrap_or_else(|_| DEFAULT_FILTER.to_string());
    init_logging(LogFormat::from_env(), &filter);
}
