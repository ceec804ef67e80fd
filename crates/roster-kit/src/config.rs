//! Configuration loading.
//!
//! Values come from one optional TOML/YAML/JSON file overlaid with
//! environment variables (`__` separates nested keys, so
//! `AUTH__SECRET=...` sets `auth.secret`).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::environment::{Environment, ENVIRONMENT_VARS};
#[cfg(feature = "tracing")]
use crate::logging::{init_logging, LogFormat};

/// Error type for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// Configuration file not found.
    NotFound(PathBuf),
    /// Failed to parse configuration.
    Parse(String),
    /// Configuration parsed but holds an unusable value.
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "Config file not found: {}", path.display()),
            Self::Parse(msg) => write!(f, "Failed to parse config: {}", msg),
            Self::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    DotEnv,
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        let file_name = path.file_name()?.to_str()?;
        if file_name == ".env" || file_name.starts_with(".env.") {
            return Some(Self::DotEnv);
        }
        match path.extension()?.to_str()?.to_lowercase().as_str() {
            "env" => Some(Self::DotEnv),
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Configuration builder.
///
/// # Example
///
/// ```ignore
/// use roster_kit::ConfigBuilder;
///
/// let config: AppConfig = ConfigBuilder::new()
///     .with_dotenv()
///     .with_config_file("roster.toml")
///     .build()?;
/// ```
#[derive(Default)]
pub struct ConfigBuilder {
    load_default_dotenv: bool,
    config_files: Vec<PathBuf>,
    #[cfg(feature = "tracing")]
    init_logging: bool,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load environment variables from `.env` in the current directory.
    pub fn with_dotenv(mut self) -> Self {
        self.load_default_dotenv = true;
        self
    }

    /// Add a configuration file.
    ///
    /// Dotenv files are applied to the process environment (several may be
    /// given); of the structured formats only the last one is loaded.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_files.push(path.into());
        self
    }

    /// Add a configuration file only when `path` is `Some`.
    pub fn with_optional_config_file(self, path: Option<impl Into<PathBuf>>) -> Self {
        match path {
            Some(path) => self.with_config_file(path),
            None => self,
        }
    }

    /// Initialize logging from `LOG_FORMAT` and `RUST_LOG` once dotenv files
    /// have been applied.
    #[cfg(feature = "tracing")]
    pub fn with_logging_from_env(mut self) -> Self {
        self.init_logging = true;
        self
    }

    pub fn build<C: DeserializeOwned>(self) -> Result<C, ConfigError> {
        if self.load_default_dotenv {
            let _ = dotenvy::dotenv();
        }

        let mut main_config_file: Option<&PathBuf> = None;
        for path in &self.config_files {
            match ConfigFormat::from_path(path) {
                Some(ConfigFormat::DotEnv) => {
                    if path.exists() {
                        let _ = dotenvy::from_path(path);
                    }
                }
                Some(_) => main_config_file = Some(path),
                None => {
                    return Err(ConfigError::Invalid(format!(
                        "unsupported config file type: {}",
                        path.display()
                    )))
                }
            }
        }

        #[cfg(feature = "tracing")]
        if self.init_logging {
            init_logging(LogFormat::from_env(), "info");
        }

        match main_config_file {
            Some(path) => load_config_file(path),
            None => load_from_env(),
        }
    }
}

/// Load config from environment variables only.
pub fn load_from_env<C: DeserializeOwned>() -> Result<C, ConfigError> {
    config::Config::builder()
        .add_source(EnvSource)
        .build()
        .and_then(|c| c.try_deserialize::<C>())
        .map_err(|e| ConfigError::Parse(e.to_string()))
}

/// Load config from file with env var overrides.
pub fn load_config_file<C: DeserializeOwned>(path: &Path) -> Result<C, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(EnvSource)
        .build()
        .and_then(|c| c.try_deserialize())
        .map_err(|e| ConfigError::Parse(e.to_string()))
}

/// Environment source that also maps `ENVIRONMENT`/`APP_ENV`/`RUST_ENV`
/// onto the `environment` key, at the top level and inside `server`.
#[derive(Debug, Clone)]
struct EnvSource;

impl config::Source for EnvSource {
    fn clone_into_box(&self) -> Box<dyn config::Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<config::Map<String, config::Value>, config::ConfigError> {
        use config::{Value, ValueKind};

        let mut map = config::Environment::default()
            .separator("__")
            .try_parsing(true)
            .collect()?;

        if let Some(val) = ENVIRONMENT_VARS.iter().find_map(|name| env::var(name).ok()) {
            for key in ["environment", "server.environment"] {
                map.entry(key.to_string())
                    .or_insert_with(|| Value::new(None, ValueKind::String(val.clone())));
            }
        }

        Ok(map)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    /// CORS allowed origins; `"*"` allows any origin, empty disables CORS.
    /// Only used when the `cors` feature is enabled.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            host: "0.0.0.0".to_string(),
            port: 3000,
            request_timeout_secs: 30,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AsRef<ServerConfig> for ServerConfig {
    fn as_ref(&self) -> &ServerConfig {
        self
    }
}
