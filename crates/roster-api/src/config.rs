//! Application configuration.
//!
//! ```toml
//! api_version = "v1"
//!
//! [server]
//! port = 8080
//!
//! [auth]
//! secret = "change-me"
//!
//! [[auth.public]]
//! regex = "^/api/v1/docs"
//! method = "GET"
//! ```

use roster_auth::{Algorithm, PathMatcher, RuleConfig, VerifyOptions};
use roster_kit::{ConfigBuilder, ConfigError, ServerConfig};
use serde::Deserialize;
use std::time::Duration;

use crate::users::{ADMIN_ROLES, ALL_ROLES};

const THIRTY_DAYS: u64 = 30 * 24 * 60 * 60;
const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;
const MAX_LEEWAY_SECS: u64 = 5 * 60;
const BCRYPT_COSTS: std::ops::RangeInclusive<u32> = 4..=31;
const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthSettings,
    pub api_version: String,
    /// bcrypt cost for stored passwords.
    pub password_cost: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthSettings::default(),
            api_version: "v1".to_string(),
            password_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl AsRef<ServerConfig> for AppConfig {
    fn as_ref(&self) -> &ServerConfig {
        &self.server
    }
}

impl AppConfig {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Load `.env`, then the file named by `ROSTER_CONFIG` if set, then
    /// environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::builder()
            .with_dotenv()
            .with_optional_config_file(std::env::var("ROSTER_CONFIG").ok())
            .with_logging_from_env()
            .build()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.secret.trim().is_empty() {
            return Err(ConfigError::Invalid("auth.secret must be set".into()));
        }
        if !(1..=MAX_TOKEN_TTL_SECS).contains(&self.auth.token_ttl_secs) {
            return Err(ConfigError::Invalid(format!(
                "auth.token_ttl_secs must be between 1 and {}",
                MAX_TOKEN_TTL_SECS
            )));
        }
        if self.auth.leeway_secs > MAX_LEEWAY_SECS {
            return Err(ConfigError::Invalid(format!(
                "auth.leeway_secs must be at most {}",
                MAX_LEEWAY_SECS
            )));
        }
        if self.auth.algorithms.is_empty() {
            return Err(ConfigError::Invalid("auth.algorithms must not be empty".into()));
        }
        if !self.auth.algorithms.iter().all(|a| HMAC_ALGORITHMS.contains(a)) {
            return Err(ConfigError::Invalid(
                "auth.algorithms must be HMAC (HS256, HS384, HS512) with a shared secret".into(),
            ));
        }
        if !BCRYPT_COSTS.contains(&self.password_cost) {
            return Err(ConfigError::Invalid(format!(
                "password_cost must be between {} and {}",
                BCRYPT_COSTS.start(),
                BCRYPT_COSTS.end()
            )));
        }
        self.auth.public_matcher()?;
        self.auth.admin_matcher()?;
        Ok(())
    }

    /// Prefix every API route is mounted under, e.g. `/api/v1`.
    pub fn api_prefix(&self) -> String {
        format!("/api/{}", self.api_version)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub secret: String,
    pub token_ttl_secs: u64,
    /// Role that passes every guard.
    pub admin_role: String,
    pub default_roles: Vec<String>,
    pub admin_roles: Vec<String>,
    /// Extra unauthenticated paths, on top of the built-in auth routes.
    pub public: Vec<RuleConfig>,
    /// Extra admin-only paths, on top of the built-in admin routes.
    pub admin_paths: Vec<RuleConfig>,
    pub leeway_secs: u64,
    pub algorithms: Vec<Algorithm>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            secret: String::new(),
            token_ttl_secs: THIRTY_DAYS,
            admin_role: roster_auth::DEFAULT_ADMIN_ROLE.to_string(),
            default_roles: ALL_ROLES.iter().map(|r| r.to_string()).collect(),
            admin_roles: ADMIN_ROLES.iter().map(|r| r.to_string()).collect(),
            public: Vec::new(),
            admin_paths: Vec::new(),
            leeway_secs: 0,
            algorithms: vec![Algorithm::HS256],
        }
    }
}

impl AuthSettings {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn verify_options(&self) -> VerifyOptions {
        VerifyOptions::default()
            .with_algorithms(self.algorithms.clone())
            .with_leeway(self.leeway_secs)
    }

    pub fn public_matcher(&self) -> Result<PathMatcher, ConfigError> {
        compile("auth.public", &self.public)
    }

    pub fn admin_matcher(&self) -> Result<PathMatcher, ConfigError> {
        compile("auth.admin_paths", &self.admin_paths)
    }
}

fn compile(key: &str, rules: &[RuleConfig]) -> Result<PathMatcher, ConfigError> {
    PathMatcher::from_config(rules).map_err(|e| ConfigError::Invalid(format!("{}: {}", key, e)))
}
