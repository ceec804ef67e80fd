//! HTTP surface: handlers and the authentication policy in front of them.

mod auth;
mod users;

use axum::Router;
use roster_auth::{AuthGuard, AuthPolicy, ExemptionRule, PathMatcher, RuleError, SecretSource};
use roster_kit::ConfigError;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::state::AppState;
use crate::users::{StoreRevocation, UserStore};

/// Every API route, relative to the API prefix.
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(auth::routes()).merge(users::routes())
}

/// Admin paths go through the admin guard, auth and health paths are
/// public, everything else needs a token with one of the default roles.
pub fn auth_policy(config: &AppConfig, store: Arc<dyn UserStore>) -> Result<AuthPolicy, ConfigError> {
    let prefix = config.api_prefix();
    let settings = &config.auth;
    let secret = SecretSource::from_secret(settings.secret.as_bytes());
    let revocation = StoreRevocation::new(store);

    let guard = |roles: &[String]| {
        AuthGuard::builder(secret.clone())
            .roles(roles.iter().cloned())
            .admin_role(settings.admin_role.clone())
            .revocation(revocation.clone())
            .verify_options(settings.verify_options())
            .build()
    };
    let admin = Arc::new(guard(&settings.admin_roles));

    Ok(AuthPolicy::new(guard(&settings.default_roles))
        .guard(admin_paths(&prefix).map_err(invalid)?, admin.clone())
        .guard(settings.admin_matcher()?, admin)
        .public(public_paths(&prefix).map_err(invalid)?)
        .public(settings.public_matcher()?))
}

fn admin_paths(prefix: &str) -> Result<PathMatcher, RuleError> {
    let pattern = format!("^{}/user/admin(/|$)", regex::escape(prefix));
    Ok(PathMatcher::new(vec![ExemptionRule::regex(&pattern)?]))
}

fn public_paths(prefix: &str) -> Result<PathMatcher, RuleError> {
    let mut rules = [auth::REGISTER, auth::LOGIN, auth::ADMIN_LOGIN]
        .iter()
        .map(|path| ExemptionRule::exact(format!("{}{}", prefix, path)).methods(["POST"]))
        .collect::<Result<Vec<_>, _>>()?;
    rules.push(ExemptionRule::exact("/health").methods(["GET"])?);
    Ok(PathMatcher::new(rules))
}

fn invalid(err: RuleError) -> ConfigError {
    ConfigError::Invalid(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::MemoryUserStore;
    use axum::http::Method;
    use roster_auth::Route;

    fn policy(config: &AppConfig) -> AuthPolicy {
        auth_policy(config, Arc::new(MemoryUserStore::new())).unwrap()
    }

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.auth.secret = "routes-secret".into();
        config
    }

    fn guard_roles(route: &Route) -> Vec<String> {
        match route {
            Route::Guard(guard) => guard.roles().accepted().to_vec(),
            Route::Public => panic!("expected a guard"),
        }
    }

    #[test]
    fn auth_routes_are_public_for_post_only() {
        let policy = policy(&config());
        assert!(matches!(
            policy.resolve("/api/v1/auth/login", &Method::POST),
            Route::Public
        ));
        assert!(matches!(policy.resolve("/health", &Method::GET), Route::Public));
        assert!(matches!(
            policy.resolve("/api/v1/auth/login", &Method::GET),
            Route::Guard(_)
        ));
    }

    #[test]
    fn admin_paths_use_admin_roles() {
        let policy = policy(&config());
        let admin = guard_roles(policy.resolve("/api/v1/user/admin/lock/42", &Method::PUT));
        assert_eq!(admin, ["admin", "super admin"]);

        let default = guard_roles(policy.resolve("/api/v1/user/admins-report", &Method::GET));
        assert_eq!(default, ["admin", "driver", "super admin"]);
    }

    #[test]
    fn configured_rules_extend_builtins() {
        let mut config = config();
        config.auth.public = vec![roster_auth::RuleConfig::regex("^/api/v1/docs")];
        config.auth.admin_paths = vec![roster_auth::RuleConfig::path("/api/v1/reports")];
        let policy = policy(&config);

        assert!(matches!(policy.resolve("/api/v1/docs/intro", &Method::GET), Route::Public));
        let roles = guard_roles(policy.resolve("/api/v1/reports", &Method::GET));
        assert_eq!(roles, ["admin", "super admin"]);
    }
}
