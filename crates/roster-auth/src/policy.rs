use axum::http::Method;
use std::sync::Arc;

use crate::exemption::PathMatcher;
use crate::guard::AuthGuard;

/// What happens to a request once its path is classified.
#[derive(Debug, Clone)]
pub enum Route {
    Public,
    Guard(Arc<AuthGuard>),
}

/// Ordered routing table from path rules to guards.
///
/// Entries are checked in insertion order and the first matching one wins.
/// Requests matching no entry use the default route.
#[derive(Debug, Clone)]
pub struct AuthPolicy {
    entries: Vec<(Arc<PathMatcher>, Route)>,
    default: Route,
}

impl AuthPolicy {
    /// Every unmatched request goes through `guard`.
    pub fn new(guard: AuthGuard) -> Self {
        Self {
            entries: Vec::new(),
            default: Route::Guard(Arc::new(guard)),
        }
    }

    /// Unmatched requests pass without authentication.
    pub fn open() -> Self {
        Self {
            entries: Vec::new(),
            default: Route::Public,
        }
    }

    /// Requests matching `matcher` use `guard` instead of the default.
    pub fn guard(self, matcher: impl Into<Arc<PathMatcher>>, guard: impl Into<Arc<AuthGuard>>) -> Self {
        self.route(matcher, Route::Guard(guard.into()))
    }

    /// Requests matching `matcher` skip authentication.
    pub fn public(self, matcher: impl Into<Arc<PathMatcher>>) -> Self {
        self.route(matcher, Route::Public)
    }

    fn route(mut self, matcher: impl Into<Arc<PathMatcher>>, route: Route) -> Self {
        let matcher = matcher.into();
        if !matcher.is_empty() {
            self.entries.push((matcher, route));
        }
        self
    }

    pub fn resolve(&self, path: &str, method: &Method) -> &Route {
        self.entries
            .iter()
            .find(|(matcher, _)| matcher.is_exempt(path, method))
            .map(|(_, route)| route)
            .unwrap_or(&self.default)
    }
}
