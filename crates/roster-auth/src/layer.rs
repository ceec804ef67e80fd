use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use axum::Router;
use roster_kit::Environment;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::context::AuthContext;
use crate::guard::{Attachment, AuthDecision, AuthGuard};
use crate::policy::{AuthPolicy, Route};

/// Applies an [`AuthPolicy`] to every request.
#[derive(Clone)]
pub struct AuthLayer {
    policy: Arc<AuthPolicy>,
    environment: Environment,
}

impl AuthLayer {
    pub fn new(policy: AuthPolicy, environment: Environment) -> Self {
        Self {
            policy: Arc::new(policy),
            environment,
        }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            policy: Arc::clone(&self.policy),
            environment: self.environment,
        }
    }
}

#[derive(Clone)]
pub struct AuthService<S> {
    inner: S,
    policy: Arc<AuthPolicy>,
    environment: Environment,
}

impl<S> Service<Request<Body>> for AuthService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let guard = match self.policy.resolve(req.uri().path(), req.method()) {
            Route::Public => None,
            Route::Guard(guard) => Some(Arc::clone(guard)),
        };
        let production = self.environment.is_production();
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let Some(guard) = guard else {
                return inner.call(req).await;
            };

            let (mut parts, body) = req.into_parts();
            let claims = match guard.authorize(&parts).await {
                Ok(AuthDecision::Authenticated(claims)) => Some(claims),
                Ok(AuthDecision::Anonymous | AuthDecision::Preflight) => None,
                Err(err) if production => return Ok(err.redacted().into_response()),
                Err(err) => return Ok(err.into_response()),
            };

            let Some(claims) = claims else {
                return inner.call(Request::from_parts(parts, body)).await;
            };

            match guard.attachment() {
                Attachment::Request(property) => {
                    AuthContext::attach(&mut parts.extensions, property, claims);
                    inner.call(Request::from_parts(parts, body)).await
                }
                Attachment::Response(property) => {
                    let mut response = inner.call(Request::from_parts(parts, body)).await?;
                    AuthContext::attach(response.extensions_mut(), property, claims);
                    Ok(response)
                }
            }
        })
    }
}

/// Extension trait for adding authentication to Router.
pub trait AuthExt {
    /// Route every request through `policy`.
    fn with_auth(self, policy: AuthPolicy, environment: Environment) -> Self;

    /// Protect every route with a single guard.
    fn with_guard(self, guard: AuthGuard, environment: Environment) -> Self;
}

impl AuthExt for Router {
    fn with_auth(self, policy: AuthPolicy, environment: Environment) -> Self {
        self.layer(AuthLayer::new(policy, environment))
    }

    fn with_guard(self, guard: AuthGuard, environment: Environment) -> Self {
        self.with_auth(AuthPolicy::new(guard), environment)
    }
}
