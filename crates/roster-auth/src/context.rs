//! Verified claims attached to requests, and extractors reading them.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::collections::HashMap;

use crate::error::AuthError;
use crate::guard::DEFAULT_USER_PROPERTY;
use crate::jwt::Claims;

/// Claims stored by name in request (or response) extensions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthContext {
    entries: HashMap<String, Claims>,
}

impl AuthContext {
    pub fn get(&self, property: &str) -> Option<&Claims> {
        self.entries.get(property)
    }

    pub fn insert(&mut self, property: impl Into<String>, claims: Claims) {
        self.entries.insert(property.into(), claims);
    }

    /// Claims under the default `"user"` property.
    pub fn user(&self) -> Option<&Claims> {
        self.get(DEFAULT_USER_PROPERTY)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert into `extensions`, creating the context if needed.
    pub(crate) fn attach(
        extensions: &mut axum::http::Extensions,
        property: &str,
        claims: Claims,
    ) {
        match extensions.get_mut::<AuthContext>() {
            Some(context) => context.insert(property, claims),
            None => {
                let mut context = AuthContext::default();
                context.insert(property, claims);
                extensions.insert(context);
            }
        }
    }
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Claims of the authenticated caller under `"user"`.
///
/// Rejects with `credentials_required` when the route was not guarded.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser(pub Claims);

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.0.sub
    }

    pub fn role(&self) -> &str {
        &self.0.role
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .and_then(AuthContext::user)
            .cloned()
            .map(CurrentUser)
            .ok_or_else(AuthError::credentials_required)
    }
}
