//! Verification key resolution.

use async_trait::async_trait;
use axum::http::request::Parts;
use jsonwebtoken::{DecodingKey, Header};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::BoxError;
use crate::jwt::Claims;

/// Produces the verification key for one request.
///
/// Receives the request head together with the unverified token header and
/// claims, so keys can depend on `kid`, issuer, tenant claims or headers.
#[async_trait]
pub trait SecretResolver: Send + Sync {
    async fn resolve(
        &self,
        parts: &Parts,
        header: &Header,
        claims: &Claims,
    ) -> Result<DecodingKey, BoxError>;
}

/// Where the guard gets its verification key. Chosen once when the guard
/// is built.
#[derive(Clone)]
pub enum SecretSource {
    Static(DecodingKey),
    Dynamic(Arc<dyn SecretResolver>),
}

impl SecretSource {
    pub fn from_secret(secret: impl AsRef<[u8]>) -> Self {
        Self::Static(DecodingKey::from_secret(secret.as_ref()))
    }

    pub fn dynamic(resolver: impl SecretResolver + 'static) -> Self {
        Self::Dynamic(Arc::new(resolver))
    }

    pub(crate) async fn resolve(
        &self,
        parts: &Parts,
        header: &Header,
        claims: &Claims,
    ) -> Result<DecodingKey, BoxError> {
        match self {
            Self::Static(key) => Ok(key.clone()),
            Self::Dynamic(resolver) => resolver.resolve(parts, header, claims).await,
        }
    }
}

impl fmt::Debug for SecretSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(_) => f.write_str("SecretSource::Static(..)"),
            Self::Dynamic(_) => f.write_str("SecretSource::Dynamic(..)"),
        }
    }
}

#[derive(Debug)]
pub struct UnknownKeyId(pub Option<String>);

impl fmt::Display for UnknownKeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(kid) => write!(f, "no key registered for kid {:?}", kid),
            None => write!(f, "token header has no kid"),
        }
    }
}

impl std::error::Error for UnknownKeyId {}

/// Picks a shared secret by the token header's `kid`.
#[derive(Clone, Default)]
pub struct KeyIdResolver {
    keys: HashMap<String, DecodingKey>,
}

impl KeyIdResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, kid: impl Into<String>, secret: impl AsRef<[u8]>) -> Self {
        self.keys
            .insert(kid.into(), DecodingKey::from_secret(secret.as_ref()));
        self
    }
}

#[async_trait]
impl SecretResolver for KeyIdResolver {
    async fn resolve(
        &self,
        _parts: &Parts,
        header: &Header,
        _claims: &Claims,
    ) -> Result<DecodingKey, BoxError> {
        header
            .kid
            .as_ref()
            .and_then(|kid| self.keys.get(kid))
            .cloned()
            .ok_or_else(|| UnknownKeyId(header.kid.clone()).into())
    }
}
