//! Revocation checks run after a token has been verified.

use async_trait::async_trait;
use axum::http::request::Parts;
use std::collections::HashSet;
use tokio::sync::RwLock;

use crate::error::BoxError;
use crate::jwt::Claims;

/// Answers whether a verified token may no longer be used.
#[async_trait]
pub trait RevocationCheck: Send + Sync {
    async fn is_revoked(&self, parts: &Parts, claims: &Claims) -> Result<bool, BoxError>;
}

#[async_trait]
impl<T: RevocationCheck + ?Sized> RevocationCheck for std::sync::Arc<T> {
    async fn is_revoked(&self, parts: &Parts, claims: &Claims) -> Result<bool, BoxError> {
        (**self).is_revoked(parts, claims).await
    }
}

/// Default checker: nothing is ever revoked.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverRevoked;

#[async_trait]
impl RevocationCheck for NeverRevoked {
    async fn is_revoked(&self, _parts: &Parts, _claims: &Claims) -> Result<bool, BoxError> {
        Ok(false)
    }
}

/// Process-local blocklist keyed by token id (`jti`) or subject.
#[derive(Debug, Default)]
pub struct MemoryBlocklist {
    tokens: RwLock<HashSet<String>>,
    subjects: RwLock<HashSet<String>>,
}

impl MemoryBlocklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn revoke_token(&self, jti: impl Into<String>) {
        self.tokens.write().await.insert(jti.into());
    }

    /// Revoke every token issued to `sub`, past and future.
    pub async fn revoke_subject(&self, sub: impl Into<String>) {
        self.subjects.write().await.insert(sub.into());
    }

    pub async fn restore_subject(&self, sub: &str) -> bool {
        self.subjects.write().await.remove(sub)
    }
}

#[async_trait]
impl RevocationCheck for MemoryBlocklist {
    async fn is_revoked(&self, _parts: &Parts, claims: &Claims) -> Result<bool, BoxError> {
        if self.subjects.read().await.contains(&claims.sub) {
            return Ok(true);
        }
        Ok(match &claims.jti {
            Some(jti) => self.tokens.read().await.contains(jti),
            None => false,
        })
    }
}
