use async_trait::async_trait;
use axum::http::request::Parts;
use roster_auth::{BoxError, Claims, RevocationCheck};
use std::sync::Arc;

use super::store::UserStore;

/// Treats a token as revoked once its subject is locked or no longer exists.
#[derive(Clone)]
pub struct StoreRevocation {
    store: Arc<dyn UserStore>,
}

impl StoreRevocation {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RevocationCheck for StoreRevocation {
    async fn is_revoked(&self, _parts: &Parts, claims: &Claims) -> Result<bool, BoxError> {
        let user = self.store.get(&claims.sub).await?;
        Ok(match user {
            Some(user) => user.is_lock,
            None => true,
        })
    }
}
