use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::RwLock;

use super::model::User;

#[derive(Debug)]
pub enum StoreError {
    /// A user with this email already exists.
    Duplicate(String),
    NotFound(String),
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate(email) => write!(f, "duplicate email: {}", email),
            Self::NotFound(id) => write!(f, "user not found: {}", id),
            Self::Backend(msg) => write!(f, "user store failure: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Filters for listing users. All set filters must match.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<String>,
    pub roles: Option<Vec<String>>,
    pub lock: Option<bool>,
    /// Matches `active.profile`.
    pub active: Option<bool>,
    /// Field name and pattern, e.g. `("email", /gmail/i)`.
    pub search: Option<(String, Regex)>,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        self.role.as_ref().map_or(true, |r| &user.role == r)
            && self.roles.as_ref().map_or(true, |rs| rs.contains(&user.role))
            && self.lock.map_or(true, |l| user.is_lock == l)
            && self.active.map_or(true, |a| user.active.profile == a)
            && self.search.as_ref().map_or(true, |(field, re)| {
                user.field(field).is_some_and(|value| re.is_match(value))
            })
    }
}

/// Persistence for the user collection.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: User) -> Result<User, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Lookup by email, compared case-insensitively.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Replace the stored record with the same id.
    async fn update(&self, user: User) -> Result<User, StoreError>;

    /// Matching users newest first, after skipping `offset`, at most `limit`,
    /// together with the total number of matches.
    async fn list(
        &self,
        filter: &UserFilter,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<User>, usize), StoreError>;
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::Duplicate(user.email));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        match users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(user)
            }
            None => Err(StoreError::NotFound(user.id)),
        }
    }

    async fn list(
        &self,
        filter: &UserFilter,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<User>, usize), StoreError> {
        let users = self.users.read().await;
        let mut matched: Vec<&User> = users.values().filter(|u| filter.matches(u)).collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        let total = matched.len();
        let page = matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((page, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use regex::RegexBuilder;

    fn user(email: &str, role: &str, age_secs: i64) -> User {
        let mut user = User::new(email).with_role(role);
        user.created_at -= Duration::seconds(age_secs);
        user
    }

    #[tokio::test]
    async fn email_is_unique_ignoring_case() {
        let store = MemoryUserStore::new();
        store.insert(User::new("a@b.co")).await.unwrap();

        let err = store.insert(User::new("A@B.CO")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert!(store.find_by_email("A@b.co").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_requires_existing_record() {
        let store = MemoryUserStore::new();
        let err = store.update(User::new("a@b.co")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        let mut saved = store.insert(User::new("a@b.co")).await.unwrap();
        saved.is_lock = true;
        store.update(saved.clone()).await.unwrap();
        assert!(store.get(&saved.id).await.unwrap().unwrap().is_lock);
    }

    #[tokio::test]
    async fn list_filters_sorts_and_pages() {
        let store = MemoryUserStore::new();
        store.insert(user("old@x.co", "driver", 30)).await.unwrap();
        store.insert(user("mid@x.co", "driver", 20)).await.unwrap();
        store.insert(user("new@x.co", "driver", 10)).await.unwrap();
        store.insert(user("boss@x.co", "admin", 5)).await.unwrap();

        let drivers = UserFilter {
            role: Some("driver".into()),
            ..Default::default()
        };
        let (page, total) = store.list(&drivers, 1, 1).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].email, "mid@x.co");

        let search = UserFilter {
            search: Some((
                "email".into(),
                RegexBuilder::new("^BOSS").case_insensitive(true).build().unwrap(),
            )),
            ..Default::default()
        };
        let (page, total) = store.list(&search, 0, 20).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].role, "admin");
    }
}
