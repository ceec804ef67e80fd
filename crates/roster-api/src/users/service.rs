//! User use cases behind the REST handlers.

use chrono::Utc;
use regex::RegexBuilder;
use roster_auth::{Claims, CurrentUser, TokenSigner};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use super::model::{OsType, User};
use super::store::{UserFilter, UserStore};
use super::{is_admin_role, is_known_role, validation, ADMIN_ROLES, ROLE_ADMIN, ROLE_DRIVER};
use crate::error::ApiError;
use crate::response::{Page, PageParams};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub os_type: Option<String>,
    pub device_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub os_type: Option<String>,
    pub device_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub middle_initial: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub avatar: Option<String>,
    pub ssn: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
    pub retry_password: Option<String>,
}

/// Query string of `GET /user`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub role: Option<String>,
    pub lock: Option<bool>,
    pub active: Option<bool>,
    /// Field to search in, e.g. `email` or `firstName`.
    pub search: Option<String>,
    /// Case-insensitive pattern matched against `search`.
    pub keyword: Option<String>,
}

impl ListQuery {
    pub fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
}

fn parse_os_type(value: Option<&str>) -> Option<OsType> {
    match value? {
        "ios" => Some(OsType::Ios),
        "android" => Some(OsType::Android),
        "web" => Some(OsType::Web),
        _ => None,
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct UserService {
    store: Arc<dyn UserStore>,
    signer: TokenSigner,
    password_cost: u32,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, signer: TokenSigner, password_cost: u32) -> Self {
        Self {
            store,
            signer,
            password_cost,
        }
    }

    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    /// Create an account, or set the password of a record that has none.
    #[instrument(skip_all)]
    pub async fn register(&self, req: RegisterRequest) -> Result<TokenResponse, ApiError> {
        let os_type = parse_os_type(req.os_type.as_deref());
        validation::email(req.email.as_deref())
            .and_then(|_| validation::strong_password(req.password.as_deref()))
            .and_then(|_| validation::device(os_type, req.device_token.as_deref()))
            .and_then(|_| validation::phone(req.phone.as_deref(), "Missing phone number"))
            .map_err(ApiError::BadRequest)?;

        let email = normalize_email(req.email.as_deref().unwrap_or_default());
        let existing = self.store.find_by_email(&email).await?;
        if existing.as_ref().is_some_and(|u| u.password_hash.is_some()) {
            return Err(ApiError::bad_request(format!(
                "Account: {} is already taken.",
                email
            )));
        }
        let password_hash = self
            .hash_password(req.password.unwrap_or_default())
            .await?;

        let user = match existing {
            Some(mut existing) => {
                existing.password_hash = Some(password_hash);
                existing.touch();
                self.store.update(existing).await?
            }
            None => {
                let mut user = User::new(email);
                user.password_hash = Some(password_hash);
                user.phone = req.phone;
                user.os_type = os_type;
                user.device_token = req.device_token;
                let user = self.store.insert(user).await?;
                info!(user_id = %user.id, "registered user");
                user
            }
        };

        self.issue_token(&user)
    }

    #[instrument(skip_all)]
    pub async fn login(&self, req: LoginRequest) -> Result<TokenResponse, ApiError> {
        let os_type = parse_os_type(req.os_type.as_deref());
        validation::required(req.email.as_deref(), "Email cannot be empty!")
            .and_then(|_| validation::required(req.password.as_deref(), "Password cannot be empty!"))
            .and_then(|_| validation::device(os_type, req.device_token.as_deref()))
            .map_err(ApiError::BadRequest)?;

        let mut user = self.check_credentials(&req, |_| Ok(())).await?;
        user.os_type = os_type;
        user.device_token = req.device_token;
        self.record_login(user).await
    }

    /// Login restricted to `admin` and `super admin` accounts.
    #[instrument(skip_all)]
    pub async fn admin_login(&self, req: LoginRequest) -> Result<TokenResponse, ApiError> {
        validation::required(req.email.as_deref(), "Email cannot be empty!")
            .and_then(|_| validation::required(req.password.as_deref(), "Password cannot be empty!"))
            .map_err(ApiError::BadRequest)?;

        let user = self
            .check_credentials(&req, |user| {
                if is_admin_role(&user.role) {
                    Ok(())
                } else {
                    Err(ApiError::bad_request("You are not admin!!"))
                }
            })
            .await?;
        self.record_login(user).await
    }

    async fn check_credentials(
        &self,
        req: &LoginRequest,
        allowed: impl Fn(&User) -> Result<(), ApiError>,
    ) -> Result<User, ApiError> {
        let email = normalize_email(req.email.as_deref().unwrap_or_default());
        let user = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or_else(|| ApiError::bad_request("Email is not exist!"))?;

        allowed(&user)?;
        if user.is_lock {
            return Err(ApiError::bad_request(
                "Account locked for some reason. Please contact your administrator to reactivate",
            ));
        }

        let password = req.password.clone().unwrap_or_default();
        let matches = match user.password_hash.clone() {
            Some(hash) => self.verify_password(password, hash).await?,
            None => false,
        };
        if !matches {
            return Err(ApiError::bad_request("Your password is invalid!"));
        }
        Ok(user)
    }

    async fn record_login(&self, mut user: User) -> Result<TokenResponse, ApiError> {
        user.first_login = Some(user.first_login.is_none());
        user.time_login = Utc::now();
        user.touch();
        let user = self.store.update(user).await?;
        info!(user_id = %user.id, role = %user.role, "user logged in");
        self.issue_token(&user)
    }

    fn issue_token(&self, user: &User) -> Result<TokenResponse, ApiError> {
        let claims = Claims::new(&user.id, &user.role)
            .expires_in(self.signer.ttl())
            .with_jti(uuid::Uuid::new_v4().to_string());
        Ok(TokenResponse {
            access_token: self.signer.sign_claims(&claims)?,
        })
    }

    /// Profile of `id`; callers may read their own, admins any.
    #[instrument(skip(self, caller), fields(caller = %caller.id()))]
    pub async fn profile(&self, caller: &CurrentUser, id: &str) -> Result<User, ApiError> {
        if id != caller.id() && caller.role() != ROLE_ADMIN {
            return Err(ApiError::Forbidden);
        }
        self.store.get(id).await?.ok_or_else(ApiError::user_not_found)
    }

    #[instrument(skip(self, caller, req), fields(caller = %caller.id()))]
    pub async fn update_profile(
        &self,
        caller: &CurrentUser,
        id: &str,
        req: UpdateProfileRequest,
    ) -> Result<User, ApiError> {
        validation::required(req.first_name.as_deref(), "First name cannot be empty!")
            .and_then(|_| validation::required(req.last_name.as_deref(), "Last name cannot be empty!"))
            .and_then(|_| validation::phone(req.phone.as_deref(), "Phone number cannot be empty!"))
            .and_then(|_| validation::required(req.address.as_deref(), "Address cannot be empty!"))
            .and_then(|_| validation::required(req.city.as_deref(), "City cannot be empty!"))
            .and_then(|_| validation::required(req.state.as_deref(), "State cannot be empty!"))
            .and_then(|_| validation::zip_code(req.zip_code.as_deref()))
            .and_then(|_| validation::ssn(req.ssn.as_deref()))
            .map_err(ApiError::BadRequest)?;

        if id != caller.id() {
            return Err(ApiError::Forbidden);
        }

        let mut user = self
            .store
            .get(id)
            .await?
            .ok_or_else(ApiError::user_not_found)?;
        user.first_name = req.first_name;
        user.last_name = req.last_name;
        user.phone = req.phone;
        user.address = req.address;
        user.city = req.city;
        user.state = req.state;
        user.zip_code = req.zip_code;
        if req.middle_initial.is_some() {
            user.middle_initial = req.middle_initial;
        }
        if req.avatar.is_some() {
            user.avatar = req.avatar;
        }
        if req.ssn.is_some() {
            user.ssn = req.ssn;
        }
        user.active.profile = true;
        user.touch();

        Ok(self.store.update(user).await?)
    }

    #[instrument(skip(self, caller, req), fields(caller = %caller.id()))]
    pub async fn change_password(
        &self,
        caller: &CurrentUser,
        req: ChangePasswordRequest,
    ) -> Result<(), ApiError> {
        validation::required(req.old_password.as_deref(), "password old is required.")
            .and_then(|_| validation::required(req.new_password.as_deref(), "password new is required."))
            .and_then(|_| {
                validation::required(req.retry_password.as_deref(), "retry password cannot be empty.")
            })
            .map_err(ApiError::BadRequest)?;
        if req.new_password != req.retry_password {
            return Err(ApiError::bad_request("Retry password not match."));
        }

        let mut user = self
            .store
            .get(caller.id())
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

        let old = req.old_password.unwrap_or_default();
        let matches = match user.password_hash.clone() {
            Some(hash) => self.verify_password(old, hash).await?,
            None => false,
        };
        if !matches {
            return Err(ApiError::bad_request("Password old not match."));
        }

        user.password_hash = Some(self.hash_password(req.new_password.unwrap_or_default()).await?);
        user.touch();
        self.store.update(user).await?;
        Ok(())
    }

    /// Paginated listing for admins; drivers are refused.
    #[instrument(skip(self, caller), fields(caller = %caller.id()))]
    pub async fn list(&self, caller: &CurrentUser, query: ListQuery) -> Result<Page<User>, ApiError> {
        if caller.role() == ROLE_DRIVER {
            return Err(ApiError::Forbidden);
        }

        let search = match (&query.search, &query.keyword) {
            (Some(field), Some(keyword)) if !keyword.is_empty() => {
                if !User::is_searchable(field) {
                    return Err(ApiError::bad_request(format!(
                        "Search field is not supported: {}",
                        field
                    )));
                }
                let pattern = RegexBuilder::new(keyword)
                    .case_insensitive(true)
                    .build()
                    .map_err(|_| ApiError::bad_request("Keyword is invalid!"))?;
                Some((field.clone(), pattern))
            }
            _ => None,
        };

        let params = query.page_params();
        let filter = UserFilter {
            role: query.role,
            roles: None,
            lock: query.lock,
            active: query.active,
            search,
        };
        let (users, total) = self
            .store
            .list(&filter, params.offset(), params.page_size())
            .await?;
        Ok(Page::new(users, total, &params))
    }

    pub async fn list_admins(&self) -> Result<Vec<User>, ApiError> {
        let filter = UserFilter {
            roles: Some(ADMIN_ROLES.iter().map(|r| r.to_string()).collect()),
            ..Default::default()
        };
        let (users, _) = self.store.list(&filter, 0, usize::MAX).await?;
        Ok(users)
    }

    #[instrument(skip(self))]
    pub async fn update_role(&self, id: &str, role: Option<&str>) -> Result<User, ApiError> {
        let role = role
            .filter(|r| is_known_role(r))
            .ok_or_else(|| ApiError::bad_request("Role is invalid!"))?;

        let mut user = self
            .store
            .get(id)
            .await?
            .ok_or_else(ApiError::user_not_found)?;
        user.role = role.to_string();
        user.touch();
        let user = self.store.update(user).await?;
        info!(user_id = %user.id, role = %user.role, "role changed");
        Ok(user)
    }

    /// Lock or unlock an account. Tokens of a locked account stop working.
    #[instrument(skip(self))]
    pub async fn set_lock(&self, id: &str, lock: bool) -> Result<User, ApiError> {
        let mut user = self
            .store
            .get(id)
            .await?
            .ok_or_else(ApiError::user_not_found)?;
        user.is_lock = lock;
        user.touch();
        let user = self.store.update(user).await?;
        info!(user_id = %user.id, lock, "lock changed");
        Ok(user)
    }

    async fn hash_password(&self, password: String) -> Result<String, ApiError> {
        let cost = self.password_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?
            .map_err(ApiError::from)
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, ApiError> {
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?
            .map_err(ApiError::from)
    }
}
