//! The user collection: records, storage, validation and use cases.

mod model;
mod revocation;
mod service;
mod store;
mod validation;

pub use model::{ActiveFlags, OsType, User};
pub use revocation::StoreRevocation;
pub use service::{
    ChangePasswordRequest, LoginRequest, ListQuery, RegisterRequest, TokenResponse,
    UpdateProfileRequest, UserService,
};
pub use store::{MemoryUserStore, StoreError, UserFilter, UserStore};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_DRIVER: &str = "driver";
pub const ROLE_SUPER_ADMIN: &str = "super admin";

pub const ALL_ROLES: [&str; 3] = [ROLE_ADMIN, ROLE_DRIVER, ROLE_SUPER_ADMIN];
pub const ADMIN_ROLES: [&str; 2] = [ROLE_ADMIN, ROLE_SUPER_ADMIN];

pub fn is_known_role(role: &str) -> bool {
    ALL_ROLES.contains(&role)
}

pub fn is_admin_role(role: &str) -> bool {
    ADMIN_ROLES.contains(&role)
}
