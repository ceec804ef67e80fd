use crate::error::AuthError;

pub const DEFAULT_ADMIN_ROLE: &str = "admin";
pub const DEFAULT_ROLE: &str = "driver";

/// Accepted roles for one guard.
///
/// The admin role passes every gate, whether or not it is listed in
/// `accepted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGate {
    accepted: Vec<String>,
    admin_role: String,
}

impl Default for RoleGate {
    fn default() -> Self {
        Self::new([DEFAULT_ROLE])
    }
}

impl RoleGate {
    pub fn new<I, R>(accepted: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self {
            accepted: accepted.into_iter().map(Into::into).collect(),
            admin_role: DEFAULT_ADMIN_ROLE.to_string(),
        }
    }

    pub fn with_admin_role(mut self, role: impl Into<String>) -> Self {
        self.admin_role = role.into();
        self
    }

    pub fn accepted(&self) -> &[String] {
        &self.accepted
    }

    pub fn admin_role(&self) -> &str {
        &self.admin_role
    }

    pub fn accepts(&self, role: &str) -> bool {
        role == self.admin_role || self.accepted.iter().any(|r| r == role)
    }

    pub fn check(&self, role: &str) -> Result<(), AuthError> {
        if self.accepts(role) {
            Ok(())
        } else {
            Err(AuthError::permission_denied())
        }
    }
}
