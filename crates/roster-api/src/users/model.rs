use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ROLE_DRIVER;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsType {
    Ios,
    Android,
    Web,
}

impl fmt::Display for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ios => "ios",
            Self::Android => "android",
            Self::Web => "web",
        })
    }
}

/// Onboarding steps the user has completed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveFlags {
    pub profile: bool,
    pub tax_profile: bool,
    pub verify_email: bool,
    pub link_account: bool,
    #[serde(rename = "verifySMS")]
    pub verify_sms: bool,
}

/// A stored user.
///
/// Serializes as the public profile: the password hash is never written.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub role: String,
    pub provider: String,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub middle_initial: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub avatar: Option<String>,
    pub ssn: Option<String>,
    pub active: ActiveFlags,
    pub is_lock: bool,
    pub receive_notify: bool,
    /// `None` until the first login, then `true` for that login only.
    pub first_login: Option<bool>,
    pub time_login: DateTime<Utc>,
    pub device_token: Option<String>,
    pub os_type: Option<OsType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// A new local account with the default role.
    pub fn new(email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.into(),
            password_hash: None,
            role: ROLE_DRIVER.to_string(),
            provider: "local".to_string(),
            phone: None,
            first_name: None,
            middle_initial: None,
            last_name: None,
            address: None,
            city: None,
            state: None,
            zip_code: None,
            avatar: None,
            ssn: None,
            active: ActiveFlags::default(),
            is_lock: false,
            receive_notify: true,
            first_login: None,
            time_login: now,
            device_token: None,
            os_type: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Value of a searchable field, by its JSON name.
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "email" => Some(&self.email),
            "role" => Some(&self.role),
            "phone" => self.phone.as_ref(),
            "firstName" => self.first_name.as_ref(),
            "middleInitial" => self.middle_initial.as_ref(),
            "lastName" => self.last_name.as_ref(),
            "address" => self.address.as_ref(),
            "city" => self.city.as_ref(),
            "state" => self.state.as_ref(),
            "zipCode" => self.zip_code.as_ref(),
            _ => None,
        };
        value.map(String::as_str)
    }

    pub fn is_searchable(name: &str) -> bool {
        matches!(
            name,
            "email"
                | "role"
                | "phone"
                | "firstName"
                | "middleInitial"
                | "lastName"
                | "address"
                | "city"
                | "state"
                | "zipCode"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_json_hides_password() {
        let mut user = User::new("a@b.co");
        user.password_hash = Some("$2b$04$hash".into());

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "driver");
        assert_eq!(json["isLock"], false);
        assert_eq!(json["active"]["verifySMS"], false);
    }

    #[test]
    fn searchable_fields_resolve() {
        let mut user = User::new("a@b.co");
        user.city = Some("Hanoi".into());
        assert_eq!(user.field("city"), Some("Hanoi"));
        assert_eq!(user.field("zipCode"), None);
        assert!(User::is_searchable("firstName"));
        assert!(!User::is_searchable("passwordHash"));
    }
}
