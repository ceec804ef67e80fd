//! Request field checks. Each returns the first failure as a client message.

use regex::Regex;
use std::sync::LazyLock;

use super::model::OsType;

const PASSWORD_SPECIALS: &str = "!@#$%&*";

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[_A-Za-z0-9-]+(\.[_A-Za-z0-9-]+)*@[A-Za-z0-9]+(\.[A-Za-z0-9]+)*(\.[A-Za-z]{2,})$")
        .expect("Invalid email pattern")
});

/// Vietnamese mobile numbers, local `0` or `+84` prefix.
static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\+?84|0)(1[2689]|[89])[0-9]{8}$").expect("Invalid phone pattern")
});

/// 3 to 10 alphanumerics, inner spaces and dashes allowed.
static POSTAL_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 -]{1,8}[A-Za-z0-9]$").expect("Invalid postal code pattern")
});

/// `123-45-6789` or `123456789`.
static SSN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{3}-\d{2}-\d{4}|\d{9})$").expect("Invalid SSN pattern")
});

pub(crate) type Check = Result<(), String>;

pub(crate) fn required(value: Option<&str>, message: &str) -> Check {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(message.to_string()),
    }
}

pub(crate) fn email(value: Option<&str>) -> Check {
    required(value, "Email is required!")?;
    match value {
        Some(v) if EMAIL.is_match(v.trim()) => Ok(()),
        _ => Err("Email invalid!".to_string()),
    }
}

/// 8 to 40 characters with a lowercase letter, an uppercase letter, a digit
/// and one of `!@#$%&*`.
pub(crate) fn strong_password(value: Option<&str>) -> Check {
    let password = value.unwrap_or_default();
    let len = password.chars().count();
    if !(8..=40).contains(&len) {
        return Err("Password must be longer than 8 characters!".to_string());
    }
    let strong = password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c));
    if strong {
        Ok(())
    } else {
        Err("Password is not match the requirement".to_string())
    }
}

/// Mobile clients must send a push token: 64 characters on iOS, 64 to 256
/// on Android.
pub(crate) fn device(os_type: Option<OsType>, device_token: Option<&str>) -> Check {
    let Some(os_type) = os_type else {
        return Err("Missing os type!".to_string());
    };
    let len = device_token.map(|t| t.chars().count()).unwrap_or(0);
    let valid = match os_type {
        OsType::Web => true,
        OsType::Ios => len == 64,
        OsType::Android => (64..=256).contains(&len),
    };
    if valid {
        Ok(())
    } else {
        Err("Device token invalid!".to_string())
    }
}

/// `missing` when absent or blank, `Phone invalid!` when malformed.
pub(crate) fn phone(value: Option<&str>, missing: &str) -> Check {
    required(value, missing)?;
    match value {
        Some(v) if PHONE.is_match(v.trim()) => Ok(()),
        _ => Err("Phone invalid!".to_string()),
    }
}

pub(crate) fn zip_code(value: Option<&str>) -> Check {
    match value {
        Some(v) if POSTAL_CODE.is_match(v.trim()) => Ok(()),
        _ => Err("Zip code is invalid!".to_string()),
    }
}

pub(crate) fn ssn(value: Option<&str>) -> Check {
    match value {
        None | Some("") => Ok(()),
        Some(v) if SSN.is_match(v) => Ok(()),
        Some(_) => Err("Social security invalid!".to_string()),
    }
}
