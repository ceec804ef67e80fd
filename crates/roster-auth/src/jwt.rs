//! Token codec: unverified decoding, verification and signing.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Token payload.
///
/// `sub` and `role` are what the guard needs; every other claim is kept in
/// `extra` so a verified payload reaches handlers unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Claims {
    pub fn new(sub: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            role: role.into(),
            iat: None,
            exp: None,
            jti: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Stamp `iat` with the current time and `exp` with `iat + ttl`.
    pub fn expires_in(mut self, ttl: Duration) -> Self {
        let now = now();
        self.iat = Some(now);
        self.exp = Some(now.saturating_add(ttl.as_secs()));
        self
    }

    pub fn with_jti(mut self, jti: impl Into<String>) -> Self {
        self.jti = Some(jti.into());
        self
    }

    pub fn with_claim(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    pub fn claim(&self, name: &str) -> Option<&serde_json::Value> {
        self.extra.get(name)
    }
}

pub(crate) fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Not a JWT, or header/payload could not be parsed.
    Malformed(String),
    InvalidSignature,
    Expired,
    /// Structurally fine but rejected (algorithm, issuer, audience, nbf).
    Invalid(String),
    Signing(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(msg) => write!(f, "malformed token: {}", msg),
            Self::InvalidSignature => write!(f, "invalid signature"),
            Self::Expired => write!(f, "jwt expired"),
            Self::Invalid(msg) => write!(f, "invalid token: {}", msg),
            Self::Signing(msg) => write!(f, "failed to sign token: {}", msg),
        }
    }
}

impl std::error::Error for TokenError {}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => Self::Malformed(err.to_string()),
            _ => Self::Invalid(err.to_string()),
        }
    }
}

/// Header and payload read without any key.
#[derive(Debug, Clone)]
pub struct DecodedToken {
    pub header: Header,
    pub claims: Claims,
}

/// Parse a token without checking its signature or expiry.
///
/// Used to read the header and claims before the verification key is known.
pub fn decode(token: &str) -> Result<DecodedToken, TokenError> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::ExpiredSignature => {
                TokenError::Malformed(e.to_string())
            }
            _ => TokenError::from(e),
        })?;

    Ok(DecodedToken {
        header: data.header,
        claims: data.claims,
    })
}

/// Options applied by [`verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOptions {
    pub algorithms: Vec<Algorithm>,
    /// Clock skew tolerated on `exp` and `nbf`, in seconds.
    pub leeway: u64,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            algorithms: vec![Algorithm::HS256],
            leeway: 0,
            issuer: None,
            audience: None,
        }
    }
}

impl VerifyOptions {
    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.algorithms = algorithms;
        self
    }

    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(
            self.algorithms.first().copied().unwrap_or(Algorithm::HS256),
        );
        validation.algorithms = self.algorithms.clone();
        validation.leeway = self.leeway;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.required_spec_claims.clear();

        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }
        validation.validate_aud = self.audience.is_some();
        if let Some(audience) = &self.audience {
            validation.set_audience(&[audience]);
        }
        validation
    }
}

/// Check signature, algorithm and time claims, returning the payload.
pub fn verify(token: &str, key: &DecodingKey, options: &VerifyOptions) -> Result<Claims, TokenError> {
    jsonwebtoken::decode::<Claims>(token, key, &options.validation())
        .map(|data| data.claims)
        .map_err(TokenError::from)
}

/// Issues tokens for login and registration.
#[derive(Clone)]
pub struct TokenSigner {
    key: EncodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("algorithm", &self.algorithm)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    /// HMAC signer (HS256) for a shared secret.
    pub fn from_secret(secret: &[u8], ttl: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
            ttl,
        }
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn sign(&self, sub: impl Into<String>, role: impl Into<String>) -> Result<String, TokenError> {
        self.sign_claims(&Claims::new(sub, role).expires_in(self.ttl))
    }

    /// Sign `claims` as given; time claims are not touched.
    pub fn sign_claims(&self, claims: &Claims) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(self.algorithm), claims, &self.key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}
