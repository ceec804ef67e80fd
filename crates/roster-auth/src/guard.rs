//! The authentication pipeline for a single request.
//!
//! Stages run in order and stop at the first failure:
//! preflight bypass, token extraction, unverified decode, key resolution,
//! verification, revocation check, role gate.

use axum::http::header::{ACCESS_CONTROL_REQUEST_HEADERS, AUTHORIZATION};
use axum::http::request::Parts;
use axum::http::Method;
use std::fmt;
use std::sync::Arc;

use crate::error::{AuthError, BoxError};
use crate::jwt::{self, Claims, VerifyOptions};
use crate::revocation::{NeverRevoked, RevocationCheck};
use crate::role::RoleGate;
use crate::secret::SecretSource;

pub const DEFAULT_USER_PROPERTY: &str = "user";

/// Custom token lookup, replacing the `Authorization: Bearer` header.
///
/// `Ok(None)` means no token was presented.
pub trait TokenExtractor: Send + Sync {
    fn extract(&self, parts: &Parts) -> Result<Option<String>, BoxError>;
}

impl<F> TokenExtractor for F
where
    F: Fn(&Parts) -> Result<Option<String>, BoxError> + Send + Sync,
{
    fn extract(&self, parts: &Parts) -> Result<Option<String>, BoxError> {
        self(parts)
    }
}

/// Outcome of a request that was let through.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthDecision {
    Authenticated(Claims),
    /// No token and credentials are optional.
    Anonymous,
    /// CORS preflight asking to send `Authorization`.
    Preflight,
}

/// Where verified claims are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    /// Request extensions, under this name.
    Request(String),
    /// Response extensions, under this name.
    Response(String),
}

/// One configured authentication policy.
pub struct AuthGuard {
    secret: SecretSource,
    gate: RoleGate,
    revocation: Arc<dyn RevocationCheck>,
    attachment: Attachment,
    credentials_required: bool,
    token_extractor: Option<Arc<dyn TokenExtractor>>,
    verify: VerifyOptions,
}

impl fmt::Debug for AuthGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGuard")
            .field("secret", &self.secret)
            .field("gate", &self.gate)
            .field("attachment", &self.attachment)
            .field("credentials_required", &self.credentials_required)
            .field("custom_extractor", &self.token_extractor.is_some())
            .field("verify", &self.verify)
            .finish_non_exhaustive()
    }
}

impl AuthGuard {
    pub fn builder(secret: SecretSource) -> AuthGuardBuilder {
        AuthGuardBuilder::new(secret)
    }

    pub fn attachment(&self) -> &Attachment {
        &self.attachment
    }

    pub fn roles(&self) -> &RoleGate {
        &self.gate
    }

    pub async fn authorize(&self, parts: &Parts) -> Result<AuthDecision, AuthError> {
        let result = self.run(parts).await;
        match &result {
            Ok(AuthDecision::Authenticated(claims)) => {
                tracing::trace!(sub = %claims.sub, role = %claims.role, "request authenticated");
            }
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(
                    code = err.kind().code(),
                    method = %parts.method,
                    path = %parts.uri.path(),
                    "request rejected"
                );
            }
        }
        result
    }

    async fn run(&self, parts: &Parts) -> Result<AuthDecision, AuthError> {
        if is_preflight(parts) {
            return Ok(AuthDecision::Preflight);
        }

        let token = match &self.token_extractor {
            Some(extractor) => extractor.extract(parts).map_err(AuthError::check_failed)?,
            None => bearer_token(parts, self.credentials_required)?,
        };
        let token = match token.filter(|t| !t.is_empty()) {
            Some(token) => token,
            None if self.credentials_required => return Err(AuthError::credentials_required()),
            None => return Ok(AuthDecision::Anonymous),
        };

        let decoded = jwt::decode(&token).map_err(AuthError::invalid_token)?;

        let key = self
            .secret
            .resolve(parts, &decoded.header, &decoded.claims)
            .await
            .map_err(AuthError::invalid_token)?;

        let claims = jwt::verify(&token, &key, &self.verify).map_err(AuthError::invalid_token)?;

        let revoked = self
            .revocation
            .is_revoked(parts, &claims)
            .await
            .map_err(AuthError::check_failed)?;
        if revoked {
            return Err(AuthError::revoked());
        }

        self.gate.check(&claims.role)?;
        Ok(AuthDecision::Authenticated(claims))
    }
}

fn is_preflight(parts: &Parts) -> bool {
    parts.method == Method::OPTIONS
        && parts
            .headers
            .get_all(ACCESS_CONTROL_REQUEST_HEADERS)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .any(|name| name.trim().eq_ignore_ascii_case("authorization"))
}

/// Read `Authorization: Bearer <token>`.
///
/// A non-Bearer scheme is only an error when credentials are required;
/// otherwise the request goes through anonymously.
fn bearer_token(parts: &Parts, credentials_required: bool) -> Result<Option<String>, AuthError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AuthError::credentials_bad_format())?;

    let mut segments = value.split(' ');
    let (Some(scheme), Some(credentials), None) =
        (segments.next(), segments.next(), segments.next())
    else {
        return Err(AuthError::credentials_bad_format());
    };

    if scheme.eq_ignore_ascii_case("bearer") {
        Ok(Some(credentials.to_string()))
    } else if credentials_required {
        Err(AuthError::credentials_bad_scheme())
    } else {
        Ok(None)
    }
}

pub struct AuthGuardBuilder {
    secret: SecretSource,
    roles: Vec<String>,
    admin_role: Option<String>,
    revocation: Arc<dyn RevocationCheck>,
    user_property: String,
    result_property: Option<String>,
    credentials_required: bool,
    token_extractor: Option<Arc<dyn TokenExtractor>>,
    verify: VerifyOptions,
}

impl AuthGuardBuilder {
    fn new(secret: SecretSource) -> Self {
        Self {
            secret,
            roles: RoleGate::default().accepted().to_vec(),
            admin_role: None,
            revocation: Arc::new(NeverRevoked),
            user_property: DEFAULT_USER_PROPERTY.to_string(),
            result_property: None,
            credentials_required: true,
            token_extractor: None,
            verify: VerifyOptions::default(),
        }
    }

    pub fn roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn admin_role(mut self, role: impl Into<String>) -> Self {
        self.admin_role = Some(role.into());
        self
    }

    pub fn revocation(mut self, check: impl RevocationCheck + 'static) -> Self {
        self.revocation = Arc::new(check);
        self
    }

    pub fn user_property(mut self, name: impl Into<String>) -> Self {
        self.user_property = name.into();
        self
    }

    /// Store claims on the response instead of the request.
    pub fn result_property(mut self, name: impl Into<String>) -> Self {
        self.result_property = Some(name.into());
        self
    }

    pub fn credentials_required(mut self, required: bool) -> Self {
        self.credentials_required = required;
        self
    }

    pub fn token_extractor(mut self, extractor: impl TokenExtractor + 'static) -> Self {
        self.token_extractor = Some(Arc::new(extractor));
        self
    }

    pub fn verify_options(mut self, options: VerifyOptions) -> Self {
        self.verify = options;
        self
    }

    pub fn build(self) -> AuthGuard {
        let mut gate = RoleGate::new(self.roles);
        if let Some(admin_role) = self.admin_role {
            gate = gate.with_admin_role(admin_role);
        }
        let attachment = match self.result_property {
            Some(name) => Attachment::Response(name),
            None => Attachment::Request(self.user_property),
        };

        AuthGuard {
            secret: self.secret,
            gate,
            revocation: self.revocation,
            attachment,
            credentials_required: self.credentials_required,
            token_extractor: self.token_extractor,
            verify: self.verify,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthErrorKind;
    use crate::jwt::TokenSigner;
    use crate::revocation::MemoryBlocklist;
    use crate::secret::SecretResolver;
    use async_trait::async_trait;
    use axum::http::Request;
    use jsonwebtoken::{DecodingKey, Header};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const SECRET: &str = "guard-secret";

    fn signer() -> TokenSigner {
        TokenSigner::from_secret(SECRET.as_bytes(), Duration::from_secs(600))
    }

    fn guard() -> AuthGuardBuilder {
        AuthGuard::builder(SecretSource::from_secret(SECRET))
    }

    fn request(method: Method, headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().method(method).uri("/api/v1/user");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn bearer(token: &str) -> Parts {
        request(Method::GET, &[("authorization", format!("Bearer {token}").as_str())])
    }

    #[derive(Clone, Default)]
    struct CountingResolver(Arc<AtomicUsize>);

    #[async_trait]
    impl SecretResolver for CountingResolver {
        async fn resolve(
            &self,
            _parts: &Parts,
            _header: &Header,
            _claims: &Claims,
        ) -> Result<DecodingKey, BoxError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(DecodingKey::from_secret(SECRET.as_bytes()))
        }
    }

    #[tokio::test]
    async fn missing_header_is_rejected_before_key_lookup() {
        let resolver = CountingResolver::default();
        let calls = resolver.0.clone();
        let guard = AuthGuard::builder(SecretSource::dynamic(resolver)).build();

        let err = guard.authorize(&request(Method::GET, &[])).await.unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::CredentialsRequired);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dynamic_resolver_is_consulted_per_token() {
        let resolver = CountingResolver::default();
        let calls = resolver.0.clone();
        let guard = AuthGuard::builder(SecretSource::dynamic(resolver)).build();

        let token = signer().sign("u-1", "driver").unwrap();
        assert!(guard.authorize(&bearer(&token)).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_header_passes_when_optional() {
        let guard = guard().credentials_required(false).build();
        let decision = guard.authorize(&request(Method::GET, &[])).await.unwrap();
        assert_eq!(decision, AuthDecision::Anonymous);
    }

    #[tokio::test]
    async fn accepted_role_round_trips_claims() {
        let claims = Claims::new("u-1", "driver")
            .expires_in(Duration::from_secs(60))
            .with_claim("fleet", serde_json::json!(7));
        let token = signer().sign_claims(&claims).unwrap();

        let decision = guard().roles(["driver"]).build().authorize(&bearer(&token)).await;
        assert_eq!(decision.unwrap(), AuthDecision::Authenticated(claims));
    }

    // Admin escalation: the admin role passes guards that do not list it.
    #[tokio::test]
    async fn admin_role_bypasses_accepted_roles() {
        let token = signer().sign("root", "admin").unwrap();
        let guard = guard().roles(["driver"]).build();
        assert!(matches!(
            guard.authorize(&bearer(&token)).await,
            Ok(AuthDecision::Authenticated(_))
        ));
    }

    #[tokio::test]
    async fn driver_is_forbidden_on_admin_only_guard() {
        let token = signer().sign("u-1", "driver").unwrap();
        let err = guard()
            .roles(["admin"])
            .build()
            .authorize(&bearer(&token))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::PermissionDenied);
        assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn basic_scheme_is_bad_scheme() {
        let parts = request(Method::GET, &[("authorization", "Basic xyz")]);
        let err = guard().build().authorize(&parts).await.unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::CredentialsBadScheme);
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn basic_scheme_passes_when_optional() {
        let parts = request(Method::GET, &[("authorization", "Basic xyz")]);
        let decision = guard().credentials_required(false).build().authorize(&parts).await;
        assert_eq!(decision.unwrap(), AuthDecision::Anonymous);
    }

    #[tokio::test]
    async fn wrong_part_count_is_bad_format() {
        for value in ["Bearer", "Bearer a b"] {
            let parts = request(Method::GET, &[("authorization", value)]);
            let err = guard().build().authorize(&parts).await.unwrap_err();
            assert_eq!(err.kind(), AuthErrorKind::CredentialsBadFormat, "{value}");
        }
    }

    #[tokio::test]
    async fn scheme_is_case_insensitive() {
        let token = signer().sign("u-1", "driver").unwrap();
        let parts = request(Method::GET, &[("authorization", format!("bearer {token}").as_str())]);
        assert!(guard().build().authorize(&parts).await.is_ok());
    }

    #[tokio::test]
    async fn preflight_skips_token_processing() {
        let resolver = CountingResolver::default();
        let calls = resolver.0.clone();
        let guard = AuthGuard::builder(SecretSource::dynamic(resolver)).build();

        let parts = request(
            Method::OPTIONS,
            &[("access-control-request-headers", "content-type, Authorization")],
        );
        assert_eq!(guard.authorize(&parts).await.unwrap(), AuthDecision::Preflight);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn options_without_auth_header_request_is_not_preflight() {
        let parts = request(
            Method::OPTIONS,
            &[("access-control-request-headers", "content-type")],
        );
        let err = guard().build().authorize(&parts).await.unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::CredentialsRequired);
    }

    #[tokio::test]
    async fn expired_token_is_invalid() {
        let mut claims = Claims::new("u-1", "driver");
        claims.exp = Some(jwt::now() - 60);
        let token = signer().sign_claims(&claims).unwrap();

        let err = guard().build().authorize(&bearer(&token)).await.unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::InvalidToken);
        assert!(err.inner().is_some());
    }

    #[tokio::test]
    async fn garbage_token_is_invalid() {
        let err = guard().build().authorize(&bearer("abc.def")).await.unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::InvalidToken);
    }

    #[tokio::test]
    async fn revoked_subject_is_rejected() {
        let blocklist = Arc::new(MemoryBlocklist::new());
        blocklist.revoke_subject("u-1").await;
        let guard = guard().revocation(blocklist.clone()).build();

        let token = signer().sign("u-1", "driver").unwrap();
        let err = guard.authorize(&bearer(&token)).await.unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::RevokedToken);
        assert_eq!(err.message(), "The token has been revoked.");
    }

    #[tokio::test]
    async fn failing_revocation_check_is_generic_error() {
        struct Broken;

        #[async_trait]
        impl RevocationCheck for Broken {
            async fn is_revoked(&self, _: &Parts, _: &Claims) -> Result<bool, BoxError> {
                Err("store unavailable".into())
            }
        }

        let token = signer().sign("u-1", "driver").unwrap();
        let err = guard()
            .revocation(Broken)
            .build()
            .authorize(&bearer(&token))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::CheckFailed);
        assert_eq!(err.inner(), Some("store unavailable"));
    }

    #[tokio::test]
    async fn custom_extractor_reads_query_token() {
        let token = signer().sign("u-1", "driver").unwrap();
        let guard = guard()
            .token_extractor(|parts: &Parts| -> Result<Option<String>, BoxError> {
                Ok(parts
                    .uri
                    .query()
                    .and_then(|q| q.strip_prefix("token="))
                    .map(str::to_string))
            })
            .build();

        let parts = Request::builder()
            .uri(format!("/api/v1/user?token={token}"))
            .body(())
            .unwrap()
            .into_parts()
            .0;
        assert!(matches!(
            guard.authorize(&parts).await,
            Ok(AuthDecision::Authenticated(_))
        ));
    }

    #[test]
    fn builder_defaults() {
        let guard = guard().build();
        assert_eq!(guard.attachment(), &Attachment::Request("user".into()));
        assert_eq!(guard.roles().accepted(), ["driver".to_string()]);
        assert_eq!(guard.roles().admin_role(), "admin");

        let guard = AuthGuard::builder(SecretSource::from_secret(SECRET))
            .result_property("auth")
            .build();
        assert_eq!(guard.attachment(), &Attachment::Response("auth".into()));
    }
}
