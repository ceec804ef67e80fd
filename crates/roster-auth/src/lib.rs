//! JWT authentication and role gating for roster.
//!
//! A request goes through an [`AuthPolicy`]: path rules pick either no
//! authentication or one of several [`AuthGuard`]s, and the guard runs the
//! token pipeline (extract, decode, resolve key, verify, revocation, role).
//!
//! # Example
//!
//! ```rust,ignore
//! use roster_auth::{AuthExt, AuthGuard, AuthPolicy, ExemptionRule, PathMatcher, SecretSource};
//!
//! let secret = SecretSource::from_secret("your-secret-key");
//! let default = AuthGuard::builder(secret.clone())
//!     .roles(["admin", "driver"])
//!     .build();
//! let admin = AuthGuard::builder(secret).roles(["admin"]).build();
//!
//! let policy = AuthPolicy::new(default)
//!     .guard(PathMatcher::new(vec![ExemptionRule::regex("^/admin")?]), admin)
//!     .public(PathMatcher::new(vec![ExemptionRule::exact("/login")]));
//!
//! let app = Router::new()
//!     .route("/protected", get(handler))
//!     .with_auth(policy, Environment::Production);
//! ```

mod context;
mod error;
mod exemption;
mod guard;
mod jwt;
mod layer;
mod policy;
mod revocation;
mod role;
mod secret;

pub use context::{AuthContext, CurrentUser};
pub use error::{AuthError, AuthErrorKind, BoxError};
pub use exemption::{ExemptionRule, MethodList, PathMatcher, PathPattern, RuleConfig, RuleError};
pub use guard::{
    Attachment, AuthDecision, AuthGuard, AuthGuardBuilder, TokenExtractor, DEFAULT_USER_PROPERTY,
};
pub use jwt::{decode, verify, Claims, DecodedToken, TokenError, TokenSigner, VerifyOptions};
pub use layer::{AuthExt, AuthLayer, AuthService};
pub use policy::{AuthPolicy, Route};
pub use revocation::{MemoryBlocklist, NeverRevoked, RevocationCheck};
pub use role::{RoleGate, DEFAULT_ADMIN_ROLE, DEFAULT_ROLE};
pub use secret::{KeyIdResolver, SecretResolver, SecretSource, UnknownKeyId};

pub use jsonwebtoken::{Algorithm, DecodingKey, Header};
