//! Keygate: bearer-token validation for OAuth2/OIDC resource servers.
//!
//! Keygate validates JWT access tokens issued by a third-party identity
//! provider against the provider's published JWKS, caching signing keys and
//! transparently recovering when the provider rotates them. On top of the
//! validation core it enforces scope-based authorization and ships a thin
//! axum middleware adapter.
//!
//! # Architecture
//!
//! ```text
//! middleware/auth.rs -> validator.rs -> keystore.rs + jwks.rs
//!                                    -> jwt.rs (parse/verify)
//!                       scope.rs (post-validation authorization)
//! ```
//!
//! # Modules
//!
//! - `config` - Validator configuration from environment
//! - `errors` - Error taxonomy with HTTP status code mapping
//! - `claims` - Validated claim set attached to requests
//! - `jwt` - Token parsing and signature/claims verification
//! - `keystore` - Cached signing-key snapshots
//! - `jwks` - JWKS fetching from the identity provider
//! - `validator` - The validation state machine
//! - `scope` - Scope membership checks
//! - `middleware` - axum middleware adapter

pub mod claims;
pub mod config;
pub mod errors;
pub mod jwks;
pub mod jwt;
pub mod keystore;
pub mod middleware;
pub mod scope;
pub mod validator;

pub use claims::{Audience, ValidatedClaims};
pub use config::AuthConfig;
pub use errors::AuthError;
pub use validator::{AuthDecision, TokenValidator};
