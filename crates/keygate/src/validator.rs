//! The token validation state machine.
//!
//! `TokenValidator` orchestrates bearer extraction, header pre-checks, key
//! resolution against the cached store, signature/claims verification, and
//! the one-shot rotation-recovery refetch. It owns its `KeyStore`, so
//! multiple independent validators can coexist in one process.
//!
//! # Network bounds
//!
//! Steps that touch the provider are limited to one fetch on a key miss and
//! one forced refetch when a cached key fails signature verification: at
//! most two fetches per request, zero on the warm path.

use crate::claims::ValidatedClaims;
use crate::config::AuthConfig;
use crate::errors::AuthError;
use crate::jwks::KeySetFetcher;
use crate::jwt::{self, VerifyError};
use crate::keystore::{KeyStore, SigningKey};
use jsonwebtoken::Algorithm;
use std::str::FromStr;
use tracing::instrument;

/// Terminal outcome of validating one bearer header.
pub type AuthDecision = Result<ValidatedClaims, AuthError>;

/// Where a resolved key came from, for rotation-recovery decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyOrigin {
    /// Served from a snapshot that predates this request.
    Cache,
    /// Fetched during this request; refetching again cannot help.
    Fresh,
}

/// Validates bearer access tokens against the provider's published keys.
pub struct TokenValidator {
    audience: String,
    issuer: String,
    algorithms: Vec<Algorithm>,
    clock_skew_seconds: u64,
    store: KeyStore,
    fetcher: KeySetFetcher,
}

impl TokenValidator {
    /// Create a validator with an empty key store.
    ///
    /// The first validation populates the store lazily; no fetch happens
    /// at construction time.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            audience: config.audience.clone(),
            issuer: config.issuer.clone(),
            algorithms: config.algorithms.clone(),
            clock_skew_seconds: config.clock_skew_seconds,
            store: KeyStore::new(),
            fetcher: KeySetFetcher::new(config.jwks_url.clone(), config.fetch_timeout),
        }
    }

    /// The key store backing this validator.
    pub fn key_store(&self) -> &KeyStore {
        &self.store
    }

    /// Validate an `Authorization` header value.
    ///
    /// Runs the full sequence: bearer extraction, unverified header decode
    /// with the symmetric-algorithm rejection, key resolution (one fetch on
    /// miss), signature and standard-claims verification, and the one-shot
    /// rotation recovery on a cached-key signature failure.
    #[instrument(skip_all)]
    pub async fn validate(&self, authorization: Option<&str>) -> AuthDecision {
        // Steps 1-2 are purely local; nothing here touches the network.
        let token = extract_bearer_token(authorization)?;
        let header = jwt::decode_header(token)
            .map_err(|e| AuthError::InvalidHeader(e.to_string()))?;

        if jwt::is_symmetric_algorithm(&header.alg) {
            tracing::debug!(
                target: "keygate.validator",
                alg = %header.alg,
                "Token rejected: symmetric algorithm"
            );
            return Err(AuthError::InvalidHeader(
                "token must be signed with an asymmetric algorithm".to_string(),
            ));
        }

        let alg = Algorithm::from_str(&header.alg).map_err(|_| {
            AuthError::InvalidHeader(format!("unsupported algorithm '{}'", header.alg))
        })?;
        if !self.algorithms.contains(&alg) {
            tracing::debug!(
                target: "keygate.validator",
                alg = %header.alg,
                "Token rejected: algorithm not in accepted set"
            );
            return Err(AuthError::InvalidHeader(
                "token is not signed with an accepted algorithm".to_string(),
            ));
        }

        // Resolve the signing key, fetching once on a miss.
        let (key, origin) = match self.store.get(&header.kid).await {
            Some(key) => (key, KeyOrigin::Cache),
            None => {
                self.refresh().await?;
                match self.store.get(&header.kid).await {
                    Some(key) => (key, KeyOrigin::Fresh),
                    None => {
                        tracing::debug!(
                            target: "keygate.validator",
                            kid = %header.kid,
                            "Key not found after fetch"
                        );
                        return Err(AuthError::unknown_key());
                    }
                }
            }
        };

        match self.verify(token, &key) {
            Ok(claims) => Ok(claims),
            Err(VerifyError::Signature) if origin == KeyOrigin::Cache => {
                // Rotation recovery: the cached key may be stale. One forced
                // refetch, one retry, then terminal failure.
                tracing::debug!(
                    target: "keygate.validator",
                    kid = %header.kid,
                    "Signature failed with cached key, refetching key set"
                );
                self.refresh().await?;
                let key = self
                    .store
                    .get(&header.kid)
                    .await
                    .ok_or_else(AuthError::unknown_key)?;
                match self.verify(token, &key) {
                    Ok(claims) => {
                        tracing::info!(
                            target: "keygate.validator",
                            kid = %header.kid,
                            "Token validated after key rotation recovery"
                        );
                        Ok(claims)
                    }
                    Err(e) => Err(map_verify_error(e)),
                }
            }
            Err(e) => Err(map_verify_error(e)),
        }
    }

    fn verify(&self, token: &str, key: &SigningKey) -> Result<ValidatedClaims, VerifyError> {
        jwt::verify_signed_claims(
            token,
            key,
            &self.audience,
            &self.issuer,
            &self.algorithms,
            self.clock_skew_seconds,
        )
    }

    /// Fetch the provider's key set and swap it into the store.
    ///
    /// Fetch failures surface as the generic `InvalidHeader`-class 401 so a
    /// provider outage is not distinguishable by unauthenticated callers;
    /// the cause is logged server-side.
    async fn refresh(&self) -> Result<(), AuthError> {
        let key_set = self.fetcher.fetch().await.map_err(|e| {
            tracing::warn!(target: "keygate.validator", error = %e, "Key set refresh failed");
            AuthError::InvalidHeader("unable to verify credentials".to_string())
        })?;
        self.store.replace(key_set).await;
        Ok(())
    }
}

/// Parse an `Authorization` header value as exactly `Bearer <token>`.
///
/// The four failure modes are distinct, user-visible errors; the scheme is
/// matched case-insensitively.
fn extract_bearer_token(authorization: Option<&str>) -> Result<&str, AuthError> {
    let value = authorization.ok_or(AuthError::MissingAuthorizationHeader)?;

    let mut parts = value.split_whitespace();
    let scheme = parts.next().ok_or(AuthError::MissingBearerScheme)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingBearerScheme);
    }

    let token = parts.next().ok_or(AuthError::MissingToken)?;
    if parts.next().is_some() {
        return Err(AuthError::MalformedAuthorizationHeader);
    }

    Ok(token)
}

fn map_verify_error(e: VerifyError) -> AuthError {
    match e {
        VerifyError::Signature => AuthError::InvalidSignature,
        VerifyError::Claims(msg) => AuthError::InvalidClaims(msg),
        VerifyError::Malformed(msg) => AuthError::InvalidHeader(msg),
        VerifyError::Key(msg) => {
            tracing::warn!(target: "keygate.validator", error = %msg, "Unusable signing key");
            AuthError::unknown_key()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_missing_header() {
        assert!(matches!(
            extract_bearer_token(None),
            Err(AuthError::MissingAuthorizationHeader)
        ));
    }

    #[test]
    fn test_extract_bearer_empty_header() {
        assert!(matches!(
            extract_bearer_token(Some("")),
            Err(AuthError::MissingBearerScheme)
        ));
        assert!(matches!(
            extract_bearer_token(Some("   ")),
            Err(AuthError::MissingBearerScheme)
        ));
    }

    #[test]
    fn test_extract_bearer_wrong_scheme() {
        assert!(matches!(
            extract_bearer_token(Some("Basic abc123")),
            Err(AuthError::MissingBearerScheme)
        ));
        assert!(matches!(
            extract_bearer_token(Some("Token abc123")),
            Err(AuthError::MissingBearerScheme)
        ));
    }

    #[test]
    fn test_extract_bearer_scheme_only() {
        assert!(matches!(
            extract_bearer_token(Some("Bearer")),
            Err(AuthError::MissingToken)
        ));
        assert!(matches!(
            extract_bearer_token(Some("Bearer   ")),
            Err(AuthError::MissingToken)
        ));
    }

    #[test]
    fn test_extract_bearer_too_many_segments() {
        assert!(matches!(
            extract_bearer_token(Some("Bearer abc def")),
            Err(AuthError::MalformedAuthorizationHeader)
        ));
        assert!(matches!(
            extract_bearer_token(Some("Bearer a b c d")),
            Err(AuthError::MalformedAuthorizationHeader)
        ));
    }

    #[test]
    fn test_extract_bearer_valid() {
        assert_eq!(extract_bearer_token(Some("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_extract_bearer_scheme_is_case_insensitive() {
        assert_eq!(extract_bearer_token(Some("bearer tok")).unwrap(), "tok");
        assert_eq!(extract_bearer_token(Some("BEARER tok")).unwrap(), "tok");
        assert_eq!(extract_bearer_token(Some("BeArEr tok")).unwrap(), "tok");
    }

    #[test]
    fn test_map_verify_error_categories() {
        assert!(matches!(
            map_verify_error(VerifyError::Signature),
            AuthError::InvalidSignature
        ));
        assert!(matches!(
            map_verify_error(VerifyError::Claims("expired".to_string())),
            AuthError::InvalidClaims(_)
        ));
        assert!(matches!(
            map_verify_error(VerifyError::Malformed("bad".to_string())),
            AuthError::InvalidHeader(_)
        ));
        assert!(matches!(
            map_verify_error(VerifyError::Key("no modulus".to_string())),
            AuthError::InvalidHeader(_)
        ));
    }
}
