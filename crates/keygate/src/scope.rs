//! Scope membership checks.
//!
//! Scope checks are a function of already-validated claims only; they must
//! never run against an unverified payload. The 403 produced here is the
//! only non-401 outcome in the error taxonomy: authentication succeeded,
//! authorization did not.

use crate::claims::ValidatedClaims;
use crate::errors::AuthError;

/// Whether the validated token was granted `required_scope`.
///
/// Exact token match against the space-separated `scope` claim; an absent
/// claim grants nothing.
pub fn has_scope(claims: &ValidatedClaims, required_scope: &str) -> bool {
    claims.has_scope(required_scope)
}

/// Require a scope, yielding the caller-level 403 when it is missing.
pub fn require_scope(claims: &ValidatedClaims, required_scope: &str) -> Result<(), AuthError> {
    if claims.has_scope(required_scope) {
        Ok(())
    } else {
        tracing::debug!(
            target: "keygate.scope",
            required = %required_scope,
            "Scope check failed"
        );
        Err(AuthError::InsufficientScope(required_scope.to_string()))
    }
}
