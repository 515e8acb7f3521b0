//! Validated JWT claims.
//!
//! `ValidatedClaims` is produced only by the signature-then-claims
//! verification path in `jwt::verify_signed_claims`; no other code path may
//! construct one from untrusted input. The `sub` field is redacted in Debug
//! output to prevent exposure in logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The `aud` claim: a single audience or a list of them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    /// Exact-match membership test.
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::One(aud) => aud == audience,
            Audience::Many(auds) => auds.iter().any(|a| a == audience),
        }
    }
}

/// Claim set of a token whose signature and standard claims have been
/// verified. Attached to request extensions for the lifetime of one request;
/// never persisted.
#[derive(Clone, Serialize, Deserialize)]
pub struct ValidatedClaims {
    /// Subject (user or client identifier) - redacted in Debug output.
    pub sub: String,

    /// Issuer URL of the identity provider.
    pub iss: String,

    /// Audience(s) the token was issued for.
    pub aud: Audience,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Not-before timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Space-separated scopes granted to this token. Absent claim is
    /// treated as an empty scope set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Custom Debug implementation that redacts the `sub` field.
impl fmt::Debug for ValidatedClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedClaims")
            .field("sub", &"[REDACTED]")
            .field("iss", &self.iss)
            .field("aud", &self.aud)
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("nbf", &self.nbf)
            .field("scope", &self.scope)
            .finish()
    }
}

impl ValidatedClaims {
    /// Check if the token was granted a specific scope.
    ///
    /// Scopes are space-separated; the match is an exact token match, never
    /// a substring or prefix match.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope
            .as_deref()
            .unwrap_or("")
            .split_whitespace()
            .any(|s| s == scope)
    }

    /// Get all scopes as a vector.
    pub fn scopes(&self) -> Vec<&str> {
        self.scope
            .as_deref()
            .unwrap_or("")
            .split_whitespace()
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn claims(scope: Option<&str>) -> ValidatedClaims {
        ValidatedClaims {
            sub: "user".to_string(),
            iss: "https://issuer.example.com/".to_string(),
            aud: Audience::One("https://api.example.com".to_string()),
            exp: 1_234_567_890,
            iat: Some(1_234_567_800),
            nbf: None,
            scope: scope.map(ToString::to_string),
        }
    }

    #[test]
    fn test_debug_redacts_sub() {
        let mut c = claims(Some("read write"));
        c.sub = "secret-user-id".to_string();

        let debug_str = format!("{:?}", c);

        assert!(
            !debug_str.contains("secret-user-id"),
            "Debug output should not contain actual sub value"
        );
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_has_scope_exact_match_only() {
        let c = claims(Some("read:messages write:messages"));

        assert!(c.has_scope("read:messages"));
        assert!(c.has_scope("write:messages"));
        assert!(!c.has_scope("read:other"));
        assert!(!c.has_scope("read")); // Prefix match should not work
        assert!(!c.has_scope("messages")); // Substring match should not work
    }

    #[test]
    fn test_has_scope_absent_claim() {
        let c = claims(None);

        assert!(!c.has_scope("anything"));
        assert!(c.scopes().is_empty());
    }

    #[test]
    fn test_scopes_list() {
        let c = claims(Some("read write admin"));
        assert_eq!(c.scopes(), vec!["read", "write", "admin"]);
    }

    #[test]
    fn test_audience_single() {
        let aud = Audience::One("https://api.example.com".to_string());
        assert!(aud.contains("https://api.example.com"));
        assert!(!aud.contains("https://api.example.co"));
    }

    #[test]
    fn test_audience_list() {
        let aud = Audience::Many(vec![
            "https://api.example.com".to_string(),
            "https://other.example.com".to_string(),
        ]);
        assert!(aud.contains("https://other.example.com"));
        assert!(!aud.contains("https://third.example.com"));
    }

    #[test]
    fn test_deserialize_string_audience() {
        let json = r#"{
            "sub": "client@clients",
            "iss": "https://issuer.example.com/",
            "aud": "https://api.example.com",
            "exp": 1234567890,
            "iat": 1234567800,
            "scope": "read:messages"
        }"#;

        let c: ValidatedClaims = serde_json::from_str(json).unwrap();
        assert_eq!(c.aud, Audience::One("https://api.example.com".to_string()));
        assert_eq!(c.scope.as_deref(), Some("read:messages"));
    }

    #[test]
    fn test_deserialize_array_audience_and_missing_optionals() {
        let json = r#"{
            "sub": "client@clients",
            "iss": "https://issuer.example.com/",
            "aud": ["https://api.example.com", "https://userinfo.example.com"],
            "exp": 1234567890
        }"#;

        let c: ValidatedClaims = serde_json::from_str(json).unwrap();
        assert!(c.aud.contains("https://userinfo.example.com"));
        assert!(c.iat.is_none());
        assert!(c.nbf.is_none());
        assert!(c.scope.is_none());
    }

    #[test]
    fn test_serialization_omits_absent_fields() {
        let c = claims(None);
        let json = serde_json::to_string(&c).unwrap();
        assert!(!json.contains("scope"));
        assert!(!json.contains("nbf"));
    }
}
