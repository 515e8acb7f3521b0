//! Builders for minting signed test tokens.
//!
//! Defaults line up with the test config used across the integration suites
//! (`PROVIDER_DOMAIN=tenant.auth.example.com`,
//! `API_AUDIENCE=https://api.example.com`), so a plain
//! `TestTokenBuilder::new().sign_with(&key)` produces a token the validator
//! accepts. Every claim can be overridden to produce a rejectable token.

use crate::crypto_fixtures::TestRsaKeypair;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{Map, Value};

/// Issuer matching the default test provider domain.
pub const TEST_ISSUER: &str = "https://tenant.auth.example.com/";

/// Audience matching the default test config.
pub const TEST_AUDIENCE: &str = "https://api.example.com";

/// Builder for JWT access tokens signed with test keys.
#[derive(Debug, Clone)]
pub struct TestTokenBuilder {
    sub: String,
    iss: String,
    aud: String,
    scope: Option<String>,
    exp: i64,
    iat: Option<i64>,
    nbf: Option<i64>,
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTokenBuilder {
    /// A token valid for one hour, issued now, with the default test
    /// issuer and audience and no scope.
    pub fn new() -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: "test-client@clients".to_string(),
            iss: TEST_ISSUER.to_string(),
            aud: TEST_AUDIENCE.to_string(),
            scope: None,
            exp: now + 3600,
            iat: Some(now),
            nbf: None,
        }
    }

    pub fn for_subject(mut self, sub: &str) -> Self {
        self.sub = sub.to_string();
        self
    }

    pub fn with_issuer(mut self, iss: &str) -> Self {
        self.iss = iss.to_string();
        self
    }

    pub fn with_audience(mut self, aud: &str) -> Self {
        self.aud = aud.to_string();
        self
    }

    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = Some(scope.to_string());
        self
    }

    /// Set `exp` relative to now; negative values produce an expired token.
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = Utc::now().timestamp() + seconds;
        self
    }

    /// Set `exp` to an absolute Unix timestamp.
    pub fn expires_at(mut self, exp: i64) -> Self {
        self.exp = exp;
        self
    }

    pub fn issued_at(mut self, iat: i64) -> Self {
        self.iat = Some(iat);
        self
    }

    /// Set `nbf` relative to now; positive values make the token immature.
    pub fn not_before_in(mut self, seconds: i64) -> Self {
        self.nbf = Some(Utc::now().timestamp() + seconds);
        self
    }

    fn claims(&self) -> Value {
        let mut claims = Map::new();
        claims.insert("sub".to_string(), Value::from(self.sub.clone()));
        claims.insert("iss".to_string(), Value::from(self.iss.clone()));
        claims.insert("aud".to_string(), Value::from(self.aud.clone()));
        claims.insert("exp".to_string(), Value::from(self.exp));
        if let Some(iat) = self.iat {
            claims.insert("iat".to_string(), Value::from(iat));
        }
        if let Some(nbf) = self.nbf {
            claims.insert("nbf".to_string(), Value::from(nbf));
        }
        if let Some(scope) = &self.scope {
            claims.insert("scope".to_string(), Value::from(scope.clone()));
        }
        Value::Object(claims)
    }

    /// Sign with an RS256 test keypair, stamping its `kid` in the header.
    pub fn sign_with(&self, keypair: &TestRsaKeypair) -> String {
        self.sign_with_kid(keypair, &keypair.kid)
    }

    /// Sign with a keypair but stamp an arbitrary `kid` in the header.
    /// Useful for minting tokens that reference keys the provider no
    /// longer (or never did) publish.
    pub fn sign_with_kid(&self, keypair: &TestRsaKeypair, kid: &str) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(kid.to_string());
        encode(&header, &self.claims(), &keypair.encoding_key())
            .expect("RS256 signing with a checked-in key must succeed")
    }

    /// Sign with HS256 using a shared secret. The validator must reject
    /// these before any key lookup happens.
    pub fn sign_hs256(&self, kid: &str, secret: &[u8]) -> String {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(kid.to_string());
        encode(&header, &self.claims(), &EncodingKey::from_secret(secret))
            .expect("HS256 signing must succeed")
    }
}
