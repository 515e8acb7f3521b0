//! Validator configuration.
//!
//! Configuration is loaded from environment variables, with a
//! `from_vars` entry point for tests. The issuer and JWKS URL are derived
//! from the provider domain the way the provider publishes them; the JWKS
//! URL can be overridden for self-hosted providers and test harnesses.

use jsonwebtoken::Algorithm;
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default JWKS fetch timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 10;

/// Maximum allowed JWKS fetch timeout in seconds.
pub const MAX_FETCH_TIMEOUT_SECONDS: u64 = 60;

/// Default exp/nbf leeway in seconds.
pub const DEFAULT_CLOCK_SKEW_SECONDS: u64 = 60;

/// Maximum allowed exp/nbf leeway in seconds.
///
/// Bounds misconfiguration that would otherwise weaken expiry checks.
pub const MAX_CLOCK_SKEW_SECONDS: u64 = 600;

/// Token validator configuration.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Identity provider domain (e.g. "tenant.auth.example.com").
    pub provider_domain: String,

    /// Expected audience (the resource identifier this API was registered as).
    pub audience: String,

    /// Exact expected `iss` value: `https://{provider_domain}/`.
    pub issuer: String,

    /// JWKS document URL, `https://{provider_domain}/.well-known/jwks.json`
    /// unless overridden.
    pub jwks_url: String,

    /// Accepted signing algorithms. Asymmetric only; default RS256.
    pub algorithms: Vec<Algorithm>,

    /// Timeout applied to each JWKS fetch.
    pub fetch_timeout: Duration,

    /// Leeway in seconds applied to `exp`/`nbf` checks.
    pub clock_skew_seconds: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid accepted algorithms: {0}")]
    InvalidAlgorithms(String),

    #[error("Invalid fetch timeout configuration: {0}")]
    InvalidFetchTimeout(String),

    #[error("Invalid clock skew configuration: {0}")]
    InvalidClockSkew(String),
}

fn is_symmetric(alg: Algorithm) -> bool {
    matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

impl AuthConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let provider_domain = vars
            .get("PROVIDER_DOMAIN")
            .ok_or_else(|| ConfigError::MissingEnvVar("PROVIDER_DOMAIN".to_string()))?
            .clone();

        let audience = vars
            .get("API_AUDIENCE")
            .ok_or_else(|| ConfigError::MissingEnvVar("API_AUDIENCE".to_string()))?
            .clone();

        let issuer = format!("https://{}/", provider_domain);

        let jwks_url = vars.get("PROVIDER_JWKS_URL").cloned().unwrap_or_else(|| {
            format!("https://{}/.well-known/jwks.json", provider_domain)
        });

        // Parse accepted algorithms, rejecting symmetric families outright:
        // a symmetric "secret" here would be the public key material itself.
        let algorithms = if let Some(value_str) = vars.get("ACCEPTED_ALGORITHMS") {
            let mut algorithms = Vec::new();
            for name in value_str.split([' ', ',']).filter(|s| !s.is_empty()) {
                let alg = Algorithm::from_str(name).map_err(|_| {
                    ConfigError::InvalidAlgorithms(format!("unknown algorithm '{}'", name))
                })?;
                if is_symmetric(alg) {
                    return Err(ConfigError::InvalidAlgorithms(format!(
                        "symmetric algorithm '{}' is not allowed for provider-issued tokens",
                        name
                    )));
                }
                algorithms.push(alg);
            }
            if algorithms.is_empty() {
                return Err(ConfigError::InvalidAlgorithms(
                    "ACCEPTED_ALGORITHMS must name at least one algorithm".to_string(),
                ));
            }
            algorithms
        } else {
            vec![Algorithm::RS256]
        };

        // Parse fetch timeout with validation
        let fetch_timeout_seconds = if let Some(value_str) = vars.get("JWKS_FETCH_TIMEOUT_SECONDS")
        {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidFetchTimeout(format!(
                    "JWKS_FETCH_TIMEOUT_SECONDS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidFetchTimeout(
                    "JWKS_FETCH_TIMEOUT_SECONDS must be greater than 0".to_string(),
                ));
            }

            if value > MAX_FETCH_TIMEOUT_SECONDS {
                return Err(ConfigError::InvalidFetchTimeout(format!(
                    "JWKS_FETCH_TIMEOUT_SECONDS must not exceed {} seconds, got {}",
                    MAX_FETCH_TIMEOUT_SECONDS, value
                )));
            }

            value
        } else {
            DEFAULT_FETCH_TIMEOUT_SECONDS
        };

        // Parse clock skew with validation
        let clock_skew_seconds = if let Some(value_str) = vars.get("CLOCK_SKEW_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidClockSkew(format!(
                    "CLOCK_SKEW_SECONDS must be a valid non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value > MAX_CLOCK_SKEW_SECONDS {
                return Err(ConfigError::InvalidClockSkew(format!(
                    "CLOCK_SKEW_SECONDS must not exceed {} seconds, got {}",
                    MAX_CLOCK_SKEW_SECONDS, value
                )));
            }

            value
        } else {
            DEFAULT_CLOCK_SKEW_SECONDS
        };

        Ok(AuthConfig {
            provider_domain,
            audience,
            issuer,
            jwks_url,
            algorithms,
            fetch_timeout: Duration::from_secs(fetch_timeout_seconds),
            clock_skew_seconds,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([
            (
                "PROVIDER_DOMAIN".to_string(),
                "tenant.auth.example.com".to_string(),
            ),
            (
                "API_AUDIENCE".to_string(),
                "https://api.example.com".to_string(),
            ),
        ])
    }

    #[test]
    fn test_from_vars_success_with_defaults() {
        let config = AuthConfig::from_vars(&base_vars()).expect("config should load");

        assert_eq!(config.provider_domain, "tenant.auth.example.com");
        assert_eq!(config.audience, "https://api.example.com");
        assert_eq!(config.issuer, "https://tenant.auth.example.com/");
        assert_eq!(
            config.jwks_url,
            "https://tenant.auth.example.com/.well-known/jwks.json"
        );
        assert_eq!(config.algorithms, vec![Algorithm::RS256]);
        assert_eq!(
            config.fetch_timeout,
            Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECONDS)
        );
        assert_eq!(config.clock_skew_seconds, DEFAULT_CLOCK_SKEW_SECONDS);
    }

    #[test]
    fn test_from_vars_missing_domain() {
        let mut vars = base_vars();
        vars.remove("PROVIDER_DOMAIN");

        let result = AuthConfig::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "PROVIDER_DOMAIN"));
    }

    #[test]
    fn test_from_vars_missing_audience() {
        let mut vars = base_vars();
        vars.remove("API_AUDIENCE");

        let result = AuthConfig::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "API_AUDIENCE"));
    }

    #[test]
    fn test_jwks_url_override() {
        let mut vars = base_vars();
        vars.insert(
            "PROVIDER_JWKS_URL".to_string(),
            "http://127.0.0.1:9999/.well-known/jwks.json".to_string(),
        );

        let config = AuthConfig::from_vars(&vars).expect("config should load");
        assert_eq!(
            config.jwks_url,
            "http://127.0.0.1:9999/.well-known/jwks.json"
        );
        // Issuer stays derived from the real provider domain
        assert_eq!(config.issuer, "https://tenant.auth.example.com/");
    }

    #[test]
    fn test_accepted_algorithms_parsing() {
        let mut vars = base_vars();
        vars.insert("ACCEPTED_ALGORITHMS".to_string(), "RS256, RS384".to_string());

        let config = AuthConfig::from_vars(&vars).expect("config should load");
        assert_eq!(config.algorithms, vec![Algorithm::RS256, Algorithm::RS384]);
    }

    #[test]
    fn test_accepted_algorithms_rejects_symmetric() {
        let mut vars = base_vars();
        vars.insert("ACCEPTED_ALGORITHMS".to_string(), "RS256 HS256".to_string());

        let result = AuthConfig::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidAlgorithms(msg)) if msg.contains("HS256"))
        );
    }

    #[test]
    fn test_accepted_algorithms_rejects_unknown() {
        let mut vars = base_vars();
        vars.insert("ACCEPTED_ALGORITHMS".to_string(), "RS999".to_string());

        let result = AuthConfig::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidAlgorithms(msg)) if msg.contains("RS999"))
        );
    }

    #[test]
    fn test_accepted_algorithms_rejects_empty() {
        let mut vars = base_vars();
        vars.insert("ACCEPTED_ALGORITHMS".to_string(), " , ".to_string());

        let result = AuthConfig::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidAlgorithms(_))));
    }

    #[test]
    fn test_fetch_timeout_rejects_zero() {
        let mut vars = base_vars();
        vars.insert("JWKS_FETCH_TIMEOUT_SECONDS".to_string(), "0".to_string());

        let result = AuthConfig::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidFetchTimeout(msg)) if msg.contains("greater than 0"))
        );
    }

    #[test]
    fn test_fetch_timeout_rejects_too_large() {
        let mut vars = base_vars();
        vars.insert("JWKS_FETCH_TIMEOUT_SECONDS".to_string(), "61".to_string());

        let result = AuthConfig::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidFetchTimeout(msg)) if msg.contains("must not exceed 60"))
        );
    }

    #[test]
    fn test_clock_skew_accepts_zero() {
        let mut vars = base_vars();
        vars.insert("CLOCK_SKEW_SECONDS".to_string(), "0".to_string());

        let config = AuthConfig::from_vars(&vars).expect("config should load");
        assert_eq!(config.clock_skew_seconds, 0);
    }

    #[test]
    fn test_clock_skew_rejects_too_large() {
        let mut vars = base_vars();
        vars.insert("CLOCK_SKEW_SECONDS".to_string(), "601".to_string());

        let result = AuthConfig::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidClockSkew(msg)) if msg.contains("must not exceed 600"))
        );
    }

    #[test]
    fn test_clock_skew_rejects_non_numeric() {
        let mut vars = base_vars();
        vars.insert("CLOCK_SKEW_SECONDS".to_string(), "one-minute".to_string());

        let result = AuthConfig::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidClockSkew(msg)) if msg.contains("valid non-negative integer"))
        );
    }
}
