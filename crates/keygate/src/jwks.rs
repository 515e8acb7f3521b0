//! JWKS fetching from the identity provider.
//!
//! One HTTP GET per call to the provider's `/.well-known/jwks.json`
//! endpoint. No retry loop lives here: retry policy belongs to the
//! validator, which bounds refetches per request.

use crate::keystore::KeySet;
use std::time::Duration;
use thiserror::Error;

/// Errors from fetching or parsing the provider's key set.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network failure or a non-success status from the provider.
    #[error("key set endpoint unreachable: {0}")]
    Unreachable(String),

    /// Response body was not a JWKS document, or listed no keys.
    #[error("malformed key set response: {0}")]
    MalformedResponse(String),
}

/// Retrieves the current key set from the identity provider.
pub struct KeySetFetcher {
    jwks_url: String,
    http_client: reqwest::Client,
}

impl KeySetFetcher {
    /// Create a fetcher for the given JWKS URL with a per-request timeout.
    pub fn new(jwks_url: String, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(
                    target: "keygate.jwks",
                    error = %e,
                    "Failed to build HTTP client with custom config, using defaults"
                );
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
        }
    }

    /// Fetch and parse the provider's current key set.
    ///
    /// Issues exactly one GET; an empty `keys` array is treated as
    /// malformed since a provider with no published keys cannot have
    /// issued a verifiable token.
    pub async fn fetch(&self) -> Result<KeySet, FetchError> {
        tracing::debug!(target: "keygate.jwks", url = %self.jwks_url, "Fetching JWKS from provider");

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(target: "keygate.jwks", error = %e, "Failed to fetch JWKS");
                FetchError::Unreachable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                target: "keygate.jwks",
                status = %status,
                "JWKS endpoint returned error status"
            );
            return Err(FetchError::Unreachable(format!(
                "provider returned status {}",
                status
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            tracing::warn!(target: "keygate.jwks", error = %e, "Failed to read JWKS response body");
            FetchError::Unreachable(e.to_string())
        })?;

        let key_set = KeySet::from_json_slice(&body).map_err(|e| {
            tracing::warn!(target: "keygate.jwks", error = %e, "Failed to parse JWKS response");
            FetchError::MalformedResponse(e.to_string())
        })?;

        if key_set.is_empty() {
            tracing::warn!(target: "keygate.jwks", "JWKS response listed no keys");
            return Err(FetchError::MalformedResponse(
                "key set listed no keys".to_string(),
            ));
        }

        tracing::debug!(
            target: "keygate.jwks",
            key_count = key_set.keys.len(),
            "JWKS fetched"
        );

        Ok(key_set)
    }
}
