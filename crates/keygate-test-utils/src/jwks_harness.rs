//! A mock JWKS provider backed by wiremock.
//!
//! The harness serves `/.well-known/jwks.json` from mutable shared state
//! instead of remounting mocks, so published keys can be rotated or swapped
//! for failure responses mid-test without clearing the request journal.
//! `fetch_count` therefore observes every fetch the validator made since the
//! harness started, which is what the bounded-refetch tests assert on.

use crate::crypto_fixtures::{jwks_json, TestRsaKeypair};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Well-known JWKS path served by the harness.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// Provider domain the harness config points at. The JWKS URL itself is
/// overridden to the mock server, so this only shapes the expected issuer.
pub const TEST_PROVIDER_DOMAIN: &str = "tenant.auth.example.com";

enum JwksResponse {
    Keys(Value),
    Status(u16),
    RawBody(String),
}

struct JwksResponder {
    state: Arc<Mutex<JwksResponse>>,
}

impl Respond for JwksResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let state = self.state.lock().expect("jwks responder state poisoned");
        match &*state {
            JwksResponse::Keys(doc) => ResponseTemplate::new(200).set_body_json(doc.clone()),
            JwksResponse::Status(status) => ResponseTemplate::new(*status),
            JwksResponse::RawBody(body) => ResponseTemplate::new(200).set_body_string(body.clone()),
        }
    }
}

/// Mock OAuth2 provider exposing a JWKS endpoint.
pub struct JwksHarness {
    server: MockServer,
    state: Arc<Mutex<JwksResponse>>,
}

impl JwksHarness {
    /// Start the harness publishing the given keypairs.
    pub async fn start(keys: &[&TestRsaKeypair]) -> Self {
        let server = MockServer::start().await;
        let state = Arc::new(Mutex::new(JwksResponse::Keys(jwks_json(keys))));

        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(JwksResponder {
                state: Arc::clone(&state),
            })
            .mount(&server)
            .await;

        Self { server, state }
    }

    /// Full URL of the mock JWKS endpoint.
    pub fn jwks_url(&self) -> String {
        format!("{}{}", self.server.uri(), JWKS_PATH)
    }

    /// Replace the published key set, simulating a provider rotation.
    pub fn serve_keys(&self, keys: &[&TestRsaKeypair]) {
        let mut state = self.state.lock().expect("jwks responder state poisoned");
        *state = JwksResponse::Keys(jwks_json(keys));
    }

    /// Serve an HTTP error status for every subsequent fetch.
    pub fn serve_status(&self, status: u16) {
        let mut state = self.state.lock().expect("jwks responder state poisoned");
        *state = JwksResponse::Status(status);
    }

    /// Serve an arbitrary 200 body, e.g. malformed JSON.
    pub fn serve_raw_body(&self, body: &str) {
        let mut state = self.state.lock().expect("jwks responder state poisoned");
        *state = JwksResponse::RawBody(body.to_string());
    }

    /// Number of JWKS fetches received since the harness started.
    pub async fn fetch_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|req| req.url.path() == JWKS_PATH)
            .count()
    }

    /// Environment-style config pointing a validator at this harness,
    /// with clock skew disabled for deterministic expiry tests.
    pub fn config_vars(&self) -> HashMap<String, String> {
        HashMap::from([
            (
                "PROVIDER_DOMAIN".to_string(),
                TEST_PROVIDER_DOMAIN.to_string(),
            ),
            (
                "API_AUDIENCE".to_string(),
                crate::token_builders::TEST_AUDIENCE.to_string(),
            ),
            ("PROVIDER_JWKS_URL".to_string(), self.jwks_url()),
            ("CLOCK_SKEW_SECONDS".to_string(), "0".to_string()),
        ])
    }
}
