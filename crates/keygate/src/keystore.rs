//! Cached signing-key snapshots.
//!
//! The store holds at most one immutable snapshot of the provider's key set,
//! replaced wholesale on each successful fetch. Readers clone keys out of
//! the current snapshot; a replace is never visible partially. Staleness is
//! repaired reactively by the validator, so no expiry timer exists here.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Public signing key record from the provider's JWKS document.
///
/// Only the fields required for verification are retained. Immutable once
/// constructed; key material is never accepted from request input.
#[derive(Debug, Clone, Deserialize)]
pub struct SigningKey {
    /// Key type ("RSA", or "OKP" for Ed25519).
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    pub kid: String,

    /// Key use (should be "sig" for signing).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// Algorithm the provider intends the key for.
    #[serde(default)]
    pub alg: Option<String>,

    /// RSA modulus (base64url encoded).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url encoded).
    #[serde(default)]
    pub e: Option<String>,

    /// OKP public key value (base64url encoded).
    #[serde(default)]
    pub x: Option<String>,
}

/// A parsed JWKS document: the provider's current set of published keys.
#[derive(Debug, Clone, Deserialize)]
pub struct KeySet {
    /// List of published signing keys.
    pub keys: Vec<SigningKey>,
}

impl KeySet {
    /// Parse a key set from a raw JSON document.
    ///
    /// Also usable for seeding a store from a local file instead of HTTP.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// One immutable snapshot of the key set with its fetch timestamp.
struct Snapshot {
    keys: HashMap<String, SigningKey>,
    fetched_at: Instant,
}

/// Process-local cache of the provider's signing keys.
///
/// Two states: EMPTY (never fetched) and POPULATED. The transition happens
/// only through [`KeyStore::replace`]; `get` never triggers network access.
pub struct KeyStore {
    inner: RwLock<Option<Arc<Snapshot>>>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// Look up a key by id in the current snapshot. Pure cache read.
    pub async fn get(&self, kid: &str) -> Option<SigningKey> {
        let guard = self.inner.read().await;
        guard.as_ref().and_then(|snap| snap.keys.get(kid).cloned())
    }

    /// Atomically swap in a freshly fetched key set.
    ///
    /// Full replace, never a merge: duplicate kids within one fetch are
    /// last-write-wins, matching the provider's document order.
    pub async fn replace(&self, set: KeySet) {
        let keys: HashMap<String, SigningKey> = set
            .keys
            .into_iter()
            .map(|key| (key.kid.clone(), key))
            .collect();

        tracing::info!(
            target: "keygate.keystore",
            key_count = keys.len(),
            "Signing key snapshot replaced"
        );

        let snapshot = Arc::new(Snapshot {
            keys,
            fetched_at: Instant::now(),
        });

        let mut guard = self.inner.write().await;
        *guard = Some(snapshot);
    }

    /// Whether the store has ever been populated.
    pub async fn is_populated(&self) -> bool {
        self.inner.read().await.is_some()
    }

    /// Timestamp of the snapshot currently being served, if any.
    pub async fn fetched_at(&self) -> Option<Instant> {
        let guard = self.inner.read().await;
        guard.as_ref().map(|snap| snap.fetched_at)
    }
}

impl Default for KeyStore {
    fn default() -> Self {
        Self::new()
    }
}
