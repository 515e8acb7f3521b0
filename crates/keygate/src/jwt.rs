//! Token parsing and verification.
//!
//! This module is the single seam behind which the JWT library sits:
//! `decode_header`, `decode_claims_unverified`, and `verify_signed_claims`.
//! Swapping the underlying cryptographic library is an implementation detail
//! of this module; nothing else in the crate touches `jsonwebtoken` directly.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Unverified output is only for key selection and pre-inspection; it must
//!   never feed an authorization decision
//! - Generic error messages prevent information leakage

use crate::claims::ValidatedClaims;
use crate::keystore::SigningKey;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use thiserror::Error;

/// Maximum allowed JWT size in bytes (8 KiB).
///
/// Typical access tokens are a few hundred bytes; anything larger is
/// rejected before base64 decoding or any cryptographic work.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Errors from parsing a token without verifying it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtParseError {
    /// Token size exceeds maximum allowed.
    #[error("token exceeds maximum size")]
    TokenTooLarge,

    /// Token is not well-formed compact serialization.
    #[error("unable to parse authentication token")]
    MalformedToken,

    /// Token header has no usable `kid` for key selection.
    #[error("token header is missing a key id")]
    MissingKid,
}

/// JWT header fields decoded without signature verification.
///
/// Used only to pre-check the declared algorithm and select a signing key.
#[derive(Debug, Clone)]
pub struct UnverifiedHeader {
    /// Declared signing algorithm, as written in the token.
    pub alg: String,

    /// Key identifier naming which published key signed the token.
    pub kid: String,
}

/// Whether a declared algorithm name is a symmetric (HMAC) scheme.
///
/// Symmetric schemes are rejected before any key lookup: the "secret" would
/// be the provider's public key material, which any caller can fetch.
pub fn is_symmetric_algorithm(alg: &str) -> bool {
    matches!(alg, "HS256" | "HS384" | "HS512")
}

fn decode_segment(token: &str, index: usize) -> Result<serde_json::Value, JwtParseError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "keygate.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtParseError::TokenTooLarge);
    }

    // Compact serialization: header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::debug!(
            target: "keygate.jwt",
            parts = parts.len(),
            "Token rejected: invalid compact serialization"
        );
        return Err(JwtParseError::MalformedToken);
    }

    let segment = parts.get(index).ok_or(JwtParseError::MalformedToken)?;
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|e| {
        tracing::debug!(target: "keygate.jwt", error = %e, "Failed to decode token segment base64");
        JwtParseError::MalformedToken
    })?;

    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::debug!(target: "keygate.jwt", error = %e, "Failed to parse token segment JSON");
        JwtParseError::MalformedToken
    })
}

/// Decode the JWT header without verifying the signature.
///
/// The `kid` is rejected if absent, non-string, or empty; without it no key
/// can be selected from the provider's set.
pub fn decode_header(token: &str) -> Result<UnverifiedHeader, JwtParseError> {
    let header = decode_segment(token, 0)?;

    let alg = header
        .get("alg")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(JwtParseError::MalformedToken)?;

    let kid = header
        .get("kid")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(JwtParseError::MissingKid)?;

    Ok(UnverifiedHeader { alg, kid })
}

/// Decode the JWT payload without verifying the signature.
///
/// The result must never be treated as authoritative: it exists for
/// pre-inspection only (e.g. routing on a hint claim), never authorization.
pub fn decode_claims_unverified(token: &str) -> Result<serde_json::Value, JwtParseError> {
    decode_segment(token, 1)
}

/// Errors from signature-and-claims verification.
///
/// `Signature` is distinguished from `Claims` because the rotation-recovery
/// path only triggers on signature failures.
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("signature verification failed")]
    Signature,

    #[error("{0}")]
    Claims(String),

    #[error("{0}")]
    Malformed(String),

    #[error("unusable signing key: {0}")]
    Key(String),
}

fn decoding_key(key: &SigningKey) -> Result<DecodingKey, VerifyError> {
    if let Some(key_use) = &key.key_use {
        if key_use != "sig" {
            return Err(VerifyError::Key(format!(
                "key '{}' is not a signing key (use={})",
                key.kid, key_use
            )));
        }
    }

    match key.kty.as_str() {
        "RSA" => {
            let n = key
                .n
                .as_deref()
                .ok_or_else(|| VerifyError::Key(format!("RSA key '{}' missing modulus", key.kid)))?;
            let e = key
                .e
                .as_deref()
                .ok_or_else(|| VerifyError::Key(format!("RSA key '{}' missing exponent", key.kid)))?;
            DecodingKey::from_rsa_components(n, e)
                .map_err(|err| VerifyError::Key(format!("invalid RSA key material: {}", err)))
        }
        "OKP" => {
            let x = key
                .x
                .as_deref()
                .ok_or_else(|| VerifyError::Key(format!("OKP key '{}' missing x field", key.kid)))?;
            let bytes = URL_SAFE_NO_PAD
                .decode(x)
                .map_err(|err| VerifyError::Key(format!("invalid OKP key encoding: {}", err)))?;
            Ok(DecodingKey::from_ed_der(&bytes))
        }
        other => Err(VerifyError::Key(format!(
            "unsupported key type '{}'",
            other
        ))),
    }
}

/// Verify a token's signature and standard claims against a resolved key.
///
/// Checks, in the library's order: signature under one of `algorithms`,
/// `exp` in the future and `nbf` (if present) in the past with `leeway`
/// seconds of tolerance, `aud` containing `audience`, and `iss`
/// exact-equal to `issuer`.
pub fn verify_signed_claims(
    token: &str,
    key: &SigningKey,
    audience: &str,
    issuer: &str,
    algorithms: &[Algorithm],
    leeway: u64,
) -> Result<ValidatedClaims, VerifyError> {
    let decoding_key = decoding_key(key)?;

    let first = algorithms
        .first()
        .ok_or_else(|| VerifyError::Key("no accepted algorithms configured".to_string()))?;
    let mut validation = Validation::new(*first);
    validation.algorithms = algorithms.to_vec();
    validation.set_audience(&[audience]);
    validation.set_issuer(&[issuer]);
    validation.leeway = leeway;
    validation.validate_nbf = true;

    let token_data = decode::<ValidatedClaims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::debug!(target: "keygate.jwt", error = %e, "Token verification failed");
        match e.kind() {
            ErrorKind::InvalidSignature => VerifyError::Signature,
            ErrorKind::ExpiredSignature => VerifyError::Claims("token is expired".to_string()),
            ErrorKind::ImmatureSignature => {
                VerifyError::Claims("token is not yet valid".to_string())
            }
            ErrorKind::InvalidAudience | ErrorKind::InvalidIssuer => VerifyError::Claims(
                "incorrect claims, please check the audience and issuer".to_string(),
            ),
            ErrorKind::MissingRequiredClaim(claim) => {
                VerifyError::Claims(format!("missing required claim '{}'", claim))
            }
            _ => VerifyError::Malformed("unable to parse authentication token".to_string()),
        }
    })?;

    Ok(token_data.claims)
}
