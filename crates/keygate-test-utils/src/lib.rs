//! # Keygate Test Utilities
//!
//! Shared fixtures for testing token validation:
//! - Deterministic crypto fixtures (checked-in RSA keypairs)
//! - Token builders (`TestTokenBuilder`)
//! - A wiremock-backed JWKS endpoint harness (`JwksHarness`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use keygate_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let key = TestRsaKeypair::new(0, "test-key-01");
//!     let harness = JwksHarness::start(&[&key]).await;
//!
//!     let token = TestTokenBuilder::new()
//!         .for_subject("client@clients")
//!         .with_scope("read:messages")
//!         .sign_with(&key);
//! }
//! ```

pub mod crypto_fixtures;
pub mod jwks_harness;
pub mod token_builders;

pub use crypto_fixtures::*;
pub use jwks_harness::*;
pub use token_builders::*;
