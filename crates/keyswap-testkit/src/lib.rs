//! # keyswap testkit
//!
//! Testing utilities for keyswap.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Known-answer vectors**: small keys with hand-checkable ciphertexts
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: a seeded exchange service and parties with small keys
//!
//! ## Known-Answer Vectors
//!
//! ```rust
//! use keyswap_testkit::vectors::{all_vectors, verify_all_vectors};
//!
//! assert!(verify_all_vectors().is_empty());
//! for vector in all_vectors() {
//!     println!("{}: {}", vector.name, vector.ciphertext);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use keyswap_testkit::generators::plaintext;
//!
//! proptest! {
//!     #[test]
//!     fn roundtrip(text in plaintext(3233, 16)) {
//!         // ...
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use keyswap_testkit::fixtures::TestFixture;
//!
//! async fn example() {
//!     let mut fixture = TestFixture::new();
//!     let alice = fixture.add_party("alice").await.unwrap();
//!     let bob = fixture.add_party("bob").await.unwrap();
//!     fixture.service.request_key_exchange(&alice.id, &bob.id).await.unwrap();
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{small_keygen_config, FixedPrimes, TestFixture, TestParty};
pub use vectors::{all_vectors, verify_all_vectors, KnownAnswer};
