//! # keyswap
//!
//! Pairwise shared-secret exchange between registered parties.
//!
//! ## Overview
//!
//! Each party registers an identity and publishes a public key. When one
//! party requests an exchange with another, the service draws a secret in
//! `[1, 26]`, encrypts it under both public keys and stores both halves as
//! the single record for that pair. Each party recovers the same secret
//! with its own private key.
//!
//! ## Key Concepts
//!
//! - **Unordered pair**: `(A, B)` and `(B, A)` name the same record.
//! - **Slot**: which member sits in position A of the record. By default the
//!   last requester takes slot A (see [`SlotPolicy`]).
//! - **Overwrite**: every exchange replaces the pair's secret.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use keyswap::{KeyExchange, KeyswapConfig, SharedSecret};
//! use keyswap::core::PartyId;
//! use keyswap::store::SqliteStore;
//!
//! async fn example() -> keyswap::Result<()> {
//!     let store = SqliteStore::open("keyswap.db")?;
//!     let service = KeyExchange::new(store, KeyswapConfig::default());
//!
//!     let alice = PartyId::new("alice")?;
//!     let bob = PartyId::new("bob")?;
//!     service.register_party(&alice, "Alice").await?;
//!     service.register_party(&bob, "Bob").await?;
//!
//!     let alice_keys = service.generate_keypair().await?;
//!     let bob_keys = service.generate_keypair().await?;
//!     service.publish_public_key(&alice, alice_keys.public_key()).await?;
//!     service.publish_public_key(&bob, bob_keys.public_key()).await?;
//!
//!     let for_alice = service.request_key_exchange(&alice, &bob).await?;
//!     let secret = SharedSecret::recover(&for_alice, alice_keys.private_key())?;
//!
//!     let listing = &service.list_keys(&bob).await?[0];
//!     let same = SharedSecret::recover(&listing.encrypted_secret, bob_keys.private_key())?;
//!     assert_eq!(secret, same);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `keyswap::core` - the encryption primitive and identities
//! - `keyswap::store` - storage abstraction and SQLite

pub mod config;
pub mod error;
pub mod exchange;
pub mod secret;

pub use keyswap_core as core;
pub use keyswap_store as store;

pub use config::{KeyswapConfig, SlotPolicy};
pub use error::{KeyswapError, Result};
pub use exchange::{KeyExchange, KeyListing};
pub use secret::SharedSecret;

pub use keyswap_core::{Ciphertext, Keypair, PartyId, PrivateKey, PublicKey};
