//! # keyswap core
//!
//! The asymmetric primitive behind keyswap: keypair generation, primality
//! testing and per-character textbook public-key encryption.
//!
//! This crate contains no I/O, no storage, no networking. Randomness is
//! always supplied by the caller, so every operation is reproducible under a
//! seeded generator.
//!
//! ## Key Types
//!
//! - [`Keypair`], [`PublicKey`], [`PrivateKey`] - exponent/modulus pairs with
//!   JSON text forms
//! - [`Ciphertext`] - one integer per plaintext character, comma-separated
//!   as text
//! - [`KeyGenerator`] - prime search and key assembly
//! - [`PrimalityTest`] / [`PrimeSource`] - pluggable prime selection
//! - [`PartyId`] / [`PartyPair`] - identities taking part in key exchange
//!
//! ## Usage
//!
//! ```rust,no_run
//! use keyswap_core::{generate_keypair, PrivateKey};
//!
//! let mut rng = rand::thread_rng();
//! let keypair = generate_keypair(512, &mut rng).unwrap();
//!
//! let ciphertext = keypair.public_key().encrypt("17");
//! let text = ciphertext.to_string();
//!
//! let plaintext = keypair.private_key().decrypt_str(&text).unwrap();
//! assert_eq!(plaintext, "17");
//! ```
//!
//! ## Security
//!
//! Textbook encryption without padding is deterministic and malleable. It is
//! only used to move a small shared value between two parties.

pub mod arith;
pub mod cipher;
pub mod error;
pub mod keygen;
pub mod keys;
pub mod prime;
pub mod types;

pub use cipher::{decrypt, encrypt, Ciphertext};
pub use error::{CoreError, Result};
pub use keygen::{generate_keypair, KeyGenerator, KeygenConfig, DEFAULT_PUBLIC_EXPONENT};
pub use keys::{Keypair, PrivateKey, PublicKey};
pub use prime::{
    Fermat, MillerRabin, PrimalityConfig, PrimalityKind, PrimalityTest, PrimeSource, RandomPrimes,
};
pub use types::{PartyId, PartyPair};

pub use num_bigint::BigUint;
