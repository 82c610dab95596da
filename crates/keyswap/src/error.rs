//! Error types for the exchange service.

use keyswap_core::{CoreError, PartyId};
use keyswap_store::StoreError;
use thiserror::Error;

/// Errors that can occur during key exchange operations.
#[derive(Debug, Error)]
pub enum KeyswapError {
    /// Both sides of an exchange are the same party.
    #[error("party {0} cannot exchange a key with itself")]
    SelfExchange(PartyId),

    /// The identity is not registered.
    #[error("party not found: {0}")]
    PartyNotFound(PartyId),

    /// The party has not published a public key.
    #[error("party {0} has no public key")]
    MissingPublicKey(PartyId),

    /// A decrypted shared secret is not an integer in the valid range.
    #[error("invalid shared secret: {0}")]
    InvalidSecret(String),

    /// Primitive error: key generation, key format or decoding.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// A background task failed to complete.
    #[error("background task failed: {0}")]
    Task(String),
}

/// Result type for exchange operations.
pub type Result<T> = std::result::Result<T, KeyswapError>;
