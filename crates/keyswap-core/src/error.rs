//! Error types for keyswap core.

use thiserror::Error;

/// Errors raised by key generation, key parsing and the cipher.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid generator parameters or primes, or no inverse for the public
    /// exponent.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("prime size of {requested} bits is below the minimum of {minimum} bits")]
    InvalidBitLength { requested: u64, minimum: u64 },

    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// Ciphertext text is malformed, an integer lies outside `[0, n)`, or a
    /// decrypted value is not a character.
    #[error("decode error: {0}")]
    Decode(String),

    #[error("invalid party id: {0}")]
    InvalidPartyId(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
