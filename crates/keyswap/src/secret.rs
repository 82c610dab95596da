//! The shared secret carried by a key exchange.

use std::fmt;
use std::str::FromStr;

use keyswap_core::{Ciphertext, PrivateKey};
use rand::Rng;

use crate::error::{KeyswapError, Result};

/// An integer in `[1, 26]` known to both parties of an exchange.
///
/// On the wire it is the decimal string of the integer, encrypted
/// character by character.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SharedSecret(u8);

impl SharedSecret {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 26;

    pub fn new(value: u8) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(KeyswapError::InvalidSecret(format!(
                "{value} is outside [{}, {}]",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    /// Draw a secret uniformly from `[1, 26]`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(rng.gen_range(Self::MIN..=Self::MAX))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// The decimal text that gets encrypted.
    pub fn to_plaintext(&self) -> String {
        self.0.to_string()
    }

    /// Parse the decrypted text. Only canonical decimal forms are accepted.
    pub fn from_plaintext(text: &str) -> Result<Self> {
        let canonical = !text.is_empty()
            && text.bytes().all(|b| b.is_ascii_digit())
            && !text.starts_with('0');
        if !canonical {
            return Err(KeyswapError::InvalidSecret(format!(
                "{text:?} is not a decimal integer"
            )));
        }
        let value: u8 = text
            .parse()
            .map_err(|_| KeyswapError::InvalidSecret(format!("{text:?} is out of range")))?;
        Self::new(value)
    }

    /// Decrypt a party's half of an exchange and parse the secret.
    pub fn recover(encrypted: &Ciphertext, key: &PrivateKey) -> Result<Self> {
        let plaintext = key.decrypt(encrypted)?;
        Self::from_plaintext(&plaintext)
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(..)")
    }
}

impl fmt::Display for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SharedSecret {
    type Err = KeyswapError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_plaintext(s)
    }
}
