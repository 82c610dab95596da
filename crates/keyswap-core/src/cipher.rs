//! Per-character textbook encryption.
//!
//! Each Unicode scalar value `m` of the plaintext becomes `m^e mod n`. The
//! ciphertext is the ordered list of those integers; its text form is the
//! decimal integers joined by commas. Order is the message: permuting the
//! list permutes the plaintext.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::arith::parse_decimal;
use crate::error::{CoreError, Result};
use crate::keys::{PrivateKey, PublicKey};

/// An encrypted payload: one integer per plaintext character.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ciphertext(Vec<BigUint>);

impl Ciphertext {
    pub fn from_values(values: Vec<BigUint>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[BigUint] {
        &self.0
    }

    pub fn into_values(self) -> Vec<BigUint> {
        self.0
    }

    /// Number of encrypted characters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ciphertext({} values)", self.0.len())
    }
}

impl FromStr for Ciphertext {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Self::default());
        }
        s.split(',')
            .enumerate()
            .map(|(i, part)| {
                parse_decimal(part).ok_or_else(|| {
                    CoreError::Decode(format!("element {i} is not a base-10 integer"))
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }
}

impl TryFrom<String> for Ciphertext {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Ciphertext> for String {
    fn from(ciphertext: Ciphertext) -> Self {
        ciphertext.to_string()
    }
}

/// Encrypt `plaintext` under `key`.
///
/// Characters whose code point is not below the modulus are reduced modulo
/// `n` and will not decrypt to themselves. Check with
/// [`PublicKey::can_encode`] when the alphabet is not known to fit.
pub fn encrypt(plaintext: &str, key: &PublicKey) -> Ciphertext {
    let values = plaintext
        .chars()
        .map(|c| BigUint::from(c as u32).modpow(key.exponent(), key.modulus()))
        .collect();
    Ciphertext(values)
}

/// Decrypt `ciphertext` with `key`.
///
/// Every element must lie in `[0, n)` and decrypt to a Unicode scalar value.
pub fn decrypt(ciphertext: &Ciphertext, key: &PrivateKey) -> Result<String> {
    let n = key.modulus();
    ciphertext
        .0
        .iter()
        .enumerate()
        .map(|(i, value)| {
            if value >= n {
                return Err(CoreError::Decode(format!(
                    "element {i} is outside the key modulus"
                )));
            }
            let m = value.modpow(key.exponent(), n);
            u32::try_from(&m)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| {
                    CoreError::Decode(format!("element {i} does not decrypt to a character"))
                })
        })
        .collect()
}
