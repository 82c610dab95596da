//! Public and private keys and their JSON text forms.
//!
//! Public keys travel as `{"e": "<decimal>", "n": "<decimal>"}` and private
//! keys as `{"d": "<decimal>", "n": "<decimal>"}`. Numbers are strings so
//! that JSON consumers without big-integer support keep every digit.

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::arith::parse_key_component;
use crate::cipher::{self, Ciphertext};
use crate::error::{CoreError, Result};

/// Wire form of a public key.
#[derive(Serialize, Deserialize)]
struct PublicKeyText {
    e: String,
    n: String,
}

/// Wire form of a private key.
#[derive(Serialize, Deserialize)]
struct PrivateKeyText {
    d: String,
    n: String,
}

fn check_components(exponent: &BigUint, modulus: &BigUint) -> Result<()> {
    if modulus < &BigUint::from(2u32) {
        return Err(CoreError::InvalidKeyFormat("modulus must be at least 2".into()));
    }
    if exponent.is_zero() {
        return Err(CoreError::InvalidKeyFormat("exponent must be non-zero".into()));
    }
    Ok(())
}

/// The published half of a keypair: exponent `e` and modulus `n`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PublicKeyText", into = "PublicKeyText")]
pub struct PublicKey {
    e: BigUint,
    n: BigUint,
}

impl PublicKey {
    pub fn new(e: BigUint, n: BigUint) -> Result<Self> {
        check_components(&e, &n)?;
        Ok(Self { e, n })
    }

    pub fn exponent(&self) -> &BigUint {
        &self.e
    }

    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    /// Whether every character of `plaintext` has a code point below `n`.
    ///
    /// [`PublicKey::encrypt`] does not check this: characters at or above
    /// the modulus are reduced and come back as different characters.
    pub fn can_encode(&self, plaintext: &str) -> bool {
        plaintext.chars().all(|c| BigUint::from(c as u32) < self.n)
    }

    /// Encrypt each character of `plaintext` as `code_point^e mod n`.
    pub fn encrypt(&self, plaintext: &str) -> Ciphertext {
        cipher::encrypt(plaintext, self)
    }

    /// Serialize to the JSON text form.
    pub fn to_json(&self) -> String {
        let text = PublicKeyText::from(self.clone());
        // Two string fields cannot fail to serialize.
        serde_json::to_string(&text).unwrap_or_default()
    }

    /// Parse the JSON text form.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CoreError::InvalidKeyFormat(e.to_string()))
    }
}

impl TryFrom<PublicKeyText> for PublicKey {
    type Error = CoreError;

    fn try_from(text: PublicKeyText) -> Result<Self> {
        let e = parse_key_component("e", &text.e)?;
        let n = parse_key_component("n", &text.n)?;
        Self::new(e, n)
    }
}

impl From<PublicKey> for PublicKeyText {
    fn from(key: PublicKey) -> Self {
        Self {
            e: key.e.to_str_radix(10),
            n: key.n.to_str_radix(10),
        }
    }
}

impl FromStr for PublicKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_json(s)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey(e={}, n={} bits)", self.e, self.n.bits())
    }
}

/// The secret half of a keypair: exponent `d` and modulus `n`.
///
/// Never persisted by keyswap; the owner keeps it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PrivateKeyText", into = "PrivateKeyText")]
pub struct PrivateKey {
    d: BigUint,
    n: BigUint,
}

impl PrivateKey {
    pub fn new(d: BigUint, n: BigUint) -> Result<Self> {
        check_components(&d, &n)?;
        Ok(Self { d, n })
    }

    pub fn exponent(&self) -> &BigUint {
        &self.d
    }

    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    /// Decrypt a ciphertext produced under the matching public key.
    pub fn decrypt(&self, ciphertext: &Ciphertext) -> Result<String> {
        cipher::decrypt(ciphertext, self)
    }

    /// Parse the comma-separated text form and decrypt it.
    pub fn decrypt_str(&self, ciphertext: &str) -> Result<String> {
        self.decrypt(&ciphertext.parse()?)
    }

    /// Serialize to the JSON text form.
    pub fn to_json(&self) -> String {
        let text = PrivateKeyText::from(self.clone());
        serde_json::to_string(&text).unwrap_or_default()
    }

    /// Parse the JSON text form.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CoreError::InvalidKeyFormat(e.to_string()))
    }
}

impl TryFrom<PrivateKeyText> for PrivateKey {
    type Error = CoreError;

    fn try_from(text: PrivateKeyText) -> Result<Self> {
        let d = parse_key_component("d", &text.d)?;
        let n = parse_key_component("n", &text.n)?;
        Self::new(d, n)
    }
}

impl From<PrivateKey> for PrivateKeyText {
    fn from(key: PrivateKey) -> Self {
        Self {
            d: key.d.to_str_radix(10),
            n: key.n.to_str_radix(10),
        }
    }
}

impl FromStr for PrivateKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_json(s)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey(d=<redacted>, n={} bits)", self.n.bits())
    }
}

/// A matched public/private key pair.
#[derive(Clone)]
pub struct Keypair {
    public: PublicKey,
    private: PrivateKey,
}

impl Keypair {
    /// Pair two halves. The moduli must agree.
    pub fn from_parts(public: PublicKey, private: PrivateKey) -> Result<Self> {
        if public.n != private.n {
            return Err(CoreError::InvalidKeyFormat(
                "public and private modulus differ".into(),
            ));
        }
        Ok(Self { public, private })
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    pub fn into_parts(self) -> (PublicKey, PrivateKey) {
        (self.public, self.private)
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({:?})", self.public)
    }
}
