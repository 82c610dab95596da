//! Known-answer vectors for the encryption primitive.
//!
//! Each vector fixes two small primes and a public exponent, so the derived
//! private exponent and every ciphertext can be checked by hand.

use keyswap_core::{BigUint, Ciphertext, Keypair, PrivateKey, PublicKey, Result};

/// A known-answer test vector.
#[derive(Debug, Clone)]
pub struct KnownAnswer {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub p: u64,
    pub q: u64,
    pub e: u64,
    /// Expected private exponent, `e⁻¹ mod (p-1)(q-1)`.
    pub d: u64,
    pub plaintext: &'static str,
    /// Expected ciphertext text form.
    pub ciphertext: &'static str,
}

impl KnownAnswer {
    pub fn modulus(&self) -> u64 {
        self.p * self.q
    }

    /// The vector's keypair, built from the expected exponents.
    pub fn keypair(&self) -> Result<Keypair> {
        let n = BigUint::from(self.modulus());
        Keypair::from_parts(
            PublicKey::new(BigUint::from(self.e), n.clone())?,
            PrivateKey::new(BigUint::from(self.d), n)?,
        )
    }
}

/// Get all known-answer vectors.
pub fn all_vectors() -> Vec<KnownAnswer> {
    vec![
        KnownAnswer {
            name: "single character",
            p: 61,
            q: 53,
            e: 17,
            d: 2753,
            plaintext: "A",
            ciphertext: "2790",
        },
        KnownAnswer {
            name: "repeated characters",
            p: 61,
            q: 53,
            e: 17,
            d: 2753,
            plaintext: "hello",
            ciphertext: "2170,1313,745,745,2185",
        },
        KnownAnswer {
            name: "two digit secret",
            p: 61,
            q: 53,
            e: 17,
            d: 2753,
            plaintext: "17",
            ciphertext: "2906,2653",
        },
        KnownAnswer {
            name: "conventional exponent",
            p: 1009,
            q: 1013,
            e: 65_537,
            d: 832_193,
            plaintext: "26",
            ciphertext: "243567,114380",
        },
        KnownAnswer {
            name: "non-ascii plaintext",
            p: 1009,
            q: 1013,
            e: 65_537,
            d: 832_193,
            plaintext: "ok \u{2713}",
            ciphertext: "123508,75382,651066,237057",
        },
        KnownAnswer {
            name: "empty plaintext",
            p: 61,
            q: 53,
            e: 17,
            d: 2753,
            plaintext: "",
            ciphertext: "",
        },
    ]
}

/// Check every vector against the primitive, returning the names of the
/// ones that fail.
pub fn verify_all_vectors() -> Vec<&'static str> {
    all_vectors()
        .into_iter()
        .filter(|v| !verify_vector(v))
        .map(|v| v.name)
        .collect()
}

fn verify_vector(vector: &KnownAnswer) -> bool {
    let Ok(keypair) = vector.keypair() else {
        return false;
    };
    let encrypted = keypair.public_key().encrypt(vector.plaintext);
    if encrypted.to_string() != vector.ciphertext {
        return false;
    }
    match vector.ciphertext.parse::<Ciphertext>() {
        Ok(parsed) => keypair.private_key().decrypt(&parsed).ok().as_deref() == Some(vector.plaintext),
        Err(_) => false,
    }
}
