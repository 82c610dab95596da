//! Keypair generation.
//!
//! `n = p·q` for two distinct primes of the requested size, `e` fixed at the
//! configured exponent unless it shares a factor with `φ(n)`, and
//! `d = e⁻¹ mod φ(n)`.

use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::One;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::arith::{is_coprime, mod_inverse};
use crate::error::{CoreError, Result};
use crate::keys::{Keypair, PrivateKey, PublicKey};
use crate::prime::{PrimalityConfig, PrimeSource, RandomPrimes};

/// Conventional public exponent, 2^16 + 1.
pub const DEFAULT_PUBLIC_EXPONENT: u64 = 65_537;

/// Key generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeygenConfig {
    /// Size of each prime factor in bits. The modulus is about twice this.
    pub prime_bits: u64,
    /// Smallest prime size accepted by [`KeyGenerator::generate`].
    pub min_prime_bits: u64,
    /// Preferred public exponent. Must be odd and at least 3.
    pub public_exponent: u64,
    pub primality: PrimalityConfig,
}

impl Default for KeygenConfig {
    fn default() -> Self {
        Self {
            prime_bits: 512,
            min_prime_bits: 256,
            public_exponent: DEFAULT_PUBLIC_EXPONENT,
            primality: PrimalityConfig::default(),
        }
    }
}

/// Generates keypairs according to a [`KeygenConfig`].
#[derive(Debug, Clone, Default)]
pub struct KeyGenerator {
    config: KeygenConfig,
}

impl KeyGenerator {
    pub fn new(config: KeygenConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KeygenConfig {
        &self.config
    }

    /// Generate a keypair with the configured prime size.
    pub fn generate_default<R: RngCore>(&self, rng: &mut R) -> Result<Keypair> {
        self.generate(self.config.prime_bits, rng)
    }

    /// Generate a keypair whose prime factors have `bit_length` bits.
    ///
    /// May take a while for large sizes; callers that need cancellation run
    /// it on a worker they can abandon.
    pub fn generate<R: RngCore>(&self, bit_length: u64, rng: &mut R) -> Result<Keypair> {
        if bit_length < self.config.min_prime_bits.max(2) {
            return Err(CoreError::InvalidBitLength {
                requested: bit_length,
                minimum: self.config.min_prime_bits.max(2),
            });
        }
        let mut source = RandomPrimes::from_config(&self.config.primality);
        self.generate_with_source(bit_length, &mut source, rng)
    }

    /// Generate a keypair drawing primes from `source`.
    ///
    /// The bit-length floor is not applied, so tests can feed small known
    /// primes.
    pub fn generate_with_source(
        &self,
        bit_length: u64,
        source: &mut dyn PrimeSource,
        rng: &mut dyn RngCore,
    ) -> Result<Keypair> {
        let p = source.next_prime(bit_length, rng);
        let mut q = source.next_prime(bit_length, rng);
        let mut redraws = 0u32;
        while q == p {
            redraws += 1;
            if redraws > 64 {
                return Err(CoreError::KeyGeneration(
                    "prime source keeps returning the same prime".into(),
                ));
            }
            q = source.next_prime(bit_length, rng);
        }

        let keypair = self.assemble(&p, &q, rng)?;
        tracing::debug!(
            prime_bits = bit_length,
            modulus_bits = keypair.public_key().modulus().bits(),
            "generated keypair"
        );
        Ok(keypair)
    }

    fn assemble(&self, p: &BigUint, q: &BigUint, rng: &mut dyn RngCore) -> Result<Keypair> {
        let e0 = self.config.public_exponent;
        if e0 < 3 || e0 % 2 == 0 {
            return Err(CoreError::KeyGeneration(format!(
                "public exponent {e0} must be odd and at least 3"
            )));
        }
        if p.is_even() || q.is_even() {
            return Err(CoreError::KeyGeneration("prime factors must be odd".into()));
        }

        let one = BigUint::one();
        let n = p * q;
        let phi = (p - &one) * (q - &one);
        let three = BigUint::from(3u32);
        if phi <= three {
            return Err(CoreError::KeyGeneration(
                "prime factors too small for a usable totient".into(),
            ));
        }

        let mut e = BigUint::from(e0);
        while !is_coprime(&e, &phi) {
            // phi is even, so an odd draw below it stays below it
            e = rng.gen_biguint_range(&three, &phi) | &one;
        }

        let d = mod_inverse(&e, &phi).ok_or_else(|| {
            CoreError::KeyGeneration("public exponent has no inverse modulo the totient".into())
        })?;

        Keypair::from_parts(PublicKey::new(e, n.clone())?, PrivateKey::new(d, n)?)
    }
}

/// Generate a keypair with default settings and `bit_length`-bit primes.
pub fn generate_keypair<R: RngCore>(bit_length: u64, rng: &mut R) -> Result<Keypair> {
    KeyGenerator::default().generate(bit_length, rng)
}
