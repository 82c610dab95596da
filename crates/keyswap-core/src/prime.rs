//! Probabilistic primality testing and prime candidate sources.
//!
//! Two witness tests are available behind the [`PrimalityTest`] trait:
//!
//! - [`MillerRabin`]: the default. A composite survives `k` rounds with
//!   probability at most `4^-k`.
//! - [`Fermat`]: checks `a^(n-1) ≡ 1 (mod n)` for random witnesses. Carmichael
//!   numbers pass every witness coprime to them, so no error bound is given.
//!
//! Key generation draws primes through a [`PrimeSource`]. The default source
//! is [`RandomPrimes`]; tests substitute a deterministic list.

use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::One;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Primes used for trial division before any witness round.
const SMALL_PRIMES: [u32; 46] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89,
    97, 101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191,
    193, 197, 199,
];

/// Outcome of the cheap pre-screen.
enum Screen {
    Prime,
    Composite,
    Unknown,
}

fn screen(candidate: &BigUint) -> Screen {
    if candidate < &BigUint::from(2u32) {
        return Screen::Composite;
    }
    for &p in SMALL_PRIMES.iter() {
        let p = BigUint::from(p);
        if candidate == &p {
            return Screen::Prime;
        }
        if candidate.is_multiple_of(&p) {
            return Screen::Composite;
        }
    }
    Screen::Unknown
}

/// A probabilistic primality test.
///
/// Implementations draw their witnesses from the supplied random source so
/// results are reproducible with a seeded generator.
pub trait PrimalityTest: Send + Sync {
    /// Returns `false` if `candidate` is certainly composite, `true` if it
    /// survived every round.
    fn is_probable_prime(&self, candidate: &BigUint, rng: &mut dyn RngCore) -> bool;

    /// Upper bound on the probability that a composite is reported prime,
    /// or `None` if the test has no such bound.
    fn false_positive_bound(&self) -> Option<f64>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Miller-Rabin strong pseudoprime test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MillerRabin {
    pub rounds: u32,
}

impl PrimalityTest for MillerRabin {
    fn is_probable_prime(&self, candidate: &BigUint, rng: &mut dyn RngCore) -> bool {
        match screen(candidate) {
            Screen::Prime => return true,
            Screen::Composite => return false,
            Screen::Unknown => {}
        }

        let one = BigUint::one();
        let two = BigUint::from(2u32);
        let n_minus_one = candidate - &one;

        // n - 1 = 2^s * d with d odd
        let s = n_minus_one.trailing_zeros().unwrap_or(0);
        let d = &n_minus_one >> s;

        'witness: for _ in 0..self.rounds {
            let a = rng.gen_biguint_range(&two, &n_minus_one);
            let mut x = a.modpow(&d, candidate);
            if x == one || x == n_minus_one {
                continue;
            }
            for _ in 1..s {
                x = x.modpow(&two, candidate);
                if x == n_minus_one {
                    continue 'witness;
                }
            }
            return false;
        }

        true
    }

    fn false_positive_bound(&self) -> Option<f64> {
        Some(0.25f64.powi(self.rounds as i32))
    }

    fn name(&self) -> &'static str {
        "miller-rabin"
    }
}

/// Fermat witness test.
///
/// Carmichael numbers pass every coprime witness. Prefer [`MillerRabin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fermat {
    pub rounds: u32,
}

impl PrimalityTest for Fermat {
    fn is_probable_prime(&self, candidate: &BigUint, rng: &mut dyn RngCore) -> bool {
        match screen(candidate) {
            Screen::Prime => return true,
            Screen::Composite => return false,
            Screen::Unknown => {}
        }

        let two = BigUint::from(2u32);
        let n_minus_one = candidate - 1u32;

        for _ in 0..self.rounds {
            let a = rng.gen_biguint_range(&two, &n_minus_one);
            if !a.modpow(&n_minus_one, candidate).is_one() {
                return false;
            }
        }

        true
    }

    fn false_positive_bound(&self) -> Option<f64> {
        None
    }

    fn name(&self) -> &'static str {
        "fermat"
    }
}

/// Which witness test to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrimalityKind {
    MillerRabin,
    Fermat,
}

/// Primality test selection and round count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimalityConfig {
    pub kind: PrimalityKind,
    /// Witness rounds per candidate. More rounds lower the false-positive
    /// probability and cost one modular exponentiation each.
    pub rounds: u32,
}

impl Default for PrimalityConfig {
    fn default() -> Self {
        Self {
            kind: PrimalityKind::MillerRabin,
            rounds: 24,
        }
    }
}

impl PrimalityConfig {
    /// Instantiate the configured test.
    pub fn build(&self) -> Box<dyn PrimalityTest> {
        match self.kind {
            PrimalityKind::MillerRabin => Box::new(MillerRabin {
                rounds: self.rounds,
            }),
            PrimalityKind::Fermat => Box::new(Fermat {
                rounds: self.rounds,
            }),
        }
    }

    /// Error probability of the configured test, see
    /// [`PrimalityTest::false_positive_bound`].
    pub fn false_positive_bound(&self) -> Option<f64> {
        self.build().false_positive_bound()
    }
}

/// Supplies prime factors to key generation.
pub trait PrimeSource {
    /// Return a (probable) prime of `bits` bits.
    fn next_prime(&mut self, bits: u64, rng: &mut dyn RngCore) -> BigUint;
}

/// Draws random odd full-length candidates and keeps the first that passes
/// the primality test.
pub struct RandomPrimes {
    test: Box<dyn PrimalityTest>,
}

impl RandomPrimes {
    pub fn new(test: Box<dyn PrimalityTest>) -> Self {
        Self { test }
    }

    pub fn from_config(config: &PrimalityConfig) -> Self {
        Self::new(config.build())
    }
}

impl PrimeSource for RandomPrimes {
    fn next_prime(&mut self, bits: u64, rng: &mut dyn RngCore) -> BigUint {
        let mut candidates = 0u64;
        loop {
            candidates += 1;
            let candidate = random_odd(bits, rng);
            if self.test.is_probable_prime(&candidate, rng) {
                tracing::debug!(
                    bits,
                    candidates,
                    test = self.test.name(),
                    "found probable prime"
                );
                return candidate;
            }
        }
    }
}

/// A random odd integer of exactly `bits` bits (top and bottom bit set).
pub fn random_odd(bits: u64, rng: &mut dyn RngCore) -> BigUint {
    let bits = bits.max(2);
    let mut candidate = rng.gen_biguint(bits);
    candidate |= BigUint::one() << (bits - 1);
    candidate |= BigUint::one();
    candidate
}
