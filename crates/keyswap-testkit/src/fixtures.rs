//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use keyswap::{KeyExchange, KeyswapConfig, PartyId, Result};
use keyswap_core::{BigUint, KeyGenerator, KeygenConfig, Keypair, PrimeSource};
use keyswap_store::{MemoryStore, Store};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Prime size used for fixture keys. Large enough for any BMP character.
pub const FIXTURE_PRIME_BITS: u64 = 64;

/// Key generation settings for fast tests: small primes and a floor that
/// allows them.
pub fn small_keygen_config() -> KeygenConfig {
    KeygenConfig {
        prime_bits: FIXTURE_PRIME_BITS,
        min_prime_bits: 16,
        ..KeygenConfig::default()
    }
}

/// A prime source that hands out a fixed list of primes in order, cycling
/// when it runs out.
#[derive(Debug, Clone)]
pub struct FixedPrimes {
    primes: Vec<BigUint>,
    next: usize,
}

impl FixedPrimes {
    pub fn new(primes: &[u64]) -> Self {
        Self {
            primes: primes.iter().map(|&p| BigUint::from(p)).collect(),
            next: 0,
        }
    }

    /// How many primes have been handed out.
    pub fn drawn(&self) -> usize {
        self.next
    }
}

impl PrimeSource for FixedPrimes {
    fn next_prime(&mut self, _bits: u64, _rng: &mut dyn RngCore) -> BigUint {
        if self.primes.is_empty() {
            return BigUint::from(3u32);
        }
        let prime = self.primes[self.next % self.primes.len()].clone();
        self.next += 1;
        prime
    }
}

/// A registered party together with its keys.
#[derive(Debug, Clone)]
pub struct TestParty {
    pub id: PartyId,
    pub name: String,
    pub keypair: Keypair,
}

/// A test fixture: an exchange service over a memory store with a seeded
/// random source, plus a seeded generator for party keys.
pub struct TestFixture<S: Store = MemoryStore> {
    pub service: KeyExchange<S>,
    keygen: KeyGenerator,
    rng: StdRng,
}

impl TestFixture {
    /// Create a new fixture with a fixed seed.
    pub fn new() -> Self {
        Self::with_seed(0x6b65_7973)
    }

    /// Create a fixture whose secrets and keys derive from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_store(MemoryStore::new(), KeyswapConfig::default(), seed)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Store> TestFixture<S> {
    /// Create a fixture over any store.
    pub fn with_store(store: S, config: KeyswapConfig, seed: u64) -> Self {
        Self {
            service: KeyExchange::with_rng(store, config, StdRng::seed_from_u64(seed)),
            keygen: KeyGenerator::new(small_keygen_config()),
            rng: StdRng::seed_from_u64(seed.wrapping_add(1)),
        }
    }

    /// Generate a fresh small keypair.
    pub fn keypair(&mut self) -> Result<Keypair> {
        Ok(self.keygen.generate_default(&mut self.rng)?)
    }

    /// Register a party under `id` without publishing a key.
    pub async fn register(&self, id: &str) -> Result<PartyId> {
        let party = PartyId::new(id)?;
        self.service.register_party(&party, display_name(id)).await?;
        Ok(party)
    }

    /// Register a party, generate its keys and publish the public half.
    pub async fn add_party(&mut self, id: &str) -> Result<TestParty> {
        let party = self.register(id).await?;
        let keypair = self.keypair()?;
        self.service
            .publish_public_key(&party, keypair.public_key())
            .await?;

        Ok(TestParty {
            name: display_name(id),
            id: party,
            keypair,
        })
    }

    /// Add `count` parties named `party-0`, `party-1`, ...
    pub async fn add_parties(&mut self, count: usize) -> Result<Vec<TestParty>> {
        let mut parties = Vec::with_capacity(count);
        for i in 0..count {
            parties.push(self.add_party(&format!("party-{i}")).await?);
        }
        Ok(parties)
    }
}

fn display_name(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
