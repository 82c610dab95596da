//! The exchange service: registered parties, published keys and the
//! pairwise shared secrets between them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use keyswap_core::{BigUint, Ciphertext, KeyGenerator, Keypair, PartyId, PartyPair, PublicKey};
use keyswap_store::{Party, SecretExchange, Store, StoreError, UpsertResult};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::config::{KeyswapConfig, SlotPolicy};
use crate::error::{KeyswapError, Result};
use crate::secret::SharedSecret;

/// The largest character the secret's plaintext uses.
const HIGHEST_SECRET_CHAR: char = '9';

/// One shared secret as seen by one of its parties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyListing {
    pub counterparty: PartyId,
    pub counterparty_name: String,
    /// The half encrypted under the listing party's public key.
    pub encrypted_secret: Ciphertext,
    /// Unix ms of the last exchange for this pair.
    pub updated_at: i64,
}

/// The key exchange service.
///
/// Generic over the store and over the random source the secrets are drawn
/// from; [`KeyExchange::with_rng`] takes a seeded generator for
/// reproducible runs.
pub struct KeyExchange<S: Store, R = StdRng> {
    store: Arc<S>,
    config: KeyswapConfig,
    generator: KeyGenerator,
    rng: Mutex<R>,
}

impl<S: Store> KeyExchange<S> {
    /// Create a service drawing randomness from the operating system.
    pub fn new(store: S, config: KeyswapConfig) -> Self {
        Self::with_rng(store, config, StdRng::from_entropy())
    }
}

impl<S: Store, R: RngCore + Send> KeyExchange<S, R> {
    pub fn with_rng(store: S, config: KeyswapConfig, rng: R) -> Self {
        Self::from_shared(Arc::new(store), config, rng)
    }

    /// Create a service over a store that is shared with other owners.
    pub fn from_shared(store: Arc<S>, config: KeyswapConfig, rng: R) -> Self {
        Self {
            store,
            generator: KeyGenerator::new(config.keygen.clone()),
            config,
            rng: Mutex::new(rng),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &KeyswapConfig {
        &self.config
    }

    // A panic while drawing leaves the generator usable, so poisoning is
    // ignored.
    fn rng(&self) -> MutexGuard<'_, R> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Parties and keys
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a party, or return the existing one unchanged.
    pub async fn register_party(
        &self,
        id: &PartyId,
        display_name: impl Into<String>,
    ) -> Result<Party> {
        let party = Party::new(id.clone(), display_name, now_millis());
        let inserted = self.store.register_party(&party).await?;
        tracing::debug!(party = %id, result = ?inserted, "registered party");

        self.party(id).await
    }

    /// Look up a registered party.
    pub async fn party(&self, id: &PartyId) -> Result<Party> {
        self.store
            .get_party(id)
            .await?
            .ok_or_else(|| KeyswapError::PartyNotFound(id.clone()))
    }

    /// Store `key` as the party's public key, replacing any previous one.
    ///
    /// The modulus must exceed every character of a secret's decimal text,
    /// otherwise secrets encrypted under it could not be recovered.
    pub async fn publish_public_key(&self, id: &PartyId, key: &PublicKey) -> Result<()> {
        if key.modulus() <= &BigUint::from(u32::from(HIGHEST_SECRET_CHAR)) {
            return Err(keyswap_core::CoreError::InvalidKeyFormat(format!(
                "modulus {} is too small to carry a shared secret",
                key.modulus()
            ))
            .into());
        }

        match self.store.publish_public_key(id, key, now_millis()).await {
            Ok(()) => {
                tracing::debug!(party = %id, modulus_bits = key.modulus().bits(), "published public key");
                Ok(())
            }
            Err(StoreError::NotFound(_)) => Err(KeyswapError::PartyNotFound(id.clone())),
            Err(e) => Err(e.into()),
        }
    }

    /// The party's published public key.
    pub async fn public_key(&self, id: &PartyId) -> Result<PublicKey> {
        self.party(id)
            .await?
            .public_key
            .ok_or_else(|| KeyswapError::MissingPublicKey(id.clone()))
    }

    /// Generate a keypair with the configured key parameters.
    ///
    /// The search runs on the blocking pool, seeded from the service's
    /// random source.
    pub async fn generate_keypair(&self) -> Result<Keypair> {
        let mut seed = [0u8; 32];
        self.rng().fill_bytes(&mut seed);

        let generator = self.generator.clone();
        tokio::task::spawn_blocking(move || {
            let mut rng = StdRng::from_seed(seed);
            generator.generate_default(&mut rng)
        })
        .await
        .map_err(|e| KeyswapError::Task(e.to_string()))?
        .map_err(KeyswapError::from)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Exchange
    // ─────────────────────────────────────────────────────────────────────────

    /// Establish a fresh shared secret between `party_a` and `party_b`.
    ///
    /// The secret is encrypted under both parties' public keys and stored as
    /// the single record for the pair, replacing any earlier exchange in
    /// either direction. Returns the half encrypted for `party_a`;
    /// `party_b` reads its half through [`KeyExchange::list_keys`].
    pub async fn request_key_exchange(
        &self,
        party_a: &PartyId,
        party_b: &PartyId,
    ) -> Result<Ciphertext> {
        let pair = PartyPair::new(party_a, party_b)
            .ok_or_else(|| KeyswapError::SelfExchange(party_a.clone()))?;

        let a = self.party(party_a).await?;
        let b = self.party(party_b).await?;
        let key_a = a
            .public_key
            .ok_or_else(|| KeyswapError::MissingPublicKey(party_a.clone()))?;
        let key_b = b
            .public_key
            .ok_or_else(|| KeyswapError::MissingPublicKey(party_b.clone()))?;

        let secret = SharedSecret::random(&mut *self.rng());
        let plaintext = secret.to_plaintext();
        let for_a = key_a.encrypt(&plaintext);
        let for_b = key_b.encrypt(&plaintext);

        let a_first = match self.config.slot_policy {
            SlotPolicy::CallerOrder => true,
            SlotPolicy::Canonical => pair.low() == party_a,
        };
        let exchange = if a_first {
            SecretExchange::new(party_a.clone(), party_b.clone(), for_a.clone(), for_b)
        } else {
            SecretExchange::new(party_b.clone(), party_a.clone(), for_b, for_a.clone())
        };
        let exchange = exchange.ok_or_else(|| KeyswapError::SelfExchange(party_a.clone()))?;

        let result = self.store.upsert_shared_secret(&exchange, now_millis()).await?;
        match result {
            UpsertResult::Inserted => tracing::info!(%pair, "created shared secret"),
            UpsertResult::Updated => tracing::info!(%pair, "replaced shared secret"),
        }

        Ok(for_a)
    }

    /// Every shared secret `party` takes part in, most recently exchanged
    /// first, each with the half encrypted for `party`.
    pub async fn list_keys(&self, party: &PartyId) -> Result<Vec<KeyListing>> {
        self.party(party).await?;

        let records = self.store.list_shared_secrets(party).await?;
        let mut listings = Vec::with_capacity(records.len());

        for record in records {
            let (Some(counterparty), Some(encrypted)) =
                (record.counterparty(party), record.secret_for(party))
            else {
                tracing::warn!(%party, pair = %record.pair, "listed record does not involve party");
                continue;
            };

            let counterparty_name = match self.store.get_party(counterparty).await? {
                Some(p) => p.display_name,
                None => {
                    tracing::warn!(%counterparty, "shared secret references unknown party");
                    counterparty.to_string()
                }
            };

            listings.push(KeyListing {
                counterparty: counterparty.clone(),
                counterparty_name,
                encrypted_secret: encrypted.clone(),
                updated_at: record.updated_at,
            });
        }

        Ok(listings)
    }

    /// Number of pairs that currently hold a shared secret.
    pub async fn exchange_count(&self) -> Result<u64> {
        Ok(self.store.count_shared_secrets().await?)
    }
}

fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
