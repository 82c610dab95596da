//! Store trait: the abstract interface for party and shared-secret
//! persistence.
//!
//! This trait keeps the exchange service storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use keyswap_core::{Ciphertext, PartyId, PartyPair, PublicKey};

use crate::error::Result;

/// A party known to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Party {
    pub id: PartyId,
    pub display_name: String,
    /// Published public key, `None` until the party publishes one.
    pub public_key: Option<PublicKey>,
    /// Unix ms.
    pub created_at: i64,
    /// Unix ms.
    pub updated_at: i64,
}

impl Party {
    /// A party without a published key.
    pub fn new(id: PartyId, display_name: impl Into<String>, now: i64) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            public_key: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The write side of a key exchange: both encrypted halves, in slot order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretExchange {
    pair: PartyPair,
    party_a: PartyId,
    party_b: PartyId,
    secret_for_a: Ciphertext,
    secret_for_b: Ciphertext,
}

impl SecretExchange {
    /// Returns `None` when `party_a == party_b`.
    pub fn new(
        party_a: PartyId,
        party_b: PartyId,
        secret_for_a: Ciphertext,
        secret_for_b: Ciphertext,
    ) -> Option<Self> {
        let pair = PartyPair::new(&party_a, &party_b)?;
        Some(Self {
            pair,
            party_a,
            party_b,
            secret_for_a,
            secret_for_b,
        })
    }

    pub fn pair(&self) -> &PartyPair {
        &self.pair
    }

    pub fn party_a(&self) -> &PartyId {
        &self.party_a
    }

    pub fn party_b(&self) -> &PartyId {
        &self.party_b
    }

    pub fn secret_for_a(&self) -> &Ciphertext {
        &self.secret_for_a
    }

    pub fn secret_for_b(&self) -> &Ciphertext {
        &self.secret_for_b
    }
}

/// A persisted shared secret between two parties.
///
/// Exactly one record exists per [`PartyPair`]; which member sits in slot A
/// is whatever the last writer chose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedSecretRecord {
    pub pair: PartyPair,
    pub party_a: PartyId,
    pub party_b: PartyId,
    pub secret_for_a: Ciphertext,
    pub secret_for_b: Ciphertext,
    /// Unix ms.
    pub created_at: i64,
    /// Unix ms.
    pub updated_at: i64,
}

impl SharedSecretRecord {
    /// The half encrypted for `party`, if it is a member.
    pub fn secret_for(&self, party: &PartyId) -> Option<&Ciphertext> {
        if &self.party_a == party {
            Some(&self.secret_for_a)
        } else if &self.party_b == party {
            Some(&self.secret_for_b)
        } else {
            None
        }
    }

    /// The member that is not `party`.
    pub fn counterparty(&self, party: &PartyId) -> Option<&PartyId> {
        self.pair.other(party)
    }

    pub(crate) fn from_exchange(exchange: &SecretExchange, created_at: i64, updated_at: i64) -> Self {
        Self {
            pair: exchange.pair.clone(),
            party_a: exchange.party_a.clone(),
            party_b: exchange.party_b.clone(),
            secret_for_a: exchange.secret_for_a.clone(),
            secret_for_b: exchange.secret_for_b.clone(),
            created_at,
            updated_at,
        }
    }
}

/// Result of registering a party.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// Party was inserted.
    Inserted,
    /// Party already exists (idempotent - not an error).
    AlreadyExists,
}

/// Result of upserting a shared secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertResult {
    /// No record existed for the pair; one was created.
    Inserted,
    /// The pair's record was overwritten in place.
    Updated,
}

/// The Store trait: async interface for exchange persistence.
///
/// # Design Notes
///
/// - **One record per pair**: records are keyed by the normalised
///   [`PartyPair`], never by slot order.
/// - **Atomic upsert**: `upsert_shared_secret` runs its read-then-write as
///   one critical section, so concurrent exchanges for the same pair cannot
///   lose an overwrite and both halves are written together or not at all.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Party Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert a party unless one with the same id exists.
    async fn register_party(&self, party: &Party) -> Result<InsertResult>;

    /// Get a party by id.
    async fn get_party(&self, id: &PartyId) -> Result<Option<Party>>;

    /// Replace a party's published public key.
    ///
    /// Fails with `StoreError::NotFound` for an unknown party.
    async fn publish_public_key(&self, id: &PartyId, key: &PublicKey, now: i64) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Shared Secret Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the record for an unordered pair.
    async fn get_shared_secret(&self, pair: &PartyPair) -> Result<Option<SharedSecretRecord>>;

    /// Insert the pair's record or overwrite it in place.
    ///
    /// On overwrite both halves and the slot assignment are replaced and
    /// `updated_at` is set to `now`; `created_at` is kept.
    async fn upsert_shared_secret(&self, exchange: &SecretExchange, now: i64)
        -> Result<UpsertResult>;

    /// All records involving `party`, most recently updated first.
    async fn list_shared_secrets(&self, party: &PartyId) -> Result<Vec<SharedSecretRecord>>;

    /// Total number of shared-secret records.
    async fn count_shared_secrets(&self) -> Result<u64>;
}

/// Extension trait for common store patterns.
pub trait StoreExt: Store {
    /// The half of the `{party, counterparty}` secret encrypted for `party`.
    fn shared_secret_for(
        &self,
        party: &PartyId,
        counterparty: &PartyId,
    ) -> impl std::future::Future<Output = Result<Option<Ciphertext>>> + Send;
}

impl<S: Store + ?Sized> StoreExt for S {
    async fn shared_secret_for(
        &self,
        party: &PartyId,
        counterparty: &PartyId,
    ) -> Result<Option<Ciphertext>> {
        let Some(pair) = PartyPair::new(party, counterparty) else {
            return Ok(None);
        };

        Ok(self
            .get_shared_secret(&pair)
            .await?
            .and_then(|record| record.secret_for(party).cloned()))
    }
}
