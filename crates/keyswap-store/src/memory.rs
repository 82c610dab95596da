//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use keyswap_core::{PartyId, PartyPair, PublicKey};

use crate::error::{Result, StoreError};
use crate::traits::{
    InsertResult, Party, SecretExchange, SharedSecretRecord, Store, UpsertResult,
};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock; the
/// write lock makes every upsert a critical section.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    parties: HashMap<PartyId, Party>,

    /// Shared secrets keyed by the normalised pair.
    secrets: HashMap<PartyPair, SharedSecretRecord>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn register_party(&self, party: &Party) -> Result<InsertResult> {
        let mut inner = self.write()?;
        if inner.parties.contains_key(&party.id) {
            return Ok(InsertResult::AlreadyExists);
        }
        inner.parties.insert(party.id.clone(), party.clone());
        Ok(InsertResult::Inserted)
    }

    async fn get_party(&self, id: &PartyId) -> Result<Option<Party>> {
        Ok(self.read()?.parties.get(id).cloned())
    }

    async fn publish_public_key(&self, id: &PartyId, key: &PublicKey, now: i64) -> Result<()> {
        let mut inner = self.write()?;
        let party = inner
            .parties
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        party.public_key = Some(key.clone());
        party.updated_at = now;
        Ok(())
    }

    async fn get_shared_secret(&self, pair: &PartyPair) -> Result<Option<SharedSecretRecord>> {
        Ok(self.read()?.secrets.get(pair).cloned())
    }

    async fn upsert_shared_secret(
        &self,
        exchange: &SecretExchange,
        now: i64,
    ) -> Result<UpsertResult> {
        let mut inner = self.write()?;

        match inner.secrets.get_mut(exchange.pair()) {
            Some(existing) => {
                let created_at = existing.created_at;
                *existing = SharedSecretRecord::from_exchange(exchange, created_at, now);
                Ok(UpsertResult::Updated)
            }
            None => {
                inner.secrets.insert(
                    exchange.pair().clone(),
                    SharedSecretRecord::from_exchange(exchange, now, now),
                );
                Ok(UpsertResult::Inserted)
            }
        }
    }

    async fn list_shared_secrets(&self, party: &PartyId) -> Result<Vec<SharedSecretRecord>> {
        let inner = self.read()?;

        let mut records: Vec<SharedSecretRecord> = inner
            .secrets
            .values()
            .filter(|r| r.pair.contains(party))
            .cloned()
            .collect();

        records.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.pair.low().cmp(b.pair.low()))
                .then_with(|| a.pair.high().cmp(b.pair.high()))
        });
        Ok(records)
    }

    async fn count_shared_secrets(&self) -> Result<u64> {
        Ok(self.read()?.secrets.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::StoreExt;
    use keyswap_core::{BigUint, Ciphertext};
    use proptest::prelude::*;

    fn id(s: &str) -> PartyId {
        PartyId::new(s).unwrap()
    }

    fn ct(values: &[u32]) -> Ciphertext {
        Ciphertext::from_values(values.iter().map(|&v| BigUint::from(v)).collect())
    }

    fn exchange(a: &str, b: &str, for_a: u32, for_b: u32) -> SecretExchange {
        SecretExchange::new(id(a), id(b), ct(&[for_a]), ct(&[for_b])).unwrap()
    }

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let store = MemoryStore::new();
        let alice = Party::new(id("alice"), "Alice", 1000);

        assert_eq!(store.register_party(&alice).await.unwrap(), InsertResult::Inserted);

        let renamed = Party::new(id("alice"), "Someone Else", 2000);
        assert_eq!(
            store.register_party(&renamed).await.unwrap(),
            InsertResult::AlreadyExists
        );
        let stored = store.get_party(&id("alice")).await.unwrap().unwrap();
        assert_eq!(stored.display_name, "Alice");
    }

    #[tokio::test]
    async fn test_publish_unknown_party() {
        let store = MemoryStore::new();
        let key = PublicKey::new(BigUint::from(17u32), BigUint::from(3233u32)).unwrap();
        let result = store.publish_public_key(&id("ghost"), &key, 1000).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_upsert_overwrites_in_place() {
        let store = MemoryStore::new();

        let r1 = store
            .upsert_shared_secret(&exchange("alice", "bob", 1, 2), 1000)
            .await
            .unwrap();
        assert_eq!(r1, UpsertResult::Inserted);

        let r2 = store
            .upsert_shared_secret(&exchange("bob", "alice", 3, 4), 2000)
            .await
            .unwrap();
        assert_eq!(r2, UpsertResult::Updated);
        assert_eq!(store.count_shared_secrets().await.unwrap(), 1);

        let pair = PartyPair::new(&id("alice"), &id("bob")).unwrap();
        let record = store.get_shared_secret(&pair).await.unwrap().unwrap();
        assert_eq!(record.party_a, id("bob"));
        assert_eq!(record.party_b, id("alice"));
        assert_eq!(record.created_at, 1000);
        assert_eq!(record.updated_at, 2000);
        assert_eq!(record.secret_for(&id("bob")), Some(&ct(&[3])));
        assert_eq!(
            store.shared_secret_for(&id("alice"), &id("bob")).await.unwrap(),
            Some(ct(&[4]))
        );
    }

    #[tokio::test]
    async fn test_list_orders_by_update() {
        let store = MemoryStore::new();
        store
            .upsert_shared_secret(&exchange("alice", "bob", 1, 2), 1000)
            .await
            .unwrap();
        store
            .upsert_shared_secret(&exchange("carol", "alice", 5, 6), 3000)
            .await
            .unwrap();
        store
            .upsert_shared_secret(&exchange("bob", "carol", 7, 8), 2000)
            .await
            .unwrap();

        let records = store.list_shared_secrets(&id("alice")).await.unwrap();
        let counterparties: Vec<_> = records
            .iter()
            .map(|r| r.counterparty(&id("alice")).unwrap().clone())
            .collect();
        assert_eq!(counterparties, vec![id("carol"), id("bob")]);
        assert!(store.list_shared_secrets(&id("dave")).await.unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn test_one_record_per_pair(calls in prop::collection::vec((0usize..4, 0usize..4), 1..40)) {
            let names = ["p0", "p1", "p2", "p3"];
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let store = MemoryStore::new();
            let mut pairs = std::collections::HashSet::new();

            runtime.block_on(async {
                for (i, (a, b)) in calls.iter().enumerate() {
                    let Some(ex) = SecretExchange::new(id(names[*a]), id(names[*b]), ct(&[1]), ct(&[2])) else {
                        continue;
                    };
                    pairs.insert(ex.pair().clone());
                    store.upsert_shared_secret(&ex, i as i64).await.unwrap();
                }
            });

            let count = runtime.block_on(store.count_shared_secrets()).unwrap();
            prop_assert_eq!(count, pairs.len() as u64);
        }
    }
}
