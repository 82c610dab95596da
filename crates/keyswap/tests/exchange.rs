//! End-to-end exchange behaviour against both store backends.

use std::collections::HashSet;

use keyswap::core::{KeygenConfig, PartyPair};
use keyswap::store::{MemoryStore, SqliteStore, Store};
use keyswap::{KeyExchange, KeyswapConfig, KeyswapError, SharedSecret, SlotPolicy};
use keyswap_testkit::generators::{distinct_plaintext, exchange_calls, plaintext};
use keyswap_testkit::{TestFixture, TestParty};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn sqlite_fixture(seed: u64) -> TestFixture<SqliteStore> {
    let store = SqliteStore::open_memory().expect("open sqlite");
    TestFixture::with_store(store, KeyswapConfig::default(), seed)
}

fn memory_fixture(seed: u64) -> TestFixture<MemoryStore> {
    TestFixture::with_store(MemoryStore::new(), KeyswapConfig::default(), seed)
}

async fn recover_both<S: Store>(
    fixture: &TestFixture<S>,
    a: &TestParty,
    b: &TestParty,
) -> anyhow::Result<(SharedSecret, SharedSecret)> {
    let for_a = fixture.service.request_key_exchange(&a.id, &b.id).await?;
    let secret_a = SharedSecret::recover(&for_a, a.keypair.private_key())?;

    let listing = fixture
        .service
        .list_keys(&b.id)
        .await?
        .into_iter()
        .find(|l| l.counterparty == a.id)
        .ok_or_else(|| anyhow::anyhow!("no listing for {}", a.id))?;
    let secret_b = SharedSecret::recover(&listing.encrypted_secret, b.keypair.private_key())?;

    Ok((secret_a, secret_b))
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared scenarios, run once per backend
// ─────────────────────────────────────────────────────────────────────────────

async fn both_parties_recover_same_secret<S: Store>(mut fixture: TestFixture<S>) -> anyhow::Result<()> {
    let alice = fixture.add_party("alice").await?;
    let bob = fixture.add_party("bob").await?;

    let (a, b) = recover_both(&fixture, &alice, &bob).await?;
    assert_eq!(a, b);
    assert!((1..=26).contains(&a.value()));
    Ok(())
}

async fn either_order_hits_one_record<S: Store>(mut fixture: TestFixture<S>) -> anyhow::Result<()> {
    let alice = fixture.add_party("alice").await?;
    let bob = fixture.add_party("bob").await?;

    fixture.service.request_key_exchange(&alice.id, &bob.id).await?;
    fixture.service.request_key_exchange(&bob.id, &alice.id).await?;
    assert_eq!(fixture.service.exchange_count().await?, 1);

    // The last caller holds slot A.
    let pair = PartyPair::new(&alice.id, &bob.id).expect("distinct");
    let record = fixture
        .service
        .store()
        .get_shared_secret(&pair)
        .await?
        .expect("record");
    assert_eq!(record.party_a, bob.id);
    assert_eq!(record.party_b, alice.id);

    let (a, b) = recover_both(&fixture, &bob, &alice).await?;
    assert_eq!(a, b);
    Ok(())
}

async fn missing_key_creates_nothing<S: Store>(mut fixture: TestFixture<S>) -> anyhow::Result<()> {
    let alice = fixture.add_party("alice").await?;
    let bob = fixture.register("bob").await?;

    let result = fixture.service.request_key_exchange(&alice.id, &bob).await;
    assert!(matches!(result, Err(KeyswapError::MissingPublicKey(ref p)) if *p == bob));

    let result = fixture.service.request_key_exchange(&bob, &alice.id).await;
    assert!(matches!(result, Err(KeyswapError::MissingPublicKey(ref p)) if *p == bob));

    assert_eq!(fixture.service.exchange_count().await?, 0);
    assert!(fixture.service.list_keys(&alice.id).await?.is_empty());
    Ok(())
}

async fn successive_exchanges_overwrite<S: Store>(mut fixture: TestFixture<S>) -> anyhow::Result<()> {
    let alice = fixture.add_party("alice").await?;
    let bob = fixture.add_party("bob").await?;
    let pair = PartyPair::new(&alice.id, &bob.id).expect("distinct");

    fixture.service.request_key_exchange(&alice.id, &bob.id).await?;
    let first = fixture.service.store().get_shared_secret(&pair).await?.expect("record");

    // Encryption is deterministic, so the stored halves only change when a
    // different secret is drawn. With 26 values that happens quickly.
    let mut changed = false;
    for _ in 0..32 {
        fixture.service.request_key_exchange(&alice.id, &bob.id).await?;
        let next = fixture.service.store().get_shared_secret(&pair).await?.expect("record");
        assert_eq!(fixture.service.exchange_count().await?, 1);
        assert_eq!(next.created_at, first.created_at);
        if next.secret_for_a != first.secret_for_a {
            assert_ne!(next.secret_for_b, first.secret_for_b);
            changed = true;
            break;
        }
    }
    assert!(changed, "secret never changed across exchanges");
    Ok(())
}

async fn list_keys_per_counterparty<S: Store>(mut fixture: TestFixture<S>) -> anyhow::Result<()> {
    let parties = fixture.add_parties(4).await?;
    let hub = &parties[0];

    for other in &parties[1..] {
        fixture.service.request_key_exchange(&other.id, &hub.id).await?;
        // Distinct update times for a deterministic order.
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let listings = fixture.service.list_keys(&hub.id).await?;
    let counterparties: Vec<_> = listings.iter().map(|l| l.counterparty.clone()).collect();
    let expected: Vec<_> = parties[1..].iter().rev().map(|p| p.id.clone()).collect();
    assert_eq!(counterparties, expected);

    for listing in &listings {
        let secret = SharedSecret::recover(&listing.encrypted_secret, hub.keypair.private_key())?;
        assert!((1..=26).contains(&secret.value()));
    }
    assert_eq!(listings[0].counterparty_name, "Party-3");
    Ok(())
}

macro_rules! on_both_stores {
    ($($name:ident),* $(,)?) => {
        mod memory {
            use super::*;
            $(
                #[tokio::test]
                async fn $name() -> anyhow::Result<()> {
                    init_tracing();
                    super::$name(memory_fixture(11)).await
                }
            )*
        }

        mod sqlite {
            use super::*;
            $(
                #[tokio::test]
                async fn $name() -> anyhow::Result<()> {
                    init_tracing();
                    super::$name(sqlite_fixture(11)).await
                }
            )*
        }
    };
}

on_both_stores!(
    both_parties_recover_same_secret,
    either_order_hits_one_record,
    missing_key_creates_nothing,
    successive_exchanges_overwrite,
    list_keys_per_counterparty,
);

// ─────────────────────────────────────────────────────────────────────────────
// Single-backend tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_self_exchange_rejected() {
    let mut fixture = TestFixture::new();
    let alice = fixture.add_party("alice").await.unwrap();

    let result = fixture.service.request_key_exchange(&alice.id, &alice.id).await;
    assert!(matches!(result, Err(KeyswapError::SelfExchange(_))));
    assert_eq!(fixture.service.exchange_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_party_rejected() {
    let mut fixture = TestFixture::new();
    let alice = fixture.add_party("alice").await.unwrap();
    let ghost = keyswap::PartyId::new("ghost").unwrap();

    let result = fixture.service.request_key_exchange(&alice.id, &ghost).await;
    assert!(matches!(result, Err(KeyswapError::PartyNotFound(p)) if p == ghost));
    assert!(matches!(
        fixture.service.list_keys(&ghost).await,
        Err(KeyswapError::PartyNotFound(_))
    ));
}

#[tokio::test]
async fn test_secrets_stay_in_range() {
    let mut fixture = TestFixture::with_seed(3);
    let alice = fixture.add_party("alice").await.unwrap();
    let bob = fixture.add_party("bob").await.unwrap();

    let mut seen = HashSet::new();
    for _ in 0..200 {
        let (a, b) = recover_both(&fixture, &alice, &bob).await.unwrap();
        assert_eq!(a, b);
        assert!((1..=26).contains(&a.value()));
        seen.insert(a.value());
    }
    assert!(seen.len() > 20);
}

#[tokio::test]
async fn test_canonical_slots_do_not_flip() {
    let store = MemoryStore::new();
    let config = KeyswapConfig {
        slot_policy: SlotPolicy::Canonical,
        ..KeyswapConfig::default()
    };
    let mut fixture = TestFixture::with_store(store, config, 5);
    let alice = fixture.add_party("alice").await.unwrap();
    let bob = fixture.add_party("bob").await.unwrap();
    let pair = PartyPair::new(&alice.id, &bob.id).unwrap();

    for (x, y) in [(&bob, &alice), (&alice, &bob), (&bob, &alice)] {
        let (a, b) = recover_both(&fixture, x, y).await.unwrap();
        assert_eq!(a, b);
        let record = fixture.service.store().get_shared_secret(&pair).await.unwrap().unwrap();
        assert_eq!(record.party_a, alice.id);
    }
}

#[tokio::test]
async fn test_sqlite_file_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keyswap.db");

    let (alice, bob, for_alice) = {
        let store = SqliteStore::open(&path).unwrap();
        let mut fixture = TestFixture::with_store(store, KeyswapConfig::default(), 8);
        let alice = fixture.add_party("alice").await.unwrap();
        let bob = fixture.add_party("bob").await.unwrap();
        let for_alice = fixture
            .service
            .request_key_exchange(&alice.id, &bob.id)
            .await
            .unwrap();
        (alice, bob, for_alice)
    };

    let service = KeyExchange::new(SqliteStore::open(&path).unwrap(), KeyswapConfig::default());
    let listing = service.list_keys(&bob.id).await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].counterparty, alice.id);

    let a = SharedSecret::recover(&for_alice, alice.keypair.private_key()).unwrap();
    let b = SharedSecret::recover(&listing[0].encrypted_secret, bob.keypair.private_key()).unwrap();
    assert_eq!(a, b);
    assert_eq!(service.public_key(&alice.id).await.unwrap(), *alice.keypair.public_key());
}

#[tokio::test]
async fn test_concurrent_exchanges_one_record() {
    let mut fixture = TestFixture::with_store(
        SqliteStore::open_memory().unwrap(),
        KeyswapConfig::default(),
        21,
    );
    let alice = fixture.add_party("alice").await.unwrap();
    let bob = fixture.add_party("bob").await.unwrap();
    let service = std::sync::Arc::new(fixture.service);

    let mut handles = Vec::new();
    for i in 0..12 {
        let service = service.clone();
        let (x, y) = if i % 2 == 0 {
            (alice.id.clone(), bob.id.clone())
        } else {
            (bob.id.clone(), alice.id.clone())
        };
        handles.push(tokio::spawn(async move {
            service.request_key_exchange(&x, &y).await.unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(service.exchange_count().await.unwrap(), 1);

    // Whatever write won, its two halves carry the same secret.
    let pair = PartyPair::new(&alice.id, &bob.id).unwrap();
    let record = service.store().get_shared_secret(&pair).await.unwrap().unwrap();
    let for_a = record.secret_for(&alice.id).unwrap();
    let for_b = record.secret_for(&bob.id).unwrap();
    assert_eq!(
        SharedSecret::recover(for_a, alice.keypair.private_key()).unwrap(),
        SharedSecret::recover(for_b, bob.keypair.private_key()).unwrap()
    );
}

/// Full-size keys: 512-bit primes for both parties, generated by the service.
#[tokio::test]
async fn test_full_size_keys() {
    init_tracing();
    let config = KeyswapConfig {
        keygen: KeygenConfig {
            prime_bits: 512,
            ..KeygenConfig::default()
        },
        ..KeyswapConfig::default()
    };
    let service = KeyExchange::with_rng(MemoryStore::new(), config, StdRng::seed_from_u64(512));
    let alice = keyswap::PartyId::new("alice").unwrap();
    let bob = keyswap::PartyId::new("bob").unwrap();
    service.register_party(&alice, "Alice").await.unwrap();
    service.register_party(&bob, "Bob").await.unwrap();

    let alice_keys = service.generate_keypair().await.unwrap();
    let bob_keys = service.generate_keypair().await.unwrap();
    assert!(alice_keys.public_key().modulus().bits() >= 1023);
    assert_ne!(alice_keys.public_key(), bob_keys.public_key());

    service.publish_public_key(&alice, alice_keys.public_key()).await.unwrap();
    service.publish_public_key(&bob, bob_keys.public_key()).await.unwrap();

    let for_alice = service.request_key_exchange(&alice, &bob).await.unwrap();
    let listing = service.list_keys(&bob).await.unwrap();

    let a = alice_keys.private_key().decrypt(&for_alice).unwrap();
    let b = bob_keys.private_key().decrypt(&listing[0].encrypted_secret).unwrap();
    assert_eq!(a, b);
    let value: u8 = a.parse().unwrap();
    assert!((1..=26).contains(&value));
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────────

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_roundtrip_below_modulus(text in plaintext(0x1_0000, 24)) {
        let mut fixture = TestFixture::with_seed(17);
        let keypair = fixture.keypair().unwrap();

        let encrypted = keypair.public_key().encrypt(&text);
        prop_assert_eq!(encrypted.len(), text.chars().count());
        let text_form = encrypted.to_string();
        prop_assert_eq!(keypair.private_key().decrypt_str(&text_form).unwrap(), text);
    }

    #[test]
    fn prop_rotation_changes_plaintext(text in distinct_plaintext(0x1_0000, 12)) {
        let mut fixture = TestFixture::with_seed(23);
        let keypair = fixture.keypair().unwrap();

        let mut values = keypair.public_key().encrypt(&text).into_values();
        values.rotate_left(1);
        let rotated = keyswap::Ciphertext::from_values(values);
        let decrypted = keypair.private_key().decrypt(&rotated).unwrap();

        prop_assert_ne!(&decrypted, &text);
        let mut expected: Vec<char> = text.chars().collect();
        expected.rotate_left(1);
        prop_assert_eq!(decrypted, expected.into_iter().collect::<String>());
    }

    #[test]
    fn prop_one_record_per_pair(calls in exchange_calls(4, 16)) {
        let rt = runtime();
        let (count, pairs) = rt.block_on(async {
            let mut fixture = TestFixture::new();
            let parties = fixture.add_parties(4).await.unwrap();
            let mut pairs = HashSet::new();

            for (x, y) in &calls {
                let result = fixture
                    .service
                    .request_key_exchange(&parties[*x].id, &parties[*y].id)
                    .await;
                if x == y {
                    assert!(matches!(result, Err(KeyswapError::SelfExchange(_))));
                } else {
                    result.unwrap();
                    pairs.insert(PartyPair::new(&parties[*x].id, &parties[*y].id).unwrap());
                }
            }
            (fixture.service.exchange_count().await.unwrap(), pairs)
        });
        prop_assert_eq!(count, pairs.len() as u64);
    }
}
