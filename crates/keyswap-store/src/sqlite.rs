//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use keyswap_core::{Ciphertext, PartyId, PartyPair, PublicKey};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{
    InsertResult, Party, SecretExchange, SharedSecretRecord, Store, UpsertResult,
};

const SECRET_COLUMNS: &str = "pair_low, pair_high, party_a, party_b, secret_for_a, secret_for_b, \
                              created_at, updated_at";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        tracing::debug!(path = %path.display(), "opened sqlite store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn party_id_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<PartyId> {
    let raw: String = row.get(idx)?;
    PartyId::new(raw).map_err(|e| conversion_error(idx, e))
}

fn ciphertext_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Ciphertext> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_error(idx, e))
}

fn row_to_party(row: &Row<'_>) -> rusqlite::Result<Party> {
    let public_key = row
        .get::<_, Option<String>>(2)?
        .map(|json| PublicKey::from_json(&json))
        .transpose()
        .map_err(|e| conversion_error(2, e))?;

    Ok(Party {
        id: party_id_at(row, 0)?,
        display_name: row.get(1)?,
        public_key,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<SharedSecretRecord> {
    let low = party_id_at(row, 0)?;
    let high = party_id_at(row, 1)?;
    let pair = PartyPair::new(&low, &high).ok_or_else(|| {
        conversion_error(
            1,
            StoreError::InvalidData(format!("degenerate pair ({low}, {high})")),
        )
    })?;

    Ok(SharedSecretRecord {
        pair,
        party_a: party_id_at(row, 2)?,
        party_b: party_id_at(row, 3)?,
        secret_for_a: ciphertext_at(row, 4)?,
        secret_for_b: ciphertext_at(row, 5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn register_party(&self, party: &Party) -> Result<InsertResult> {
        let party = party.clone();

        self.run(move |conn| {
            let public_key = party.public_key.as_ref().map(PublicKey::to_json);
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO parties
                 (party_id, display_name, public_key, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    party.id.as_str(),
                    party.display_name,
                    public_key,
                    party.created_at,
                    party.updated_at,
                ],
            )?;

            Ok(if inserted == 0 {
                InsertResult::AlreadyExists
            } else {
                InsertResult::Inserted
            })
        })
        .await
    }

    async fn get_party(&self, id: &PartyId) -> Result<Option<Party>> {
        let id = id.clone();

        self.run(move |conn| {
            let party = conn
                .query_row(
                    "SELECT party_id, display_name, public_key, created_at, updated_at
                     FROM parties WHERE party_id = ?1",
                    params![id.as_str()],
                    row_to_party,
                )
                .optional()?;
            Ok(party)
        })
        .await
    }

    async fn publish_public_key(&self, id: &PartyId, key: &PublicKey, now: i64) -> Result<()> {
        let id = id.clone();
        let json = key.to_json();

        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE parties SET public_key = ?2, updated_at = ?3 WHERE party_id = ?1",
                params![id.as_str(), json, now],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Ok(())
        })
        .await
    }

    async fn get_shared_secret(&self, pair: &PartyPair) -> Result<Option<SharedSecretRecord>> {
        let pair = pair.clone();

        self.run(move |conn| {
            let record = conn
                .query_row(
                    &format!(
                        "SELECT {SECRET_COLUMNS} FROM shared_secrets
                         WHERE pair_low = ?1 AND pair_high = ?2"
                    ),
                    params![pair.low().as_str(), pair.high().as_str()],
                    row_to_record,
                )
                .optional()?;
            Ok(record)
        })
        .await
    }

    async fn upsert_shared_secret(
        &self,
        exchange: &SecretExchange,
        now: i64,
    ) -> Result<UpsertResult> {
        let exchange = exchange.clone();

        self.run(move |conn| {
            // IMMEDIATE takes the write lock up front so the existence check
            // and the write cannot interleave with another writer.
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let pair = exchange.pair();

            let existed: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM shared_secrets WHERE pair_low = ?1 AND pair_high = ?2)",
                params![pair.low().as_str(), pair.high().as_str()],
                |row| row.get(0),
            )?;

            tx.execute(
                "INSERT INTO shared_secrets
                 (pair_low, pair_high, party_a, party_b, secret_for_a, secret_for_b, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
                 ON CONFLICT(pair_low, pair_high) DO UPDATE SET
                     party_a = excluded.party_a,
                     party_b = excluded.party_b,
                     secret_for_a = excluded.secret_for_a,
                     secret_for_b = excluded.secret_for_b,
                     updated_at = excluded.updated_at",
                params![
                    pair.low().as_str(),
                    pair.high().as_str(),
                    exchange.party_a().as_str(),
                    exchange.party_b().as_str(),
                    exchange.secret_for_a().to_string(),
                    exchange.secret_for_b().to_string(),
                    now,
                ],
            )?;

            tx.commit()?;

            Ok(if existed {
                UpsertResult::Updated
            } else {
                UpsertResult::Inserted
            })
        })
        .await
    }

    async fn list_shared_secrets(&self, party: &PartyId) -> Result<Vec<SharedSecretRecord>> {
        let party = party.clone();

        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SECRET_COLUMNS} FROM shared_secrets
                 WHERE pair_low = ?1 OR pair_high = ?1
                 ORDER BY updated_at DESC, pair_low, pair_high"
            ))?;

            let records = stmt
                .query_map(params![party.as_str()], row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
        .await
    }

    async fn count_shared_secrets(&self) -> Result<u64> {
        self.run(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM shared_secrets", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }
}
