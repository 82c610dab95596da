//! Database schema migrations for SQLite.
//!
//! Each migration is a SQL batch that moves the schema from version N to
//! N+1. Applied versions are recorded in `schema_migrations`.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {current} is newer than supported version {CURRENT_VERSION}"
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
            tracing::info!(version, "applied schema migration");
        }

        tx.commit()?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: parties and shared secrets.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE parties (
            party_id TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            public_key TEXT,                  -- JSON {"e": "...", "n": "..."}, NULL until published
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        -- One row per unordered pair. pair_low/pair_high is the sorted pair;
        -- party_a/party_b is the slot order chosen by the last writer.
        CREATE TABLE shared_secrets (
            pair_low TEXT NOT NULL,
            pair_high TEXT NOT NULL,
            party_a TEXT NOT NULL,
            party_b TEXT NOT NULL,
            secret_for_a TEXT NOT NULL,       -- comma-separated decimal ciphertext
            secret_for_b TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,

            PRIMARY KEY (pair_low, pair_high),
            CHECK (pair_low < pair_high)
        );

        CREATE INDEX idx_shared_secrets_low ON shared_secrets(pair_low);
        CREATE INDEX idx_shared_secrets_high ON shared_secrets(pair_high);
        CREATE INDEX idx_shared_secrets_updated ON shared_secrets(updated_at);
        "#,
    )?;

    Ok(())
}

/// Current time in Unix milliseconds. A clock before the epoch reads as 0.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
