//! # keyswap store
//!
//! Storage abstraction for keyswap. Provides a trait-based interface for
//! party and shared-secret persistence with SQLite and in-memory
//! implementations.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`SharedSecretRecord`] - The single record kept per unordered pair
//!
//! ## Usage
//!
//! ```rust,no_run
//! use keyswap_store::{Party, SqliteStore, Store};
//! use keyswap_core::PartyId;
//!
//! async fn example() {
//!     let store = SqliteStore::open("keyswap.db").unwrap();
//!
//!     let alice = Party::new(PartyId::new("alice").unwrap(), "Alice", 0);
//!     store.register_party(&alice).await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Idempotent registration**: registering an existing id returns
//!   `AlreadyExists` and leaves the stored party untouched
//! - **Overwrite in place**: a new exchange for a pair replaces the previous
//!   one, including which party sits in slot A

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{
    InsertResult, Party, SecretExchange, SharedSecretRecord, Store, StoreExt, UpsertResult,
};
