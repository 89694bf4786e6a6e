//! Keyed relationship store.
//!
//! The directory talks to persistence only through [`RelationshipStore`]:
//! four point operations on the composite key `(user_id, contact_id)`.
//! Each call is atomic for its single key; nothing here spans keys.
//!
//! Sub-modules:
//! - `memory`: `MemoryStore`, an in-process map.
//! - `schema`: SQLite DDL definitions.
//! - `sqlite`: `SqliteStore`, a single-file SQLite database.

pub mod memory;
pub(crate) mod schema;
pub mod sqlite;

use async_trait::async_trait;
use checkin_core::{Relationship, RelationshipKey, UpdateSpec, UpdatedAttributes};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Point operations against a relationship store.
///
/// Implementations must be `Send + Sync`; the HTTP layer shares one store
/// across concurrent requests.
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    /// Upsert `item` under its own key, overwriting any existing item.
    async fn put(&self, item: &Relationship) -> Result<(), StoreError>;

    /// Point lookup. `Ok(None)` on a miss.
    async fn get(&self, key: &RelationshipKey) -> Result<Option<Relationship>, StoreError>;

    /// Apply only the assignments in `spec` and return the post-update
    /// values of the touched attributes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no item exists under `key`.
    async fn update(
        &self,
        key: &RelationshipKey,
        spec: &UpdateSpec,
    ) -> Result<UpdatedAttributes, StoreError>;

    /// Remove the item under `key`. Succeeds whether or not it existed.
    async fn delete(&self, key: &RelationshipKey) -> Result<(), StoreError>;
}

/// Errors from a store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(String),

    /// The database was written by a newer schema, or its stamp is unreadable.
    #[error("unsupported schema: {0}")]
    Schema(String),

    /// A blocking store task panicked or was cancelled.
    #[error("store task failed: {0}")]
    Task(String),

    #[error("item not found: {0}")]
    NotFound(RelationshipKey),

    #[error("lock poisoned: {0}")]
    Lock(String),

    /// A stored row could not be decoded into a relationship.
    #[error("corrupt item {key}: {reason}")]
    Corrupt { key: RelationshipKey, reason: String },
}
