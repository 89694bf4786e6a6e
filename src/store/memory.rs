//! In-process relationship store.

use std::collections::HashMap;

use async_trait::async_trait;
use checkin_core::{Relationship, RelationshipKey, UpdateSpec, UpdatedAttributes};
use tokio::sync::RwLock;

use super::{RelationshipStore, StoreError};

/// A `HashMap` behind an async `RwLock`.
///
/// Each operation holds the lock for exactly one key's read or write, which
/// gives the same single-item atomicity the trait promises.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<RelationshipKey, Relationship>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl RelationshipStore for MemoryStore {
    async fn put(&self, item: &Relationship) -> Result<(), StoreError> {
        self.items.write().await.insert(item.key(), item.clone());
        Ok(())
    }

    async fn get(&self, key: &RelationshipKey) -> Result<Option<Relationship>, StoreError> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn update(
        &self,
        key: &RelationshipKey,
        spec: &UpdateSpec,
    ) -> Result<UpdatedAttributes, StoreError> {
        let mut items = self.items.write().await;
        let item = items
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        spec.apply_to(item);
        Ok(spec.read_back(item))
    }

    async fn delete(&self, key: &RelationshipKey) -> Result<(), StoreError> {
        self.items.write().await.remove(key);
        Ok(())
    }
}
