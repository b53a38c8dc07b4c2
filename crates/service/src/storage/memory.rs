use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use models::{Entity, Id};
use tokio::sync::RwLock;

use super::Storage;
use crate::errors::ServiceResult;

/// In-process key-value table. Lives as long as the process.
///
/// Clone-friendly via Arc: clones share the same table. Each operation holds
/// the lock only for its own duration.
#[derive(Clone)]
pub struct MemoryStorage<T> {
    inner: Arc<RwLock<HashMap<Id, T>>>,
}

impl<T> Default for MemoryStorage<T> {
    fn default() -> Self {
        Self { inner: Arc::new(RwLock::new(HashMap::new())) }
    }
}

impl<T> MemoryStorage<T> {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl<T: Entity> Storage<T> for MemoryStorage<T> {
    async fn get_all(&self) -> ServiceResult<Vec<T>> {
        let map = self.inner.read().await;
        Ok(map.values().cloned().collect())
    }

    async fn get_by_id(&self, id: &str) -> ServiceResult<Option<T>> {
        let map = self.inner.read().await;
        Ok(map.get(id).cloned())
    }

    async fn create(&self, item: T) -> ServiceResult<T> {
        let mut map = self.inner.write().await;
        map.insert(item.id().to_string(), item.clone());
        Ok(item)
    }

    async fn update(&self, id: &str, patch: T::Patch) -> ServiceResult<Option<T>> {
        let mut map = self.inner.write().await;
        let Some(existing) = map.get_mut(id) else {
            return Ok(None);
        };
        existing.merge(patch);
        Ok(Some(existing.clone()))
    }

    async fn upsert(&self, item: T) -> ServiceResult<T> {
        let mut map = self.inner.write().await;
        map.insert(item.id().to_string(), item.clone());
        Ok(item)
    }

    async fn delete(&self, id: &str) -> ServiceResult<bool> {
        let mut map = self.inner.write().await;
        Ok(map.remove(id).is_some())
    }

    async fn clear(&self) -> ServiceResult<()> {
        self.inner.write().await.clear();
        Ok(())
    }

    async fn exists(&self, id: &str) -> ServiceResult<bool> {
        Ok(self.inner.read().await.contains_key(id))
    }

    async fn count(&self) -> ServiceResult<usize> {
        Ok(self.inner.read().await.len())
    }
}
