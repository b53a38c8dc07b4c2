//! Repository layer: audit stamping over a raw storage backend.
//!
//! Creates get a fresh id, creation stamps and `version = 1`. Updates re-read
//! the current entity, merge, stamp `last_updated_*` and bump the version.
//! Absence reported by storage becomes a `NotFound` error here.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use models::{ActorId, Audited, AuditedPatch, Record, Upsert};
use tracing::debug;

use crate::clock::{Clock, IdGenerator, SystemClock, UuidGenerator};
use crate::errors::{not_found, ServiceResult, TaggedError};
use crate::storage::Storage;

#[async_trait]
pub trait Repository<R: Record>: Send + Sync {
    async fn get_all(&self) -> ServiceResult<Vec<Audited<R>>>;

    /// `NotFound` if no entity has this id.
    async fn get_by_id(&self, id: &str) -> ServiceResult<Audited<R>>;

    async fn create(&self, data: R) -> ServiceResult<Audited<R>>;

    /// Last-write-wins update. Two concurrent calls may both read the same
    /// version; the later write replaces every field of the earlier one.
    async fn update(&self, id: &str, patch: R::Patch) -> ServiceResult<Audited<R>>;

    /// Like [`Repository::update`], but fails with `VersionConflict` when the
    /// stored version is not `expected_version`. The check and the write are
    /// separate storage calls, so this detects stale writers without making
    /// the update atomic.
    async fn update_checked(
        &self,
        id: &str,
        expected_version: u64,
        patch: R::Patch,
    ) -> ServiceResult<Audited<R>>;

    /// With an id: full update of that entity (`NotFound` if absent).
    /// Without: create.
    async fn upsert(&self, item: Upsert<R>) -> ServiceResult<Audited<R>>;

    async fn delete(&self, id: &str) -> ServiceResult<bool>;

    async fn clear(&self) -> ServiceResult<()>;

    async fn exists(&self, id: &str) -> ServiceResult<bool>;

    async fn count(&self) -> ServiceResult<usize>;
}

pub struct AuditedRepository<R: Record, S: Storage<Audited<R>> + ?Sized = dyn Storage<Audited<R>>> {
    storage: Arc<S>,
    actor: ActorId,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record, S: Storage<Audited<R>> + ?Sized> AuditedRepository<R, S> {
    /// Wall clock and random UUID ids.
    pub fn new(storage: Arc<S>, actor: ActorId) -> Self {
        Self {
            storage,
            actor,
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidGenerator),
            _record: PhantomData,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn actor(&self) -> &ActorId { &self.actor }

    async fn write_update(
        &self,
        current: Audited<R>,
        patch: R::Patch,
    ) -> ServiceResult<Audited<R>> {
        let mut merged = current.data;
        merged.merge(patch);
        let next_version = current.version + 1;
        let stamped = AuditedPatch {
            last_updated_at: Some(self.clock.now()),
            last_updated_by: Some(self.actor.to_string()),
            version: Some(next_version),
            data: merged.to_patch(),
        };
        let updated = self
            .storage
            .update(&current.id, stamped)
            .await?
            .ok_or_else(|| not_found(R::NAME, &current.id))?;
        debug!(entity = R::NAME, id = %updated.id, version = updated.version, "entity updated");
        Ok(updated)
    }
}

#[async_trait]
impl<R: Record, S: Storage<Audited<R>> + ?Sized> Repository<R> for AuditedRepository<R, S> {
    async fn get_all(&self) -> ServiceResult<Vec<Audited<R>>> {
        self.storage.get_all().await
    }

    async fn get_by_id(&self, id: &str) -> ServiceResult<Audited<R>> {
        self.storage.get_by_id(id).await?.ok_or_else(|| not_found(R::NAME, id))
    }

    async fn create(&self, data: R) -> ServiceResult<Audited<R>> {
        let entity = Audited::new(self.ids.next_id(), self.clock.now(), &self.actor, data);
        let created = self.storage.create(entity).await?;
        debug!(entity = R::NAME, id = %created.id, actor = %self.actor, "entity created");
        Ok(created)
    }

    async fn update(&self, id: &str, patch: R::Patch) -> ServiceResult<Audited<R>> {
        let current = self.get_by_id(id).await?;
        self.write_update(current, patch).await
    }

    async fn update_checked(
        &self,
        id: &str,
        expected_version: u64,
        patch: R::Patch,
    ) -> ServiceResult<Audited<R>> {
        let current = self.get_by_id(id).await?;
        if current.version != expected_version {
            return Err(TaggedError::version_conflict(format!(
                "{} with ID {id} is at version {}, expected {expected_version}.",
                R::NAME,
                current.version
            )));
        }
        self.write_update(current, patch).await
    }

    async fn upsert(&self, item: Upsert<R>) -> ServiceResult<Audited<R>> {
        match item.id {
            Some(id) => self.update(&id, item.data.to_patch()).await,
            None => self.create(item.data).await,
        }
    }

    async fn delete(&self, id: &str) -> ServiceResult<bool> {
        self.storage.delete(id).await
    }

    async fn clear(&self) -> ServiceResult<()> {
        self.storage.clear().await
    }

    async fn exists(&self, id: &str) -> ServiceResult<bool> {
        self.storage.exists(id).await
    }

    async fn count(&self) -> ServiceResult<usize> {
        self.storage.count().await
    }
}
