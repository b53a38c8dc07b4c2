//! Generic service layer over any [`Repository`].
//!
//! Adds request-shape checks ahead of the repository; everything else passes
//! straight through.

use std::marker::PhantomData;
use std::sync::Arc;

use models::{Audited, Patch, Record, Upsert};
use tracing::{info, instrument, warn};

use crate::errors::{ServiceResult, TaggedError};
use crate::repository::Repository;

pub struct CrudService<R: Record, Repo: Repository<R> + ?Sized = dyn Repository<R>> {
    repo: Arc<Repo>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record, Repo: Repository<R> + ?Sized> Clone for CrudService<R, Repo> {
    fn clone(&self) -> Self {
        Self { repo: self.repo.clone(), _record: PhantomData }
    }
}

impl<R: Record, Repo: Repository<R> + ?Sized> CrudService<R, Repo> {
    pub fn new(repo: Arc<Repo>) -> Self { Self { repo, _record: PhantomData } }

    pub fn repository(&self) -> &Arc<Repo> { &self.repo }

    pub async fn get_all(&self) -> ServiceResult<Vec<Audited<R>>> {
        self.repo.get_all().await
    }

    pub async fn get_by_id(&self, id: &str) -> ServiceResult<Audited<R>> {
        self.repo.get_by_id(id).await
    }

    #[instrument(skip(self, data), fields(entity = R::NAME))]
    pub async fn create(&self, data: R) -> ServiceResult<Audited<R>> {
        let created = self.repo.create(data).await?;
        info!(id = %created.id, "entity_created");
        Ok(created)
    }

    /// Fails with `UpdateNotProvided` on an empty patch without touching storage.
    #[instrument(skip(self, patch), fields(entity = R::NAME))]
    pub async fn update(&self, id: &str, patch: R::Patch) -> ServiceResult<Audited<R>> {
        ensure_not_empty::<R>(id, &patch)?;
        let updated = self.repo.update(id, patch).await?;
        info!(version = updated.version, "entity_updated");
        Ok(updated)
    }

    #[instrument(skip(self, patch), fields(entity = R::NAME))]
    pub async fn update_checked(
        &self,
        id: &str,
        expected_version: u64,
        patch: R::Patch,
    ) -> ServiceResult<Audited<R>> {
        ensure_not_empty::<R>(id, &patch)?;
        let updated = self.repo.update_checked(id, expected_version, patch).await?;
        info!(version = updated.version, "entity_updated");
        Ok(updated)
    }

    pub async fn upsert(&self, item: Upsert<R>) -> ServiceResult<Audited<R>> {
        self.repo.upsert(item).await
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<bool> {
        self.repo.delete(id).await
    }

    pub async fn clear(&self) -> ServiceResult<()> {
        self.repo.clear().await
    }

    pub async fn exists(&self, id: &str) -> ServiceResult<bool> {
        self.repo.exists(id).await
    }

    pub async fn count(&self) -> ServiceResult<usize> {
        self.repo.count().await
    }
}

fn ensure_not_empty<R: Record>(id: &str, patch: &R::Patch) -> ServiceResult<()> {
    if patch.is_empty() {
        warn!(entity = R::NAME, id, "update without fields");
        return Err(TaggedError::update_not_provided(format!(
            "No fields provided to update {} with ID {id}.",
            R::NAME
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::repository::AuditedRepository;
    use crate::storage::MemoryStorage;
    use crate::test_support::{actor, sample_user};
    use models::{User, UserData, UserPatch};

    fn service() -> CrudService<UserData> {
        let storage: Arc<MemoryStorage<User>> = Arc::new(MemoryStorage::new());
        let repo: Arc<dyn Repository<UserData>> = Arc::new(AuditedRepository::new(storage, actor()));
        CrudService::new(repo)
    }

    #[tokio::test]
    async fn empty_update_is_rejected_without_mutation() -> Result<(), anyhow::Error> {
        let svc = service();
        let created = svc.create(sample_user("ada").into_user_data("h".into())).await?;

        let err = svc.update(&created.id, UserPatch::default()).await.unwrap_err();
        assert!(err.is(ErrorKind::UpdateNotProvided));
        assert_eq!(err.name(), "UpdateNotProvidedError");
        let err = svc.update_checked(&created.id, 1, UserPatch::default()).await.unwrap_err();
        assert!(err.is(ErrorKind::UpdateNotProvided));

        let stored = svc.get_by_id(&created.id).await?;
        assert_eq!(stored, created);
        Ok(())
    }

    #[tokio::test]
    async fn empty_update_on_missing_id_reports_empty_first() -> Result<(), anyhow::Error> {
        let svc = service();
        let err = svc.update("ghost", UserPatch::default()).await.unwrap_err();
        assert!(err.is(ErrorKind::UpdateNotProvided));
        let err = svc.update("ghost", UserPatch { last_name: Some("B".into()), ..Default::default() }).await.unwrap_err();
        assert!(err.is(ErrorKind::NotFound));
        Ok(())
    }

    #[tokio::test]
    async fn non_empty_update_reaches_repository() -> Result<(), anyhow::Error> {
        let svc = service();
        let created = svc.create(sample_user("ada").into_user_data("h".into())).await?;
        let updated = svc
            .update(&created.id, UserPatch { last_name: Some("Byron".into()), ..Default::default() })
            .await?;
        assert_eq!(updated.version, 2);
        assert_eq!(updated.data.last_name, "Byron");
        assert_eq!(svc.count().await?, 1);
        let clone = svc.clone();
        assert!(clone.exists(&created.id).await?);
        Ok(())
    }
}
