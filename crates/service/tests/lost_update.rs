//! Concurrent updates are last-write-wins: two callers that read the same
//! version both succeed, and the later snapshot replaces the earlier one.

use std::sync::Arc;

use async_trait::async_trait;
use models::{ActorId, Entity, User, UserData, UserPatch, UserStatus};
use service::errors::ServiceResult;
use service::repository::{AuditedRepository, Repository};
use service::storage::{JsonFileStorage, MemoryStorage, Storage};
use tokio::sync::Barrier;

/// Holds every `get_by_id` until two callers have read, so both updates
/// start from the same version.
struct ReadGate<S> {
    inner: S,
    gate: Barrier,
}

impl<S> ReadGate<S> {
    fn new(inner: S) -> Self { Self { inner, gate: Barrier::new(2) } }
}

#[async_trait]
impl<S: Storage<User>> Storage<User> for ReadGate<S> {
    async fn get_all(&self) -> ServiceResult<Vec<User>> { self.inner.get_all().await }

    async fn get_by_id(&self, id: &str) -> ServiceResult<Option<User>> {
        let found = self.inner.get_by_id(id).await;
        self.gate.wait().await;
        found
    }

    async fn create(&self, item: User) -> ServiceResult<User> { self.inner.create(item).await }

    async fn update(&self, id: &str, patch: <User as Entity>::Patch) -> ServiceResult<Option<User>> {
        self.inner.update(id, patch).await
    }

    async fn upsert(&self, item: User) -> ServiceResult<User> { self.inner.upsert(item).await }
    async fn delete(&self, id: &str) -> ServiceResult<bool> { self.inner.delete(id).await }
    async fn clear(&self) -> ServiceResult<()> { self.inner.clear().await }
    async fn exists(&self, id: &str) -> ServiceResult<bool> { self.inner.exists(id).await }
    async fn count(&self) -> ServiceResult<usize> { self.inner.count().await }
}

fn actor() -> ActorId { ActorId::new("race-test").unwrap() }

fn ada() -> UserData {
    UserData {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        username: "ada".into(),
        email: "ada@example.com".into(),
        password: "hash".into(),
        status: UserStatus { is_active: true, is_verified: false, is_locked: false },
    }
}

fn first_name(v: &str) -> UserPatch { UserPatch { first_name: Some(v.into()), ..Default::default() } }
fn last_name(v: &str) -> UserPatch { UserPatch { last_name: Some(v.into()), ..Default::default() } }

async fn race_disjoint_updates<S>(store: S) -> Result<(), anyhow::Error>
where
    S: Storage<User> + Clone + 'static,
{
    let seed_repo = AuditedRepository::new(Arc::new(store.clone()), actor());
    let seeded = seed_repo.create(ada()).await?;

    let racing = AuditedRepository::new(Arc::new(ReadGate::new(store.clone())), actor());
    let (a, b) = tokio::join!(
        racing.update(&seeded.id, first_name("Alice")),
        racing.update(&seeded.id, last_name("Brown")),
    );
    let (a, b) = (a?, b?);
    assert_eq!(a.version, 2);
    assert_eq!(b.version, 2);

    let stored = seed_repo.get_by_id(&seeded.id).await?;
    assert_eq!(stored.version, 2, "two updates, one version bump");
    let kept_first = stored.data.first_name == "Alice";
    let kept_last = stored.data.last_name == "Brown";
    assert!(kept_first ^ kept_last, "exactly one caller's change survives: {stored:?}");
    Ok(())
}

#[tokio::test]
async fn memory_backend_loses_one_of_two_concurrent_updates() -> Result<(), anyhow::Error> {
    race_disjoint_updates(MemoryStorage::<User>::new()).await
}

#[tokio::test]
async fn file_backend_loses_one_of_two_concurrent_updates() -> Result<(), anyhow::Error> {
    let path = std::env::temp_dir().join(format!("lost_update_{}.json", uuid::Uuid::new_v4()));
    let result = race_disjoint_updates(JsonFileStorage::<User>::new(&path)).await;
    let _ = tokio::fs::remove_file(&path).await;
    result
}

#[tokio::test]
async fn checked_update_does_not_serialize_concurrent_writers() -> Result<(), anyhow::Error> {
    let store = MemoryStorage::<User>::new();
    let seed_repo = AuditedRepository::new(Arc::new(store.clone()), actor());
    let seeded = seed_repo.create(ada()).await?;

    let racing = AuditedRepository::new(Arc::new(ReadGate::new(store.clone())), actor());
    let (a, b) = tokio::join!(
        racing.update_checked(&seeded.id, 1, first_name("Alice")),
        racing.update_checked(&seeded.id, 1, last_name("Brown")),
    );
    // Both saw version 1 before either wrote.
    assert!(a.is_ok() && b.is_ok());

    // A caller that read before those writes is now rejected.
    let stale = seed_repo.update_checked(&seeded.id, 1, first_name("Late")).await;
    assert!(stale.unwrap_err().is(service::errors::ErrorKind::VersionConflict));
    Ok(())
}
