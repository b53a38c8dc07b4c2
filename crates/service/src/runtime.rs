//! Runtime wiring
//!
//! Builds the storage → repository → service stack from `configs::AppConfig`
//! so binaries do not assemble layers by hand.

use std::sync::Arc;

use anyhow::Context;
use configs::{AppConfig, StorageBackend, StorageConfig};
use models::{ActorId, Entity, User, UserData};
use tracing::info;

use crate::repository::{AuditedRepository, Repository};
use crate::storage::{JsonFileStorage, MemoryStorage, Storage};
use crate::user::{Argon2Hasher, PasswordConfig, UserService};

/// Open the configured backend. For the file backend the parent directory is
/// created if missing; the file itself is created on first write.
pub async fn open_storage<T: Entity>(cfg: &StorageConfig) -> anyhow::Result<Arc<dyn Storage<T>>> {
    match cfg.backend {
        StorageBackend::Memory => {
            info!(backend = "memory", "storage opened");
            Ok(Arc::new(MemoryStorage::<T>::new()))
        }
        StorageBackend::File => {
            common::env::ensure_data_dir(&cfg.path).await?;
            info!(backend = "file", path = %cfg.path.display(), "storage opened");
            Ok(Arc::new(JsonFileStorage::<T>::new(&cfg.path)))
        }
    }
}

pub async fn build_user_service(cfg: &AppConfig) -> anyhow::Result<UserService> {
    let actor = ActorId::new(cfg.audit.actor_id.as_str()).context("audit.actor_id")?;
    let storage = open_storage::<User>(&cfg.storage).await?;
    let repo: Arc<dyn Repository<UserData>> =
        Arc::new(AuditedRepository::<UserData>::new(storage, actor));
    let hasher = Argon2Hasher::new(&PasswordConfig::from(&cfg.security)).context("security")?;
    Ok(UserService::new(repo, hasher))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_user, temp_store_path};

    fn config(storage: StorageConfig) -> AppConfig {
        let mut cfg = AppConfig { storage, ..Default::default() };
        cfg.audit.actor_id = "runtime-test".into();
        cfg.security.argon2_memory_kib = 8;
        cfg.security.argon2_iterations = 1;
        cfg
    }

    #[tokio::test]
    async fn memory_backend_starts_empty() -> Result<(), anyhow::Error> {
        let store = open_storage::<User>(&StorageConfig::memory()).await?;
        assert_eq!(store.count().await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn file_backend_creates_parent_directory() -> Result<(), anyhow::Error> {
        let dir = temp_store_path("runtime_dir").with_extension("");
        let path = dir.join("users.json");
        let store = open_storage::<User>(&StorageConfig::file(&path)).await?;
        assert!(tokio::fs::metadata(&dir).await?.is_dir());
        assert!(store.get_all().await?.is_empty());
        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn user_service_uses_configured_actor() -> Result<(), anyhow::Error> {
        let svc = build_user_service(&config(StorageConfig::memory())).await?;
        let user = svc.create(sample_user("ada")).await?;
        assert_eq!(user.created_by, "runtime-test");
        Ok(())
    }

    #[tokio::test]
    async fn missing_actor_is_rejected() {
        let mut cfg = config(StorageConfig::memory());
        cfg.audit.actor_id = "  ".into();
        assert!(build_user_service(&cfg).await.is_err());
    }
}
