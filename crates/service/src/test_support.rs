#![cfg(test)]
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use models::{ActorId, CreateUserInput, Entity, Identifiable, Patch, User, UserData, UserStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::{ManualClock, SequentialIds};
use crate::repository::{AuditedRepository, Repository};
use crate::storage::MemoryStorage;
use crate::user::{Argon2Hasher, PasswordConfig, UserService};

/// Minimal storable value for backend tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doc {
    pub id: String,
    pub version: u64,
    pub title: String,
    pub tags: Vec<String>,
}

impl Doc {
    pub fn new(id: &str, title: &str) -> Self {
        Self { id: id.into(), version: 1, title: title.into(), tags: vec![] }
    }
}

impl Identifiable for Doc {
    fn id(&self) -> &str { &self.id }
}

#[derive(Debug, Clone, Default)]
pub struct DocPatch {
    pub title: Option<String>,
    pub version: Option<u64>,
    pub tags: Option<Vec<String>>,
}

impl Patch for DocPatch {
    fn is_empty(&self) -> bool { self.title.is_none() && self.version.is_none() && self.tags.is_none() }
}

impl Entity for Doc {
    type Patch = DocPatch;

    fn merge(&mut self, patch: DocPatch) {
        if let Some(title) = patch.title { self.title = title; }
        if let Some(version) = patch.version { self.version = version; }
        if let Some(tags) = patch.tags { self.tags = tags; }
    }
}

/// Unique, not-yet-existing file path under the system temp dir.
pub fn temp_store_path(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("crud_store_{tag}_{}.json", Uuid::new_v4()))
}

/// Cheapest argon2 parameters, so hashing does not dominate test time.
pub fn fast_password_config() -> PasswordConfig {
    PasswordConfig { memory_kib: 8, iterations: 1, parallelism: 1 }
}

pub fn actor() -> ActorId {
    ActorId::new("test-actor").expect("valid actor")
}

pub fn fixed_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()))
}

pub fn sample_user(username: &str) -> CreateUserInput {
    CreateUserInput {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        username: username.into(),
        email: format!("{username}@example.com"),
        password: "correct horse".into(),
        status: UserStatus { is_active: true, is_verified: true, is_locked: false },
    }
}

/// Memory-backed user service with a manual clock and `user-N` ids.
pub fn memory_user_service() -> (UserService, Arc<ManualClock>) {
    let clock = fixed_clock();
    let storage: Arc<MemoryStorage<User>> = Arc::new(MemoryStorage::new());
    let repo: Arc<dyn Repository<UserData>> = Arc::new(
        AuditedRepository::new(storage, actor())
            .with_clock(clock.clone())
            .with_id_generator(Arc::new(SequentialIds::new("user"))),
    );
    let hasher = Argon2Hasher::new(&fast_password_config()).expect("valid argon2 params");
    (UserService::new(repo, hasher), clock)
}
