//! Storage abstractions for service layer
//!
//! The lowest layer: raw persistence of identifiable values with no domain
//! awareness. Absence is reported as `None` / `false`, never as an error;
//! errors are reserved for fatal backend failures (`Database`).

use async_trait::async_trait;
use models::Entity;

use crate::errors::ServiceResult;

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStorage;
pub use memory::MemoryStorage;

/// Key-value persistence for one entity type, keyed by `Identifiable::id`.
///
/// Callers always receive independent copies. No operation is atomic with
/// respect to any other: concurrent read-modify-write cycles lose updates.
#[async_trait]
pub trait Storage<T: Entity>: Send + Sync {
    /// Snapshot of every stored item. Order is unspecified.
    async fn get_all(&self) -> ServiceResult<Vec<T>>;

    async fn get_by_id(&self, id: &str) -> ServiceResult<Option<T>>;

    /// Store under `item.id()`. An existing item with that id is silently
    /// overwritten.
    async fn create(&self, item: T) -> ServiceResult<T>;

    /// Merge `patch` onto the stored item. `None` if `id` is absent; never creates.
    async fn update(&self, id: &str, patch: T::Patch) -> ServiceResult<Option<T>>;

    async fn upsert(&self, item: T) -> ServiceResult<T>;

    /// True iff an item existed and was removed.
    async fn delete(&self, id: &str) -> ServiceResult<bool>;

    async fn clear(&self) -> ServiceResult<()>;

    async fn exists(&self, id: &str) -> ServiceResult<bool>;

    async fn count(&self) -> ServiceResult<usize>;
}
