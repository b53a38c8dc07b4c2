//! Service layer providing generic, audited CRUD on top of `models`.
//! - `storage`: raw key-value persistence (memory, JSON file).
//! - `repository`: audit stamping and not-found translation.
//! - `service` / `user`: request-shape checks and domain use cases.

pub mod clock;
pub mod errors;
pub mod repository;
pub mod runtime;
pub mod service;
pub mod storage;
#[cfg(test)]
pub mod test_support;
pub mod user;

pub use repository::{AuditedRepository, Repository};
pub use service::CrudService;
pub use storage::{JsonFileStorage, MemoryStorage, Storage};
pub use user::UserService;
