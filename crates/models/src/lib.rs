//! Domain types: identity and audit contracts, the user record and its
//! declarative input schemas.

pub mod errors;
pub mod shared;
pub mod user;
pub mod validation;

pub use errors::{Constraint, ValidationIssue};
pub use shared::{ActorId, Audited, AuditedPatch, Entity, Id, Identifiable, Patch, Record, Upsert};
pub use user::{CreateUserInput, UpdateUserInput, UpsertUserInput, User, UserData, UserPatch, UserStatus};
