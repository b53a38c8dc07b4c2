//! User domain services.

pub mod password;
pub mod service;

pub use password::{Argon2Hasher, PasswordConfig};
pub use service::UserService;
