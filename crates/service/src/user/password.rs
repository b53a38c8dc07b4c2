use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use configs::SecurityConfig;
use rand::rngs::OsRng;

use crate::errors::{ServiceResult, TaggedError};

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl From<&SecurityConfig> for PasswordConfig {
    fn from(cfg: &SecurityConfig) -> Self {
        Self {
            memory_kib: cfg.argon2_memory_kib,
            iterations: cfg.argon2_iterations,
            parallelism: cfg.argon2_parallelism,
        }
    }
}

/// Hashes new passwords with the configured cost; verifies against whatever
/// parameters are encoded in the stored PHC string.
#[derive(Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new(cfg: &PasswordConfig) -> ServiceResult<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| TaggedError::validation(format!("invalid argon2 parameters: {e}")))?;
        Ok(Self { argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params) })
    }

    pub fn hash(&self, password: &str) -> ServiceResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| TaggedError::authentication(format!("password hashing failed: {e}")))
    }

    /// `Ok(false)` on mismatch; `Err` only when `hash` is not a valid PHC string.
    pub fn verify(&self, password: &str, hash: &str) -> ServiceResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| {
                TaggedError::authentication(format!("stored password hash is unreadable: {e}"))
            })?;
        Ok(self.argon2.verify_password(password.as_bytes(), &parsed).is_ok())
    }
}
