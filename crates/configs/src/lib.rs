use std::path::PathBuf;

use anyhow::{anyhow, Result};
use common::{LogFormat, LogLevel};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { backend: StorageBackend::Memory, path: default_store_path() }
    }
}

impl StorageConfig {
    pub fn memory() -> Self { Self::default() }

    pub fn file<P: Into<PathBuf>>(path: P) -> Self {
        Self { backend: StorageBackend::File, path: path.into() }
    }
}

/// Identity stamped into `created_by` / `last_updated_by`. Required: there
/// is no implicit fallback actor.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuditConfig {
    #[serde(default)]
    pub actor_id: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub format: LogFormat,
}

/// Argon2 cost parameters for stored password hashes.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
        }
    }
}

fn default_store_path() -> PathBuf { PathBuf::from("data/users.json") }
fn default_argon2_memory_kib() -> u32 { 19 * 1024 }
fn default_argon2_iterations() -> u32 { 2 }
fn default_argon2_parallelism() -> u32 { 1 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg = parse(&content)?;
    debug!(%path, "configuration file loaded");
    Ok(cfg)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.storage.normalize_from_env();
        self.storage.validate()?;
        self.audit.normalize_from_env();
        self.audit.validate()?;
        self.security.validate()?;
        Ok(())
    }
}

impl StorageConfig {
    /// `STORAGE_PATH` replaces the configured file path when set.
    pub fn normalize_from_env(&mut self) {
        if let Ok(path) = std::env::var("STORAGE_PATH") {
            if !path.trim().is_empty() {
                self.path = PathBuf::from(path);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend == StorageBackend::File && self.path.as_os_str().is_empty() {
            return Err(anyhow!("storage.path must be set when storage.backend = \"file\""));
        }
        Ok(())
    }
}

impl AuditConfig {
    /// Fall back to `AUDIT_ACTOR_ID` when the file leaves the actor empty.
    pub fn normalize_from_env(&mut self) {
        if self.actor_id.trim().is_empty() {
            if let Ok(actor) = std::env::var("AUDIT_ACTOR_ID") {
                self.actor_id = actor;
            }
        }
        self.actor_id = self.actor_id.trim().to_string();
    }

    pub fn validate(&self) -> Result<()> {
        if self.actor_id.is_empty() {
            return Err(anyhow!(
                "audit.actor_id is empty; set it in config.toml or the AUDIT_ACTOR_ID environment variable"
            ));
        }
        Ok(())
    }
}

impl SecurityConfig {
    pub fn validate(&self) -> Result<()> {
        if self.argon2_iterations == 0 || self.argon2_parallelism == 0 {
            return Err(anyhow!("security.argon2_iterations and argon2_parallelism must be >= 1"));
        }
        if self.argon2_memory_kib < 8u32.saturating_mul(self.argon2_parallelism) {
            return Err(anyhow!("security.argon2_memory_kib must be >= 8 * argon2_parallelism"));
        }
        Ok(())
    }
}
