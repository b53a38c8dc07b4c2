use std::error::Error as _;

use common::{critical, init_logging, ErrorKind, TaggedError};
use configs::{AppConfig, StorageConfig};
use dotenvy::dotenv;
use serde_json::json;
use service::user::UserService;
use tracing::{error, info, warn};
use uuid::Uuid;

fn load_config() -> AppConfig {
    match AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            // No config file: in-memory store, actor from env or the demo default.
            let mut cfg = AppConfig { storage: StorageConfig::memory(), ..Default::default() };
            cfg.audit.actor_id =
                std::env::var("AUDIT_ACTOR_ID").unwrap_or_else(|_| "demo-cli".to_string());
            eprintln!("config not loaded ({e:#}); using in-memory defaults");
            cfg
        }
    }
}

fn main() -> std::process::ExitCode {
    dotenv().ok();
    let cfg = load_config();
    init_logging(cfg.logging.level, cfg.logging.format);

    let run_id = Uuid::new_v4();
    std::panic::set_hook(Box::new(move |info| {
        error!(service = "demo", event = "panic", %run_id, panic = %info, "unhandled panic occurred");
    }));

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(
                service = "demo",
                event = "runtime_build_failed",
                error = %e,
                "failed to build tokio runtime"
            );
            return std::process::ExitCode::FAILURE;
        }
    };

    info!(service = "demo", event = "start", %run_id, backend = ?cfg.storage.backend, "demo starting");
    match rt.block_on(run(&cfg)) {
        Ok(()) => {
            info!(service = "demo", event = "finish", %run_id, "demo finished");
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            error!(service = "demo", event = "failed", error = %format!("{e:#}"), "demo failed");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run(cfg: &AppConfig) -> anyhow::Result<()> {
    let users = service::runtime::build_user_service(cfg).await?;
    scenario(&users).await?;
    inspect_tagged_error();
    Ok(())
}

async fn scenario(users: &UserService) -> anyhow::Result<()> {
    let username = format!("demo_{}", &Uuid::new_v4().simple().to_string()[..8]);
    let input = models::CreateUserInput::parse(&json!({
        "firstName": "Demo",
        "lastName": "User",
        "username": username,
        "email": format!("{username}@example.com"),
        "password": "demo-password",
        "status": {"isActive": true, "isVerified": false, "isLocked": false}
    }))?;
    let created = users.create(input).await?;
    info!(user_id = %created.id, full_name = %created.full_name(), "created");

    let update = models::UpdateUserInput::parse(&json!({
        "status": {"isActive": true, "isVerified": true, "isLocked": false}
    }))?;
    let updated = users.update(&created.id, update).await?;
    info!(user_id = %updated.id, version = updated.version, "verified");

    if let Err(e) = users.update(&created.id, models::UpdateUserInput::default()).await {
        warn!(error = %e, code = e.kind().code(), "empty update rejected");
    }

    let found = users.get_by_username(&username).await?;
    let session = users.authenticate(&found.data.username, "demo-password").await?;
    info!(user_id = %session.id, initials = %session.initials(), "authenticated");

    if let Err(e) = users.authenticate(&username, "wrong-password").await {
        warn!(error = %e, "bad password rejected");
    }
    let total = users.count().await?;
    info!(total, "users stored");
    Ok(())
}

fn inspect_tagged_error() {
    if let Err(err) = raise_custom() {
        if err.is(ErrorKind::Custom) && err.name() == "MyCustomError" {
            error!(
                error_name = err.name(),
                error_message = err.message(),
                cause = ?err.source().map(|c| c.to_string()),
                trace = err.trace().unwrap_or("<not captured; set RUST_BACKTRACE=1>"),
                "caught custom error"
            );
        }
    }

    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only volume");
    let err = TaggedError::wrap(ErrorKind::Database, "could not persist user", io);
    let payload = err.to_payload();
    let as_json = serde_json::to_value(&payload).unwrap_or_default();
    info!(
        is_tagged = common::errors::is_tagged_error(&as_json),
        payload = %as_json,
        "structural check"
    );
    let restored = TaggedError::from_payload(payload);
    critical!(error_name = restored.name(), code = restored.kind().code(), "demo critical event");
}

fn raise_custom() -> common::AppResult<()> {
    let cause = std::io::Error::new(std::io::ErrorKind::Other, "Some cause");
    Err(TaggedError::custom("MyCustomError", "This is a custom error message").with_cause(cause))
}
