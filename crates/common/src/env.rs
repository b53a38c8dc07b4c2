//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use std::path::Path;

use tracing::warn;

/// Ensure the directory holding `file_path` exists, creating it if needed.
pub async fn ensure_data_dir(file_path: &Path) -> anyhow::Result<()> {
    let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    if tokio::fs::metadata(parent).await.is_err() {
        warn!(data_dir = %parent.display(), "data directory not found; creating it");
    }
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", parent.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_missing_parent_directory() -> Result<(), anyhow::Error> {
        let root = std::env::temp_dir().join(format!("ensure_data_dir_{}", uuid::Uuid::new_v4()));
        let file = root.join("nested").join("users.json");
        ensure_data_dir(&file).await?;
        assert!(tokio::fs::metadata(root.join("nested")).await?.is_dir());
        let _ = tokio::fs::remove_dir_all(&root).await;
        Ok(())
    }

    #[tokio::test]
    async fn bare_file_name_needs_no_directory() -> Result<(), anyhow::Error> {
        ensure_data_dir(Path::new("users.json")).await?;
        Ok(())
    }
}
