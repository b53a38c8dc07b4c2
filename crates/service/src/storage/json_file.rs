use std::{collections::BTreeMap, ffi::OsString, io, marker::PhantomData, path::{Path, PathBuf}};

use async_trait::async_trait;
use models::{Entity, Id};
use tokio::{fs, io::AsyncWriteExt};
use tracing::debug;
use uuid::Uuid;

use super::Storage;
use crate::errors::{database, ServiceResult};

/// JSON file-backed key-value table.
///
/// The file holds one JSON object mapping id → serialized entity. Every
/// operation reads and parses the whole file; mutating operations then
/// serialize the whole table back. A missing file is an empty table.
///
/// Writes go to a uniquely named temp file next to the target, are synced,
/// then renamed over it, so a crash mid-write leaves the previous document
/// intact. There is no locking: concurrent writers (in-process or not) each
/// rewrite the whole table and the last rename wins.
#[derive(Debug, Clone)]
pub struct JsonFileStorage<T> {
    file_path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> JsonFileStorage<T> {
    /// Point a store at `path`. Performs no I/O; the file need not exist.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { file_path: path.into(), _marker: PhantomData }
    }

    pub fn path(&self) -> &Path { &self.file_path }

    async fn read_data(&self) -> ServiceResult<BTreeMap<Id, T>> {
        let bytes = match fs::read(&self.file_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.file_path.display(), "store file not found; treating as empty");
                return Ok(BTreeMap::new());
            }
            Err(e) => {
                let message = format!("cannot read store file {}", self.file_path.display());
                return Err(database(message, e));
            }
        };
        serde_json::from_slice(&bytes)
            .map_err(|e| database(format!("malformed store file {}", self.file_path.display()), e))
    }

    async fn write_data(&self, data: &BTreeMap<Id, T>) -> ServiceResult<()> {
        let bytes = serde_json::to_vec(data)
            .map_err(|e| database(format!("cannot serialize store {}", self.file_path.display()), e))?;
        let tmp = self.temp_path();
        if let Err(e) = write_synced(&tmp, &bytes).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(database(format!("cannot write store file {}", tmp.display()), e));
        }
        if let Err(e) = fs::rename(&tmp, &self.file_path).await {
            let _ = fs::remove_file(&tmp).await;
            let message = format!("cannot replace store file {}", self.file_path.display());
            return Err(database(message, e));
        }
        debug!(path = %self.file_path.display(), items = data.len(), bytes = bytes.len(), "store file written");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .file_path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("store"));
        name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
        self.file_path.with_file_name(name)
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}

#[async_trait]
impl<T: Entity> Storage<T> for JsonFileStorage<T> {
    async fn get_all(&self) -> ServiceResult<Vec<T>> {
        let data = self.read_data().await?;
        Ok(data.into_values().collect())
    }

    async fn get_by_id(&self, id: &str) -> ServiceResult<Option<T>> {
        let mut data = self.read_data().await?;
        Ok(data.remove(id))
    }

    async fn create(&self, item: T) -> ServiceResult<T> {
        let mut data = self.read_data().await?;
        data.insert(item.id().to_string(), item.clone());
        self.write_data(&data).await?;
        Ok(item)
    }

    async fn update(&self, id: &str, patch: T::Patch) -> ServiceResult<Option<T>> {
        let mut data = self.read_data().await?;
        let Some(existing) = data.get_mut(id) else {
            return Ok(None);
        };
        existing.merge(patch);
        let updated = existing.clone();
        self.write_data(&data).await?;
        Ok(Some(updated))
    }

    async fn upsert(&self, item: T) -> ServiceResult<T> {
        let mut data = self.read_data().await?;
        data.insert(item.id().to_string(), item.clone());
        self.write_data(&data).await?;
        Ok(item)
    }

    async fn delete(&self, id: &str) -> ServiceResult<bool> {
        let mut data = self.read_data().await?;
        if data.remove(id).is_none() {
            return Ok(false);
        }
        self.write_data(&data).await?;
        Ok(true)
    }

    async fn clear(&self) -> ServiceResult<()> {
        self.write_data(&BTreeMap::new()).await
    }

    async fn exists(&self, id: &str) -> ServiceResult<bool> {
        Ok(self.read_data().await?.contains_key(id))
    }

    async fn count(&self) -> ServiceResult<usize> {
        Ok(self.read_data().await?.len())
    }
}
