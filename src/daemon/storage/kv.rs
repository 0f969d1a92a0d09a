use std::{io::ErrorKind, path::PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use fs4::tokio::AsyncFileExt;
use serde_json::{Map, Value};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::{debug, warn};

/// The asynchronous get/set capability the coordinator persists through.
/// Reads return only the requested keys; writes merge into the existing
/// namespace and leave unrelated keys untouched.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>>;

    async fn set(&self, entries: Map<String, Value>) -> Result<()>;
}

/// File-backed [KeyValueStore] holding the whole namespace as one JSON
/// object. The CLI reads the same file directly for reports, so access goes
/// through fs4 locks: shared for reads, exclusive for the read-merge-write
/// cycle of [KeyValueStore::set].
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn read_all(&self) -> Result<Map<String, Value>> {
        let file = match File::open(&self.path).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        file.lock_shared()?;
        Self::read_locked(file).await
    }

    async fn read_locked(mut file: File) -> Result<Map<String, Value>> {
        let mut content = String::new();
        let read = file.read_to_string(&mut content).await;
        file.unlock_async().await?;
        read?;

        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Map<String, Value>>(&content) {
            Ok(v) => Ok(v),
            Err(e) => {
                // Might happen after a shutdown cutting off a write.
                warn!("Store file was corrupted, starting over: {e}");
                Ok(Map::new())
            }
        }
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let mut all = self.read_all().await?;
        let mut result = Map::new();
        for key in keys {
            if let Some(value) = all.remove(*key) {
                result.insert((*key).to_string(), value);
            }
        }
        Ok(result)
    }

    async fn set(&self, entries: Map<String, Value>) -> Result<()> {
        let mut file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .await?;
        file.lock_exclusive()?;
        let result = Self::merge_locked(&mut file, entries).await;
        file.unlock_async().await?;
        result
    }
}

impl JsonFileStore {
    async fn merge_locked(file: &mut File, entries: Map<String, Value>) -> Result<()> {
        let mut content = String::new();
        file.read_to_string(&mut content).await?;

        let mut all = if content.trim().is_empty() {
            Map::new()
        } else {
            match serde_json::from_str::<Map<String, Value>>(&content) {
                Ok(v) => v,
                Err(e) => {
                    warn!("Overwriting corrupted store file: {e}");
                    Map::new()
                }
            }
        };

        for (key, value) in entries {
            all.insert(key, value);
        }

        let buffer = serde_json::to_vec(&Value::Object(all))?;
        file.set_len(0).await?;
        file.seek(std::io::SeekFrom::Start(0)).await?;
        file.write_all(&buffer).await?;
        file.flush().await?;
        debug!("Persisted {} bytes", buffer.len());
        Ok(())
    }
}
