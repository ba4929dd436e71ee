// crates/wstar-chain/src/store.rs
//
// JSON-file snapshot store.
//
// The whole world is one JSON document. Saves go to a sibling temp file
// which is then renamed over the target, so a crash mid-write leaves the
// previous snapshot intact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use wstar_core::{SnapshotStore, WstarError};

use crate::chain::{Chain, WorldState};

/// Snapshot store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl<T> SnapshotStore<T> for JsonFileStore
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn load(&self) -> Result<Option<T>, WstarError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(WstarError::Storage(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        let snapshot = serde_json::from_slice(&bytes)?;
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &T) -> Result<(), WstarError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_vec_pretty(snapshot)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &json).await.map_err(|e| {
            WstarError::Storage(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            WstarError::Storage(format!(
                "Failed to move snapshot into {}: {}",
                self.path.display(),
                e
            ))
        })?;
        tracing::debug!("Saved snapshot to {}", self.path.display());
        Ok(())
    }
}

/// Load a chain from `store`, or `None` if nothing has been saved.
pub async fn load_chain<S>(store: &S) -> Result<Option<Chain>, WstarError>
where
    S: SnapshotStore<WorldState>,
{
    match store.load().await? {
        Some(state) => Ok(Some(Chain::from_state(state)?)),
        None => Ok(None),
    }
}

/// Persist `chain` to `store`.
pub async fn save_chain<S>(store: &S, chain: &Chain) -> Result<(), WstarError>
where
    S: SnapshotStore<WorldState>,
{
    store.save(chain.state()).await
}
