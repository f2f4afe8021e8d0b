use std::path::{Path, PathBuf};

use crate::error::{PoolError, Result};
use crate::hid::HealthId;

/// File-backed copy of the pool contents, rewritten wholesale after every
/// mutation and read back at cold start and at replenishment reconciliation.
///
/// The snapshot is a derived, disposable cache: while the process is running
/// the in-memory pool is authoritative and write failures are survivable.
/// Writes go to a sibling temp file followed by a rename, so a crash
/// mid-write never leaves a torn snapshot behind.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serializes the full identifier list, replacing prior contents
    /// atomically (temp file + rename).
    pub async fn write(&self, ids: &[HealthId]) -> Result<()> {
        let bytes =
            serde_json::to_vec(ids).map_err(|e| PoolError::corrupt(&self.path, e))?;

        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| PoolError::snapshot(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| PoolError::snapshot(&self.path, e))?;

        Ok(())
    }

    /// Reads and deserializes the snapshot. A missing file is equivalent to
    /// an empty pool; malformed content is an error.
    pub async fn read(&self) -> Result<Vec<HealthId>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PoolError::snapshot(&self.path, e)),
        };

        serde_json::from_slice(&bytes).map_err(|e| PoolError::corrupt(&self.path, e))
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}
