use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the HID allocation subsystem.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The local pool has no identifiers available. Surfaced to allocation
    /// callers as a hard failure; the allocator never blocks or retries.
    #[error("health ID pool exhausted")]
    Exhausted,

    /// Snapshot file could not be read or written.
    #[error("snapshot I/O failed at {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot file exists but does not contain a JSON array of strings.
    #[error("snapshot at {path} is malformed: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PoolError {
    pub fn snapshot(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Snapshot {
            path: path.into(),
            source,
        }
    }

    pub fn corrupt(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Corrupt {
            path: path.into(),
            source,
        }
    }

    /// True for persistence failures, which mutation paths log and swallow
    /// because the in-memory pool stays authoritative for the process
    /// lifetime.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Snapshot { .. } | Self::Corrupt { .. })
    }
}

/// Convenience result type for pool operations
pub type Result<T> = std::result::Result<T, PoolError>;
