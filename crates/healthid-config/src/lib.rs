//! Configuration for the health ID allocation subsystem.
//!
//! Each crate owns the settings it consumes ([`ReplenishPolicy`] in
//! `healthid-core`, [`IssuerSettings`]/[`IdentitySettings`] in
//! `healthid-client`); this crate composes them into one [`AppConfig`],
//! loads it from an optional TOML file plus `HEALTHID__`-prefixed
//! environment overrides, and validates the result before any wiring
//! happens.

pub mod logging;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use healthid_client::{IdentitySettings, IssuerSettings};
pub use healthid_core::ReplenishPolicy;
pub use logging::LoggingSettings;

/// Error types for configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Snapshot file location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotSettings {
    #[serde(default = "default_snapshot_path")]
    pub path: PathBuf,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            path: default_snapshot_path(),
        }
    }
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("healthid-pool.json")
}

/// Complete configuration consumed by the subsystem's startup wiring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub snapshot: SnapshotSettings,
    #[serde(default)]
    pub replenish: ReplenishPolicy,
    #[serde(default)]
    pub issuer: IssuerSettings,
    #[serde(default)]
    pub identity: IdentitySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Loads configuration from an optional TOML file, then applies
    /// `HEALTHID__`-prefixed environment overrides
    /// (e.g. `HEALTHID__REPLENISH__THRESHOLD=4`), then validates.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("HEALTHID")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let cfg: AppConfig = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.snapshot.path.as_os_str().is_empty() {
            return Err(ConfigError::validation("snapshot.path must not be empty"));
        }
        if self.replenish.block_size == 0 {
            return Err(ConfigError::validation(
                "replenish.block_size must be > 0",
            ));
        }
        if self.issuer.base_url.is_empty() {
            return Err(ConfigError::validation("issuer.base_url must be set"));
        }
        if self.issuer.client_id.is_empty() {
            return Err(ConfigError::validation("issuer.client_id must be set"));
        }
        if self.issuer.request_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "issuer.request_timeout_ms must be > 0",
            ));
        }
        if self.identity.signin_url.is_empty() {
            return Err(ConfigError::validation("identity.signin_url must be set"));
        }
        if self.identity.email.is_empty() || self.identity.password.is_empty() {
            return Err(ConfigError::validation(
                "identity.email and identity.password must be set",
            ));
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(ConfigError::validation(format!(
                "logging.level must be one of {valid_levels:?}"
            )));
        }
        Ok(())
    }
}
