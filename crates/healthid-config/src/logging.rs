use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Log output settings for hosts that let this subsystem install the
/// subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level filter; `RUST_LOG` takes precedence when set.
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// Installs a fmt subscriber filtered by `RUST_LOG` or the configured level.
///
/// Safe to call more than once; later calls are no-ops (relevant for tests
/// and hosts that already installed their own subscriber).
pub fn init(settings: &LoggingSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
