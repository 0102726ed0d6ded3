use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::core::bluetooth::{
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_RESCAN_DELAY_MS, DEFAULT_SCAN_DURATION_SECS, TARGET_NAME_PREFIX,
};

pub const CONFIG_FILE_NAME: &str = "session_config.json";

/// Environment variable pointing at an alternative config file.
pub const CONFIG_PATH_ENV: &str = "SKP_BRIDGE_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Advertised name prefix a peripheral must carry to be listed.
    pub name_prefix: String,

    /// Length of one scan window.
    pub scan_duration_secs: u64,

    /// Pause before scanning again when a window found nothing.
    pub rescan_delay_ms: u64,

    /// Period of the session loop's connection liveness check.
    pub poll_interval_ms: u64,

    /// Log level used when RUST_LOG is not set.
    pub log_level: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            name_prefix: TARGET_NAME_PREFIX.to_string(),
            scan_duration_secs: DEFAULT_SCAN_DURATION_SECS,
            rescan_delay_ms: DEFAULT_RESCAN_DELAY_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            log_level: "info".to_string(),
        }
    }
}

impl SessionConfig {
    pub fn scan_duration(&self) -> Duration {
        Duration::from_secs(self.scan_duration_secs)
    }

    pub fn rescan_delay(&self) -> Duration {
        Duration::from_millis(self.rescan_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        // a zero period would make the interval panic
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Resolves the config path: explicit argument, then the environment, then the working directory.
    pub fn resolve_path(arg: Option<String>) -> PathBuf {
        arg.or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
    }

    /// Loads the config from a configuration file.
    pub async fn load_config(file_path: &Path) -> Result<Self> {
        let file_path_str = file_path.to_string_lossy().into_owned();

        if !file_path.exists() {
            warn!(
                "Config file not found at {:?}, using default.",
                file_path_str
            );
            return Ok(Self::default());
        }

        let config_json = fs::read_to_string(file_path).await?;
        let config: Self = serde_json::from_str(&config_json)?;

        info!("Config loaded from {:?}", file_path_str);
        Ok(config)
    }
}
