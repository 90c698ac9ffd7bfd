//! Configuration for the synchronization engine.
//!
//! Settings are read from a TOML file and can be overridden through
//! `DEVSYNC_*` environment variables.
//!
//! # Example
//!
//! ```no_run
//! use devsync_core::config::SyncConfig;
//! use std::path::Path;
//!
//! # async fn example() -> devsync_core::Result<()> {
//! let config = SyncConfig::load_from_path(Path::new("devsync.toml")).await?;
//! println!("Managed network: {}", config.network.name);
//! # Ok(())
//! # }
//! ```

use crate::address::ChainId;
use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable prefix for all devsync overrides
pub const ENV_PREFIX: &str = "DEVSYNC_";

pub const ENV_NETWORK: &str = "DEVSYNC_NETWORK";
pub const ENV_SERVICE_ACCOUNT: &str = "DEVSYNC_SERVICE_ACCOUNT";
pub const ENV_DEFAULT_ACCOUNT: &str = "DEVSYNC_DEFAULT_ACCOUNT";
pub const ENV_STATE_FILE: &str = "DEVSYNC_STATE_FILE";
pub const ENV_CONTRACTS_DIR: &str = "DEVSYNC_CONTRACTS_DIR";
pub const ENV_DEBOUNCE_MS: &str = "DEVSYNC_DEBOUNCE_MS";

const MAX_DEBOUNCE_MS: u64 = 60_000;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub watcher: WatcherConfig,
}

/// The network segment the engine owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Name of the managed network in deployments and aliases
    pub name: String,
    /// Chain used to attribute account addresses to the managed network
    pub chain: ChainId,
    /// Account paying for account creation, never removed by cleanup
    pub service_account: String,
    /// Account that owns contracts placed directly in the contracts folder
    pub default_account: String,
}

/// Where project files live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project configuration file, relative to the project root
    pub state_file: String,
    /// Contracts folder, relative to the project root
    pub contracts_dir: String,
    /// Extension of contract source files
    pub contract_extension: String,
}

/// File watcher timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Quiet period after the last change to a file before it is reported
    pub debounce_ms: u64,
    /// How often pending changes are checked
    pub batch_interval_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: "emulator".to_string(),
            chain: ChainId::Emulator,
            service_account: "emulator-account".to_string(),
            default_account: "default".to_string(),
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            state_file: "flow.json".to_string(),
            contracts_dir: "cadence/contracts".to_string(),
            contract_extension: "cdc".to_string(),
        }
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            batch_interval_ms: 250,
        }
    }
}

impl WatcherConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn batch_interval(&self) -> Duration {
        Duration::from_millis(self.batch_interval_ms)
    }
}

impl SyncConfig {
    /// Load configuration from a TOML file, apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the result is invalid
    pub async fn load_from_path(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SyncError::config(format!("Failed to read config file: {}", e)))?;

        let mut config = Self::from_toml(&content)?;
        config.merge_env_vars()?;
        config.validate()?;

        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise use defaults with environment overrides.
    pub async fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load_from_path(path).await;
        }

        debug!("No configuration at {}, using defaults", path.display());
        let mut config = Self::default();
        config.merge_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| SyncError::config(format!("Failed to parse config file: {}", e)))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| SyncError::config(format!("Failed to serialize config: {}", e)))
    }

    /// Save configuration to `path` atomically.
    pub async fn save_to_path(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    SyncError::config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = self.to_toml()?;
        let temp_path = path.with_extension("toml.tmp");

        tokio::fs::write(&temp_path, content)
            .await
            .map_err(|e| SyncError::config(format!("Failed to write config file: {}", e)))?;
        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| SyncError::config(format!("Failed to rename config file: {}", e)))?;

        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("network.name", &self.network.name),
            ("network.service_account", &self.network.service_account),
            ("network.default_account", &self.network.default_account),
            ("project.state_file", &self.project.state_file),
            ("project.contracts_dir", &self.project.contracts_dir),
            ("project.contract_extension", &self.project.contract_extension),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(SyncError::config(format!("{} must not be empty", field)));
            }
        }

        if self.project.contract_extension.starts_with('.') {
            return Err(SyncError::config(
                "project.contract_extension must not start with '.'",
            ));
        }

        if self.watcher.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(SyncError::config(format!(
                "watcher.debounce_ms must be at most {}",
                MAX_DEBOUNCE_MS
            )));
        }

        if self.watcher.batch_interval_ms == 0 {
            return Err(SyncError::config(
                "watcher.batch_interval_ms must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Merge environment variable overrides into the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    pub fn merge_env_vars(&mut self) -> Result<()> {
        if let Ok(network) = std::env::var(ENV_NETWORK) {
            debug!("Overriding network from environment: {}", network);
            self.network.name = network;
        }

        if let Ok(service_account) = std::env::var(ENV_SERVICE_ACCOUNT) {
            debug!("Overriding service account from environment: {}", service_account);
            self.network.service_account = service_account;
        }

        if let Ok(default_account) = std::env::var(ENV_DEFAULT_ACCOUNT) {
            debug!("Overriding default account from environment: {}", default_account);
            self.network.default_account = default_account;
        }

        if let Ok(state_file) = std::env::var(ENV_STATE_FILE) {
            debug!("Overriding state file from environment: {}", state_file);
            self.project.state_file = state_file;
        }

        if let Ok(contracts_dir) = std::env::var(ENV_CONTRACTS_DIR) {
            debug!("Overriding contracts dir from environment: {}", contracts_dir);
            self.project.contracts_dir = contracts_dir;
        }

        if let Ok(debounce) = std::env::var(ENV_DEBOUNCE_MS) {
            let ms = debounce.parse::<u64>().map_err(|e| {
                SyncError::config(format!("Invalid debounce in environment: {}", e))
            })?;
            debug!("Overriding debounce from environment: {} ms", ms);
            self.watcher.debounce_ms = ms;
        }

        Ok(())
    }
}
