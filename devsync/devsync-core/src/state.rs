//! In-memory project state and its persistence.
//!
//! [`State`] holds the accounts, contracts and deployments of a project and
//! writes them back to the project's JSON configuration file through a
//! [`ReaderWriter`]. Contract sources are read through the same collaborator,
//! so tests can run the whole engine against an in-memory filesystem.

use crate::address::Address;
use crate::error::{Result, SyncError};
use crate::keys::AccountKey;
use crate::model::{
    Account, Accounts, Alias, Aliases, Contract, ContractDeployment, Contracts, Deployment,
    Deployments,
};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// File access used by the state for its configuration and contract sources.
pub trait ReaderWriter: Send + Sync {
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()>;
}

/// Reads and writes files relative to a project root.
#[derive(Debug, Clone)]
pub struct FsReaderWriter {
    root: PathBuf,
}

impl FsReaderWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl ReaderWriter for FsReaderWriter {
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(self.resolve(path))
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let target = self.resolve(path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Atomic write: write to temp file, then rename
        let mut temp_name = target.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);
        std::fs::write(&temp_path, data)?;
        std::fs::rename(&temp_path, &target)
    }
}

/// Keeps files in memory. Writes can be made to fail for testing error paths.
#[derive(Debug, Default)]
pub struct MemoryReaderWriter {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl MemoryReaderWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, data: impl Into<Vec<u8>>) {
        self.files.lock().insert(path.into(), data.into());
    }

    pub fn remove(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.lock().remove(path)
    }

    pub fn contents(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.lock().get(path).cloned()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl ReaderWriter for MemoryReaderWriter {
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.contents(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )
        })
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is read-only", path.display()),
            ));
        }
        self.insert(path, data.to_vec());
        Ok(())
    }
}

/// Mutable project configuration.
pub struct State {
    accounts: Accounts,
    contracts: Contracts,
    deployments: Deployments,
    networks: IndexMap<String, serde_json::Value>,
    /// Top-level sections the engine does not manage, written back untouched
    extra: IndexMap<String, serde_json::Value>,
    rw: Arc<dyn ReaderWriter>,
    config_path: PathBuf,
}

impl State {
    /// Create an empty state that saves to `config_path`.
    pub fn new(rw: Arc<dyn ReaderWriter>, config_path: impl Into<PathBuf>) -> Self {
        Self {
            accounts: Accounts::new(),
            contracts: Contracts::new(),
            deployments: Deployments::new(),
            networks: IndexMap::new(),
            extra: IndexMap::new(),
            rw,
            config_path: config_path.into(),
        }
    }

    /// Load the state from the configuration file at `config_path`.
    pub fn load(rw: Arc<dyn ReaderWriter>, config_path: impl Into<PathBuf>) -> Result<Self> {
        let config_path = config_path.into();
        debug!("Loading project state from: {}", config_path.display());

        let content = rw.read_file(&config_path).map_err(|e| {
            SyncError::config(format!(
                "Failed to read {}: {}",
                config_path.display(),
                e
            ))
        })?;
        let file: ConfigFile = serde_json::from_slice(&content).map_err(|e| {
            SyncError::config(format!(
                "Failed to parse {}: {}",
                config_path.display(),
                e
            ))
        })?;

        let mut state = Self::new(rw, config_path);
        file.apply(&mut state);
        Ok(state)
    }

    pub fn accounts(&self) -> &Accounts {
        &self.accounts
    }

    pub fn accounts_mut(&mut self) -> &mut Accounts {
        &mut self.accounts
    }

    pub fn contracts(&self) -> &Contracts {
        &self.contracts
    }

    pub fn contracts_mut(&mut self) -> &mut Contracts {
        &mut self.contracts
    }

    pub fn deployments(&self) -> &Deployments {
        &self.deployments
    }

    pub fn deployments_mut(&mut self) -> &mut Deployments {
        &mut self.deployments
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Read a project file, such as a contract source.
    pub fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.rw.read_file(path)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String> {
        let file = ConfigFile::from_state(self);
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Persist the state to its configuration file.
    pub fn save_default(&self) -> Result<()> {
        let content = self.to_json().map_err(|e| {
            SyncError::persistence(format!("failed to serialize configuration: {}", e))
        })?;

        self.rw
            .write_file(&self.config_path, content.as_bytes())
            .map_err(|e| {
                SyncError::persistence(format!(
                    "failed to write {}: {}",
                    self.config_path.display(),
                    e
                ))
            })?;

        debug!("Project state saved to {}", self.config_path.display());
        Ok(())
    }
}

impl std::fmt::Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("accounts", &self.accounts)
            .field("contracts", &self.contracts)
            .field("deployments", &self.deployments)
            .field("config_path", &self.config_path)
            .finish_non_exhaustive()
    }
}

// On-disk representation

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    networks: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    contracts: IndexMap<String, ContractRecord>,
    #[serde(default)]
    accounts: IndexMap<String, AccountRecord>,
    #[serde(default)]
    deployments: IndexMap<String, IndexMap<String, Vec<String>>>,
    #[serde(flatten)]
    extra: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ContractRecord {
    Simple(String),
    Advanced {
        source: String,
        #[serde(default)]
        aliases: IndexMap<String, Address>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct AccountRecord {
    address: Address,
    key: AccountKey,
}

impl ConfigFile {
    fn from_state(state: &State) -> Self {
        let contracts = state
            .contracts
            .iter()
            .map(|c| {
                let record = if c.aliases.is_empty() {
                    ContractRecord::Simple(c.location.clone())
                } else {
                    ContractRecord::Advanced {
                        source: c.location.clone(),
                        aliases: c
                            .aliases
                            .iter()
                            .map(|a| (a.network.clone(), a.address))
                            .collect(),
                    }
                };
                (c.name.clone(), record)
            })
            .collect();

        let accounts = state
            .accounts
            .iter()
            .map(|a| {
                (
                    a.name.clone(),
                    AccountRecord {
                        address: a.address,
                        key: a.key.clone(),
                    },
                )
            })
            .collect();

        let mut deployments: IndexMap<String, IndexMap<String, Vec<String>>> = IndexMap::new();
        for d in &state.deployments {
            deployments.entry(d.network.clone()).or_default().insert(
                d.account.clone(),
                d.contracts.iter().map(|c| c.name.clone()).collect(),
            );
        }

        Self {
            networks: state.networks.clone(),
            extra: state.extra.clone(),
            contracts,
            accounts,
            deployments,
        }
    }

    fn apply(self, state: &mut State) {
        state.networks = self.networks;
        state.extra = self.extra;

        state.contracts = self
            .contracts
            .into_iter()
            .map(|(name, record)| match record {
                ContractRecord::Simple(location) => Contract::new(name, location),
                ContractRecord::Advanced { source, aliases } => Contract {
                    name,
                    location: source,
                    aliases: aliases
                        .into_iter()
                        .map(|(network, address)| Alias { network, address })
                        .collect::<Aliases>(),
                },
            })
            .collect();

        state.accounts = self
            .accounts
            .into_iter()
            .map(|(name, record)| Account {
                name,
                address: record.address,
                key: record.key,
            })
            .collect();

        state.deployments = self
            .deployments
            .into_iter()
            .flat_map(|(network, accounts)| {
                accounts.into_iter().map(move |(account, names)| Deployment {
                    network: network.clone(),
                    account,
                    contracts: names.into_iter().map(ContractDeployment::new).collect(),
                })
            })
            .collect();
    }
}
