//! Project folder layout.
//!
//! Contracts live in a single contracts folder. Files placed directly in it
//! belong to the default account; every first-level sub-folder declares an
//! account named after the folder, owning the contract files found anywhere
//! beneath it.
//!
//! ```text
//! cadence/contracts/
//! ├── Token.cdc           # default account
//! └── alice/
//!     ├── Market.cdc      # account "alice"
//!     └── nested/Util.cdc # account "alice"
//! ```

use crate::events::ChangeStreams;
use crate::watcher::ProjectWatcher;
use devsync_core::config::{SyncConfig, WatcherConfig};
use devsync_core::error::{Result, SyncError};
use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Source of declared deployments and file change events.
pub trait ProjectLayout: Send + Sync {
    /// Fail with an initialization error if the expected folders are missing.
    fn exists(&self) -> Result<()>;

    /// Contract locations per account name; the empty name is the default account.
    fn deployments(&self) -> Result<BTreeMap<String, Vec<String>>>;

    /// Start watching the project for account and contract changes.
    fn watch(&self) -> Result<ChangeStreams>;
}

/// The on-disk project layout rooted at a project directory.
#[derive(Debug, Clone)]
pub struct ProjectFiles {
    root: PathBuf,
    contracts_dir: PathBuf,
    extension: String,
    watcher: WatcherConfig,
}

impl ProjectFiles {
    pub fn new(root: impl Into<PathBuf>, config: &SyncConfig) -> Self {
        Self {
            root: root.into(),
            contracts_dir: PathBuf::from(&config.project.contracts_dir),
            extension: config.project.contract_extension.clone(),
            watcher: config.watcher.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of the contracts folder.
    pub fn contracts_path(&self) -> PathBuf {
        self.root.join(&self.contracts_dir)
    }

    pub(crate) fn is_contract_file(path: &Path, extension: &str) -> bool {
        path.extension().is_some_and(|ext| ext == extension)
    }

    fn contracts_in(&self, dir: &Path) -> Vec<String> {
        let mut found: Vec<String> = WalkBuilder::new(dir)
            .standard_filters(false)
            .build()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .filter(|entry| Self::is_contract_file(entry.path(), &self.extension))
            .filter_map(|entry| relative_location(&self.root, entry.path()))
            .collect();
        found.sort();
        found
    }
}

impl ProjectLayout for ProjectFiles {
    fn exists(&self) -> Result<()> {
        let contracts = self.contracts_path();
        if !contracts.is_dir() {
            return Err(SyncError::initialization(format!(
                "required project folder {} does not exist",
                contracts.display()
            )));
        }
        Ok(())
    }

    fn deployments(&self) -> Result<BTreeMap<String, Vec<String>>> {
        self.exists()?;

        let mut deployments: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for entry in std::fs::read_dir(self.contracts_path())? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }

            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                deployments.insert(name, self.contracts_in(&path));
            } else if file_type.is_file() && Self::is_contract_file(&path, &self.extension) {
                if let Some(location) = relative_location(&self.root, &path) {
                    deployments.entry(String::new()).or_default().push(location);
                }
            }
        }

        if let Some(defaults) = deployments.get_mut("") {
            defaults.sort();
        }

        debug!(
            "Found {} declared deployments in {}",
            deployments.len(),
            self.contracts_path().display()
        );
        Ok(deployments)
    }

    fn watch(&self) -> Result<ChangeStreams> {
        self.exists()?;
        ProjectWatcher::start(
            &self.root,
            &self.contracts_path(),
            &self.extension,
            self.watcher.clone(),
        )
    }
}

/// Location of `path` relative to `root`, with `/` separators.
pub(crate) fn relative_location(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
