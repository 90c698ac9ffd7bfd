//! Change events delivered by a project watch.

use tokio::sync::mpsc;

/// Lifecycle change of an account folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Created,
    Removed,
}

/// An account folder appeared or disappeared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountChange {
    pub name: String,
    pub status: AccountStatus,
}

impl AccountChange {
    pub fn created(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: AccountStatus::Created,
        }
    }

    pub fn removed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: AccountStatus::Removed,
        }
    }
}

/// Lifecycle change of a contract source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractStatus {
    Created,
    Changed,
    Renamed { old_path: String },
    Removed,
}

/// A contract file changed.
///
/// `account` is the account folder holding the file, or empty for files placed
/// directly in the contracts folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractChange {
    pub path: String,
    pub account: String,
    pub status: ContractStatus,
}

impl ContractChange {
    pub fn new(path: impl Into<String>, account: impl Into<String>, status: ContractStatus) -> Self {
        Self {
            path: path.into(),
            account: account.into(),
            status,
        }
    }

    pub fn created(path: impl Into<String>, account: impl Into<String>) -> Self {
        Self::new(path, account, ContractStatus::Created)
    }

    pub fn changed(path: impl Into<String>, account: impl Into<String>) -> Self {
        Self::new(path, account, ContractStatus::Changed)
    }

    pub fn removed(path: impl Into<String>, account: impl Into<String>) -> Self {
        Self::new(path, account, ContractStatus::Removed)
    }

    pub fn renamed(
        old_path: impl Into<String>,
        path: impl Into<String>,
        account: impl Into<String>,
    ) -> Self {
        Self::new(
            path,
            account,
            ContractStatus::Renamed {
                old_path: old_path.into(),
            },
        )
    }
}

/// Keeps the machinery feeding a [`ChangeStreams`] alive.
pub struct WatchHandle {
    _guard: Box<dyn Send>,
}

impl WatchHandle {
    pub fn new<G: Send + 'static>(guard: G) -> Self {
        Self {
            _guard: Box::new(guard),
        }
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle").finish_non_exhaustive()
    }
}

/// The two event feeds of a project watch.
///
/// Both channels close once the handle is dropped and pending changes have
/// been delivered.
#[derive(Debug)]
pub struct ChangeStreams {
    pub accounts: mpsc::UnboundedReceiver<AccountChange>,
    pub contracts: mpsc::UnboundedReceiver<ContractChange>,
    handle: Option<WatchHandle>,
}

impl ChangeStreams {
    /// Streams fed directly by the caller, with nothing to keep alive.
    pub fn from_channels(
        accounts: mpsc::UnboundedReceiver<AccountChange>,
        contracts: mpsc::UnboundedReceiver<ContractChange>,
    ) -> Self {
        Self {
            accounts,
            contracts,
            handle: None,
        }
    }

    pub fn with_handle(mut self, handle: WatchHandle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Split into the receivers and the handle, so the watch can be stopped
    /// by dropping the handle.
    pub fn into_parts(
        self,
    ) -> (
        mpsc::UnboundedReceiver<AccountChange>,
        mpsc::UnboundedReceiver<ContractChange>,
        Option<WatchHandle>,
    ) {
        (self.accounts, self.contracts, self.handle)
    }
}
