//! Devsync project files
//!
//! Discovers the contracts declared by a project folder and watches that
//! folder for account and contract changes.
//!
//! # Example
//!
//! ```no_run
//! use devsync_core::SyncConfig;
//! use devsync_files::{ProjectFiles, ProjectLayout};
//!
//! # fn main() -> devsync_core::Result<()> {
//! let files = ProjectFiles::new("./my-project", &SyncConfig::default());
//! for (account, contracts) in files.deployments()? {
//!     println!("{account}: {contracts:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod events;
mod layout;
mod watcher;

pub use events::{
    AccountChange, AccountStatus, ChangeStreams, ContractChange, ContractStatus, WatchHandle,
};
pub use layout::{ProjectFiles, ProjectLayout};
