//! Core types and abstractions for the devsync project synchronization engine.
//!
//! This crate provides the project data model (accounts, contracts and
//! deployments), the state store that persists it, chain addresses and key
//! material, configuration, error handling, and the network interface the
//! engine drives.

pub mod address;
pub mod config;
pub mod error;
pub mod keys;
pub mod model;
pub mod state;
pub mod traits;

pub use address::{Address, ChainId};
pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use keys::{AccountKey, HashAlgo, HexKey, PrivateKey, PublicKey, SigAlgo};
pub use model::*;
pub use state::{FsReaderWriter, MemoryReaderWriter, ReaderWriter, State};
pub use traits::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::address::{Address, ChainId};
    pub use crate::config::SyncConfig;
    pub use crate::error::{Result, SyncError};
    pub use crate::keys::{AccountKey, HashAlgo, PrivateKey, SigAlgo};
    pub use crate::model::*;
    pub use crate::state::{ReaderWriter, State};
    pub use crate::traits::*;
}
