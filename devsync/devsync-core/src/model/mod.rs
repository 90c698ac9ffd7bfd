//! Project configuration entities: accounts, contracts and deployments.
//!
//! Every collection keeps insertion order and upserts by key, so repeated
//! synchronization passes leave entries where they were first added.

mod account;
mod contract;
mod deployment;

pub use account::{Account, Accounts};
pub use contract::{Alias, Aliases, Contract, Contracts};
pub use deployment::{ContractDeployment, Deployment, Deployments};
