//! Interfaces to the network the engine synchronizes with.

use crate::address::Address;
use crate::error::Result;
use crate::keys::{HashAlgo, PublicKey, SigAlgo};
use crate::model::Account;
use crate::state::State;
use async_trait::async_trait;

/// A public key to attach to a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPublicKey {
    pub public: PublicKey,
    pub weight: u32,
    pub sig_algo: SigAlgo,
    pub hash_algo: HashAlgo,
}

/// An account created on the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedAccount {
    pub address: Address,
    pub keys: Vec<AccountPublicKey>,
}

/// Receipt of a submitted transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction_id: String,
    pub error: Option<String>,
}

/// Options for a project deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeployOptions {
    /// Replace contracts that already exist on the target account.
    pub update_existing: bool,
}

impl DeployOptions {
    pub fn update_existing() -> Self {
        Self {
            update_existing: true,
        }
    }
}

/// Outcome of deploying one contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedContract {
    pub name: String,
    pub account: String,
    pub location: String,
    pub result: std::result::Result<Address, String>,
}

impl DeployedContract {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Network operations the engine relies on.
#[async_trait]
pub trait Services: Send + Sync {
    /// Create an account paid for by `payer` with the given keys.
    async fn create_account(
        &self,
        payer: &Account,
        keys: &[AccountPublicKey],
    ) -> Result<(CreatedAccount, TransactionReceipt)>;

    /// Deploy every deployment in `state` and report per-contract outcomes.
    async fn deploy_project(
        &self,
        state: &State,
        options: DeployOptions,
    ) -> Result<Vec<DeployedContract>>;
}
