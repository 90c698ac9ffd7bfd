//! Project reconciler.
//!
//! [`Project`] keeps the project configuration consistent with the contracts
//! folder and the managed development network. On startup it rebuilds every
//! managed entry from the files on disk; afterwards [`Project::watch`] folds
//! file changes into the configuration one event at a time, redeploying and
//! saving after each.
//!
//! Entries outside the managed network (accounts on other chains, contracts
//! aliased to an existing deployment) are never touched.

use crate::names::ContractNames;
use crate::program::Program;
use crate::report::{DeploymentSummary, report_deployment};
use devsync_core::config::SyncConfig;
use devsync_core::error::{Result, SyncError};
use devsync_core::keys::{ACCOUNT_KEY_WEIGHT_THRESHOLD, AccountKey, HashAlgo, HexKey, SigAlgo};
use devsync_core::model::{Account, Contract, ContractDeployment, Deployment};
use devsync_core::state::State;
use devsync_core::traits::{AccountPublicKey, DeployOptions, Services};
use devsync_files::{AccountChange, AccountStatus, ContractChange, ContractStatus, ProjectLayout};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Signature algorithm of keys attached to created accounts.
pub const ACCOUNT_SIG_ALGO: SigAlgo = SigAlgo::EcdsaP256;
/// Hash algorithm of keys attached to created accounts.
pub const ACCOUNT_HASH_ALGO: HashAlgo = HashAlgo::Sha3_256;

/// Synchronizes a project folder with its configuration and the network.
pub struct Project {
    service: Account,
    services: Arc<dyn Services>,
    state: State,
    layout: Arc<dyn ProjectLayout>,
    config: SyncConfig,
    names: ContractNames,
}

impl Project {
    /// Create a reconciler. Fails if the project folders are missing.
    pub fn new(
        service: Account,
        services: Arc<dyn Services>,
        state: State,
        layout: Arc<dyn ProjectLayout>,
        config: SyncConfig,
    ) -> Result<Self> {
        layout.exists()?;

        Ok(Self {
            service,
            services,
            state,
            layout,
            config,
            names: ContractNames::new(),
        })
    }

    /// Create a reconciler using the configured service account from `state`.
    pub fn open(
        services: Arc<dyn Services>,
        state: State,
        layout: Arc<dyn ProjectLayout>,
        config: SyncConfig,
    ) -> Result<Self> {
        let service = state
            .accounts()
            .by_name(&config.network.service_account)
            .cloned()
            .ok_or_else(|| {
                SyncError::initialization(format!(
                    "service account {} is not configured",
                    config.network.service_account
                ))
            })?;

        Self::new(service, services, state, layout, config)
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn names(&self) -> &ContractNames {
        &self.names
    }

    pub fn names_mut(&mut self) -> &mut ContractNames {
        &mut self.names
    }

    pub fn into_state(self) -> State {
        self.state
    }

    fn network(&self) -> &str {
        &self.config.network.name
    }

    /// Map the empty account name used for top-level files to the default account.
    fn account_name(&self, account: &str) -> String {
        if account.is_empty() {
            self.config.network.default_account.clone()
        } else {
            account.to_string()
        }
    }

    /// Rebuild every managed entry from the project files, deploy and save.
    ///
    /// A failure before the deploy step aborts the rebuild, leaving whatever
    /// was already changed in memory. Running startup again starts over.
    pub async fn startup(&mut self) -> Result<DeploymentSummary> {
        info!("Synchronizing project on network {}", self.network());

        let declared = self.layout.deployments()?;
        self.clean_state();

        let default_account = self.config.network.default_account.clone();
        self.add_account(&default_account).await?;

        for (account, locations) in declared {
            let account = self.account_name(&account);
            if account != default_account {
                self.add_account(&account).await?;
            }
            let network = self.network().to_string();
            self.state
                .deployments_mut()
                .add_or_update(Deployment::new(network, &account));

            for location in &locations {
                self.add_contract(location, &account)?;
            }
        }

        let summary = self.deploy().await;
        self.state.save_default()?;

        info!(
            "Project synchronized: {} accounts, {} contracts",
            self.state.accounts().len(),
            self.state.contracts().len()
        );
        Ok(summary)
    }

    /// Remove every managed entry that startup can regenerate.
    ///
    /// Kept: contracts aliased on the managed network, deployments on other
    /// networks, the service account and accounts whose address does not
    /// belong to the managed chain.
    pub fn clean_state(&mut self) {
        let network = self.network().to_string();
        let chain = self.config.network.chain;
        let service = self.config.network.service_account.clone();

        for contract in self.state.contracts().snapshot() {
            if contract.is_aliased_on(&network) {
                continue;
            }
            if let Err(e) = self.state.contracts_mut().remove(&contract.name) {
                debug!("Contract {} already removed: {}", contract.name, e);
            }
        }

        for deployment in self.state.deployments().snapshot() {
            if deployment.network != network {
                continue;
            }
            if let Err(e) = self
                .state
                .deployments_mut()
                .remove(&deployment.account, &network)
            {
                debug!("Deployment for {} already removed: {}", deployment.account, e);
            }
        }

        for account in self.state.accounts().snapshot() {
            if account.name == service || account.address.network() != Some(chain) {
                continue;
            }
            if let Err(e) = self.state.accounts_mut().remove(&account.name) {
                debug!("Account {} already removed: {}", account.name, e);
            }
        }

        debug!(
            "Cleaned state: {} accounts, {} contracts, {} deployments remain",
            self.state.accounts().len(),
            self.state.contracts().len(),
            self.state.deployments().len()
        );
    }

    /// Deploy the whole project, updating contracts that already exist.
    ///
    /// Failures are reported, never returned.
    pub async fn deploy(&self) -> DeploymentSummary {
        let result = self
            .services
            .deploy_project(&self.state, DeployOptions::update_existing())
            .await;
        report_deployment(&result)
    }

    /// Create `name` on the network, keyed with the service account's key.
    pub async fn add_account(&mut self, name: &str) -> Result<()> {
        let private_key = self.service.key.private_key().map_err(|e| {
            SyncError::account_creation(format!(
                "failed to load key of service account {}: {}",
                self.service.name, e
            ))
        })?;

        let keys = [AccountPublicKey {
            public: private_key.public_key(),
            weight: ACCOUNT_KEY_WEIGHT_THRESHOLD,
            sig_algo: ACCOUNT_SIG_ALGO,
            hash_algo: ACCOUNT_HASH_ALGO,
        }];

        let (created, receipt) = self
            .services
            .create_account(&self.service, &keys)
            .await
            .map_err(|e| {
                SyncError::account_creation(format!("failed to create account {}: {}", name, e))
            })?;
        if let Some(reason) = receipt.error {
            return Err(SyncError::account_creation(format!(
                "transaction {} creating account {} failed: {}",
                receipt.transaction_id, name, reason
            )));
        }

        info!("Created account {} at {}", name, created.address);

        let network = self.network().to_string();
        self.state.accounts_mut().add_or_update(Account {
            name: name.to_string(),
            address: created.address,
            key: AccountKey::Hex(HexKey::new(0, ACCOUNT_HASH_ALGO, private_key)),
        });
        self.state
            .deployments_mut()
            .add_or_update(Deployment::new(network, name));

        Ok(())
    }

    /// Forget `name` and its deployment on the managed network.
    pub fn remove_account(&mut self, name: &str) -> Result<()> {
        let network = self.network().to_string();
        if let Err(e) = self.state.deployments_mut().remove(name, &network) {
            debug!("No deployment to remove for {}: {}", name, e);
        }

        self.state.accounts_mut().remove(name)?;
        info!("Removed account {}", name);
        Ok(())
    }

    /// Name of the contract declared at `location`, cached per location.
    pub fn contract_name(&mut self, location: &str) -> Result<String> {
        if let Some(name) = self.names.get(location) {
            debug!("Contract name cache hit for {}", location);
            return Ok(name.to_string());
        }

        let content = self.state.read_file(Path::new(location)).map_err(|e| {
            SyncError::contract_read(format!(
                "could not load contract to get the name: {}: {}",
                location, e
            ))
        })?;
        let name = Program::parse(&content, location)?.name()?;

        self.names.insert(location, &name);
        Ok(name)
    }

    /// Add or update the contract at `location` and attach it to `account`.
    ///
    /// Existing aliases are kept. A contract aliased on the managed network is
    /// not attached to any deployment.
    pub fn add_contract(&mut self, location: &str, account: &str) -> Result<()> {
        let name = self.contract_name(location)?;
        let network = self.network().to_string();

        let mut contract = Contract::new(&name, location);
        if let Some(existing) = self.state.contracts().by_name(&name) {
            contract.aliases = existing.aliases.clone();
        }

        if !contract.is_aliased_on(&network) {
            let deployments = self.state.deployments_mut();
            if let Some(deployment) = deployments.by_account_and_network_mut(account, &network) {
                deployment.add_contract(ContractDeployment::new(&name));
            } else {
                let mut deployment = Deployment::new(&network, account);
                deployment.add_contract(ContractDeployment::new(&name));
                deployments.add_or_update(deployment);
            }
        }

        debug!("Added contract {} from {} to {}", name, location, account);
        self.state.contracts_mut().add_or_update(contract);
        Ok(())
    }

    /// Detach the contract at `location` from the deployment of `account`.
    pub fn remove_contract(&mut self, location: &str, account: &str) -> Result<()> {
        let name = self
            .contract_name(location)
            .map_err(|e| e.context("failed to remove contract"))?;
        let account = self.account_name(account);
        let network = self.network().to_string();

        // The account may already be gone together with its folder
        if let Some(deployment) = self
            .state
            .deployments_mut()
            .by_account_and_network_mut(&account, &network)
        {
            deployment.remove_contract(&name);
            debug!("Removed contract {} from {}", name, account);
        }

        Ok(())
    }

    /// Point every contract located at `old_location` to `new_location`.
    pub fn rename_contract(&mut self, old_location: &str, new_location: &str) {
        for mut contract in self.state.contracts().snapshot() {
            if contract.location != old_location {
                continue;
            }
            debug!(
                "Contract {} moved from {} to {}",
                contract.name, old_location, new_location
            );
            contract.location = new_location.to_string();
            self.state.contracts_mut().add_or_update(contract);
        }

        if let Some(name) = self.names.get(old_location).map(str::to_string) {
            self.names.insert(new_location, name);
        }
    }

    async fn apply_account_change(&mut self, change: AccountChange) -> Result<()> {
        match change.status {
            AccountStatus::Created => self.add_account(&change.name).await,
            AccountStatus::Removed => self.remove_account(&change.name),
        }
    }

    fn apply_contract_change(&mut self, change: ContractChange) -> Result<()> {
        let account = self.account_name(&change.account);
        match change.status {
            ContractStatus::Created | ContractStatus::Changed => {
                if let Err(e) = self.add_contract(&change.path, &account) {
                    warn!("Skipping contract {}: {}", change.path, e);
                }
                Ok(())
            }
            ContractStatus::Renamed { old_path } => {
                self.rename_contract(&old_path, &change.path);
                Ok(())
            }
            ContractStatus::Removed => self.remove_contract(&change.path, &account),
        }
    }

    /// Apply project file changes until both change feeds close.
    ///
    /// Account failures, contract removal failures and save failures stop the
    /// loop. Contracts that cannot be read or parsed are skipped.
    pub async fn watch(&mut self) -> Result<()> {
        let (mut accounts, mut contracts, _handle) = self.layout.watch()?.into_parts();
        let mut accounts_open = true;
        let mut contracts_open = true;

        info!("Watching project for changes");

        while accounts_open || contracts_open {
            tokio::select! {
                biased;

                change = accounts.recv(), if accounts_open => {
                    let Some(change) = change else {
                        accounts_open = false;
                        continue;
                    };
                    debug!("Account change: {:?}", change);
                    self.apply_account_change(change).await.map_err(|e| {
                        error!("Stopping watch: failed updating accounts: {}", e);
                        e.context("failed updating accounts")
                    })?;
                }

                change = contracts.recv(), if contracts_open => {
                    let Some(change) = change else {
                        contracts_open = false;
                        continue;
                    };
                    debug!("Contract change: {:?}", change);
                    self.apply_contract_change(change).inspect_err(|e| {
                        error!("Stopping watch: {}", e);
                    })?;
                    self.deploy().await;
                }
            }

            self.state.save_default().map_err(|e| {
                error!("Stopping watch: failed saving configuration: {}", e);
                e.context("failed saving configuration")
            })?;
        }

        info!("Project watch finished");
        Ok(())
    }
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("service", &self.service.name)
            .field("network", &self.config.network.name)
            .field("state", &self.state)
            .field("names", &self.names.len())
            .finish_non_exhaustive()
    }
}
