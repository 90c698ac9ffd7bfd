use crate::error::{Result, SyncError};

/// A contract scheduled for deployment to an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDeployment {
    pub name: String,
}

impl ContractDeployment {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Contracts to deploy to one account on one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub network: String,
    pub account: String,
    pub contracts: Vec<ContractDeployment>,
}

impl Deployment {
    pub fn new(network: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            account: account.into(),
            contracts: Vec::new(),
        }
    }

    /// Attach a contract. Attaching an already attached name is a no-op.
    pub fn add_contract(&mut self, contract: ContractDeployment) {
        if !self.contracts.iter().any(|c| c.name == contract.name) {
            self.contracts.push(contract);
        }
    }

    /// Detach a contract by name, ignoring names that are not attached.
    pub fn remove_contract(&mut self, name: &str) {
        self.contracts.retain(|c| c.name != name);
    }

    pub fn contract_names(&self) -> Vec<&str> {
        self.contracts.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Ordered collection of deployments keyed by (account, network).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deployments(Vec<Deployment>);

impl Deployments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_network(&self, network: &str) -> Vec<&Deployment> {
        self.0.iter().filter(|d| d.network == network).collect()
    }

    pub fn by_account_and_network(&self, account: &str, network: &str) -> Option<&Deployment> {
        self.0
            .iter()
            .find(|d| d.account == account && d.network == network)
    }

    pub fn by_account_and_network_mut(
        &mut self,
        account: &str,
        network: &str,
    ) -> Option<&mut Deployment> {
        self.0
            .iter_mut()
            .find(|d| d.account == account && d.network == network)
    }

    pub fn add_or_update(&mut self, deployment: Deployment) {
        match self
            .0
            .iter_mut()
            .find(|d| d.account == deployment.account && d.network == deployment.network)
        {
            Some(existing) => *existing = deployment,
            None => self.0.push(deployment),
        }
    }

    pub fn remove(&mut self, account: &str, network: &str) -> Result<()> {
        let index = self
            .0
            .iter()
            .position(|d| d.account == account && d.network == network)
            .ok_or_else(|| SyncError::not_found("deployment", format!("{}@{}", account, network)))?;
        self.0.remove(index);
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Deployment> {
        self.0.iter()
    }

    pub fn snapshot(&self) -> Vec<Deployment> {
        self.0.clone()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Deployments {
    type Item = &'a Deployment;
    type IntoIter = std::slice::Iter<'a, Deployment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Deployment> for Deployments {
    fn from_iter<I: IntoIterator<Item = Deployment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_contract_is_idempotent() {
        let mut deployment = Deployment::new("emulator", "alice");
        deployment.add_contract(ContractDeployment::new("Foo"));
        deployment.add_contract(ContractDeployment::new("Foo"));
        deployment.add_contract(ContractDeployment::new("Bar"));
        assert_eq!(deployment.contract_names(), vec!["Foo", "Bar"]);

        deployment.remove_contract("Foo");
        deployment.remove_contract("Missing");
        assert_eq!(deployment.contract_names(), vec!["Bar"]);
    }

    #[test]
    fn test_upsert_by_account_and_network() {
        let mut deployments = Deployments::new();
        deployments.add_or_update(Deployment::new("emulator", "alice"));
        deployments.add_or_update(Deployment::new("testnet", "alice"));

        let mut updated = Deployment::new("emulator", "alice");
        updated.add_contract(ContractDeployment::new("Foo"));
        deployments.add_or_update(updated);

        assert_eq!(deployments.len(), 2);
        assert_eq!(
            deployments
                .by_account_and_network("alice", "emulator")
                .unwrap()
                .contract_names(),
            vec!["Foo"]
        );
        assert_eq!(deployments.by_network("testnet").len(), 1);
    }

    #[test]
    fn test_remove_missing_deployment() {
        let mut deployments = Deployments::new();
        let err = deployments.remove("bob", "emulator").unwrap_err();
        assert!(err.is_not_found());
    }
}
