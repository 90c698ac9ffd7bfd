use crate::address::Address;
use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};

/// An address a contract is already deployed at on some network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub network: String,
    pub address: Address,
}

/// Ordered per-network aliases of a contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aliases(Vec<Alias>);

impl Aliases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_network(&self, network: &str) -> Option<&Alias> {
        self.0.iter().find(|a| a.network == network)
    }

    pub fn add(&mut self, network: impl Into<String>, address: Address) {
        let network = network.into();
        match self.0.iter_mut().find(|a| a.network == network) {
            Some(existing) => existing.address = address,
            None => self.0.push(Alias { network, address }),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Alias> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Alias> for Aliases {
    fn from_iter<I: IntoIterator<Item = Alias>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A contract source known to the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
    pub name: String,
    pub location: String,
    pub aliases: Aliases,
}

impl Contract {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            aliases: Aliases::new(),
        }
    }

    /// Whether the contract is pinned to an existing deployment on `network`.
    pub fn is_aliased_on(&self, network: &str) -> bool {
        self.aliases.by_network(network).is_some()
    }
}

/// Ordered collection of contracts keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contracts(Vec<Contract>);

impl Contracts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_name(&self, name: &str) -> Option<&Contract> {
        self.0.iter().find(|c| c.name == name)
    }

    pub fn add_or_update(&mut self, contract: Contract) {
        match self.0.iter_mut().find(|c| c.name == contract.name) {
            Some(existing) => *existing = contract,
            None => self.0.push(contract),
        }
    }

    pub fn remove(&mut self, name: &str) -> Result<()> {
        let index = self
            .0
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| SyncError::not_found("contract", name))?;
        self.0.remove(index);
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Contract> {
        self.0.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn snapshot(&self) -> Vec<Contract> {
        self.0.clone()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Contracts {
    type Item = &'a Contract;
    type IntoIter = std::slice::Iter<'a, Contract>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Contract> for Contracts {
    fn from_iter<I: IntoIterator<Item = Contract>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
