use crate::address::Address;
use crate::error::{Result, SyncError};
use crate::keys::AccountKey;

/// A named account with its address and signing key.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub name: String,
    pub address: Address,
    pub key: AccountKey,
}

/// Ordered collection of accounts keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accounts(Vec<Account>);

impl Accounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_name(&self, name: &str) -> Option<&Account> {
        self.0.iter().find(|a| a.name == name)
    }

    /// Replace the account with the same name in place, or append it.
    pub fn add_or_update(&mut self, account: Account) {
        match self.0.iter_mut().find(|a| a.name == account.name) {
            Some(existing) => *existing = account,
            None => self.0.push(account),
        }
    }

    pub fn remove(&mut self, name: &str) -> Result<()> {
        let index = self
            .0
            .iter()
            .position(|a| a.name == name)
            .ok_or_else(|| SyncError::not_found("account", name))?;
        self.0.remove(index);
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Account> {
        self.0.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|a| a.name.as_str()).collect()
    }

    /// Copy of the current entries, safe to iterate while mutating `self`.
    pub fn snapshot(&self) -> Vec<Account> {
        self.0.clone()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Accounts {
    type Item = &'a Account;
    type IntoIter = std::slice::Iter<'a, Account>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Account> for Accounts {
    fn from_iter<I: IntoIterator<Item = Account>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
