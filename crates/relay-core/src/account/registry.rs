//! Account registry: account records kept in lockstep with their secrets.

use tracing::{info, warn};

use super::model::{Account, AccountSpec};
use super::repository::AccountRepository;
use crate::error::{Error, Result};
use crate::vault::Vault;

/// Adds, lists and removes accounts.
///
/// Every account record has a matching vault entry under the same name.
/// `add` undoes the record if the secret cannot be stored, and `remove`
/// always erases the secret together with the record.
#[derive(Debug, Clone)]
pub struct AccountRegistry {
    accounts: AccountRepository,
    vault: Vault,
}

impl AccountRegistry {
    /// Creates a registry over an account repository and a vault.
    #[must_use]
    pub const fn new(accounts: AccountRepository, vault: Vault) -> Self {
        Self { accounts, vault }
    }

    /// The vault holding account secrets.
    #[must_use]
    pub const fn vault(&self) -> &Vault {
        &self.vault
    }

    /// Validates `spec`, persists the account and stores its secret.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidName`], [`Error::InvalidEmail`] or
    ///   [`Error::Configuration`] for a bad spec.
    /// - [`Error::DuplicateAccount`] if the name is taken.
    /// - Vault errors; the account record is removed again in that case.
    pub async fn add(&self, spec: AccountSpec, secret: &str) -> Result<Account> {
        let account = spec.resolve()?;
        self.accounts.insert(&account).await?;

        if let Err(e) = self.vault.store(&account.name, secret).await {
            warn!(account = %account.name, error = %e, "storing secret failed, rolling back");
            self.accounts.delete(&account.name).await?;
            return Err(e);
        }

        info!(account = %account.name, provider = %account.provider, "added account");
        Ok(account)
    }

    /// All accounts in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<Account>> {
        self.accounts.list().await
    }

    /// Resolves a name to its account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccountNotFound`] for an unknown name.
    pub async fn get(&self, name: &str) -> Result<Account> {
        self.accounts
            .get(name)
            .await?
            .ok_or_else(|| Error::AccountNotFound(name.to_string()))
    }

    /// Removes an account and erases its secret.
    ///
    /// Without `force`, the caller must pass `confirmed = true` after asking
    /// the user; otherwise nothing is deleted.
    ///
    /// # Errors
    ///
    /// - [`Error::AccountNotFound`] for an unknown name, whatever the flags.
    /// - [`Error::ConfirmationRequired`] if neither `force` nor `confirmed`.
    pub async fn remove(&self, name: &str, force: bool, confirmed: bool) -> Result<()> {
        if self.accounts.get(name).await?.is_none() {
            return Err(Error::AccountNotFound(name.to_string()));
        }
        if !(force || confirmed) {
            return Err(Error::ConfirmationRequired(name.to_string()));
        }

        self.accounts.delete(name).await?;
        self.vault.erase(name).await?;
        info!(account = %name, "removed account");
        Ok(())
    }
}
