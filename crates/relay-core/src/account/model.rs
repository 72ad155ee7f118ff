//! Account model types.

use serde::{Deserialize, Serialize};

use super::validation::{validate_email, validate_name};
use crate::error::{Error, Result};
use crate::provider::{Folders, IMAP_TLS_PORT, ProviderKind};

/// A configured mail account. The secret lives in the vault, never here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique, user-chosen name.
    pub name: String,
    /// Email address, also the IMAP login.
    pub email: String,
    /// Provider, fixed at creation.
    pub provider: ProviderKind,
    /// IMAP server host.
    pub imap_host: String,
    /// IMAP server port (implicit TLS).
    pub imap_port: u16,
}

impl Account {
    /// Well-known folders for this account's provider.
    #[must_use]
    pub const fn folders(&self) -> Folders {
        self.provider.folders()
    }
}

/// Input for creating an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSpec {
    /// Account name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Provider; detected from host and email when absent.
    pub provider: Option<ProviderKind>,
    /// IMAP host override.
    pub host: Option<String>,
    /// IMAP port override.
    pub port: Option<u16>,
}

impl AccountSpec {
    /// Creates a spec with only the required fields.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            ..Self::default()
        }
    }

    /// Sets the provider.
    #[must_use]
    pub const fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Sets an explicit server.
    #[must_use]
    pub fn with_server(mut self, host: impl Into<String>, port: Option<u16>) -> Self {
        self.host = Some(host.into());
        self.port = port;
        self
    }

    /// Validates the spec and fills server defaults from the provider
    /// catalog.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidName`] / [`Error::InvalidEmail`] for malformed input.
    /// - [`Error::Configuration`] for a custom provider without a host, or
    ///   port 0.
    pub fn resolve(self) -> Result<Account> {
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_string();
        validate_name(&name)?;
        validate_email(&email)?;

        let host = self
            .host
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty());
        let provider = self
            .provider
            .unwrap_or_else(|| ProviderKind::detect(host.as_deref(), &email));
        let catalog = provider.resolve();

        let imap_host = match (host, &catalog) {
            (Some(host), _) => host,
            (None, Some(endpoint)) => endpoint.host.clone(),
            (None, None) => {
                return Err(Error::Configuration(format!(
                    "provider {provider} needs an explicit IMAP host"
                )));
            }
        };
        let imap_port = self
            .port
            .or_else(|| catalog.map(|endpoint| endpoint.port))
            .unwrap_or(IMAP_TLS_PORT);
        if imap_port == 0 {
            return Err(Error::Configuration("IMAP port must be 1-65535".to_string()));
        }

        Ok(Account {
            name,
            email,
            provider,
            imap_host,
            imap_port,
        })
    }
}
