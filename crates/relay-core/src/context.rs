//! Process-wide wiring: one database, one vault, one registry.

use std::sync::Arc;

use tracing::debug;

use crate::account::{AccountRegistry, AccountRepository};
use crate::config::{KeyStoreKind, Settings};
use crate::error::Result;
use crate::session::{Connector, SessionManager, TlsConnector};
use crate::storage;
use crate::vault::{FileKeyStore, KeyStore, KeyringStore, Vault};

/// Everything a front end needs, built once at start-up.
#[derive(Debug, Clone)]
pub struct Relay {
    settings: Settings,
    registry: AccountRegistry,
    sessions: SessionManager,
}

impl Relay {
    /// Opens the database under the settings' data directory and connects
    /// over TLS.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the database cannot be opened.
    pub async fn open(settings: Settings) -> Result<Self> {
        let keys: Arc<dyn KeyStore> = match settings.key_store {
            KeyStoreKind::Keyring => Arc::new(KeyringStore),
            KeyStoreKind::File => Arc::new(FileKeyStore::new(settings.key_file_path())),
        };
        let pool = storage::open(&settings.database_path()).await?;
        Self::assemble(settings, pool, keys, Arc::new(TlsConnector)).await
    }

    /// Builds the context from explicit parts.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the schema cannot be created.
    pub async fn assemble(
        settings: Settings,
        pool: sqlx::SqlitePool,
        keys: Arc<dyn KeyStore>,
        connector: Arc<dyn Connector>,
    ) -> Result<Self> {
        let accounts = AccountRepository::new(pool.clone()).await?;
        let vault = Vault::new(pool, keys).await?;
        let registry = AccountRegistry::new(accounts, vault);
        let sessions = SessionManager::new(registry.clone(), connector, &settings);
        debug!(data_dir = %settings.data_dir.display(), "relay context ready");
        Ok(Self {
            settings,
            registry,
            sessions,
        })
    }

    /// Active settings.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The account registry.
    #[must_use]
    pub const fn accounts(&self) -> &AccountRegistry {
        &self.registry
    }

    /// The session manager.
    #[must_use]
    pub const fn sessions(&self) -> &SessionManager {
        &self.sessions
    }
}
