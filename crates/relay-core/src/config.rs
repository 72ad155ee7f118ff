//! Settings.
//!
//! A JSON file under the config directory; every field has a default, so a
//! missing file or a partial one is fine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Where the vault keeps its master key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStoreKind {
    /// The OS secret service (Keychain, Credential Manager, Secret Service).
    #[default]
    Keyring,
    /// A 0600 key file in the data directory.
    File,
}

/// Runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding `relay.db` and, for the file key store, the key.
    pub data_dir: PathBuf,
    /// Master key location.
    pub key_store: KeyStoreKind,
    /// TCP connect plus TLS handshake limit.
    pub connect_timeout_secs: u64,
    /// Limit for each protocol command.
    pub io_timeout_secs: u64,
    /// Default number of messages to list.
    pub list_count: usize,
    /// How many recent messages a search looks at.
    pub search_window: usize,
    /// Snippet length in characters.
    pub snippet_length: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("relay"),
            key_store: KeyStoreKind::default(),
            connect_timeout_secs: 30,
            io_timeout_secs: 60,
            list_count: 20,
            search_window: 100,
            snippet_length: 200,
        }
    }
}

impl Settings {
    /// Loads settings from `$RELAY_CONFIG` or the default path, then applies
    /// `$RELAY_HOME`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file exists but is not valid JSON.
    pub fn load() -> Result<Self> {
        let path = std::env::var_os("RELAY_CONFIG")
            .map_or_else(Self::default_path, PathBuf::from);
        let mut settings = Self::load_from(&path)?;
        if let Some(home) = std::env::var_os("RELAY_HOME") {
            settings.data_dir = PathBuf::from(home);
        }
        Ok(settings)
    }

    /// Loads settings from `path`; a missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unreadable or malformed files.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| Error::Configuration(format!("{}: {e}", path.display())))
    }

    /// `<config dir>/relay/config.json`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("relay")
            .join("config.json")
    }

    /// Path of the SQLite database.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("relay.db")
    }

    /// Path of the key file used by [`KeyStoreKind::File`].
    #[must_use]
    pub fn key_file_path(&self) -> PathBuf {
        self.data_dir.join("master.key")
    }

    /// Connect timeout as a duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Per-command timeout as a duration.
    #[must_use]
    pub const fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }
}
