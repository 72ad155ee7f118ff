//! Where the vault's master key lives.

use std::path::PathBuf;
use std::sync::Mutex;

use keyring::Entry;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Service name used for the keyring entry.
const SERVICE_NAME: &str = "relay";

/// Entry name of the master key.
const KEY_ENTRY: &str = "master-key";

/// Holds the base64-encoded master key.
pub trait KeyStore: Send + Sync {
    /// Returns the stored key, or `None` if none was ever saved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyStore`] if the store cannot be read.
    fn load_key(&self) -> Result<Option<String>>;

    /// Saves the key, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyStore`] if the store cannot be written.
    fn save_key(&self, key: &str) -> Result<()>;
}

/// The platform secret service.
///
/// - Linux: Secret Service (GNOME Keyring, `KWallet`)
/// - macOS: Keychain
/// - Windows: Credential Manager
#[derive(Debug, Default)]
pub struct KeyringStore;

impl KeyringStore {
    fn entry() -> Result<Entry> {
        Entry::new(SERVICE_NAME, KEY_ENTRY).map_err(keyring_error)
    }
}

impl KeyStore for KeyringStore {
    fn load_key(&self) -> Result<Option<String>> {
        match Self::entry()?.get_password() {
            Ok(key) => Ok(Some(key)),
            Err(keyring::Error::NoEntry) => {
                debug!("no master key in keyring");
                Ok(None)
            }
            Err(e) => Err(keyring_error(e)),
        }
    }

    fn save_key(&self, key: &str) -> Result<()> {
        Self::entry()?.set_password(key).map_err(keyring_error)?;
        debug!("stored master key in keyring");
        Ok(())
    }
}

fn keyring_error(err: keyring::Error) -> Error {
    warn!("keyring failure: {err}");
    Error::KeyStore(err.to_string())
}

/// A key file readable only by the owner, for hosts without a secret
/// service.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    path: PathBuf,
}

impl FileKeyStore {
    /// Uses the key file at `path`.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl KeyStore for FileKeyStore {
    fn load_key(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(key) => Ok(Some(key.trim().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::KeyStore(format!("{}: {e}", self.path.display()))),
        }
    }

    fn save_key(&self, key: &str) -> Result<()> {
        use std::io::Write;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(&self.path)
            .map_err(|e| Error::KeyStore(format!("{}: {e}", self.path.display())))?;
        file.write_all(key.as_bytes())?;
        debug!(path = %self.path.display(), "wrote master key file");
        Ok(())
    }
}

/// Process-local store for tests.
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    key: Mutex<Option<String>>,
}

impl MemoryKeyStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryKeyStore {
    fn load_key(&self) -> Result<Option<String>> {
        let guard = self
            .key
            .lock()
            .map_err(|_| Error::KeyStore("key store lock poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save_key(&self, key: &str) -> Result<()> {
        let mut guard = self
            .key
            .lock()
            .map_err(|_| Error::KeyStore("key store lock poisoned".to_string()))?;
        *guard = Some(key.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn memory_store() {
        let store = MemoryKeyStore::new();
        assert_eq!(store.load_key().unwrap(), None);
        store.save_key("abc").unwrap();
        assert_eq!(store.load_key().unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyStore::new(dir.path().join("nested").join("master.key"));
        assert_eq!(store.load_key().unwrap(), None);

        store.save_key("c2VjcmV0\n").unwrap();
        assert_eq!(store.load_key().unwrap().as_deref(), Some("c2VjcmV0"));
    }

    #[cfg(unix)]
    #[test]
    fn key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.key");
        FileKeyStore::new(path.clone()).save_key("k").unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    #[ignore = "Interacts with system keyring"]
    fn keyring_round_trip() {
        let store = KeyringStore;
        let previous = store.load_key().unwrap();
        store.save_key("dGVzdA==").unwrap();
        assert_eq!(store.load_key().unwrap().as_deref(), Some("dGVzdA=="));
        if let Some(key) = previous {
            store.save_key(&key).unwrap();
        }
    }
}
