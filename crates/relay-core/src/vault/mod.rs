//! Credential vault.
//!
//! Secrets are encrypted with AES-256-GCM under a master key held in a
//! [`KeyStore`]. Each row stores its own random nonce, and the account name
//! is bound as associated data: a ciphertext copied under another name does
//! not decrypt. Nothing here touches the network.

mod key_store;
mod secret;

use std::sync::Arc;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use sqlx::Row;
use sqlx::sqlite::SqlitePool;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub use key_store::{FileKeyStore, KeyStore, KeyringStore, MemoryKeyStore};
pub use secret::Secret;

use crate::error::{Error, Result};

/// Nonce size for AES-GCM (96 bits).
const NONCE_SIZE: usize = 12;

/// Encrypted secret storage keyed by account name.
#[derive(Clone)]
pub struct Vault {
    pool: SqlitePool,
    keys: Arc<dyn KeyStore>,
    /// Held while a missing master key is generated and saved.
    key_init: Arc<Mutex<()>>,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault").finish_non_exhaustive()
    }
}

impl Vault {
    /// Opens the vault on `pool`, creating its table if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if schema creation fails.
    pub async fn new(pool: SqlitePool, keys: Arc<dyn KeyStore>) -> Result<Self> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS credentials (
                account_name TEXT PRIMARY KEY,
                nonce BLOB NOT NULL,
                ciphertext BLOB NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&pool)
        .await?;
        Ok(Self {
            pool,
            keys,
            key_init: Arc::new(Mutex::new(())),
        })
    }

    /// Encrypts and stores `secret` under `name`, replacing any previous value.
    ///
    /// Generates and saves a master key first if none exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the key store or database fails.
    pub async fn store(&self, name: &str, secret: &str) -> Result<()> {
        let cipher = match self.cipher()? {
            Some(cipher) => cipher,
            None => self.first_key().await?,
        };
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: secret.as_bytes(),
                    aad: name.as_bytes(),
                },
            )
            .map_err(|_| Error::KeyStore("encryption failed".to_string()))?;

        sqlx::query(
            r"
            INSERT INTO credentials (account_name, nonce, ciphertext)
            VALUES (?, ?, ?)
            ON CONFLICT(account_name) DO UPDATE SET
                nonce = excluded.nonce,
                ciphertext = excluded.ciphertext,
                updated_at = CURRENT_TIMESTAMP
            ",
        )
        .bind(name)
        .bind(nonce.as_slice())
        .bind(ciphertext)
        .execute(&self.pool)
        .await?;

        debug!(account = %name, "stored credential");
        Ok(())
    }

    /// Decrypts the secret stored under `name`.
    ///
    /// # Errors
    ///
    /// - [`Error::CredentialNotFound`] if nothing is stored under `name`.
    /// - [`Error::DecryptionFailed`] if the master key is missing or the
    ///   ciphertext does not authenticate.
    pub async fn load(&self, name: &str) -> Result<Secret> {
        let row = sqlx::query("SELECT nonce, ciphertext FROM credentials WHERE account_name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::CredentialNotFound(name.to_string()))?;

        let nonce: Vec<u8> = row.get("nonce");
        let ciphertext: Vec<u8> = row.get("ciphertext");
        if nonce.len() != NONCE_SIZE {
            return Err(Error::DecryptionFailed(name.to_string()));
        }
        let cipher = self
            .cipher()?
            .ok_or_else(|| Error::DecryptionFailed(name.to_string()))?;

        let plaintext = cipher
            .decrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: &ciphertext,
                    aad: name.as_bytes(),
                },
            )
            .map_err(|_| Error::DecryptionFailed(name.to_string()))?;
        let secret =
            String::from_utf8(plaintext).map_err(|_| Error::DecryptionFailed(name.to_string()))?;
        Ok(Secret::new(secret))
    }

    /// Deletes the secret stored under `name`. Deleting nothing is fine.
    ///
    /// # Errors
    ///
    /// Returns an error if the database fails.
    pub async fn erase(&self, name: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM credentials WHERE account_name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;
        debug!(account = %name, removed = result.rows_affected(), "erased credential");
        Ok(())
    }

    fn cipher(&self) -> Result<Option<Aes256Gcm>> {
        let Some(encoded) = self.keys.load_key()? else {
            return Ok(None);
        };
        let Ok(bytes) = BASE64.decode(encoded.trim()) else {
            return Err(Error::KeyStore("master key is not valid base64".to_string()));
        };
        Aes256Gcm::new_from_slice(&bytes)
            .map(Some)
            .map_err(|_| Error::KeyStore("master key has the wrong length".to_string()))
    }

    /// Creates the master key unless a concurrent store already did.
    async fn first_key(&self) -> Result<Aes256Gcm> {
        let _guard = self.key_init.lock().await;
        match self.cipher()? {
            Some(cipher) => Ok(cipher),
            None => self.create_key(),
        }
    }

    fn create_key(&self) -> Result<Aes256Gcm> {
        let key = Aes256Gcm::generate_key(OsRng);
        self.keys.save_key(&BASE64.encode(key))?;
        info!("generated new master key");
        Ok(Aes256Gcm::new(&key))
    }
}
