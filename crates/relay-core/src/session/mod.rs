//! Session manager.
//!
//! Turns an account name into an authenticated connection with a folder
//! selected. A [`Session`] owns its connection; dropping it (on any path,
//! including a cancelled future) tears the transport down, and
//! [`Session::close`] logs out politely first.
//!
//! Transient network failures (reset, premature EOF, timeout) anywhere
//! between connecting and opening the folder get exactly one retry on a new
//! connection. Rejected credentials and refused folders are never retried.

mod connector;
mod health;

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use relay_imap::{Client, Mailbox, MailboxStatus};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

pub use connector::{BoxedStream, Connector, MailStream, TlsConnector};
pub use health::ConnectionHealth;

use crate::account::{Account, AccountRegistry};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::vault::Secret;

/// IMAP client over a boxed transport.
pub type ImapClient = Client<BoxedStream>;

/// Runs `fut` under `limit`, turning expiry into a timeout error.
async fn within<T>(
    limit: Duration,
    fut: impl Future<Output = relay_imap::Result<T>>,
) -> relay_imap::Result<T> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| relay_imap::Error::Timeout(limit))?
}

/// Opens and tests sessions.
#[derive(Clone)]
pub struct SessionManager {
    registry: AccountRegistry,
    connector: Arc<dyn Connector>,
    connect_timeout: Duration,
    io_timeout: Duration,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("connect_timeout", &self.connect_timeout)
            .field("io_timeout", &self.io_timeout)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Creates a manager with timeouts from `settings`.
    #[must_use]
    pub fn new(
        registry: AccountRegistry,
        connector: Arc<dyn Connector>,
        settings: &Settings,
    ) -> Self {
        Self {
            registry,
            connector,
            connect_timeout: settings.connect_timeout(),
            io_timeout: settings.io_timeout(),
        }
    }

    /// The registry accounts are resolved from.
    #[must_use]
    pub const fn registry(&self) -> &AccountRegistry {
        &self.registry
    }

    /// Opens a session on `folder`, or the provider's inbox when `None`.
    ///
    /// # Errors
    ///
    /// - [`Error::AccountNotFound`] and credential errors from the vault.
    /// - [`Error::Connection`] after the single retry is spent.
    /// - [`Error::Authentication`] if the server rejects the login.
    /// - [`Error::FolderNotFound`] if the folder cannot be selected.
    pub async fn open(&self, account_name: &str, folder: Option<&str>) -> Result<Session> {
        let account = self.registry.get(account_name).await?;
        let folder = Mailbox::new(folder.unwrap_or(account.folders().inbox));

        let (client, status) = {
            let secret = self.registry.vault().load(&account.name).await?;
            self.establish_with_retry(&account, &secret, &folder, false)
                .await?
        };

        info!(account = %account.name, folder = %folder, exists = status.exists, "session opened");
        Ok(Session {
            account,
            folder,
            status,
            io_timeout: self.io_timeout,
            client: Mutex::new(client),
        })
    }

    /// Logs in to `account_name`, looks at the inbox and logs out again.
    ///
    /// Connection, credential and login failures are reported in the
    /// returned health rather than as errors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccountNotFound`] or a storage error if the account
    /// cannot be resolved.
    pub async fn test(&self, account_name: &str) -> Result<ConnectionHealth> {
        let account = self.registry.get(account_name).await?;
        let started = Instant::now();
        match self.registry.vault().load(&account.name).await {
            Ok(secret) => Ok(self.probe_from(&account, &secret, started).await),
            Err(e) => Ok(ConnectionHealth::failed(
                &account.name,
                elapsed_ms(started),
                &e,
            )),
        }
    }

    /// Tests an account that need not be registered yet.
    pub async fn probe(&self, account: &Account, secret: &Secret) -> ConnectionHealth {
        self.probe_from(account, secret, Instant::now()).await
    }

    async fn probe_from(
        &self,
        account: &Account,
        secret: &Secret,
        started: Instant,
    ) -> ConnectionHealth {
        let inbox = Mailbox::new(account.folders().inbox);
        let (mut client, status) = match self
            .establish_with_retry(account, secret, &inbox, true)
            .await
        {
            Ok(opened) => opened,
            Err(e) => {
                warn!(account = %account.name, error = %e, "connection test failed");
                return ConnectionHealth::failed(&account.name, elapsed_ms(started), &e);
            }
        };
        let capabilities = client
            .capabilities()
            .iter()
            .map(ToString::to_string)
            .collect();
        self.logout_quietly(&mut client).await;

        ConnectionHealth::healthy(
            &account.name,
            elapsed_ms(started),
            capabilities,
            status.exists,
        )
    }

    /// Connects, logs in and opens `folder`, starting over once from a
    /// fresh connection if any of those steps fails transiently.
    async fn establish_with_retry(
        &self,
        account: &Account,
        secret: &Secret,
        folder: &Mailbox,
        read_only: bool,
    ) -> Result<(ImapClient, MailboxStatus)> {
        match self.establish(account, secret, folder, read_only).await {
            Err(e) if e.is_transient() => {
                warn!(account = %account.name, error = %e, "transient failure, retrying once");
                self.establish(account, secret, folder, read_only).await
            }
            other => other,
        }
    }

    async fn establish(
        &self,
        account: &Account,
        secret: &Secret,
        folder: &Mailbox,
        read_only: bool,
    ) -> Result<(ImapClient, MailboxStatus)> {
        let mut client = self.login(account, secret).await?;
        let opened = if read_only {
            within(self.io_timeout, client.examine(folder)).await
        } else {
            within(self.io_timeout, client.select(folder)).await
        };
        match opened {
            Ok(status) => Ok((client, status)),
            Err(e) => {
                self.logout_quietly(&mut client).await;
                Err(folder_error(e, folder))
            }
        }
    }

    async fn login(&self, account: &Account, secret: &Secret) -> Result<ImapClient> {
        debug!(host = %account.imap_host, port = account.imap_port, "connecting");
        let stream = within(
            self.connect_timeout,
            self.connector.connect(&account.imap_host, account.imap_port),
        )
        .await?;
        let mut client = within(self.io_timeout, Client::connect(stream)).await?;

        let password = secret.for_login();
        within(
            self.io_timeout,
            client.login(&account.email, password.expose()),
        )
        .await?;
        debug!(account = %account.name, "authenticated");
        Ok(client)
    }

    async fn logout_quietly(&self, client: &mut ImapClient) {
        if let Err(e) = within(self.io_timeout, client.logout()).await {
            debug!(error = %e, "logout failed");
        }
    }
}

/// Maps a failed SELECT/EXAMINE: a NO means the folder is not there.
fn folder_error(err: relay_imap::Error, folder: &Mailbox) -> Error {
    match err {
        relay_imap::Error::No { .. } => Error::FolderNotFound(folder.to_string()),
        other => other.into(),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// An authenticated connection with a folder selected.
///
/// Commands on one session are serialized through an internal lock.
pub struct Session {
    account: Account,
    folder: Mailbox,
    status: MailboxStatus,
    io_timeout: Duration,
    client: Mutex<ImapClient>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("account", &self.account.name)
            .field("folder", &self.folder)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// The account this session belongs to.
    #[must_use]
    pub const fn account(&self) -> &Account {
        &self.account
    }

    /// The selected folder.
    #[must_use]
    pub const fn folder(&self) -> &Mailbox {
        &self.folder
    }

    /// What SELECT reported when the session opened.
    #[must_use]
    pub const fn status(&self) -> &MailboxStatus {
        &self.status
    }

    /// Exclusive access to the connection.
    pub(crate) async fn lock(&self) -> MutexGuard<'_, ImapClient> {
        self.client.lock().await
    }

    /// Runs one protocol command under the I/O timeout.
    pub(crate) async fn timed<T>(
        &self,
        fut: impl Future<Output = relay_imap::Result<T>>,
    ) -> relay_imap::Result<T> {
        within(self.io_timeout, fut).await
    }

    /// Logs out and releases the connection.
    ///
    /// # Errors
    ///
    /// Returns the logout failure; the connection is released either way.
    pub async fn close(self) -> Result<()> {
        let mut client = self.client.into_inner();
        let result = within(self.io_timeout, client.logout()).await;
        debug!(account = %self.account.name, "session closed");
        result.map_err(Error::from)
    }
}
