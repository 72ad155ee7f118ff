//! Error types for the core library.

use serde::Serialize;
use thiserror::Error;

/// Broad failure category, for callers that branch on what went wrong
/// rather than on the exact variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad account spec, duplicate name, unreadable settings.
    Configuration,
    /// Missing or undecryptable secret, key store failure.
    Credential,
    /// Network or TLS failure.
    Connection,
    /// The server rejected the credential.
    Authentication,
    /// Unknown account, folder or message.
    NotFound,
    /// The server rejected a command, or the session was in the wrong state.
    Protocol,
    /// Local database or file I/O failure.
    Storage,
}

impl ErrorKind {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Credential => "credential",
            Self::Connection => "connection",
            Self::Authentication => "authentication",
            Self::NotFound => "not_found",
            Self::Protocol => "protocol",
            Self::Storage => "storage",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An account with this name already exists.
    #[error("Account already exists: {0}")]
    DuplicateAccount(String),

    /// The email address is malformed.
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    /// The account name is malformed.
    #[error("Invalid account name: {0}")]
    InvalidName(String),

    /// Removal was requested without `force` and without confirmation.
    #[error("Removing account {0} requires confirmation")]
    ConfirmationRequired(String),

    /// Any other configuration problem.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No secret is stored under this account name.
    #[error("No credential stored for account {0}")]
    CredentialNotFound(String),

    /// The master key is unavailable or the ciphertext is corrupt.
    #[error("Could not decrypt credential for account {0}")]
    DecryptionFailed(String),

    /// The OS secret store or key file failed.
    #[error("Key store error: {0}")]
    KeyStore(String),

    /// Network, TLS or timeout failure talking to the server.
    #[error("Connection failed: {0}")]
    Connection(#[source] relay_imap::Error),

    /// The server rejected the login.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// No account with this name.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// The folder does not exist on the server.
    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    /// No message with this UID in the folder.
    #[error("Message {uid} not found in {folder}")]
    MessageNotFound {
        /// Folder that was searched.
        folder: String,
        /// The missing UID.
        uid: u32,
    },

    /// The server rejected a command; its text is kept verbatim.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Settings could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateAccount(_)
            | Self::InvalidEmail(_)
            | Self::InvalidName(_)
            | Self::ConfirmationRequired(_)
            | Self::Configuration(_)
            | Self::Serde(_) => ErrorKind::Configuration,
            Self::CredentialNotFound(_) | Self::DecryptionFailed(_) | Self::KeyStore(_) => {
                ErrorKind::Credential
            }
            Self::Connection(_) => ErrorKind::Connection,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::AccountNotFound(_) | Self::FolderNotFound(_) | Self::MessageNotFound { .. } => {
                ErrorKind::NotFound
            }
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::Database(_) | Self::Io(_) => ErrorKind::Storage,
        }
    }

    /// Returns true for connection resets, aborts, premature EOF and
    /// timeouts: the failures worth exactly one retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection(inner) => inner.is_transient(),
            _ => false,
        }
    }
}

impl From<relay_imap::Error> for Error {
    fn from(err: relay_imap::Error) -> Self {
        use relay_imap::Error as Imap;
        match err {
            Imap::Auth(text) => Self::Authentication(text),
            Imap::No { text, .. } => Self::Protocol(text),
            Imap::Bad(text) | Imap::InvalidState(text) | Imap::Protocol(text) => {
                Self::Protocol(text)
            }
            Imap::Parse { .. } => Self::Protocol(err.to_string()),
            Imap::Io(_) | Imap::Tls(_) | Imap::InvalidDnsName(_) | Imap::Timeout(_) | Imap::Bye(_) => {
                Self::Connection(err)
            }
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn imap_errors_map_to_categories() {
        let auth: Error = relay_imap::Error::Auth("invalid credentials".into()).into();
        assert_eq!(auth.kind(), ErrorKind::Authentication);
        assert!(!auth.is_transient());

        let no: Error = relay_imap::Error::No {
            code: None,
            text: "[CANNOT] quota exceeded".into(),
        }
        .into();
        assert_eq!(no.kind(), ErrorKind::Protocol);
        assert!(no.to_string().contains("[CANNOT] quota exceeded"));

        let state: Error = relay_imap::Error::InvalidState("no folder selected".into()).into();
        assert_eq!(state.kind(), ErrorKind::Protocol);
    }

    #[test]
    fn only_network_hiccups_are_transient() {
        let reset: Error =
            relay_imap::Error::Io(std::io::ErrorKind::ConnectionReset.into()).into();
        assert_eq!(reset.kind(), ErrorKind::Connection);
        assert!(reset.is_transient());

        let timeout: Error = relay_imap::Error::Timeout(Duration::from_secs(30)).into();
        assert!(timeout.is_transient());

        let refused: Error =
            relay_imap::Error::Io(std::io::ErrorKind::ConnectionRefused.into()).into();
        assert_eq!(refused.kind(), ErrorKind::Connection);
        assert!(!refused.is_transient());

        assert!(!Error::CredentialNotFound("work".into()).is_transient());
    }

    #[test]
    fn kind_names() {
        assert_eq!(Error::AccountNotFound("ghost".into()).kind().as_str(), "not_found");
        assert_eq!(
            serde_json::to_string(&ErrorKind::Authentication).unwrap(),
            "\"authentication\""
        );
    }
}
