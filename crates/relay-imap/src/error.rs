//! Error types for the IMAP library.

use std::time::Duration;

use thiserror::Error;

use crate::types::ResponseCode;

/// Errors that can occur during IMAP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake or encryption error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// Protocol parsing error.
    #[error("Protocol error at position {position}: {message}")]
    Parse {
        /// Byte position where the error occurred.
        position: usize,
        /// Description of what went wrong.
        message: String,
    },

    /// The server rejected the supplied credentials.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Server returned NO response.
    #[error("Server returned NO: {text}")]
    No {
        /// Response code attached to the completion, if any.
        code: Option<ResponseCode>,
        /// Human-readable server text.
        text: String,
    },

    /// Server returned BAD response.
    #[error("Server returned BAD: {0}")]
    Bad(String),

    /// Server sent BYE (disconnecting).
    #[error("Server sent BYE: {0}")]
    Bye(String),

    /// Operation timed out.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Command issued from a session state that does not allow it.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Protocol violation or unexpected data.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl Error {
    /// Returns true when the failure is a network hiccup worth one retry.
    ///
    /// Resets, aborts, premature EOF and timeouts qualify. Server verdicts
    /// (NO/BAD/BYE), TLS failures and parse errors do not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::Interrupted
            ),
            Self::Timeout(_) => true,
            _ => false,
        }
    }

    /// Returns true when the connection can no longer carry commands.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Tls(_) | Self::Timeout(_) | Self::Bye(_) | Self::Parse { .. }
        )
    }

    /// Returns the response code carried by a NO completion.
    #[must_use]
    pub const fn response_code(&self) -> Option<&ResponseCode> {
        match self {
            Self::No { code, .. } => code.as_ref(),
            _ => None,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
