//! Connection state machine.
//!
//! ```text
//! Disconnected --greeting--> Connected --LOGIN--> Authenticated
//!                                  PREAUTH greeting --^   |  ^
//!                                          SELECT/EXAMINE |  | failed SELECT
//!                                                         v  |
//!                                                   FolderSelected
//! any --LOGOUT--> Closed        any --I/O failure--> Disconnected
//! ```

use crate::command::Command;
use crate::types::Mailbox;
use crate::{Error, Result};

/// Where a connection is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No usable transport: never connected, or the transport failed.
    Disconnected,
    /// Greeting received, not yet logged in.
    Connected,
    /// Logged in, no mailbox selected.
    Authenticated,
    /// A mailbox is selected.
    FolderSelected {
        /// The selected mailbox.
        mailbox: Mailbox,
        /// True when opened with EXAMINE or the server forced read-only.
        read_only: bool,
    },
    /// LOGOUT completed.
    Closed,
}

impl SessionState {
    /// Short state name for logs and errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Authenticated => "authenticated",
            Self::FolderSelected { .. } => "folder-selected",
            Self::Closed => "closed",
        }
    }

    /// Returns the selected mailbox, if any.
    #[must_use]
    pub const fn selected(&self) -> Option<&Mailbox> {
        match self {
            Self::FolderSelected { mailbox, .. } => Some(mailbox),
            _ => None,
        }
    }

    /// Returns true while the transport can carry commands.
    #[must_use]
    pub const fn is_usable(&self) -> bool {
        !matches!(self, Self::Disconnected | Self::Closed)
    }

    /// Checks that `command` may be sent from this state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] naming the command and the state.
    pub fn check(&self, command: &Command) -> Result<()> {
        let allowed = match command {
            Command::Capability | Command::Noop | Command::Logout => self.is_usable(),
            Command::Login { .. } => matches!(self, Self::Connected),
            Command::Select(_) | Command::Examine(_) => {
                matches!(self, Self::Authenticated | Self::FolderSelected { .. })
            }
            Command::UidSearch(_)
            | Command::UidFetch { .. }
            | Command::UidCopy { .. } => matches!(self, Self::FolderSelected { .. }),
            Command::UidStore { .. }
            | Command::UidMove { .. }
            | Command::UidExpunge(_)
            | Command::Expunge => {
                if let Self::FolderSelected {
                    read_only: true, ..
                } = self
                {
                    return Err(Error::InvalidState(format!(
                        "{} needs a read-write mailbox",
                        command.name()
                    )));
                }
                matches!(self, Self::FolderSelected { .. })
            }
        };

        if allowed {
            Ok(())
        } else {
            Err(Error::InvalidState(format!(
                "{} not allowed while {}",
                command.name(),
                self.name()
            )))
        }
    }
}
