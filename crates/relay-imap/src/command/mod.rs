//! IMAP commands.
//!
//! Only the commands a mailbox access layer needs: session setup, folder
//! selection, UID-addressed search/fetch/store/copy/move/expunge, and logout.

mod serialize;
mod tag_generator;
mod types;

pub use serialize::Encoded;
pub use tag_generator::TagGenerator;
pub use types::{FetchAttribute, SearchCriteria, StoreAction};

use crate::types::{Mailbox, UidSet};

/// An IMAP command.
#[derive(Debug, Clone)]
pub enum Command {
    /// CAPABILITY
    Capability,
    /// NOOP
    Noop,
    /// LOGIN user password
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// SELECT mailbox (read-write).
    Select(Mailbox),
    /// EXAMINE mailbox (read-only).
    Examine(Mailbox),
    /// UID SEARCH
    UidSearch(SearchCriteria),
    /// UID FETCH
    UidFetch {
        /// Target UIDs.
        uids: UidSet,
        /// Requested data items.
        attributes: Vec<FetchAttribute>,
    },
    /// UID STORE
    UidStore {
        /// Target UIDs.
        uids: UidSet,
        /// Flag change.
        action: StoreAction,
        /// Suppress the untagged FETCH echo.
        silent: bool,
    },
    /// UID COPY
    UidCopy {
        /// Source UIDs.
        uids: UidSet,
        /// Destination mailbox.
        mailbox: Mailbox,
    },
    /// UID MOVE (RFC 6851)
    UidMove {
        /// Source UIDs.
        uids: UidSet,
        /// Destination mailbox.
        mailbox: Mailbox,
    },
    /// UID EXPUNGE (RFC 4315): expunge only the given `\Deleted` messages.
    UidExpunge(UidSet),
    /// EXPUNGE: expunge every `\Deleted` message in the mailbox.
    Expunge,
    /// LOGOUT
    Logout,
}

impl Command {
    /// Short name for logging. Never includes arguments.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Capability => "CAPABILITY",
            Self::Noop => "NOOP",
            Self::Login { .. } => "LOGIN",
            Self::Select(_) => "SELECT",
            Self::Examine(_) => "EXAMINE",
            Self::UidSearch(_) => "UID SEARCH",
            Self::UidFetch { .. } => "UID FETCH",
            Self::UidStore { .. } => "UID STORE",
            Self::UidCopy { .. } => "UID COPY",
            Self::UidMove { .. } => "UID MOVE",
            Self::UidExpunge(_) => "UID EXPUNGE",
            Self::Expunge => "EXPUNGE",
            Self::Logout => "LOGOUT",
        }
    }

    /// Encodes the command under `tag`, CRLF included.
    #[must_use]
    pub fn encode(&self, tag: &str) -> Encoded {
        let mut out = Encoded::new();
        out.push_str(tag);
        out.push_byte(b' ');
        match self {
            Self::Capability | Self::Noop | Self::Expunge | Self::Logout => {
                out.push_str(self.name());
            }
            Self::Login { username, password } => {
                out.push_str("LOGIN ");
                out.push_astring(username);
                out.push_byte(b' ');
                out.push_astring(password);
            }
            Self::Select(mailbox) | Self::Examine(mailbox) => {
                out.push_str(self.name());
                out.push_byte(b' ');
                out.push_astring(mailbox.as_str());
            }
            Self::UidSearch(criteria) => {
                out.push_str("UID SEARCH ");
                out.push_search(criteria);
            }
            Self::UidFetch { uids, attributes } => {
                out.push_str(&format!("UID FETCH {uids} "));
                out.push_fetch_attributes(attributes);
            }
            Self::UidStore {
                uids,
                action,
                silent,
            } => {
                out.push_str(&format!("UID STORE {uids} "));
                out.push_store(action, *silent);
            }
            Self::UidCopy { uids, mailbox } | Self::UidMove { uids, mailbox } => {
                out.push_str(&format!("{} {uids} ", self.name()));
                out.push_astring(mailbox.as_str());
            }
            Self::UidExpunge(uids) => {
                out.push_str(&format!("UID EXPUNGE {uids}"));
            }
        }
        out.push_str("\r\n");
        out
    }
}
