//! # relay-core
//!
//! The mailbox access layer behind the `relay` command:
//!
//! - **Vault**: account secrets encrypted at rest under a master key kept in
//!   the OS keyring (or a key file).
//! - **Accounts**: validated account records, kept in lockstep with their
//!   secrets.
//! - **Providers**: server and folder defaults for Gmail, Outlook, Yahoo and
//!   iCloud.
//! - **Sessions**: authenticated IMAP connections with timeouts and a
//!   single retry on transient failures.
//! - **Mailbox**: list, open, flag, move, trash and spam.
//! - **Search and threads**: local matching and grouping over fetched
//!   messages.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
pub mod config;
mod context;
mod error;
pub mod mailbox;
pub mod provider;
pub mod search;
pub mod session;
pub mod storage;
pub mod thread;
pub mod vault;

pub use account::{Account, AccountRegistry, AccountRepository, AccountSpec};
pub use config::{KeyStoreKind, Settings};
pub use context::Relay;
pub use error::{Error, ErrorKind, Result};
pub use mailbox::{FlagOp, MailboxRepository, MessageDetail, MessageSummary};
pub use provider::{Endpoint, Folders, ProviderKind};
pub use search::{Field, Match, Searchable, search};
pub use session::{Connector, ConnectionHealth, Session, SessionManager, TlsConnector};
pub use thread::{Thread, group_threads};
pub use vault::{Secret, Vault};
