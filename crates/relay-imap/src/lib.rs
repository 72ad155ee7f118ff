//! # relay-imap
//!
//! The IMAP4rev1 subset a mailbox access layer needs: LOGIN, SELECT/EXAMINE,
//! UID SEARCH/FETCH/STORE/COPY/MOVE/EXPUNGE, EXPUNGE and LOGOUT over implicit
//! TLS.
//!
//! - **Explicit session state**: [`Client`] tracks a [`SessionState`] and
//!   rejects commands issued from the wrong state with
//!   [`Error::InvalidState`] before anything reaches the wire.
//! - **Sans-I/O parser**: [`parser`] works on complete framed responses and
//!   never touches the network.
//! - **TLS via rustls**: no OpenSSL; roots come from `webpki-roots`.
//!
//! ```ignore
//! use relay_imap::{Client, Mailbox, SearchCriteria, connection::connect_tls};
//!
//! let stream = connect_tls("imap.example.com", 993).await?;
//! let mut client = Client::connect(stream).await?;
//! client.login("user@example.com", "app-password").await?;
//! let status = client.select(&Mailbox::new("INBOX")).await?;
//! let unread = client.uid_search(SearchCriteria::Unseen).await?;
//! client.logout().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
mod state;
pub mod types;

pub use command::{Command, FetchAttribute, SearchCriteria, StoreAction, TagGenerator};
pub use connection::{Client, FetchedMessage, FramedStream, ImapStream};
pub use error::{Error, Result};
pub use parser::{FetchItem, Response, ResponseParser, UntaggedResponse};
pub use state::SessionState;
pub use types::{
    Capability, CopyUid, Flag, Flags, Mailbox, MailboxStatus, ResponseCode, Status, Uid,
    UidSet, UidValidity,
};
