//! Core IMAP types.
//!
//! Identifiers, flags, capabilities, response codes and UID sets shared by
//! the parser, the command encoder and the client.

mod capability;
mod flags;
mod identifiers;
mod mailbox;
mod response_code;
mod sequence;

pub use capability::{Capability, Status};
pub use flags::{Flag, Flags};
pub use identifiers::{Uid, UidValidity};
pub use mailbox::{Mailbox, MailboxStatus};
pub use response_code::{CopyUid, ResponseCode};
pub use sequence::UidSet;
