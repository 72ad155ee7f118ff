//! Response codes.

use super::{Capability, Uid, UidSet, UidValidity};

/// Bracketed response code attached to a status response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// ALERT: Human-readable message that must be shown to the user.
    Alert,
    /// AUTHENTICATIONFAILED (RFC 5530).
    AuthenticationFailed,
    /// CAPABILITY list piggybacked on a greeting or completion.
    Capability(Vec<Capability>),
    /// NONEXISTENT (RFC 5530): the named mailbox does not exist.
    Nonexistent,
    /// READ-ONLY: Mailbox selected as read-only.
    ReadOnly,
    /// READ-WRITE: Mailbox selected as read-write.
    ReadWrite,
    /// TRYCREATE: Target mailbox doesn't exist, but can be created.
    TryCreate,
    /// UIDNEXT: Next UID to be assigned.
    UidNext(Uid),
    /// UIDVALIDITY: Unique identifier validity value.
    UidValidity(UidValidity),
    /// UNSEEN: First unseen message sequence number.
    Unseen(u32),
    /// COPYUID (RFC 4315): where COPY/MOVE put the messages.
    CopyUid(CopyUid),
    /// Any other code, by name.
    Other(String),
}

impl ResponseCode {
    /// Returns true for codes that mean "that mailbox is not there".
    #[must_use]
    pub const fn is_missing_mailbox(&self) -> bool {
        matches!(self, Self::TryCreate | Self::Nonexistent)
    }
}

/// Payload of a COPYUID response code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyUid {
    /// UIDVALIDITY of the destination mailbox.
    pub uid_validity: UidValidity,
    /// Source UIDs, in the server's order.
    pub source: UidSet,
    /// Destination UIDs, positionally matching `source`.
    pub destination: UidSet,
}

impl CopyUid {
    /// Returns the destination UID assigned to `source_uid`.
    #[must_use]
    pub fn destination_of(&self, source_uid: Uid) -> Option<Uid> {
        let position = self.source.iter().position(|uid| uid == source_uid)?;
        self.destination.iter().nth(position)
    }
}
