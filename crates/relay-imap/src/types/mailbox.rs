//! Mailbox names and what SELECT reports about them.

use super::{Flags, Uid, UidValidity};

/// A folder name, unencoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mailbox(String);

impl Mailbox {
    /// Wraps a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when both names denote the same mailbox.
    ///
    /// `INBOX` is case-insensitive; every other name is compared exactly.
    #[must_use]
    pub fn same_as(&self, other: &str) -> bool {
        if self.0.eq_ignore_ascii_case("INBOX") {
            other.eq_ignore_ascii_case("INBOX")
        } else {
            self.0 == other
        }
    }
}

impl std::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Untagged data gathered while opening a mailbox.
#[derive(Debug, Clone, Default)]
pub struct MailboxStatus {
    /// `* n EXISTS`.
    pub exists: u32,
    /// `[UNSEEN n]`: sequence number of the first unread message.
    pub unseen: Option<u32>,
    /// `[UIDNEXT n]`.
    pub uid_next: Option<Uid>,
    /// `[UIDVALIDITY n]`.
    pub uid_validity: Option<UidValidity>,
    /// `* FLAGS (...)`.
    pub flags: Flags,
    /// `[READ-ONLY]` on the tagged OK, always the case for EXAMINE.
    pub read_only: bool,
}
