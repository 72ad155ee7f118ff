//! CAPABILITY atoms and the status keyword of status responses.

/// `OK`, `NO`, `BAD`, `PREAUTH` or `BYE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Success.
    Ok,
    /// The command was understood but refused.
    No,
    /// The command was malformed or not valid now.
    Bad,
    /// Greeting of an already authenticated connection.
    PreAuth,
    /// The server is about to close the connection.
    Bye,
}

impl Status {
    /// Matches a status keyword, ignoring case.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let status = match s.to_ascii_uppercase().as_str() {
            "OK" => Self::Ok,
            "NO" => Self::No,
            "BAD" => Self::Bad,
            "PREAUTH" => Self::PreAuth,
            "BYE" => Self::Bye,
            _ => return None,
        };
        Some(status)
    }
}

/// One advertised capability.
///
/// Variants exist for what the client and the mailbox layer branch on;
/// everything else lands in [`Capability::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Base protocol.
    Imap4Rev1,
    /// `UID MOVE` is available.
    Move,
    /// `COPYUID` codes and `UID EXPUNGE` are available.
    UidPlus,
    /// LOGIN must not be used on this connection.
    LoginDisabled,
    /// `AUTH=<mechanism>`, mechanism upper-cased.
    Auth(String),
    /// Any other atom, as sent.
    Other(String),
}

impl Capability {
    /// Classifies a capability atom.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let upper = s.to_ascii_uppercase();
        if let Some(mechanism) = upper.strip_prefix("AUTH=") {
            return Self::Auth(mechanism.to_string());
        }
        match upper.as_str() {
            "IMAP4REV1" => Self::Imap4Rev1,
            "MOVE" => Self::Move,
            "UIDPLUS" => Self::UidPlus,
            "LOGINDISABLED" => Self::LoginDisabled,
            _ => Self::Other(s.to_string()),
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Imap4Rev1 => f.write_str("IMAP4rev1"),
            Self::Move => f.write_str("MOVE"),
            Self::UidPlus => f.write_str("UIDPLUS"),
            Self::LoginDisabled => f.write_str("LOGINDISABLED"),
            Self::Auth(mechanism) => write!(f, "AUTH={mechanism}"),
            Self::Other(atom) => f.write_str(atom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atoms_are_classified() {
        assert_eq!(Capability::parse("imap4rev1"), Capability::Imap4Rev1);
        assert_eq!(Capability::parse("Move"), Capability::Move);
        assert_eq!(Capability::parse("auth=plain"), Capability::Auth("PLAIN".into()));
        assert_eq!(Capability::parse("IDLE"), Capability::Other("IDLE".into()));
        assert_eq!(
            Capability::parse("X-GM-EXT-1"),
            Capability::Other("X-GM-EXT-1".into())
        );
    }

    #[test]
    fn display_uses_wire_spelling() {
        assert_eq!(Capability::Auth("XOAUTH2".into()).to_string(), "AUTH=XOAUTH2");
        assert_eq!(Capability::UidPlus.to_string(), "UIDPLUS");
        assert_eq!(Capability::Other("SPECIAL-USE".into()).to_string(), "SPECIAL-USE");
    }

    #[test]
    fn status_keywords() {
        assert_eq!(Status::parse("ok"), Some(Status::Ok));
        assert_eq!(Status::parse("PreAuth"), Some(Status::PreAuth));
        assert_eq!(Status::parse("MAYBE"), None);
    }
}
