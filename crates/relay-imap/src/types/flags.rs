//! System flags and keywords.

/// A flag on a message, or one a mailbox declares.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Flag {
    /// `\Seen`: read.
    Seen,
    /// `\Answered`: replied to.
    Answered,
    /// `\Flagged`: starred.
    Flagged,
    /// `\Deleted`: removed on the next expunge.
    Deleted,
    /// `\Draft`.
    Draft,
    /// `\Recent`. Only the server sets it.
    Recent,
    /// Keyword such as `$Forwarded` or `$Junk`, spelled as received.
    Keyword(String),
}

impl Flag {
    /// Reads a flag atom. System flags ignore case; keywords are kept as is.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let Some(name) = s.strip_prefix('\\') else {
            return Self::Keyword(s.to_string());
        };
        match name.to_ascii_lowercase().as_str() {
            "seen" => Self::Seen,
            "answered" => Self::Answered,
            "flagged" => Self::Flagged,
            "deleted" => Self::Deleted,
            "draft" => Self::Draft,
            "recent" => Self::Recent,
            _ => Self::Keyword(s.to_string()),
        }
    }

    /// Wire spelling.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Seen => "\\Seen",
            Self::Answered => "\\Answered",
            Self::Flagged => "\\Flagged",
            Self::Deleted => "\\Deleted",
            Self::Draft => "\\Draft",
            Self::Recent => "\\Recent",
            Self::Keyword(keyword) => keyword,
        }
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flags of one message in the order the server listed them, without
/// duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags(Vec<Flag>);

impl Flags {
    /// No flags.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Adds `flag`; a repeat is ignored.
    pub fn insert(&mut self, flag: Flag) {
        if !self.contains(&flag) {
            self.0.push(flag);
        }
    }

    /// Whether `flag` is set.
    #[must_use]
    pub fn contains(&self, flag: &Flag) -> bool {
        self.0.contains(flag)
    }

    /// Whether `\Seen` is set.
    #[must_use]
    pub fn is_seen(&self) -> bool {
        self.contains(&Flag::Seen)
    }

    /// Flags in listing order.
    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.0.iter()
    }

    /// Whether no flag is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Flag> for Flags {
    fn from_iter<I: IntoIterator<Item = Flag>>(iter: I) -> Self {
        let mut flags = Self::new();
        iter.into_iter().for_each(|flag| flags.insert(flag));
        flags
    }
}
