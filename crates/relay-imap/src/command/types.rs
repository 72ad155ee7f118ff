//! Command argument types.

use crate::types::Flag;

/// A data item requested by UID FETCH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchAttribute {
    /// The message UID.
    Uid,
    /// Current flags.
    Flags,
    /// Server-side arrival date.
    InternalDate,
    /// Size of the full message in octets.
    Rfc822Size,
    /// `BODY.PEEK[section]<start.len>`; never sets `\Seen`.
    BodyPeek {
        /// Section spec (`HEADER`, `TEXT`, `HEADER.FIELDS (...)`); empty means the whole message.
        section: String,
        /// Optional `(offset, length)` partial window.
        partial: Option<(u32, u32)>,
    },
}

impl FetchAttribute {
    /// The full message, without touching `\Seen`.
    #[must_use]
    pub fn full_message() -> Self {
        Self::BodyPeek {
            section: String::new(),
            partial: None,
        }
    }

    /// The header block only.
    #[must_use]
    pub fn header() -> Self {
        Self::BodyPeek {
            section: "HEADER".to_string(),
            partial: None,
        }
    }

    /// The first `len` bytes of the body text.
    #[must_use]
    pub fn text_preview(len: u32) -> Self {
        Self::BodyPeek {
            section: "TEXT".to_string(),
            partial: Some((0, len)),
        }
    }

    /// Selected header fields, e.g. `MESSAGE-ID`.
    #[must_use]
    pub fn header_fields(fields: &[&str]) -> Self {
        Self::BodyPeek {
            section: format!("HEADER.FIELDS ({})", fields.join(" ")),
            partial: None,
        }
    }
}

/// Search key for UID SEARCH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// Every message.
    All,
    /// Messages without `\Seen`.
    Unseen,
    /// Messages whose named header contains the value.
    Header(String, String),
}

/// How UID STORE changes flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAction {
    /// `+FLAGS`: add to the current flags.
    Add(Vec<Flag>),
    /// `-FLAGS`: remove from the current flags.
    Remove(Vec<Flag>),
}
