//! Parsed response types.

use crate::types::{Capability, Flags, ResponseCode, Status, Uid};

/// One complete server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Completion of a command: `tag OK|NO|BAD [code] text`.
    Tagged {
        /// Tag of the command this completes.
        tag: String,
        /// Completion status.
        status: Status,
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// Untagged data: `* ...`.
    Untagged(UntaggedResponse),
    /// Command continuation request: `+ text`.
    Continuation {
        /// Text after the `+`.
        text: String,
    },
}

/// Untagged server data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UntaggedResponse {
    /// `* OK|NO|BAD|PREAUTH|BYE [code] text`
    Status {
        /// Status keyword.
        status: Status,
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* CAPABILITY ...`
    Capability(Vec<Capability>),
    /// `* FLAGS (...)`
    Flags(Flags),
    /// `* n EXISTS`
    Exists(u32),
    /// `* n RECENT`
    Recent(u32),
    /// `* n EXPUNGE`
    Expunge(u32),
    /// `* SEARCH ...` (UIDs when answering UID SEARCH).
    Search(Vec<Uid>),
    /// `* n FETCH (...)`
    Fetch {
        /// Message sequence number.
        seq: u32,
        /// Data items, in server order.
        items: Vec<FetchItem>,
    },
    /// Anything the client does not act on, kept as its keyword.
    Other(String),
}

/// One data item of a FETCH response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchItem {
    /// `UID n`
    Uid(Uid),
    /// `FLAGS (...)`
    Flags(Flags),
    /// `INTERNALDATE "..."`, unparsed.
    InternalDate(String),
    /// `RFC822.SIZE n`
    Rfc822Size(u32),
    /// `BODY[section]<origin> data`
    Body {
        /// Section spec as sent by the server; empty for the whole message.
        section: String,
        /// Partial-fetch origin, if any.
        origin: Option<u32>,
        /// Section bytes; `None` for NIL.
        data: Option<Vec<u8>>,
    },
}
