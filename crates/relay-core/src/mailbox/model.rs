//! Message views returned by the mailbox repository.

use chrono::{DateTime, Utc};
use relay_mime::{Address, AttachmentInfo};
use serde::{Deserialize, Serialize};

/// Add or remove flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagOp {
    /// Set the flags.
    Add,
    /// Clear the flags.
    Remove,
}

/// A message as shown in a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSummary {
    /// UID in the session's folder.
    pub uid: u32,
    /// `Message-ID`, with angle brackets.
    pub message_id: Option<String>,
    /// `Date` header, or the server's arrival time when that is missing.
    pub timestamp: Option<DateTime<Utc>>,
    /// Senders.
    pub from: Vec<Address>,
    /// Primary recipients.
    pub to: Vec<Address>,
    /// Carbon-copy recipients.
    pub cc: Vec<Address>,
    /// Blind-copy recipients, when the server kept them.
    pub bcc: Vec<Address>,
    /// Decoded subject.
    pub subject: String,
    /// Start of the body text, whitespace collapsed.
    pub snippet: String,
    /// Flags in wire form (`\Seen`, `$Forwarded`, ...).
    pub flags: Vec<String>,
    /// True without `\Seen`.
    pub unread: bool,
    /// Size of the full message in bytes.
    pub size: Option<u32>,
    /// `In-Reply-To` id.
    pub in_reply_to: Option<String>,
    /// `References` ids, oldest first.
    pub references: Vec<String>,
}

impl MessageSummary {
    /// Conversation key: the thread root from `References`, else the parent
    /// from `In-Reply-To`, else the message's own id.
    #[must_use]
    pub fn thread_id(&self) -> String {
        self.references
            .first()
            .or(self.in_reply_to.as_ref())
            .or(self.message_id.as_ref())
            .cloned()
            .unwrap_or_else(|| format!("uid:{}", self.uid))
    }
}

/// A fully fetched message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDetail {
    /// List fields; the snippet is taken from the full body.
    #[serde(flatten)]
    pub summary: MessageSummary,
    /// Every header, decoded, in message order.
    pub headers: Vec<(String, String)>,
    /// Plain-text body.
    pub body: String,
    /// True when `body` was converted from HTML.
    pub html_derived: bool,
    /// `body` with quoted replies removed.
    pub body_without_quotes: String,
    /// Attachment metadata; contents are never fetched.
    pub attachments: Vec<AttachmentInfo>,
    /// See [`MessageSummary::thread_id`].
    pub thread_id: String,
}
