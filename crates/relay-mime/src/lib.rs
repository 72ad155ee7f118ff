//! # relay-mime
//!
//! Read-side MIME handling for a mailbox client: enough to show a message,
//! never enough to build one.
//!
//! - **Headers**: ordered, unfolded, with RFC 2047 encoded words decoded on
//!   request.
//! - **Bodies**: base64 / quoted-printable transfer decoding and the common
//!   charsets; the first plain and HTML bodies of the MIME tree.
//! - **Attachments**: filename, type and decoded size only.
//! - **Display helpers**: HTML to text, quoted-reply stripping, snippets,
//!   date parsing.
//!
//! ```
//! use relay_mime::Message;
//!
//! let raw = b"Subject: Lunch\r\nContent-Type: text/plain\r\n\r\nNoon works.\r\n";
//! let message = Message::parse(raw).unwrap();
//! assert_eq!(message.subject().as_deref(), Some("Lunch"));
//! assert_eq!(message.plain_text().as_deref(), Some("Noon works.\r\n"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;
pub mod text;

pub use address::{Address, parse_address_list};
pub use content_type::{ContentType, Disposition, DispositionKind};
pub use error::{Error, Result};
pub use header::{Headers, message_ids, split_header_body};
pub use message::{AttachmentInfo, Message};
