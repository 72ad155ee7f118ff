//! Connection handling: TLS transport, CRLF + literal framing, and the
//! state-tracking client.

mod client;
mod framed;
mod stream;

pub use client::{Client, FetchedMessage};
pub use framed::FramedStream;
pub use stream::{ImapStream, connect_tls, create_tls_connector};
