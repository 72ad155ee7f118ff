//! Transport factory for sessions.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// A byte stream a session can run IMAP over.
pub trait MailStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> MailStream for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// Boxed transport handed to the IMAP client.
pub type BoxedStream = Box<dyn MailStream>;

/// Opens transports to mail servers.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Dials `host:port` and returns a ready stream.
    ///
    /// # Errors
    ///
    /// Returns a network, TLS or DNS-name error.
    async fn connect(&self, host: &str, port: u16) -> relay_imap::Result<BoxedStream>;
}

/// Implicit TLS over TCP, verified against the web PKI roots.
#[derive(Debug, Default, Clone, Copy)]
pub struct TlsConnector;

#[async_trait]
impl Connector for TlsConnector {
    async fn connect(&self, host: &str, port: u16) -> relay_imap::Result<BoxedStream> {
        let stream = relay_imap::connection::connect_tls(host, port).await?;
        Ok(Box::new(stream))
    }
}
