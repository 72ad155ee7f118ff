//! TLS transport.

use std::sync::Arc;

use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use crate::Result;

/// A TLS session over TCP, as used for implicit-TLS IMAP (port 993).
pub type ImapStream = TlsStream<TcpStream>;

/// Builds a TLS connector trusting the bundled web PKI roots.
#[must_use]
pub fn create_tls_connector() -> TlsConnector {
    let roots = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    let config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
}

/// Dials `host:port` and completes a TLS handshake for `host`.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidDnsName`] for hosts that cannot be used as a
/// TLS server name, and [`crate::Error::Io`] for network or handshake failures.
pub async fn connect_tls(host: &str, port: u16) -> Result<ImapStream> {
    let server_name = ServerName::try_from(host.to_string())?;
    let tcp = TcpStream::connect((host, port)).await?;
    tcp.set_nodelay(true)?;
    tracing::debug!(host, port, "tcp connected, starting tls handshake");
    let tls = create_tls_connector().connect(server_name, tcp).await?;
    Ok(tls)
}
