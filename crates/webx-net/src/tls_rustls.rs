//! rustls-backed [`TlsProvider`], behind the `tls-rustls` feature.

use std::net::TcpStream;
use std::sync::Arc;

use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};
use rustls_pki_types::ServerName;

use webx_types::error::{Result, WebxError};

use crate::tls::{TlsProvider, TlsStream};

/// Verifies servers against the bundled Mozilla roots.
pub struct RustlsTlsProvider {
    config: Arc<ClientConfig>,
}

impl RustlsTlsProvider {
    pub fn new() -> Self {
        let roots: RootCertStore = webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
        let config = ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();
        Self {
            config: Arc::new(config),
        }
    }
}

impl Default for RustlsTlsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TlsProvider for RustlsTlsProvider {
    fn connect_tls(&self, stream: TcpStream, server_name: &str) -> Result<Box<dyn TlsStream>> {
        let name = ServerName::try_from(server_name.to_owned())
            .map_err(|e| WebxError::Backend(format!("invalid server name {server_name}: {e}")))?;
        let session = ClientConnection::new(Arc::clone(&self.config), name)
            .map_err(|e| WebxError::Backend(format!("TLS init: {e}")))?;
        // Handshake happens on first I/O.
        Ok(Box::new(StreamOwned::new(session, stream)))
    }
}
