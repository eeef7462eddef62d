//! TLS seam for the HTTP client.

use std::io::{Read, Write};
use std::net::TcpStream;

use webx_types::error::Result;

/// Any byte stream the HTTP client can talk over. Plain TCP qualifies.
pub trait TlsStream: Read + Write + Send {}

impl<T: Read + Write + Send> TlsStream for T {}

/// Wraps a connected socket in a client TLS session.
pub trait TlsProvider: Send + Sync {
    /// `server_name` drives SNI and certificate verification.
    fn connect_tls(&self, stream: TcpStream, server_name: &str) -> Result<Box<dyn TlsStream>>;
}
