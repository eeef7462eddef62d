//! Networking for the WebX browser.
//!
//! Provides URL parsing, a minimal blocking HTTP/1.1 client with optional
//! TLS, the async [`Transport`] seam the page pipeline fetches through, and
//! the naming-service client that turns `name.tld` into a location.

pub mod http;
pub mod naming;
pub mod tls;
#[cfg(feature = "tls-rustls")]
pub mod tls_rustls;
pub mod transport;
pub mod url;

pub use http::{HttpLimits, HttpResponse, http_get};
pub use naming::NamingClient;
pub use tls::{TlsProvider, TlsStream};
#[cfg(feature = "tls-rustls")]
pub use tls_rustls::RustlsTlsProvider;
pub use transport::{HttpTransport, Transport};
pub use url::Url;
