//! Async retrieval seam used by the page pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use webx_types::error::{Result, WebxError};

use crate::http::{HttpLimits, http_get};
use crate::tls::TlsProvider;
use crate::url::Url;

/// Retrieves the text body at an absolute address.
///
/// Implementations must report every failure (unreachable host, error
/// status, malformed response) as [`WebxError::FetchFailed`]. Futures are
/// `!Send`: the pipeline runs on a single-threaded cooperative scheduler.
#[async_trait(?Send)]
pub trait Transport {
    async fn get(&self, url: &str) -> Result<String>;
}

/// [`Transport`] over the blocking HTTP client, run on tokio's blocking
/// pool so the cooperative scheduler keeps running other tasks.
pub struct HttpTransport {
    tls: Option<Arc<dyn TlsProvider>>,
    limits: HttpLimits,
}

impl HttpTransport {
    pub fn new(limits: HttpLimits) -> Self {
        Self { tls: None, limits }
    }

    /// Attach a TLS provider for `https://` addresses.
    pub fn with_tls(mut self, provider: Arc<dyn TlsProvider>) -> Self {
        self.tls = Some(provider);
        self
    }
}

#[async_trait(?Send)]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String> {
        let parsed =
            Url::parse(url).ok_or_else(|| WebxError::fetch(url, "not an absolute address"))?;
        let tls = self.tls.clone();
        let limits = self.limits.clone();

        log::debug!("GET {parsed}");
        let resp = tokio::task::spawn_blocking(move || http_get(&parsed, tls.as_deref(), &limits))
            .await
            .map_err(|e| WebxError::fetch(url, e))?
            .map_err(|e| WebxError::fetch(url, e))?;

        if resp.status_code >= 400 {
            return Err(WebxError::fetch(url, format!("HTTP status {}", resp.status_code)));
        }
        Ok(String::from_utf8_lossy(&resp.body).into_owned())
    }
}
