//! Naming-service client: `name.tld` -> location.
//!
//! Protocol: `GET {base}/domain/{name}/{tld}` answering
//! `{ "ip": "<location>" }`.

use serde::Deserialize;
use webx_types::error::{Result, WebxError};

use crate::transport::Transport;
use crate::url::Url;

#[derive(Debug, Deserialize)]
struct DomainRecord {
    ip: String,
}

/// Client for the configured naming service.
#[derive(Debug, Clone)]
pub struct NamingClient {
    base: Url,
}

impl NamingClient {
    pub fn new(base: &str) -> Result<Self> {
        let base = Url::parse(base).ok_or_else(|| {
            WebxError::Config(format!("naming service is not an absolute address: {base}"))
        })?;
        Ok(Self { base })
    }

    /// Lookup address for a two-label name.
    pub fn lookup_url(&self, name: &str, tld: &str) -> String {
        let mut url = self.base.clone();
        url.path = format!("/domain/{name}/{tld}");
        url.query = None;
        url.fragment = None;
        url.to_string()
    }

    /// Ask the naming service for the location registered under
    /// `name.tld`. Any retrieval or decoding failure is a
    /// [`WebxError::ResolutionFailed`].
    pub async fn lookup(&self, transport: &dyn Transport, name: &str, tld: &str) -> Result<String> {
        let url = self.lookup_url(name, tld);
        let body = transport
            .get(&url)
            .await
            .map_err(|e| WebxError::ResolutionFailed(format!("{name}.{tld}: {e}")))?;
        let record: DomainRecord = serde_json::from_str(&body)
            .map_err(|e| WebxError::ResolutionFailed(format!("{name}.{tld}: bad record: {e}")))?;
        let ip = record.ip.trim();
        if ip.is_empty() {
            return Err(WebxError::ResolutionFailed(format!("{name}.{tld}: empty location")));
        }
        log::debug!("{name}.{tld} -> {ip}");
        Ok(ip.to_string())
    }
}
