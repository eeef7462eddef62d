//! Address resolution: operator input to a fully-qualified base location.

use webx_net::{NamingClient, Transport};
use webx_types::{Result, WebxError};

use crate::surface::NAV_SCHEME;

const DEFAULT_SCHEME: &str = "https://";

/// Outcome of resolving one address. Lives for one navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub base: String,
    pub query: String,
}

/// Text between the first `?` and the next one, or empty.
pub fn query_of(input: &str) -> &str {
    input.split('?').nth(1).unwrap_or_default()
}

/// Whether `input` starts with `scheme://`.
pub fn has_scheme(input: &str) -> bool {
    let Some((scheme, _)) = input.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Reduce input to its bare hostname: lower-cased, scheme, path and query
/// removed.
pub fn normalize_hostname(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    let without_scheme = match lowered.find("://") {
        Some(i) => &lowered[i + 3..],
        None => lowered.as_str(),
    };
    without_scheme
        .split('/')
        .next()
        .unwrap_or_default()
        .split('?')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Split a two-label hostname (`name.tld`) into its labels.
pub fn parse_hostname(hostname: &str) -> Result<(&str, &str)> {
    let valid_label = |label: &str| {
        !label.is_empty()
            && label
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    };
    match hostname.split_once('.') {
        Some((name, tld)) if valid_label(name) && valid_label(tld) => Ok((name, tld)),
        _ => Err(WebxError::InvalidAddress(hostname.to_string())),
    }
}

/// Resolves operator input through the naming service when needed.
#[derive(Debug, Clone)]
pub struct AddressResolver {
    naming: NamingClient,
}

impl AddressResolver {
    pub fn new(naming_service: &str) -> Result<Self> {
        Ok(Self {
            naming: NamingClient::new(naming_service)?,
        })
    }

    /// Resolve `input`. Fully-qualified addresses are used verbatim; bare
    /// hostnames cost exactly one naming lookup. A lookup answer that
    /// itself names the navigation scheme is refused rather than followed.
    pub async fn resolve(&self, transport: &dyn Transport, input: &str) -> Result<ResolvedTarget> {
        let input = input.trim();
        let input = input.strip_prefix(NAV_SCHEME).unwrap_or(input);
        if input.is_empty() {
            return Err(WebxError::InvalidAddress("empty address".into()));
        }
        let query = query_of(input).to_string();

        let location = if has_scheme(input) {
            input.to_string()
        } else {
            let hostname = normalize_hostname(input);
            let (name, tld) = parse_hostname(&hostname)?;
            let location = self.naming.lookup(transport, name, tld).await?;
            if location.to_lowercase().starts_with(NAV_SCHEME) {
                return Err(WebxError::ResolutionFailed(format!(
                    "{hostname} points at another name ({location})"
                )));
            }
            location
        };

        let base = if location.contains("://") {
            location
        } else {
            format!("{DEFAULT_SCHEME}{location}")
        };
        log::debug!("resolved {input} -> {base}");
        Ok(ResolvedTarget { base, query })
    }
}
