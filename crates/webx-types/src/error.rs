//! Error types for the WebX browser.

use std::io;

/// Errors produced while navigating, fetching and running page scripts.
#[derive(Debug, thiserror::Error)]
pub enum WebxError {
    /// Operator input is not a usable address. Raised before any network
    /// call is made.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The naming service was unreachable or answered with something other
    /// than a usable location.
    #[error("resolution failed: {0}")]
    ResolutionFailed(String),

    #[error("fetch failed for {url}: {cause}")]
    FetchFailed { url: String, cause: String },

    #[error("Unknown version: {version} for: {script}")]
    UnknownDialect { version: String, script: String },

    #[error("{0}")]
    ExecutionFailed(String),

    /// A markup or style collaborator rejected its input.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("config error: {0}")]
    Config(String),

    /// Transport-level fault (socket, TLS, malformed HTTP).
    #[error("backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl WebxError {
    /// Wrap any displayable cause as a fetch failure for `url`.
    pub fn fetch(url: impl Into<String>, cause: impl ToString) -> Self {
        WebxError::FetchFailed {
            url: url.into(),
            cause: cause.to_string(),
        }
    }

}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, WebxError>;
