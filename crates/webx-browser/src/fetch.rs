//! Resource retrieval relative to a page's base location.
//!
//! Bases on the source-hosting provider's web host are rewritten to its
//! raw-content host before the request goes out. The first such rewrite in
//! the process surfaces a warning on the log panel.

use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use webx_net::{Transport, Url};
use webx_types::{Result, WebxError};

use crate::log::LogSink;

const PROVIDER_HOSTS: [&str; 2] = ["github.com", "www.github.com"];
const RAW_HOST: &str = "raw.githubusercontent.com";
const DEFAULT_BRANCH: &str = "main";
const TREE_MARKER: &str = "tree";
const DEFAULT_DOCUMENT: &str = "index.html";

pub const PROVIDER_WARNING: &str = "This website is using the outdated github dns target.";

static PROVIDER_WARNED: OneShot = OneShot::new();

/// A flag that reports `true` exactly once.
#[derive(Debug, Default)]
pub struct OneShot(AtomicBool);

impl OneShot {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// True on the first call only.
    pub fn fire(&self) -> bool {
        !self.0.swap(true, Ordering::Relaxed)
    }
}

/// Where a resource request actually goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub url: String,
    pub provider_rewrite: bool,
}

/// Compute the request address for `path` relative to `base`.
pub fn resource_location(base: &str, path: &str) -> Location {
    if let Some(url) = rewrite_provider(base, path) {
        return Location {
            url,
            provider_rewrite: true,
        };
    }
    Location {
        url: join_plain(base, path),
        provider_rewrite: false,
    }
}

fn rewrite_provider(base: &str, path: &str) -> Option<String> {
    let url = Url::parse(base)?;
    if !PROVIDER_HOSTS.contains(&url.host.as_str()) {
        return None;
    }
    let path = if path.is_empty() { DEFAULT_DOCUMENT } else { path };

    // Owner and repository come first; only later segments name a branch.
    let segments: Vec<&str> = url.path.split('/').filter(|s| !s.is_empty()).collect();
    let (repo, rest) = segments.split_at(segments.len().min(2));
    let tree = rest.iter().position(|s| *s == TREE_MARKER);
    let has_branch = tree.is_some() || rest.contains(&DEFAULT_BRANCH);

    let mut parts = repo.to_vec();
    if !has_branch {
        parts.push(DEFAULT_BRANCH);
    }
    parts.extend(
        rest.iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != tree)
            .map(|(_, s)| *s),
    );
    let joined = format!("/{}/{path}", parts.join("/"));

    Some(format!("{}://{RAW_HOST}{}", url.scheme, collapse_slashes(&joined)))
}

/// Plain concatenation. A separator is inserted only when the base stops
/// at its authority and the path does not start with one.
fn join_plain(base: &str, path: &str) -> String {
    let bare_authority = base
        .split_once("://")
        .is_some_and(|(_, rest)| !rest.is_empty() && !rest.contains(['/', '?', '#']));
    if bare_authority && !path.is_empty() && !path.starts_with('/') {
        format!("{base}/{path}")
    } else {
        format!("{base}{path}")
    }
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Fetches page, style and script text through a [`Transport`].
#[derive(Clone)]
pub struct ResourceFetcher {
    transport: Rc<dyn Transport>,
    log: LogSink,
    warned: &'static OneShot,
}

impl ResourceFetcher {
    pub fn new(transport: Rc<dyn Transport>, log: LogSink) -> Self {
        Self {
            transport,
            log,
            warned: &PROVIDER_WARNED,
        }
    }

    /// Use a private warning flag instead of the process-wide one.
    pub fn with_warning_flag(mut self, flag: &'static OneShot) -> Self {
        self.warned = flag;
        self
    }

    /// Fetch `path` relative to `base`. Every failure is a
    /// [`WebxError::FetchFailed`]; no retry is attempted.
    pub async fn fetch(&self, base: &str, path: &str) -> Result<String> {
        let location = resource_location(base, path);
        if location.provider_rewrite && self.warned.fire() {
            self.log.warn(PROVIDER_WARNING);
        }
        log::debug!("fetching {}", location.url);
        match self.transport.get(&location.url).await {
            Ok(body) => Ok(body),
            Err(e @ WebxError::FetchFailed { .. }) => Err(e),
            Err(e) => Err(WebxError::fetch(location.url, e)),
        }
    }
}
