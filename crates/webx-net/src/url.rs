//! Absolute URLs: parsing, redirect resolution and display.

use std::fmt;

/// A parsed absolute URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Url {
    /// Lower-cased scheme (`"https"`).
    pub scheme: String,
    /// Lower-cased host.
    pub host: String,
    pub port: Option<u16>,
    /// Path, always starting with `/`.
    pub path: String,
    /// Query without the leading `?`.
    pub query: Option<String>,
    /// Fragment without the leading `#`.
    pub fragment: Option<String>,
}

impl Url {
    /// Parse `scheme://host[:port][/path][?query][#fragment]`.
    ///
    /// `None` when the scheme or host is missing.
    pub fn parse(input: &str) -> Option<Self> {
        let (scheme, rest) = input.trim().split_once("://")?;
        if scheme.is_empty() {
            return None;
        }

        let (rest, fragment) = split_off(rest, '#');
        let (rest, query) = split_off(rest, '?');
        let (authority, path) = match rest.find('/') {
            Some(i) => rest.split_at(i),
            None => (rest, "/"),
        };
        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => match port.parse::<u16>() {
                Ok(port) => (host, Some(port)),
                Err(_) => (authority, None),
            },
            None => (authority, None),
        };
        if host.is_empty() {
            return None;
        }

        Some(Url {
            scheme: scheme.to_lowercase(),
            host: host.to_lowercase(),
            port,
            path: path.to_string(),
            query,
            fragment,
        })
    }

    /// Resolve a redirect target against this URL.
    ///
    /// Accepts absolute URLs, scheme-relative `//host/path`, absolute paths
    /// and paths relative to this URL's directory (with `.`/`..`).
    pub fn resolve(&self, reference: &str) -> Option<Url> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Some(self.clone());
        }
        if reference.contains("://") {
            return Url::parse(reference);
        }
        if let Some(rest) = reference.strip_prefix("//") {
            return Url::parse(&format!("{}://{rest}", self.scheme));
        }

        let (rest, fragment) = split_off(reference, '#');
        let (path, query) = split_off(rest, '?');
        let base = if path.starts_with('/') { "/" } else { self.base_dir() };
        Some(Url {
            path: normalize_path(base, path),
            query,
            fragment,
            ..self.clone()
        })
    }

    /// Everything up to and including the last `/` of the path.
    fn base_dir(&self) -> &str {
        self.path
            .rfind('/')
            .map_or("/", |i| &self.path[..=i])
    }

    /// Connect port: explicit, or the scheme default.
    pub fn effective_port(&self) -> u16 {
        match (self.port, self.scheme.as_str()) {
            (Some(port), _) => port,
            (None, "https") => 443,
            (None, _) => 80,
        }
    }

    /// `/path?query` as sent on the request line.
    pub fn request_target(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{q}", self.path),
            None => self.path.clone(),
        }
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        f.write_str(&self.request_target())?;
        if let Some(frag) = &self.fragment {
            write!(f, "#{frag}")?;
        }
        Ok(())
    }
}

fn split_off(s: &str, delim: char) -> (&str, Option<String>) {
    match s.split_once(delim) {
        Some((head, tail)) => (head, Some(tail.to_string())),
        None => (s, None),
    }
}

/// Join `relative` onto `base_dir`, folding `.` and `..`. A trailing `/`
/// on the reference is kept.
fn normalize_path(base_dir: &str, relative: &str) -> String {
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for seg in relative.split('/') {
        match seg {
            "" | "." => {},
            ".." => {
                segments.pop();
            },
            s => segments.push(s),
        }
    }
    let mut out = format!("/{}", segments.join("/"));
    if relative.ends_with('/') && !out.ends_with('/') {
        out.push('/');
    }
    out
}
