//! Minimal HTTP/1.1 GET client.
//!
//! Supports plain HTTP over `std::net::TcpStream` and, when a
//! [`TlsProvider`] is supplied, HTTPS through it. Calls block; async
//! callers go through [`crate::transport::HttpTransport`].

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use webx_types::BrowserConfig;
use webx_types::error::{Result, WebxError};

use crate::tls::{TlsProvider, TlsStream};
use crate::url::Url;

/// Extra bytes tolerated on the wire beyond the body ceiling (headers).
const HEAD_ALLOWANCE: usize = 16 * 1024;

/// Bounds applied to a single GET.
#[derive(Debug, Clone)]
pub struct HttpLimits {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub max_body: usize,
    pub max_redirects: u8,
}

impl Default for HttpLimits {
    fn default() -> Self {
        Self::from_config(&BrowserConfig::default())
    }
}

impl HttpLimits {
    pub fn from_config(config: &BrowserConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout(),
            read_timeout: config.read_timeout(),
            max_body: config.max_body_bytes(),
            max_redirects: config.max_redirects,
        }
    }
}

/// A completed response.
#[derive(Debug)]
pub struct HttpResponse {
    /// Address the body was finally served from.
    pub url: String,
    pub status_code: u16,
    /// Lower-cased header names with trimmed values, in arrival order.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn backend(context: &str, err: impl std::fmt::Display) -> WebxError {
    WebxError::Backend(format!("{context}: {err}"))
}

/// GET `url`, following up to `limits.max_redirects` redirects.
///
/// HTTPS requires `tls`.
pub fn http_get(
    url: &Url,
    tls: Option<&dyn TlsProvider>,
    limits: &HttpLimits,
) -> Result<HttpResponse> {
    let mut target = url.clone();
    let mut hops = 0u8;
    loop {
        if !matches!(target.scheme.as_str(), "http" | "https") {
            return Err(WebxError::Backend(format!(
                "unsupported scheme for HTTP client: {}",
                target.scheme
            )));
        }

        let mut resp = exchange(&target, tls, limits)?;
        let location = match resp.status_code {
            301 | 302 | 303 | 307 | 308 => resp.header("location").map(str::to_owned),
            _ => None,
        };
        let Some(location) = location else {
            resp.url = target.to_string();
            return Ok(resp);
        };

        if hops == limits.max_redirects {
            return Err(WebxError::Backend("too many redirects".to_string()));
        }
        hops += 1;
        target = target
            .resolve(&location)
            .ok_or_else(|| WebxError::Backend(format!("bad redirect Location: {location}")))?;
        log::debug!("redirect {hops} -> {target}");
    }
}

/// One request/response on a fresh connection.
fn exchange(
    url: &Url,
    tls: Option<&dyn TlsProvider>,
    limits: &HttpLimits,
) -> Result<HttpResponse> {
    let mut stream = open(url, tls, limits)?;
    stream
        .write_all(request_text(url).as_bytes())
        .and_then(|()| stream.flush())
        .map_err(|e| backend("send request", e))?;
    let raw = read_to_close(&mut stream, limits.max_body.saturating_add(HEAD_ALLOWANCE))?;
    parse_response(&raw, limits.max_body)
}

fn open(
    url: &Url,
    tls: Option<&dyn TlsProvider>,
    limits: &HttpLimits,
) -> Result<Box<dyn TlsStream>> {
    let port = url.effective_port();
    let addr = (url.host.as_str(), port)
        .to_socket_addrs()
        .map_err(|e| backend("DNS resolution failed", e))?
        .next()
        .ok_or_else(|| WebxError::Backend(format!("no addresses for {}:{port}", url.host)))?;

    let tcp = TcpStream::connect_timeout(&addr, limits.connect_timeout)
        .map_err(|e| backend("TCP connect failed", e))?;
    tcp.set_read_timeout(Some(limits.read_timeout))
        .map_err(|e| backend("set read timeout", e))?;

    if url.scheme != "https" {
        return Ok(Box::new(tcp));
    }
    match tls {
        Some(provider) => provider.connect_tls(tcp, &url.host),
        None => Err(WebxError::Backend(
            "HTTPS requested but TLS is not available".to_string(),
        )),
    }
}

fn request_text(url: &Url) -> String {
    let default_port = if url.scheme == "https" { 443 } else { 80 };
    let host = match url.port {
        Some(port) if port != default_port => format!("{}:{port}", url.host),
        _ => url.host.clone(),
    };
    format!(
        "GET {} HTTP/1.1\r\n\
         Host: {host}\r\n\
         User-Agent: WebX/{}\r\n\
         Accept: */*\r\n\
         Connection: close\r\n\r\n",
        url.request_target(),
        env!("CARGO_PKG_VERSION"),
    )
}

/// Read until the peer closes (or the read timeout fires).
fn read_to_close(stream: &mut dyn TlsStream, ceiling: usize) -> Result<Vec<u8>> {
    let mut raw = Vec::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = match stream.read(&mut buf) {
            Ok(0) => return Ok(raw),
            Ok(n) => n,
            // A TLS peer that skips close_notify shows up as UnexpectedEof.
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock
                        | io::ErrorKind::TimedOut
                        | io::ErrorKind::UnexpectedEof
                ) =>
            {
                return Ok(raw);
            },
            Err(e) => return Err(backend("read response", e)),
        };
        if raw.len() + n > ceiling {
            return Err(WebxError::Backend("response too large".to_string()));
        }
        raw.extend_from_slice(&buf[..n]);
    }
}

/// How the body is delimited on the wire.
#[derive(Debug, PartialEq)]
enum Framing {
    Chunked,
    Length(usize),
    UntilClose,
}

impl Framing {
    fn from_headers(headers: &[(String, String)]) -> Result<Self> {
        if find_header(headers, "transfer-encoding").is_some_and(|v| v.contains("chunked")) {
            return Ok(Framing::Chunked);
        }
        match find_header(headers, "content-length") {
            Some(len) => len
                .parse()
                .map(Framing::Length)
                .map_err(|_| WebxError::Backend("bad Content-Length".to_string())),
            None => Ok(Framing::UntilClose),
        }
    }
}

fn too_large() -> WebxError {
    WebxError::Backend("response body exceeds size limit".to_string())
}

/// Split raw response bytes into status, headers and a decoded body.
pub fn parse_response(data: &[u8], max_body: usize) -> Result<HttpResponse> {
    let split = data
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .ok_or_else(|| {
            WebxError::Backend("malformed HTTP response: no header terminator".to_string())
        })?;
    let head = std::str::from_utf8(&data[..split])
        .map_err(|_| WebxError::Backend("non-UTF-8 headers".to_string()))?;
    let payload = &data[split + 4..];

    let mut lines = head.split("\r\n");
    let status_code = parse_status_line(lines.next().unwrap_or_default())?;
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect();

    let body = match Framing::from_headers(&headers)? {
        Framing::Chunked => decode_chunked(payload, max_body)?,
        Framing::Length(len) if len > max_body => return Err(too_large()),
        Framing::Length(len) => payload[..payload.len().min(len)].to_vec(),
        Framing::UntilClose if payload.len() > max_body => return Err(too_large()),
        Framing::UntilClose => payload.to_vec(),
    };

    Ok(HttpResponse {
        url: String::new(),
        status_code,
        headers,
        body,
    })
}

/// Status code from `HTTP/1.x NNN reason`.
fn parse_status_line(line: &str) -> Result<u16> {
    line.split(' ')
        .nth(1)
        .and_then(|code| code.parse().ok())
        .ok_or_else(|| WebxError::Backend(format!("bad status line: {line}")))
}

/// Header value by name, ignoring case.
pub fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Decode a chunked body. A truncated final chunk keeps what arrived.
fn decode_chunked(mut rest: &[u8], max_body: usize) -> Result<Vec<u8>> {
    let bad_size = || WebxError::Backend("bad chunk size".to_string());
    let mut out = Vec::new();

    while let Some(eol) = rest.windows(2).position(|w| w == b"\r\n") {
        let size_line = std::str::from_utf8(&rest[..eol]).map_err(|_| bad_size())?;
        let digits = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(digits, 16).map_err(|_| bad_size())?;
        if size == 0 {
            break;
        }
        if out.len().checked_add(size).is_none_or(|total| total > max_body) {
            return Err(WebxError::Backend("chunked body exceeds size limit".to_string()));
        }

        let data = &rest[eol + 2..];
        if data.len() < size {
            out.extend_from_slice(data);
            break;
        }
        out.extend_from_slice(&data[..size]);
        rest = data.get(size + 2..).unwrap_or_default();
    }
    Ok(out)
}
