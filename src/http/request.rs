//! Request model seen by the handler chain.
//!
//! # Design Decisions
//! - Requests are never mutated in place; rewrites produce a new value
//! - Only the parts a static server needs are kept (no body)
//! - Request IDs are short and only generated when header dumps are enabled

use std::borrow::Cow;
use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::request::Parts;
use axum::http::uri::PathAndQuery;
use axum::http::{HeaderMap, Method, Uri};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped when a decoded path is turned back into a request
/// target.
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// An inbound request as observed by middleware.
#[derive(Debug, Clone)]
pub struct ServeRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    remote_addr: Option<SocketAddr>,
}

impl ServeRequest {
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            remote_addr: None,
        }
    }

    /// Build from the head of an axum request. The peer address is taken
    /// from `ConnectInfo` when the router was served with it.
    pub fn from_parts(parts: &Parts) -> Self {
        let remote_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
            remote_addr,
        }
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Raw (still percent-encoded) path.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Percent-decoded path. Invalid UTF-8 is replaced lossily.
    pub fn decoded_path(&self) -> Cow<'_, str> {
        percent_decode_str(self.uri.path()).decode_utf8_lossy()
    }

    /// Path plus query, as it appeared on the request line.
    pub fn request_target(&self) -> &str {
        self.uri
            .path_and_query()
            .map(PathAndQuery::as_str)
            .unwrap_or("/")
    }

    /// A copy of this request pointing at `path` (decoded form). The query
    /// string and everything else is kept.
    pub fn with_path(&self, path: &str) -> Result<ServeRequest, axum::http::Error> {
        let encoded = utf8_percent_encode(path, PATH).to_string();
        let target = match self.uri.query() {
            Some(query) => format!("{encoded}?{query}"),
            None => encoded,
        };

        let mut parts = self.uri.clone().into_parts();
        parts.path_and_query = Some(PathAndQuery::try_from(target)?);
        let uri = Uri::from_parts(parts)?;

        Ok(ServeRequest {
            method: self.method.clone(),
            uri,
            headers: self.headers.clone(),
            remote_addr: self.remote_addr,
        })
    }
}

/// Short identifier used to correlate the two lines of a header dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// First eight characters of a random UUID followed by `suffix`.
    pub fn generate(suffix: &str) -> Self {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("{}{}", &uuid[..8], suffix))
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
