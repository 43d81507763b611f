//! Request and response values exchanged with the cache and the network
//!
//! Both are pass-through values: the worker only reads the request URL,
//! method and the headers named by a cached response's `Vary`.

use crate::error::{PrecacheError, PrecacheResult};
use serde::{Deserialize, Serialize};
use url::Url;

/// Header list in wire order, names compared case-insensitively
pub type Headers = Vec<(String, String)>;

/// An outgoing request from the controlled page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// HTTP method, upper case
    pub method: String,

    /// Absolute request URL
    pub url: Url,

    /// Request headers
    pub headers: Headers,

    /// Request body (empty for GET)
    #[serde(default)]
    pub body: Vec<u8>,
}

impl Request {
    /// Create a request with the given method and no headers
    pub fn new(method: impl Into<String>, url: Url) -> Self {
        let method: String = method.into();
        Self {
            method: method.to_ascii_uppercase(),
            url,
            headers: vec![],
            body: vec![],
        }
    }

    /// Create a GET request
    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    /// Add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a body
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Look up a header value by name
    pub fn header(&self, name: &str) -> Option<&str> {
        get_header(name, &self.headers)
    }

    /// Whether this request is a GET
    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// Identity of this request's URL in a cache store
    pub fn cache_key(&self) -> String {
        cache_key(&self.url)
    }
}

/// A response, either fetched from the network or replayed from a cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// HTTP status code
    pub status: u16,

    /// Status reason phrase
    pub status_text: String,

    /// Response headers
    pub headers: Headers,

    /// Response body
    pub body: Vec<u8>,
}

impl Response {
    /// Create a response with a status and body and no headers
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: String::new(),
            headers: vec![],
            body: body.into(),
        }
    }

    /// Add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up a header value by name
    pub fn header(&self, name: &str) -> Option<&str> {
        get_header(name, &self.headers)
    }

    /// True for 2xx statuses
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Resolve a path or URL against the origin the worker is scoped to
pub fn resolve(origin: &Url, path: &str) -> PrecacheResult<Url> {
    origin.join(path).map_err(|e| PrecacheError::InvalidUrl {
        url: path.to_string(),
        reason: e.to_string(),
    })
}

/// Cache identity of a URL: the full URL without its fragment
pub fn cache_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.to_string()
}

/// Get value for the header with the given name.
pub fn get_header<'a>(name: &str, headers: &'a [(String, String)]) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Get every value of the header with the given name, in wire order.
pub fn get_all_headers<'a>(name: &str, headers: &'a [(String, String)]) -> Vec<&'a str> {
    headers
        .iter()
        .filter(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
        .collect()
}

/// Get header names listed in a Vary header, lower-cased.
pub fn get_headers_from_vary_header(vary_header: &str) -> Vec<String> {
    vary_header
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Check that the headers named in `vary_header` are equal on the query
/// request and the request the cached response was stored for.
///
/// `Vary: *` never matches.
pub fn vary_header_matches(
    vary_header: &str,
    query_request_headers: &[(String, String)],
    cached_request_headers: &[(String, String)],
) -> bool {
    for header in get_headers_from_vary_header(vary_header) {
        if header == "*" {
            return false;
        }
        let query_header = get_header(&header, query_request_headers);
        let cached_header = get_header(&header, cached_request_headers);
        if query_header != cached_header {
            return false;
        }
    }
    true
}
