//! Read-only view over an inbound request.
//!
//! # Responsibilities
//! - Expose the raw path and decoded query parameters
//! - Case-insensitive header lookup
//! - Split the `Authorization` header into scheme and credentials
//!
//! # Design Decisions
//! - Built once per request; classifiers never see the body
//! - Path is kept percent-encoded, as received
//! - Repeated query parameters: first occurrence wins

use std::net::IpAddr;

use axum::http::{header, HeaderMap, Request, Uri};

/// Parsed `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthHeader<'a> {
    pub scheme: &'a str,
    pub credentials: &'a str,
}

impl AuthHeader<'_> {
    /// Case-insensitive scheme comparison.
    pub fn is_scheme(&self, scheme: &str) -> bool {
        self.scheme.eq_ignore_ascii_case(scheme)
    }
}

/// What a classifier can see of a request.
#[derive(Debug, Clone)]
pub struct RequestView {
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    client_addr: Option<IpAddr>,
}

impl RequestView {
    /// Build a view from URI, headers and peer address.
    pub fn new(uri: &Uri, headers: HeaderMap, client_addr: Option<IpAddr>) -> Self {
        let query = uri
            .query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        Self {
            path: uri.path().to_string(),
            query,
            headers,
            client_addr,
        }
    }

    /// Build a view from an HTTP request.
    pub fn from_request<B>(request: &Request<B>, client_addr: Option<IpAddr>) -> Self {
        Self::new(request.uri(), request.headers().clone(), client_addr)
    }

    /// Request path, without the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// First value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Header value by case-insensitive name. Non-visible-ASCII values are ignored.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Remote address of the caller.
    pub fn client_addr(&self) -> Option<IpAddr> {
        self.client_addr
    }

    /// The `User-Agent` header.
    pub fn user_agent(&self) -> Option<&str> {
        self.header(header::USER_AGENT.as_str())
    }

    /// The `Authorization` header split into scheme and credentials.
    pub fn authorization(&self) -> Option<AuthHeader<'_>> {
        let raw = self.header(header::AUTHORIZATION.as_str())?.trim();
        if raw.is_empty() {
            return None;
        }
        let (scheme, credentials) = match raw.split_once(char::is_whitespace) {
            Some((scheme, rest)) => (scheme, rest.trim()),
            None => (raw, ""),
        };
        Some(AuthHeader {
            scheme,
            credentials,
        })
    }

    /// Path remainder after `prefix`, when the path lies under it.
    /// Matching honours segment boundaries: `/share` covers `/share/x` but not `/shared`.
    pub fn path_under<'a>(&'a self, prefix: &str) -> Option<&'a str> {
        strip_path_prefix(&self.path, prefix)
    }
}

/// Strip `prefix` from `path` on a segment boundary.
/// Returns the remainder (empty or starting with `/`).
pub fn strip_path_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let prefix = prefix.trim_end_matches('/');
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}
