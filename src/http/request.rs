//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4)
//! - Drop client-supplied segment headers
//! - Stamp the classification onto the forwarded request
//! - Rewrite the URI to the selected backend
//!
//! # Design Decisions
//! - Inbound `x-segment-*` headers are never trusted
//! - Forwarded requests always use HTTP/1.1 towards backends

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Request, Uri, Version};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::http::response::strip_hop_by_hop;
use crate::segment::Classification;

pub const X_REQUEST_ID: &str = "x-request-id";
pub const X_SEGMENT_MARKER: &str = "x-segment-marker";
pub const X_SEGMENT_CONTEXT: &str = "x-segment-context";
pub const X_SEGMENT_USER: &str = "x-segment-user";

/// Generates `x-request-id` values for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The request id header, or `"unknown"`.
pub fn request_id_of(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Remove every `x-segment-*` header.
pub fn strip_segment_headers(headers: &mut HeaderMap) {
    let spoofed: Vec<_> = headers
        .keys()
        .filter(|name| name.as_str().starts_with("x-segment-"))
        .cloned()
        .collect();
    for name in spoofed {
        headers.remove(&name);
    }
}

/// Build the request sent to `backend`.
pub fn build_upstream_request(
    request: Request<Body>,
    backend: SocketAddr,
    classification: &Classification,
) -> Result<Request<Body>, axum::http::Error> {
    let (mut parts, body) = request.into_parts();

    strip_hop_by_hop(&mut parts.headers);
    strip_segment_headers(&mut parts.headers);

    if let Classification::Resolved(resolution) = classification {
        parts.headers.insert(
            X_SEGMENT_MARKER,
            HeaderValue::from_str(&resolution.marker.encode())?,
        );
        if let Some(user) = resolution.user {
            parts
                .headers
                .insert(X_SEGMENT_CONTEXT, HeaderValue::from(user.context_id()));
            if let Some(user_id) = user.user_id() {
                parts.headers.insert(X_SEGMENT_USER, HeaderValue::from(user_id));
            }
        }
    }

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    parts.uri = Uri::builder()
        .scheme("http")
        .authority(backend.to_string())
        .path_and_query(path_and_query)
        .build()?;
    parts.version = Version::HTTP_11;

    Ok(Request::from_parts(parts, body))
}
