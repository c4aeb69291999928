//! Response handling and transformation.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Map routing failures to generic status responses
//!
//! # Design Decisions
//! - Failure bodies never name a tenant, schema or classifier

use axum::body::Body;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

const HOP_BY_HOP: [header::HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Remove connection-scoped headers.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}

/// Relay a backend response to the client.
pub fn relay(response: hyper::Response<hyper::body::Incoming>) -> Response {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}

/// Classification could not complete; the request must not be routed.
pub fn routing_fault() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "Service temporarily unavailable").into_response()
}

/// No backend in the chosen group can take the request.
pub fn no_backend() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "No backend available").into_response()
}

/// Forwarding to the backend failed.
pub fn upstream_failed() -> Response {
    (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
}
