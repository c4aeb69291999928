//! Admin API authentication.
//!
//! Every admin route requires `Authorization: Bearer <admin.api_key>`. The
//! key is read from the live configuration, so a reload rotates it.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::http::server::AppState;

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let inner = state.inner.load();

    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(key) if key == inner.config.admin.api_key => Ok(next.run(request).await),
        _ => {
            tracing::warn!("Rejected admin request with missing or wrong API key");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
