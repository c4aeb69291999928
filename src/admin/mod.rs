//! Admin API.
//!
//! JSON views of the running router, served on a separate listener
//! behind a Bearer API key. `/admin/paths` also adds and removes
//! Basic-auth protocol paths without a restart.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/classifiers", get(get_classifiers))
        .route("/admin/segments", get(get_segments))
        .route("/admin/backends", get(get_backends))
        .route(
            "/admin/paths",
            get(get_paths).post(add_path).delete(remove_path),
        )
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
