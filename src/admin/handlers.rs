use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::classify::{ClassifierDescriptor, ProtocolPath};
use crate::http::server::AppState;
use crate::load_balancer::pool::BackendStatus;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub classifiers: usize,
}

#[derive(Debug, Serialize)]
pub struct SegmentsView {
    pub default_group: String,
    pub mappings: BTreeMap<String, String>,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started.elapsed().as_secs(),
        classifiers: state.orchestrator.registry().len(),
    })
}

/// Registered classifiers in dispatch order.
pub async fn get_classifiers(State(state): State<AppState>) -> Json<Vec<ClassifierDescriptor>> {
    Json(state.orchestrator.registry().describe())
}

pub async fn get_segments(State(state): State<AppState>) -> Json<SegmentsView> {
    let inner = state.inner.load();
    let segments = &inner.config.segments;
    Json(SegmentsView {
        default_group: segments.default_group.clone(),
        mappings: segments
            .mappings
            .iter()
            .map(|m| (m.schema.clone(), m.group.clone()))
            .collect(),
    })
}

pub async fn get_backends(State(state): State<AppState>) -> Json<Vec<BackendStatus>> {
    Json(state.inner.load().backends.status())
}

#[derive(Debug, Deserialize)]
pub struct PathQuery {
    pub prefix: String,
}

/// Basic-auth protocol paths. 404 when the classifier is not installed.
pub async fn get_paths(State(state): State<AppState>) -> Result<Json<Vec<ProtocolPath>>, StatusCode> {
    let classifier = state.protocol_paths.as_ref().ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(classifier.paths()))
}

/// Register a protocol path, replacing any entry with the same prefix.
pub async fn add_path(
    State(state): State<AppState>,
    Json(path): Json<ProtocolPath>,
) -> Result<StatusCode, StatusCode> {
    let classifier = state.protocol_paths.as_ref().ok_or(StatusCode::NOT_FOUND)?;
    let prefix_ok = path.prefix.starts_with('/') && !path.prefix.trim_end_matches('/').is_empty();
    if !prefix_ok || path.client.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    classifier.register_path(path);
    Ok(StatusCode::CREATED)
}

/// Remove the protocol path registered under `?prefix=`.
pub async fn remove_path(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
) -> StatusCode {
    match &state.protocol_paths {
        Some(classifier) if classifier.unregister_path(&query.prefix) => {
            tracing::info!(prefix = %query.prefix, "Basic-auth path removed");
            StatusCode::NO_CONTENT
        }
        _ => StatusCode::NOT_FOUND,
    }
}
