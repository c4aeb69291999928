//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use segment_router::classify::{Classifier, ClassifyError, RequestView};
use segment_router::config::{BackendConfig, ContextConfig, RouterConfig};
use segment_router::http::HttpServer;
use segment_router::lifecycle::Shutdown;
use segment_router::segment::{Classification, SegmentMarker, UserInfo};
use segment_router::services::{
    ClientContext, CollaboratorError, CredentialVerifier, DirectoryError, LiveSession, Principal,
    Reservation, ReservationLookup, SchemaDirectory, SessionLookup, StaticSchemaDirectory,
    TokenStatus, TokenValidator,
};

/// Start a backend that answers every request with
/// `<name>|<x-segment-marker>|<x-segment-context>|<x-segment-user>`.
/// Missing headers are rendered as `-`.
pub async fn start_echo_backend(name: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                loop {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                    if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }

                let head = String::from_utf8_lossy(&buf);
                let headers: HashMap<String, String> = head
                    .lines()
                    .skip(1)
                    .filter_map(|line| line.split_once(':'))
                    .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
                    .collect();
                let field = |name: &str| headers.get(name).cloned().unwrap_or_else(|| "-".into());

                let body = format!(
                    "{}|{}|{}|{}",
                    name,
                    field("x-segment-marker"),
                    field("x-segment-context"),
                    field("x-segment-user")
                );
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

pub fn backend(name: &str, group: &str, addr: SocketAddr) -> BackendConfig {
    BackendConfig {
        name: name.into(),
        group: group.into(),
        address: addr.to_string(),
        max_connections: 100,
    }
}

pub fn context(id: u32, schema: &str) -> ContextConfig {
    ContextConfig {
        id,
        schema: schema.into(),
    }
}

/// A running router and the handle that stops it.
pub struct RunningRouter {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub reload: mpsc::UnboundedSender<RouterConfig>,
}

/// Start `server` on an ephemeral port.
pub async fn spawn_router(server: HttpServer) -> RunningRouter {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let (reload, config_updates) = mpsc::unbounded_channel();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    RunningRouter {
        addr,
        shutdown,
        reload,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub fn directory(entries: &[(u32, &str)]) -> Arc<StaticSchemaDirectory> {
    let contexts: Vec<ContextConfig> = entries.iter().map(|(id, s)| context(*id, s)).collect();
    Arc::new(StaticSchemaDirectory::from_config(&contexts))
}

pub fn resolved(schema: &str, context_id: u32, user_id: Option<u32>) -> Classification {
    Classification::resolved(
        SegmentMarker::new(schema).unwrap(),
        UserInfo::from_raw(context_id, user_id),
    )
}

/// Classifier with a fixed answer that counts its invocations.
pub struct CountingClassifier {
    name: String,
    outcome: Classification,
    pub calls: AtomicUsize,
}

impl CountingClassifier {
    pub fn new(name: &str, outcome: Classification) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            outcome,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for CountingClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn classify(&self, _view: &RequestView) -> Result<Classification, ClassifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(self.outcome.clone())
    }
}

/// Directory that is always down.
pub struct DownDirectory;

#[async_trait]
impl SchemaDirectory for DownDirectory {
    async fn schema_name(&self, _context_id: u32) -> Result<String, DirectoryError> {
        Err(CollaboratorError::Unavailable {
            service: "schema directory",
            reason: "connection refused".into(),
        }
        .into())
    }
}

/// Token validator backed by a fixed table; unknown tokens are invalid.
#[derive(Default)]
pub struct TableTokens(pub HashMap<String, TokenStatus>);

#[async_trait]
impl TokenValidator for TableTokens {
    async fn validate_access_token(&self, token: &str) -> Result<TokenStatus, CollaboratorError> {
        Ok(self.0.get(token).copied().unwrap_or(TokenStatus::Invalid))
    }
}

/// How a stub collaborator misbehaves.
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    /// Answer immediately with `CollaboratorError::Unavailable`.
    Down,
    /// Never answer within any reasonable deadline.
    Hang,
}

impl Fault {
    async fn strike<T>(self, service: &'static str) -> Result<T, CollaboratorError> {
        if let Fault::Hang = self {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Err(CollaboratorError::Unavailable {
            service,
            reason: "connection refused".into(),
        })
    }
}

/// Session lookup that always fails.
pub struct FaultySessions(pub Fault);

#[async_trait]
impl SessionLookup for FaultySessions {
    async fn find_live_session(
        &self,
        _login: &str,
        _client: &str,
    ) -> Result<Option<LiveSession>, CollaboratorError> {
        self.0.strike("session lookup").await
    }
}

/// Credential verifier that always fails.
pub struct FaultyVerifier(pub Fault);

#[async_trait]
impl CredentialVerifier for FaultyVerifier {
    async fn verify_without_login(
        &self,
        _login: &str,
        _password: &str,
        _client: &ClientContext,
    ) -> Result<Option<Principal>, CollaboratorError> {
        self.0.strike("credential verifier").await
    }
}

/// Reservation lookup that always fails.
pub struct FaultyReservations(pub Fault);

#[async_trait]
impl ReservationLookup for FaultyReservations {
    async fn peek_reservation(&self, _token: &str) -> Result<Option<Reservation>, CollaboratorError> {
        self.0.strike("reservation lookup").await
    }
}

/// Directory that never answers.
pub struct HangingDirectory;

#[async_trait]
impl SchemaDirectory for HangingDirectory {
    async fn schema_name(&self, _context_id: u32) -> Result<String, DirectoryError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(DirectoryError::UnknownContext(0))
    }
}

/// Start a fake identity service speaking the remote collaborator protocol.
///
/// Knows one login (`anton`/`secret`, a live session for client `dav`),
/// one access token (`tok`) and one SSO reservation (`res-1`), all in
/// context 7 for user 3.
pub async fn start_identity_service() -> SocketAddr {
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};

    let app = Router::new()
        .route(
            "/sessions",
            post(|Json(q): Json<Value>| async move {
                if q["login"] == "anton" && q["client"] == "dav" {
                    (axum::http::StatusCode::OK, Json(json!({"session_id": "s-1", "context_id": 7, "user_id": 3})))
                } else {
                    (axum::http::StatusCode::NOT_FOUND, Json(Value::Null))
                }
            }),
        )
        .route(
            "/verify",
            post(|Json(_): Json<Value>| async move {
                (axum::http::StatusCode::UNAUTHORIZED, Json(Value::Null))
            }),
        )
        .route(
            "/tokens",
            post(|Json(q): Json<Value>| async move {
                if q["token"] == "tok" {
                    Json(json!({"status": "valid", "context_id": 7, "user_id": 3}))
                } else {
                    Json(json!({"status": "invalid"}))
                }
            }),
        )
        .route(
            "/reservations",
            post(|Json(q): Json<Value>| async move {
                if q["token"] == "res-1" {
                    (axum::http::StatusCode::OK, Json(json!({"context_id": 7, "user_id": 3})))
                } else {
                    (axum::http::StatusCode::NOT_FOUND, Json(Value::Null))
                }
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}
