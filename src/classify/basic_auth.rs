//! Basic-auth classifier for web and DAV style clients.
//!
//! # Responsibilities
//! - Claim requests under registered protocol path prefixes
//! - Decode `Authorization: Basic` credentials
//! - Resolve repeat traffic from an existing session (fast path)
//! - Fall back to credential verification without a full login
//!
//! # Design Decisions
//! - Path table is copy-on-write; protocol plugins add/remove prefixes at runtime
//! - Longest matching prefix decides the client identifier
//! - Bad or missing credentials are `Unclaimable`, never faults
//! - Credentials are never logged

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::classify::view::strip_path_prefix;
use crate::classify::{Classifier, ClassifyError, RequestView, TenantResolver};
use crate::resilience::bounded;
use crate::segment::Classification;
use crate::services::{ClientContext, CredentialVerifier, SessionLookup};

const NAME: &str = "basic-auth";

/// A path prefix served by a Basic-auth protocol, and the client id its sessions use.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProtocolPath {
    pub prefix: String,
    pub client: String,
}

impl ProtocolPath {
    pub fn new(prefix: impl Into<String>, client: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            client: client.into(),
        }
    }
}

/// Classifier for Basic-auth protocols (WebDAV, CardDAV, CalDAV, legacy web clients).
pub struct BasicAuthClassifier {
    paths: ArcSwap<Vec<ProtocolPath>>,
    sessions: Arc<dyn SessionLookup>,
    verifier: Option<Arc<dyn CredentialVerifier>>,
    tenants: TenantResolver,
    timeout: Duration,
}

impl BasicAuthClassifier {
    pub fn new(
        sessions: Arc<dyn SessionLookup>,
        verifier: Option<Arc<dyn CredentialVerifier>>,
        tenants: TenantResolver,
        timeout: Duration,
    ) -> Self {
        Self {
            paths: ArcSwap::from_pointee(Vec::new()),
            sessions,
            verifier,
            tenants,
            timeout,
        }
    }

    /// Register several protocol paths at once.
    pub fn with_paths(self, paths: impl IntoIterator<Item = ProtocolPath>) -> Self {
        for path in paths {
            self.register_path(path);
        }
        self
    }

    /// Add a protocol path, replacing any entry with the same prefix.
    pub fn register_path(&self, path: ProtocolPath) {
        tracing::info!(prefix = %path.prefix, client = %path.client, "Basic-auth path registered");
        self.paths.rcu(|current| {
            let mut next: Vec<_> = current
                .iter()
                .filter(|p| p.prefix != path.prefix)
                .cloned()
                .collect();
            next.push(path.clone());
            next
        });
    }

    /// Remove a protocol path. Returns false if the prefix was not registered.
    pub fn unregister_path(&self, prefix: &str) -> bool {
        let previous = self.paths.rcu(|current| {
            current
                .iter()
                .filter(|p| p.prefix != prefix)
                .cloned()
                .collect::<Vec<_>>()
        });
        previous.iter().any(|p| p.prefix == prefix)
    }

    /// Currently registered paths.
    pub fn paths(&self) -> Vec<ProtocolPath> {
        self.paths.load().as_ref().clone()
    }

    fn match_path(&self, path: &str) -> Option<ProtocolPath> {
        self.paths
            .load()
            .iter()
            .filter(|p| strip_path_prefix(path, &p.prefix).is_some())
            .max_by_key(|p| p.prefix.trim_end_matches('/').len())
            .cloned()
    }

    async fn verify(
        &self,
        view: &RequestView,
        protocol: &ProtocolPath,
        login: &str,
        password: &str,
    ) -> Result<Classification, ClassifyError> {
        let Some(verifier) = &self.verifier else {
            tracing::debug!(path = %view.path(), "No live session and no credential verifier");
            return Ok(Classification::Unclaimable);
        };

        let client = ClientContext {
            client: protocol.client.clone(),
            address: view.client_addr(),
            user_agent: view.user_agent().map(str::to_string),
        };
        let call = verifier.verify_without_login(login, password, &client);
        let principal = bounded("credential verifier", self.timeout, call)
            .await
            .map_err(|source| ClassifyError::Collaborator {
                classifier: NAME,
                source,
            })?;

        match principal {
            Some(p) => self.tenants.resolve(NAME, p.context_id, p.user_id).await,
            None => {
                tracing::debug!(path = %view.path(), "Credentials could not be verified");
                Ok(Classification::Unclaimable)
            }
        }
    }
}

/// Decode `base64(login:password)`. Empty logins are rejected.
fn decode_basic(credentials: &str) -> Option<(String, String)> {
    let bytes = STANDARD.decode(credentials.trim()).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    let (login, password) = text.split_once(':')?;
    if login.is_empty() {
        return None;
    }
    Some((login.to_string(), password.to_string()))
}

#[async_trait]
impl Classifier for BasicAuthClassifier {
    fn name(&self) -> &str {
        NAME
    }

    async fn classify(&self, view: &RequestView) -> Result<Classification, ClassifyError> {
        let Some(protocol) = self.match_path(view.path()) else {
            return Ok(Classification::NotApplicable);
        };

        let credentials = view
            .authorization()
            .filter(|auth| auth.is_scheme("Basic"))
            .and_then(|auth| decode_basic(auth.credentials));
        let Some((login, password)) = credentials else {
            tracing::debug!(path = %view.path(), client = %protocol.client, "Missing or malformed Basic credentials");
            return Ok(Classification::Unclaimable);
        };

        let lookup = self.sessions.find_live_session(&login, &protocol.client);
        let session = bounded("session lookup", self.timeout, lookup)
            .await
            .map_err(|source| ClassifyError::Collaborator {
                classifier: NAME,
                source,
            })?;

        match session {
            Some(session) => {
                tracing::trace!(
                    context_id = session.context_id,
                    user_id = session.user_id,
                    "Resolved from live session"
                );
                self.tenants
                    .resolve(NAME, session.context_id, Some(session.user_id))
                    .await
            }
            None => self.verify(view, &protocol, &login, &password).await,
        }
    }
}
