//! HTTP-backed collaborators.
//!
//! # Responsibilities
//! - Ask an external identity service for sessions, credential checks,
//!   access-token status and SSO reservations
//! - Map HTTP outcomes onto collaborator results
//!
//! # Wire Format
//! Every call is `POST <url>` with a JSON body and an optional
//! `Authorization: Bearer <api_key>` header.
//! ```text
//! session      {"login","client"}                               → {"session_id","context_id","user_id"}
//! verifier     {"login","password","client","address","user_agent"} → {"context_id","user_id"?}
//! token        {"token"}                                        → {"status":"valid","context_id","user_id"}
//!                                                                  | {"status":"invalid"|"expired"|"malformed"}
//! reservation  {"token"}                                        → {"context_id","user_id"?}
//! ```
//! 404, 401 and 403 mean "nothing found"; other non-2xx statuses, transport
//! errors and unreadable bodies are collaborator failures.
//!
//! # Design Decisions
//! - Deadlines are applied by the calling classifier (`resilience::bounded`)
//! - One shared `reqwest::Client` so connections are pooled across collaborators

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::RemoteConfig;
use crate::services::{
    ClientContext, CollaboratorError, CredentialVerifier, LiveSession, Principal, Reservation,
    ReservationLookup, SessionLookup, TokenStatus, TokenValidator,
};

/// One remote endpoint.
#[derive(Debug, Clone)]
pub struct Endpoint {
    service: &'static str,
    url: Url,
    api_key: Option<Arc<str>>,
    client: reqwest::Client,
}

impl Endpoint {
    pub fn new(
        service: &'static str,
        url: &str,
        api_key: Option<&str>,
        client: reqwest::Client,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            service,
            url: Url::parse(url)?,
            api_key: api_key.map(Arc::from),
            client,
        })
    }

    fn unavailable(&self, reason: impl ToString) -> CollaboratorError {
        CollaboratorError::Unavailable {
            service: self.service,
            reason: reason.to_string(),
        }
    }

    /// POST `body`; `Ok(None)` when the service reports nothing found.
    async fn call<Req, Resp>(&self, body: &Req) -> Result<Option<Resp>, CollaboratorError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let mut request = self.client.post(self.url.clone()).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| self.unavailable(e))?;
        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status if status.is_success() => response
                .json::<Resp>()
                .await
                .map(Some)
                .map_err(|e| self.unavailable(format!("unreadable reply: {e}"))),
            status => Err(self.unavailable(format!("status {status}"))),
        }
    }
}

#[derive(Serialize)]
struct SessionQuery<'a> {
    login: &'a str,
    client: &'a str,
}

#[derive(Deserialize)]
struct SessionReply {
    session_id: String,
    context_id: u32,
    user_id: u32,
}

#[derive(Serialize)]
struct VerifyQuery<'a> {
    login: &'a str,
    password: &'a str,
    client: &'a str,
    address: Option<String>,
    user_agent: Option<&'a str>,
}

#[derive(Deserialize)]
struct PrincipalReply {
    context_id: u32,
    #[serde(default)]
    user_id: Option<u32>,
}

#[derive(Serialize)]
struct TokenQuery<'a> {
    token: &'a str,
}

#[derive(Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum TokenReply {
    Valid { context_id: u32, user_id: u32 },
    Invalid,
    Expired,
    Malformed,
}

/// Live-session lookup over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSessionLookup(Endpoint);

#[async_trait]
impl SessionLookup for HttpSessionLookup {
    async fn find_live_session(
        &self,
        login: &str,
        client: &str,
    ) -> Result<Option<LiveSession>, CollaboratorError> {
        let reply: Option<SessionReply> = self.0.call(&SessionQuery { login, client }).await?;
        Ok(reply.map(|r| LiveSession {
            session_id: r.session_id,
            context_id: r.context_id,
            user_id: r.user_id,
        }))
    }
}

/// Credential check over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCredentialVerifier(Endpoint);

#[async_trait]
impl CredentialVerifier for HttpCredentialVerifier {
    async fn verify_without_login(
        &self,
        login: &str,
        password: &str,
        client: &ClientContext,
    ) -> Result<Option<Principal>, CollaboratorError> {
        let query = VerifyQuery {
            login,
            password,
            client: &client.client,
            address: client.address.map(|a| a.to_string()),
            user_agent: client.user_agent.as_deref(),
        };
        let reply: Option<PrincipalReply> = self.0.call(&query).await?;
        Ok(reply.map(|r| Principal {
            context_id: r.context_id,
            user_id: r.user_id,
        }))
    }
}

/// OAuth access-token validation over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTokenValidator(Endpoint);

#[async_trait]
impl TokenValidator for HttpTokenValidator {
    async fn validate_access_token(&self, token: &str) -> Result<TokenStatus, CollaboratorError> {
        let reply: Option<TokenReply> = self.0.call(&TokenQuery { token }).await?;
        Ok(match reply {
            Some(TokenReply::Valid {
                context_id,
                user_id,
            }) => TokenStatus::Valid {
                context_id,
                user_id,
            },
            Some(TokenReply::Expired) => TokenStatus::Expired,
            Some(TokenReply::Malformed) => TokenStatus::Malformed,
            Some(TokenReply::Invalid) | None => TokenStatus::Invalid,
        })
    }
}

/// SSO reservation peek over HTTP. The service must not consume the reservation.
#[derive(Debug, Clone)]
pub struct HttpReservationLookup(Endpoint);

#[async_trait]
impl ReservationLookup for HttpReservationLookup {
    async fn peek_reservation(&self, token: &str) -> Result<Option<Reservation>, CollaboratorError> {
        let reply: Option<PrincipalReply> = self.0.call(&TokenQuery { token }).await?;
        Ok(reply.map(|r| Reservation {
            context_id: r.context_id,
            user_id: r.user_id,
        }))
    }
}

/// The remote collaborators named in configuration. Unset URLs stay `None`.
#[derive(Debug, Clone, Default)]
pub struct RemoteCollaborators {
    pub sessions: Option<HttpSessionLookup>,
    pub verifier: Option<HttpCredentialVerifier>,
    pub tokens: Option<HttpTokenValidator>,
    pub reservations: Option<HttpReservationLookup>,
}

impl RemoteCollaborators {
    pub fn from_config(config: &RemoteConfig) -> Result<Self, url::ParseError> {
        let client = reqwest::Client::new();
        let key = config.api_key.as_deref();
        let endpoint = |service: &'static str, url: &Option<String>| {
            url.as_deref()
                .map(|u| Endpoint::new(service, u, key, client.clone()))
                .transpose()
        };

        Ok(Self {
            sessions: endpoint("session lookup", &config.session_url)?.map(HttpSessionLookup),
            verifier: endpoint("credential verifier", &config.verifier_url)?.map(HttpCredentialVerifier),
            tokens: endpoint("token validator", &config.token_url)?.map(HttpTokenValidator),
            reservations: endpoint("reservation lookup", &config.reservation_url)?
                .map(HttpReservationLookup),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::net::SocketAddr;

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        addr
    }

    fn remote(addr: SocketAddr, key: Option<&str>) -> RemoteCollaborators {
        let base = format!("http://{addr}");
        RemoteCollaborators::from_config(&RemoteConfig {
            api_key: key.map(str::to_string),
            session_url: Some(format!("{base}/sessions")),
            verifier_url: Some(format!("{base}/verify")),
            token_url: Some(format!("{base}/tokens")),
            reservation_url: Some(format!("{base}/reservations")),
        })
        .unwrap()
    }

    async fn sessions(headers: HeaderMap, Json(q): Json<Value>) -> Result<Json<Value>, StatusCode> {
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer k") {
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
        match (q["login"].as_str(), q["client"].as_str()) {
            (Some("anton"), Some("dav")) => Ok(Json(json!({"session_id": "s", "context_id": 7, "user_id": 3}))),
            _ => Err(StatusCode::NOT_FOUND),
        }
    }

    async fn verify(Json(q): Json<Value>) -> Result<Json<Value>, StatusCode> {
        match q["password"].as_str() {
            Some("secret") => Ok(Json(json!({"context_id": 7}))),
            Some("boom") => Err(StatusCode::BAD_GATEWAY),
            _ => Err(StatusCode::UNAUTHORIZED),
        }
    }

    async fn tokens(Json(q): Json<Value>) -> Json<Value> {
        Json(match q["token"].as_str() {
            Some("good") => json!({"status": "valid", "context_id": 7, "user_id": 5}),
            Some("old") => json!({"status": "expired"}),
            _ => json!({"status": "invalid"}),
        })
    }

    async fn reservations(Json(q): Json<Value>) -> Result<String, StatusCode> {
        match q["token"].as_str() {
            Some("r1") => Ok(r#"{"context_id":7,"user_id":2}"#.to_string()),
            Some("garbled") => Ok("not json".to_string()),
            _ => Err(StatusCode::NOT_FOUND),
        }
    }

    async fn identity_service() -> SocketAddr {
        serve(
            Router::new()
                .route("/sessions", post(sessions))
                .route("/verify", post(verify))
                .route("/tokens", post(tokens))
                .route("/reservations", post(reservations)),
        )
        .await
    }

    #[tokio::test]
    async fn test_session_lookup_sends_key() {
        let addr = identity_service().await;
        let with_key = remote(addr, Some("k")).sessions.unwrap();
        let session = with_key.find_live_session("anton", "dav").await.unwrap().unwrap();
        assert_eq!((session.context_id, session.user_id), (7, 3));
        assert_eq!(with_key.find_live_session("anton", "caldav").await.unwrap(), None);

        let without_key = remote(addr, None).sessions.unwrap();
        assert!(matches!(
            without_key.find_live_session("anton", "dav").await,
            Err(CollaboratorError::Unavailable { service: "session lookup", .. })
        ));
    }

    #[tokio::test]
    async fn test_verifier_statuses() {
        let verifier = remote(identity_service().await, None).verifier.unwrap();
        let client = ClientContext {
            client: "dav".into(),
            address: None,
            user_agent: None,
        };

        let ok = verifier.verify_without_login("anton", "secret", &client).await.unwrap();
        assert_eq!(ok, Some(Principal { context_id: 7, user_id: None }));
        assert_eq!(verifier.verify_without_login("anton", "nope", &client).await.unwrap(), None);
        assert!(verifier.verify_without_login("anton", "boom", &client).await.is_err());
    }

    #[tokio::test]
    async fn test_token_statuses() {
        let tokens = remote(identity_service().await, None).tokens.unwrap();
        assert_eq!(
            tokens.validate_access_token("good").await.unwrap(),
            TokenStatus::Valid { context_id: 7, user_id: 5 }
        );
        assert_eq!(tokens.validate_access_token("old").await.unwrap(), TokenStatus::Expired);
        assert_eq!(tokens.validate_access_token("x").await.unwrap(), TokenStatus::Invalid);
    }

    #[tokio::test]
    async fn test_reservation_peek() {
        let lookup = remote(identity_service().await, None).reservations.unwrap();
        assert_eq!(
            lookup.peek_reservation("r1").await.unwrap(),
            Some(Reservation { context_id: 7, user_id: Some(2) })
        );
        assert_eq!(lookup.peek_reservation("r2").await.unwrap(), None);
        assert!(lookup.peek_reservation("garbled").await.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let tokens = remote(addr, None).tokens.unwrap();
        assert!(matches!(
            tokens.validate_access_token("good").await,
            Err(CollaboratorError::Unavailable { service: "token validator", .. })
        ));
    }

    #[test]
    fn test_unset_urls_stay_local() {
        let remote = RemoteCollaborators::from_config(&RemoteConfig::default()).unwrap();
        assert!(remote.sessions.is_none() && remote.tokens.is_none());
        assert!(RemoteCollaborators::from_config(&RemoteConfig {
            token_url: Some("not a url".into()),
            ..RemoteConfig::default()
        })
        .is_err());
    }
}
