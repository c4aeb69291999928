//! External collaborators consumed by the classifiers.
//!
//! # Data Flow
//! ```text
//! Classifier
//!     → SessionLookup / CredentialVerifier   (Basic-auth clients)
//!     → TokenValidator                       (OAuth bearer clients)
//!     → ReservationLookup                    (SSO callback)
//!     → ShareTokenCodec                      (share links)
//!     → SchemaDirectory                      (tenant → segment, all classifiers)
//! ```
//!
//! # Design Decisions
//! - Every collaborator is a trait object injected at construction time
//! - Collaborators report raw ids; classifiers validate them
//! - Built-in implementations cover single-node deployments and tests:
//!   directory.rs, sessions.rs, reservations.rs, share_token.rs
//! - remote.rs talks to an external identity service over HTTP

pub mod directory;
pub mod remote;
pub mod reservations;
pub mod sessions;
pub mod share_token;

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;

pub use directory::StaticSchemaDirectory;
pub use remote::{
    HttpCredentialVerifier, HttpReservationLookup, HttpSessionLookup, HttpTokenValidator,
    RemoteCollaborators,
};
pub use reservations::InMemoryReservationStore;
pub use sessions::InMemorySessionStore;
pub use share_token::{HexShareTokenCodec, ShareToken};

/// Failure talking to a collaborator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CollaboratorError {
    /// The collaborator could not serve the call.
    #[error("{service} unavailable: {reason}")]
    Unavailable {
        service: &'static str,
        reason: String,
    },

    /// The collaborator did not answer in time.
    #[error("{service} did not answer within {after:?}")]
    Timeout {
        service: &'static str,
        after: Duration,
    },
}

/// Failure resolving a tenant's schema.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DirectoryError {
    /// The tenant is not known to the directory.
    #[error("context {0} does not exist")]
    UnknownContext(u32),

    /// The directory itself failed.
    #[error(transparent)]
    Unavailable(#[from] CollaboratorError),
}

/// Tenant-to-partition directory.
#[async_trait]
pub trait SchemaDirectory: Send + Sync {
    /// Schema name of the segment holding `context_id`.
    async fn schema_name(&self, context_id: u32) -> Result<String, DirectoryError>;
}

/// A session already established for some login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSession {
    pub session_id: String,
    pub context_id: u32,
    pub user_id: u32,
}

/// Lookup of live sessions by login name and client identifier.
#[async_trait]
pub trait SessionLookup: Send + Sync {
    async fn find_live_session(
        &self,
        login: &str,
        client: &str,
    ) -> Result<Option<LiveSession>, CollaboratorError>;
}

/// Where a credential check originates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    /// Client identifier registered for the protocol path.
    pub client: String,
    /// Remote address of the caller.
    pub address: Option<IpAddr>,
    /// Raw `User-Agent` header.
    pub user_agent: Option<String>,
}

/// Tenant/user established by a collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub context_id: u32,
    pub user_id: Option<u32>,
}

/// Verifies credentials without establishing a session.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify_without_login(
        &self,
        login: &str,
        password: &str,
        client: &ClientContext,
    ) -> Result<Option<Principal>, CollaboratorError>;
}

/// Result of an access-token check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Valid { context_id: u32, user_id: u32 },
    Invalid,
    Expired,
    Malformed,
}

/// OAuth access-token validation.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate_access_token(&self, token: &str) -> Result<TokenStatus, CollaboratorError>;
}

/// A pending SSO login reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub context_id: u32,
    pub user_id: Option<u32>,
}

/// Read access to SSO login reservations.
///
/// `peek_reservation` must not consume the reservation or alter its expiry.
#[async_trait]
pub trait ReservationLookup: Send + Sync {
    async fn peek_reservation(&self, token: &str) -> Result<Option<Reservation>, CollaboratorError>;
}

/// Tenant and sharing user encoded in a share link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareTarget {
    pub context_id: u32,
    pub user_id: u32,
}

/// Why a share token could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShareTokenError {
    #[error("share token has invalid length {0}")]
    Length(usize),

    #[error("share token contains non-hex characters")]
    NotHex,
}

/// Decoder for opaque share tokens.
pub trait ShareTokenCodec: Send + Sync {
    fn decode_share_token(&self, token: &str) -> Result<ShareTarget, ShareTokenError>;
}
