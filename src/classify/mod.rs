//! Request segment-resolution pipeline.
//!
//! # Data Flow
//! ```text
//! Inbound request (not yet authenticated)
//!     → view.rs (RequestView: path, query, headers, client address)
//!     → orchestrator.rs (snapshot registry.rs, try classifiers by priority)
//!         - basic_auth.rs   (web/DAV clients, registered path prefixes)
//!         - bearer.rs       (OAuth bearer tokens, any path)
//!         - sso.rs          (SSO reservation callback)
//!         - share.rs        (share links)
//!     → tenant.rs (context id → schema → SegmentMarker)
//!     → Verdict: NotApplicable | Unclaimable | Resolved(marker, user)
//! ```
//!
//! # Design Decisions
//! - First claim wins: Unclaimable stops the chain just like Resolved
//! - Classification outcomes are values; only operational faults are errors
//! - A fault aborts the whole run, no lower-priority fallback
//! - The registry is copy-on-write; runs never hold a lock across awaits

pub mod basic_auth;
pub mod bearer;
pub mod orchestrator;
pub mod registry;
pub mod share;
pub mod sso;
pub mod tenant;
pub mod view;

use async_trait::async_trait;

use crate::segment::Classification;
use crate::services::CollaboratorError;

pub use basic_auth::{BasicAuthClassifier, ProtocolPath};
pub use bearer::BearerClassifier;
pub use orchestrator::{Claimant, Orchestrator, Verdict};
pub use registry::{ClassifierDescriptor, ClassifierEntry, ClassifierId, ClassifierRegistry};
pub use share::ShareLinkClassifier;
pub use sso::{CallbackRoute, SsoCallbackClassifier};
pub use tenant::TenantResolver;
pub use view::RequestView;

/// Operational fault that aborts classification of a request.
///
/// Routine outcomes such as a bad token are reported as
/// [`Classification::Unclaimable`], never through this type.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    /// The tenant directory could not answer.
    #[error("schema lookup for context {context_id} failed: {source}")]
    Directory {
        context_id: u32,
        #[source]
        source: CollaboratorError,
    },

    /// A classifier's verification collaborator failed.
    #[error("{classifier} collaborator failed: {source}")]
    Collaborator {
        classifier: &'static str,
        #[source]
        source: CollaboratorError,
    },

    /// A collaborator answered with data that breaks its contract.
    #[error("{classifier} collaborator returned invalid data: {detail}")]
    ContractViolation {
        classifier: &'static str,
        detail: String,
    },
}

/// A protocol-specific strategy that tries to claim and resolve a request.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Stable name used in logs, metrics and the admin API.
    fn name(&self) -> &str;

    /// Inspect the request. Must return [`Classification::NotApplicable`]
    /// for any request shape this protocol does not own.
    async fn classify(&self, view: &RequestView) -> Result<Classification, ClassifyError>;
}
