//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Classifier calls a collaborator:
//!     → timeouts.rs (enforce per-call deadline)
//!     → On expiry: CollaboratorError::Timeout, call future dropped
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every collaborator call has a deadline
//! - The orchestrator itself imposes no deadline; classifiers bound their calls

pub mod timeouts;

pub use timeouts::bounded;
