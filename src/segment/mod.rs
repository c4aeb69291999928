//! Segment identity subsystem.
//!
//! # Data Flow
//! ```text
//! Classifier resolves a tenant:
//!     → identity.rs (UserInfo: context + optional user)
//!     → directory lookup yields schema name
//!     → marker.rs (SegmentMarker, opaque wire token)
//!     → outcome.rs (Classification handed to the router)
//! ```
//!
//! # Design Decisions
//! - All values are immutable and live for one routing decision
//! - The marker codec is pure: no I/O, no existence checks
//! - The three-way outcome is a sum type, never a set of flags

pub mod identity;
pub mod marker;
pub mod outcome;

pub use identity::UserInfo;
pub use marker::{MarkerDecodeError, SegmentMarker};
pub use outcome::{Classification, Resolution};
