//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Verdict from the classification pipeline
//!     → router.rs (segment table lookup)
//!     → Return: RouteDecision (backend group + reason)
//!
//! Table Compilation (at startup and on reload):
//!     SegmentConfig
//!     → HashMap<schema, group>
//!     → Freeze as immutable SegmentTable
//! ```
//!
//! # Design Decisions
//! - Table is immutable after construction (thread-safe without locks)
//! - Deterministic: same verdict always routes to the same group
//! - Unresolved and unclaimed requests go to the default group

pub mod router;

pub use router::{RouteDecision, RouteReason, SegmentTable};
