//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Segment routed → backend_group identified
//!     → pool.rs (look up group)
//!     → round_robin.rs (rotate through backends with spare capacity)
//!     → backend.rs (acquire connection slot, released on drop)
//!     → Return guard or None
//! ```
//!
//! # Design Decisions
//! - Load balancer is stateless apart from its rotation counter
//! - Backends at their connection limit are skipped, not queued
//! - Pools are rebuilt wholesale on config reload

pub mod backend;
pub mod pool;
pub mod round_robin;

use std::sync::Arc;

use crate::load_balancer::backend::{Backend, BackendGuard};

/// Backend selection strategy for one group.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Pick a backend and reserve a connection slot on it.
    fn next_server(&self, backends: &[Arc<Backend>]) -> Option<BackendGuard>;
}
