//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields, never tenant secrets (credentials, tokens)
//! - Request ID flows through all log events of a request
//! - Metrics are cheap; without an installed recorder they are no-ops

pub mod logging;
pub mod metrics;
