//! Segment router library.
//!
//! Classifies unauthenticated inbound requests to the storage segment that
//! holds their tenant and forwards them to that segment's backend group.

pub mod admin;
pub mod classify;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod segment;
pub mod services;

pub use classify::{ClassifierRegistry, Orchestrator};
pub use config::RouterConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use segment::{Classification, SegmentMarker, UserInfo};
