//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, request ID)
//!     → classification pipeline (RequestView → Verdict)
//!     → routing (segment table → backend group)
//!     → load balancer (backend slot)
//!     → request.rs (rewrite URI, set segment headers)
//!     → response.rs (strip hop-by-hop headers, map failures)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID, X_SEGMENT_CONTEXT, X_SEGMENT_MARKER, X_SEGMENT_USER};
pub use server::{AppState, HttpServer, RouterState};
