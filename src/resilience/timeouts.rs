//! Timeout enforcement for collaborator calls.
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the inner future is dropped on expiry
//! - Timeout errors are distinct from collaborator-reported failures

use std::future::Future;
use std::time::Duration;

use crate::services::CollaboratorError;

/// Run `call` with a deadline, mapping expiry to [`CollaboratorError::Timeout`].
pub async fn bounded<T, E, F>(service: &'static str, limit: Duration, call: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<CollaboratorError>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(service, timeout_ms = limit.as_millis() as u64, "Collaborator call timed out");
            Err(CollaboratorError::Timeout {
                service,
                after: limit,
            }
            .into())
        }
    }
}
