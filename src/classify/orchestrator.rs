//! Chain-of-responsibility dispatch over the classifier registry.
//!
//! # Algorithm
//! ```text
//! snapshot ← registry (priority order)
//! for each active classifier:
//!     NotApplicable → next
//!     Unclaimable   → stop, report claimant
//!     Resolved      → stop, report claimant
//!     Err(fault)    → stop, propagate
//! none claimed → NotApplicable
//! ```

use std::sync::Arc;

use serde::Serialize;

use crate::classify::registry::ClassifierRegistry;
use crate::classify::{ClassifierId, ClassifyError, RequestView};
use crate::observability::metrics;
use crate::segment::Classification;

/// The classifier that claimed a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claimant {
    pub id: ClassifierId,
    pub name: String,
}

/// Result of one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub classification: Classification,
    /// `None` exactly when no classifier claimed the request.
    pub claimed_by: Option<Claimant>,
}

impl Verdict {
    fn unclaimed() -> Self {
        Self {
            classification: Classification::NotApplicable,
            claimed_by: None,
        }
    }
}

/// Runs the registered classifiers against requests.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    registry: Arc<ClassifierRegistry>,
}

impl Orchestrator {
    pub fn new(registry: Arc<ClassifierRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this orchestrator dispatches over.
    pub fn registry(&self) -> &Arc<ClassifierRegistry> {
        &self.registry
    }

    /// Classify a request.
    pub async fn classify(&self, view: &RequestView) -> Result<Classification, ClassifyError> {
        Ok(self.evaluate(view).await?.classification)
    }

    /// Classify a request and report which classifier claimed it.
    pub async fn evaluate(&self, view: &RequestView) -> Result<Verdict, ClassifyError> {
        let snapshot = self.registry.snapshot();

        for entry in snapshot.iter().filter(|e| e.is_active()) {
            let outcome = match entry.classifier().classify(view).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    metrics::record_classify_error(entry.name());
                    tracing::warn!(
                        classifier = %entry.name(),
                        path = %view.path(),
                        error = %err,
                        "Classification aborted"
                    );
                    return Err(err);
                }
            };

            if !outcome.is_claimed() {
                continue;
            }

            metrics::record_classification(entry.name(), outcome.label());
            match &outcome {
                Classification::Resolved(resolution) => tracing::debug!(
                    classifier = %entry.name(),
                    schema = %resolution.marker,
                    user = ?resolution.user.map(|u| u.to_string()),
                    "Request resolved"
                ),
                _ => tracing::debug!(
                    classifier = %entry.name(),
                    path = %view.path(),
                    "Request claimed but unresolved"
                ),
            }

            return Ok(Verdict {
                classification: outcome,
                claimed_by: Some(Claimant {
                    id: entry.id(),
                    name: entry.name().to_string(),
                }),
            });
        }

        metrics::record_classification("none", Classification::NotApplicable.label());
        Ok(Verdict::unclaimed())
    }
}
