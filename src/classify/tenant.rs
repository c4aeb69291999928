//! Tenant → segment resolution shared by all classifiers.

use std::sync::Arc;
use std::time::Duration;

use crate::classify::ClassifyError;
use crate::resilience::bounded;
use crate::segment::{Classification, SegmentMarker, UserInfo};
use crate::services::{DirectoryError, SchemaDirectory};

/// Turns a collaborator-reported tenant/user into a resolved classification.
#[derive(Clone)]
pub struct TenantResolver {
    directory: Arc<dyn SchemaDirectory>,
    timeout: Duration,
}

impl TenantResolver {
    pub fn new(directory: Arc<dyn SchemaDirectory>, timeout: Duration) -> Self {
        Self { directory, timeout }
    }

    /// Resolve the segment for `context_id`.
    ///
    /// - Zero context id or an empty schema: contract violation
    /// - Unknown context: `Unclaimable`
    /// - Directory failure or timeout: [`ClassifyError::Directory`]
    pub async fn resolve(
        &self,
        classifier: &'static str,
        context_id: u32,
        user_id: Option<u32>,
    ) -> Result<Classification, ClassifyError> {
        let user = UserInfo::from_raw(context_id, user_id).ok_or_else(|| {
            ClassifyError::ContractViolation {
                classifier,
                detail: "context id 0".to_string(),
            }
        })?;

        let lookup = self.directory.schema_name(context_id);
        match bounded("schema directory", self.timeout, lookup).await {
            Ok(schema) => {
                let marker = SegmentMarker::new(schema).ok_or_else(|| {
                    ClassifyError::ContractViolation {
                        classifier,
                        detail: format!("empty schema name for context {context_id}"),
                    }
                })?;
                Ok(Classification::resolved(marker, Some(user)))
            }
            Err(DirectoryError::UnknownContext(_)) => {
                tracing::debug!(classifier, context_id, "Claimed context is unknown");
                Ok(Classification::Unclaimable)
            }
            Err(DirectoryError::Unavailable(source)) => {
                Err(ClassifyError::Directory { context_id, source })
            }
        }
    }
}
