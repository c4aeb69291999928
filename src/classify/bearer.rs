//! OAuth bearer-token classifier.
//!
//! Scheme-selective rather than path-selective: bearer tokens may appear on
//! any endpoint. Every validation problem degrades to `Unclaimable`, including
//! a deployment without an OAuth provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::classify::{Classifier, ClassifyError, RequestView, TenantResolver};
use crate::resilience::bounded;
use crate::segment::Classification;
use crate::services::{TokenStatus, TokenValidator};

const NAME: &str = "oauth-bearer";

pub struct BearerClassifier {
    validator: Option<Arc<dyn TokenValidator>>,
    tenants: TenantResolver,
    timeout: Duration,
}

impl BearerClassifier {
    pub fn new(
        validator: Option<Arc<dyn TokenValidator>>,
        tenants: TenantResolver,
        timeout: Duration,
    ) -> Self {
        Self {
            validator,
            tenants,
            timeout,
        }
    }
}

#[async_trait]
impl Classifier for BearerClassifier {
    fn name(&self) -> &str {
        NAME
    }

    async fn classify(&self, view: &RequestView) -> Result<Classification, ClassifyError> {
        let Some(auth) = view.authorization().filter(|a| a.is_scheme("Bearer")) else {
            return Ok(Classification::NotApplicable);
        };
        if auth.credentials.is_empty() {
            tracing::debug!(path = %view.path(), "Empty bearer token");
            return Ok(Classification::Unclaimable);
        }

        let Some(validator) = &self.validator else {
            tracing::debug!("Bearer token seen but no OAuth provider is configured");
            return Ok(Classification::Unclaimable);
        };

        let call = validator.validate_access_token(auth.credentials);
        match bounded("token validator", self.timeout, call).await {
            Ok(TokenStatus::Valid {
                context_id,
                user_id,
            }) => self.tenants.resolve(NAME, context_id, Some(user_id)).await,
            Ok(status) => {
                tracing::debug!(status = ?status, "Bearer token rejected");
                Ok(Classification::Unclaimable)
            }
            Err(err) => {
                tracing::info!(error = %err, "Token validator unavailable");
                Ok(Classification::Unclaimable)
            }
        }
    }
}
