//! Share-link classifier.
//!
//! Claims everything under the share prefix. The first path segment after the
//! prefix is the share token. Undecodable tokens are routine (crawlers, typos)
//! and are logged at debug only.

use std::sync::Arc;

use async_trait::async_trait;

use crate::classify::{Classifier, ClassifyError, RequestView, TenantResolver};
use crate::segment::Classification;
use crate::services::ShareTokenCodec;

const NAME: &str = "share-link";

pub struct ShareLinkClassifier {
    prefix: String,
    codec: Arc<dyn ShareTokenCodec>,
    tenants: TenantResolver,
}

impl ShareLinkClassifier {
    pub fn new(prefix: impl Into<String>, codec: Arc<dyn ShareTokenCodec>, tenants: TenantResolver) -> Self {
        Self {
            prefix: prefix.into(),
            codec,
            tenants,
        }
    }
}

#[async_trait]
impl Classifier for ShareLinkClassifier {
    fn name(&self) -> &str {
        NAME
    }

    async fn classify(&self, view: &RequestView) -> Result<Classification, ClassifyError> {
        let Some(rest) = view.path_under(&self.prefix) else {
            return Ok(Classification::NotApplicable);
        };

        let token = rest.trim_start_matches('/').split('/').next().unwrap_or_default();
        if token.is_empty() {
            tracing::debug!(path = %view.path(), "Share path without token");
            return Ok(Classification::Unclaimable);
        }

        let target = match self.codec.decode_share_token(token) {
            Ok(target) => target,
            Err(err) => {
                tracing::debug!(error = %err, "Undecodable share token");
                return Ok(Classification::Unclaimable);
            }
        };

        // A crafted token can carry any id; zero is simply not a tenant.
        if target.context_id == 0 {
            tracing::debug!("Share token names context 0");
            return Ok(Classification::Unclaimable);
        }

        self.tenants
            .resolve(NAME, target.context_id, Some(target.user_id))
            .await
    }
}
