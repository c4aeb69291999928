//! SSO reservation-redemption classifier (e.g. SAML login callback).
//!
//! # Responsibilities
//! - Claim only the exact login callback: path + action parameter
//! - Peek at the login reservation named by the token parameter
//!
//! # Design Decisions
//! - The reservation is never redeemed here; the login flow downstream does
//!   that exactly once, so peeking must stay side-effect free
//! - Unknown, expired or already redeemed tokens are `Unclaimable`

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::classify::{Classifier, ClassifyError, RequestView, TenantResolver};
use crate::resilience::bounded;
use crate::segment::Classification;
use crate::services::ReservationLookup;

const NAME: &str = "sso-callback";

/// Where the SSO callback lives and how its parameters are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackRoute {
    pub login_path: String,
    pub action_param: String,
    pub action: String,
    pub token_param: String,
}

pub struct SsoCallbackClassifier {
    route: CallbackRoute,
    reservations: Arc<dyn ReservationLookup>,
    tenants: TenantResolver,
    timeout: Duration,
}

impl SsoCallbackClassifier {
    pub fn new(
        route: CallbackRoute,
        reservations: Arc<dyn ReservationLookup>,
        tenants: TenantResolver,
        timeout: Duration,
    ) -> Self {
        Self {
            route,
            reservations,
            tenants,
            timeout,
        }
    }

    fn is_callback(&self, view: &RequestView) -> bool {
        view.path().trim_end_matches('/') == self.route.login_path.trim_end_matches('/')
            && view.query_param(&self.route.action_param) == Some(self.route.action.as_str())
    }
}

#[async_trait]
impl Classifier for SsoCallbackClassifier {
    fn name(&self) -> &str {
        NAME
    }

    async fn classify(&self, view: &RequestView) -> Result<Classification, ClassifyError> {
        if !self.is_callback(view) {
            return Ok(Classification::NotApplicable);
        }

        let Some(token) = view
            .query_param(&self.route.token_param)
            .filter(|t| !t.is_empty())
        else {
            tracing::debug!(action = %self.route.action, "SSO callback without reservation token");
            return Ok(Classification::Unclaimable);
        };

        let peek = self.reservations.peek_reservation(token);
        let reservation = bounded("reservation lookup", self.timeout, peek)
            .await
            .map_err(|source| ClassifyError::Collaborator {
                classifier: NAME,
                source,
            })?;

        match reservation {
            Some(r) => self.tenants.resolve(NAME, r.context_id, r.user_id).await,
            None => {
                tracing::debug!(action = %self.route.action, "Unknown or expired reservation token");
                Ok(Classification::Unclaimable)
            }
        }
    }
}
