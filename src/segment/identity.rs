//! Tenant and user identity produced by a successful resolution.

use std::fmt;
use std::num::NonZeroU32;

use serde::Serialize;

/// The tenant (context) and, when known, the acting user.
///
/// A context id of zero is unrepresentable. The user id is absent when the
/// request names a tenant but not yet a specific principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct UserInfo {
    context_id: NonZeroU32,
    user_id: Option<u32>,
}

impl UserInfo {
    /// Create an identity from a validated context id.
    pub fn new(context_id: NonZeroU32, user_id: Option<u32>) -> Self {
        Self { context_id, user_id }
    }

    /// Create an identity from raw collaborator values.
    /// Returns `None` when the context id is zero.
    pub fn from_raw(context_id: u32, user_id: Option<u32>) -> Option<Self> {
        NonZeroU32::new(context_id).map(|ctx| Self::new(ctx, user_id))
    }

    /// The tenant id.
    pub fn context_id(&self) -> u32 {
        self.context_id.get()
    }

    /// The acting user, if known.
    pub fn user_id(&self) -> Option<u32> {
        self.user_id
    }
}

impl fmt::Display for UserInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.user_id {
            Some(user) => write!(f, "{}@{}", user, self.context_id),
            None => write!(f, "*@{}", self.context_id),
        }
    }
}
