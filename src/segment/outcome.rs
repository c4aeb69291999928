//! Classification outcome.
//!
//! # Design Decisions
//! - Exactly one of three shapes; a resolution always carries a marker
//! - Outcomes are values, not errors: `Unclaimable` is routine traffic

use crate::segment::{SegmentMarker, UserInfo};

/// A successful resolution: the owning segment and the likely principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Segment that owns the addressed tenant.
    pub marker: SegmentMarker,
    /// Tenant/user the request is expected to act as.
    pub user: Option<UserInfo>,
}

/// What a classifier (or the whole pipeline) decided about a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The request does not have this protocol's shape.
    NotApplicable,
    /// The request belongs to the protocol but no identity could be established.
    Unclaimable,
    /// A verifiable identity was extracted.
    Resolved(Resolution),
}

impl Classification {
    /// Build a resolved outcome.
    pub fn resolved(marker: SegmentMarker, user: Option<UserInfo>) -> Self {
        Self::Resolved(Resolution { marker, user })
    }

    /// True for any outcome other than `NotApplicable`.
    pub fn is_claimed(&self) -> bool {
        !matches!(self, Self::NotApplicable)
    }

    /// The resolution, if any.
    pub fn resolution(&self) -> Option<&Resolution> {
        match self {
            Self::Resolved(resolution) => Some(resolution),
            _ => None,
        }
    }

    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotApplicable => "not_applicable",
            Self::Unclaimable => "unclaimable",
            Self::Resolved(_) => "resolved",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_semantics() {
        assert!(!Classification::NotApplicable.is_claimed());
        assert!(Classification::Unclaimable.is_claimed());

        let marker = SegmentMarker::new("db1").unwrap();
        let resolved = Classification::resolved(marker.clone(), UserInfo::from_raw(1, None));
        assert!(resolved.is_claimed());
        assert_eq!(resolved.resolution().unwrap().marker, marker);
        assert_eq!(resolved.label(), "resolved");
        assert!(Classification::Unclaimable.resolution().is_none());
    }
}
