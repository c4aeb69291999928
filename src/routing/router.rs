//! Segment → backend group lookup.
//!
//! # Responsibilities
//! - Store compiled schema → group assignments
//! - Turn a classification into a routing decision
//!
//! # Design Decisions
//! - O(1) schema lookup via HashMap
//! - Unmapped schemas fall back to the default group, with the reason recorded

use std::collections::HashMap;

use serde::Serialize;

use crate::config::SegmentConfig;
use crate::segment::Classification;

/// Why a request went where it went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteReason {
    /// Resolved to a mapped segment.
    Segment,
    /// Resolved, but the schema has no explicit mapping.
    UnmappedSegment,
    /// Claimed by a classifier without an identity.
    Unresolved,
    /// No classifier claimed the request.
    Unclaimed,
}

impl RouteReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Segment => "segment",
            Self::UnmappedSegment => "unmapped_segment",
            Self::Unresolved => "unresolved",
            Self::Unclaimed => "unclaimed",
        }
    }
}

/// Where to send a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision<'a> {
    pub group: &'a str,
    pub reason: RouteReason,
}

/// Compiled segment assignments.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentTable {
    default_group: String,
    mappings: HashMap<String, String>,
}

impl SegmentTable {
    /// Compile the table from configuration. Later duplicates win.
    pub fn from_config(config: &SegmentConfig) -> Self {
        Self {
            default_group: config.default_group.clone(),
            mappings: config
                .mappings
                .iter()
                .map(|m| (m.schema.clone(), m.group.clone()))
                .collect(),
        }
    }

    /// Group for unresolved traffic.
    pub fn default_group(&self) -> &str {
        &self.default_group
    }

    /// Explicit group for a schema, if mapped.
    pub fn group_for(&self, schema: &str) -> Option<&str> {
        self.mappings.get(schema).map(String::as_str)
    }

    /// Decide the backend group for a classification.
    pub fn route(&self, classification: &Classification) -> RouteDecision<'_> {
        match classification {
            Classification::Resolved(resolution) => match self.group_for(resolution.marker.schema()) {
                Some(group) => RouteDecision {
                    group,
                    reason: RouteReason::Segment,
                },
                None => RouteDecision {
                    group: &self.default_group,
                    reason: RouteReason::UnmappedSegment,
                },
            },
            Classification::Unclaimable => RouteDecision {
                group: &self.default_group,
                reason: RouteReason::Unresolved,
            },
            Classification::NotApplicable => RouteDecision {
                group: &self.default_group,
                reason: RouteReason::Unclaimed,
            },
        }
    }
}
