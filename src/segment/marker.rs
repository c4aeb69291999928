//! Segment marker codec.
//!
//! # Responsibilities
//! - Identify the backend partition (database schema) owning a tenant
//! - Encode markers into an opaque, header- and URL-safe token
//! - Reject malformed tokens without ever producing a partial marker
//!
//! # Wire Format
//! ```text
//! {"schema":"<name>"}  → UTF-8 bytes → base64 (URL-safe alphabet, no padding)
//! ```
//!
//! # Design Decisions
//! - Versionless: unknown JSON fields are ignored on decode
//! - Decode tolerates trailing `=` padding and surrounding whitespace
//! - No existence check: the schema name is opaque to the codec

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

/// Error returned when a marker token cannot be decoded.
#[derive(Debug, thiserror::Error)]
pub enum MarkerDecodeError {
    /// The token is not valid base64.
    #[error("segment marker is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// The decoded bytes are not the expected JSON object.
    #[error("segment marker payload is malformed: {0}")]
    Payload(#[from] serde_json::Error),

    /// The payload carries no schema, or an empty one.
    #[error("segment marker has no schema")]
    MissingSchema,
}

/// Identifies the segment (database schema) that owns a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SegmentMarker {
    schema: String,
}

/// Decoded wire shape. The schema is optional here so a missing field maps
/// to [`MarkerDecodeError::MissingSchema`] instead of a generic parse error.
#[derive(Deserialize)]
struct WireMarker {
    #[serde(default)]
    schema: Option<String>,
}

impl SegmentMarker {
    /// Create a marker for the given schema. Returns `None` for an empty name.
    pub fn new(schema: impl Into<String>) -> Option<Self> {
        let schema = schema.into();
        if schema.is_empty() {
            return None;
        }
        Some(Self { schema })
    }

    /// The schema name this marker points at.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Encode into the opaque wire token.
    pub fn encode(&self) -> String {
        let payload = serde_json::json!({ "schema": self.schema }).to_string();
        URL_SAFE_NO_PAD.encode(payload.as_bytes())
    }

    /// Decode a wire token produced by [`SegmentMarker::encode`].
    pub fn decode(token: &str) -> Result<Self, MarkerDecodeError> {
        let trimmed = token.trim().trim_end_matches('=');
        let bytes = URL_SAFE_NO_PAD.decode(trimmed.as_bytes())?;
        let wire: WireMarker = serde_json::from_slice(&bytes)?;
        wire.schema
            .and_then(Self::new)
            .ok_or(MarkerDecodeError::MissingSchema)
    }
}

impl fmt::Display for SegmentMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.schema)
    }
}

impl FromStr for SegmentMarker {
    type Err = MarkerDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
