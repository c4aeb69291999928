//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::classify::ProtocolPath;

/// Root configuration for the segment router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Backend server definitions, grouped by segment.
    pub backends: Vec<BackendConfig>,

    /// Segment → backend group mapping.
    pub segments: SegmentConfig,

    /// Context → schema table for the built-in directory.
    pub contexts: Vec<ContextConfig>,

    /// Classifier selection and protocol settings.
    pub classifiers: ClassifiersConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent in-flight requests (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Backend connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Backend server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Unique backend identifier.
    pub name: String,

    /// Backend group this server belongs to.
    pub group: String,

    /// Backend address (e.g., "127.0.0.1:3000").
    pub address: String,

    /// Maximum concurrent connections to this backend.
    #[serde(default = "default_max_backend_conns")]
    pub max_connections: usize,
}

fn default_max_backend_conns() -> usize {
    100
}

/// Which backend group serves which segment.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Group for unclaimed, unresolved and unmapped requests.
    pub default_group: String,

    /// Explicit schema → group assignments.
    pub mappings: Vec<SegmentMapping>,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            default_group: "default".to_string(),
            mappings: Vec::new(),
        }
    }
}

/// One schema → group assignment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SegmentMapping {
    pub schema: String,
    pub group: String,
}

/// One context → schema entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContextConfig {
    pub id: u32,
    pub schema: String,
}

/// Classifier selection. Higher priority is tried first.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassifiersConfig {
    /// Deadline for each collaborator call, in milliseconds.
    pub collaborator_timeout_ms: u64,

    pub sso: SsoConfig,
    pub share: ShareConfig,
    pub bearer: BearerConfig,
    pub basic_auth: BasicAuthConfig,

    /// External identity service backing sessions, credentials, tokens and reservations.
    pub remote: RemoteConfig,
}

impl Default for ClassifiersConfig {
    fn default() -> Self {
        Self {
            collaborator_timeout_ms: 2_000,
            sso: SsoConfig::default(),
            share: ShareConfig::default(),
            bearer: BearerConfig::default(),
            basic_auth: BasicAuthConfig::default(),
            remote: RemoteConfig::default(),
        }
    }
}

/// SSO reservation callback.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SsoConfig {
    pub enabled: bool,
    pub priority: i32,
    pub login_path: String,
    pub action_param: String,
    pub action: String,
    pub token_param: String,
}

impl Default for SsoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            priority: 40,
            login_path: "/ajax/login".to_string(),
            action_param: "action".to_string(),
            action: "samlLogin".to_string(),
            token_param: "token".to_string(),
        }
    }
}

/// Share links.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShareConfig {
    pub enabled: bool,
    pub priority: i32,
    pub prefix: String,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            priority: 30,
            prefix: "/share".to_string(),
        }
    }
}

/// OAuth bearer tokens.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BearerConfig {
    pub enabled: bool,
    pub priority: i32,
}

impl Default for BearerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            priority: 20,
        }
    }
}

/// Basic-auth protocols.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BasicAuthConfig {
    pub enabled: bool,
    pub priority: i32,
    pub paths: Vec<ProtocolPath>,
}

impl Default for BasicAuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            priority: 10,
            paths: vec![
                ProtocolPath::new("/servlet/dav", "dav"),
                ProtocolPath::new("/carddav", "carddav"),
                ProtocolPath::new("/caldav", "caldav"),
            ],
        }
    }
}

/// Endpoints of an external identity service.
/// Each unset URL falls back to the built-in in-memory collaborator
/// (or to none, for the credential verifier and token validator).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Sent as `Authorization: Bearer <api_key>` on every call.
    pub api_key: Option<String>,
    pub session_url: Option<String>,
    pub verifier_url: Option<String>,
    pub token_url: Option<String>,
    pub reservation_url: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` overrides it.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
