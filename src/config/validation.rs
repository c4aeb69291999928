//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (segments reference existing backend groups)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect duplicates (backend names, context ids, schema mappings)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::RouterConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("duplicate backend name {0:?}")]
    DuplicateBackend(String),

    #[error("{field} references unknown backend group {group:?}")]
    UnknownGroup { field: &'static str, group: String },

    #[error("schema {0:?} is mapped more than once")]
    DuplicateSchema(String),

    #[error("context id 0 is not a valid tenant")]
    ZeroContextId,

    #[error("context {0} is listed more than once")]
    DuplicateContext(u32),

    #[error("{field}: {value:?} is not an http(s) URL")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field}: path {value:?} must start with '/' and name a sub-path")]
    InvalidPath { field: &'static str, value: String },
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::Zero("listener.max_connections"));
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }

    validate_backends(config, &mut errors);
    validate_segments(config, &mut errors);
    validate_contexts(config, &mut errors);
    validate_classifiers(config, &mut errors);

    if config.observability.metrics_enabled {
        check_addr(&mut errors, "observability.metrics_address", &config.observability.metrics_address);
    }
    if config.admin.enabled {
        check_addr(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key.is_empty() {
            errors.push(ValidationError::EmptyField("admin.api_key"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_path(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if !value.starts_with('/') || value.trim_end_matches('/').is_empty() {
        errors.push(ValidationError::InvalidPath {
            field,
            value: value.to_string(),
        });
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &Option<String>) {
    let Some(value) = value else {
        return;
    };
    let ok = url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false);
    if !ok {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.clone(),
        });
    }
}

fn validate_backends(config: &RouterConfig, errors: &mut Vec<ValidationError>) {
    let mut names = HashSet::new();
    for backend in &config.backends {
        if backend.name.is_empty() {
            errors.push(ValidationError::EmptyField("backends.name"));
        } else if !names.insert(backend.name.as_str()) {
            errors.push(ValidationError::DuplicateBackend(backend.name.clone()));
        }
        if backend.group.is_empty() {
            errors.push(ValidationError::EmptyField("backends.group"));
        }
        check_addr(errors, "backends.address", &backend.address);
        if backend.max_connections == 0 {
            errors.push(ValidationError::Zero("backends.max_connections"));
        }
    }
}

fn validate_segments(config: &RouterConfig, errors: &mut Vec<ValidationError>) {
    let groups: HashSet<&str> = config.backends.iter().map(|b| b.group.as_str()).collect();
    let segments = &config.segments;

    if segments.default_group.is_empty() {
        errors.push(ValidationError::EmptyField("segments.default_group"));
    } else if !groups.is_empty() && !groups.contains(segments.default_group.as_str()) {
        errors.push(ValidationError::UnknownGroup {
            field: "segments.default_group",
            group: segments.default_group.clone(),
        });
    }

    let mut schemas = HashSet::new();
    for mapping in &segments.mappings {
        if mapping.schema.is_empty() {
            errors.push(ValidationError::EmptyField("segments.mappings.schema"));
        } else if !schemas.insert(mapping.schema.as_str()) {
            errors.push(ValidationError::DuplicateSchema(mapping.schema.clone()));
        }
        if !groups.contains(mapping.group.as_str()) {
            errors.push(ValidationError::UnknownGroup {
                field: "segments.mappings.group",
                group: mapping.group.clone(),
            });
        }
    }
}

fn validate_contexts(config: &RouterConfig, errors: &mut Vec<ValidationError>) {
    let mut ids = HashSet::new();
    for context in &config.contexts {
        if context.id == 0 {
            errors.push(ValidationError::ZeroContextId);
        } else if !ids.insert(context.id) {
            errors.push(ValidationError::DuplicateContext(context.id));
        }
        if context.schema.is_empty() {
            errors.push(ValidationError::EmptyField("contexts.schema"));
        }
    }
}

fn validate_classifiers(config: &RouterConfig, errors: &mut Vec<ValidationError>) {
    let classifiers = &config.classifiers;
    if classifiers.collaborator_timeout_ms == 0 {
        errors.push(ValidationError::Zero("classifiers.collaborator_timeout_ms"));
    }

    if classifiers.basic_auth.enabled {
        for path in &classifiers.basic_auth.paths {
            check_path(errors, "classifiers.basic_auth.paths.prefix", &path.prefix);
            if path.client.is_empty() {
                errors.push(ValidationError::EmptyField("classifiers.basic_auth.paths.client"));
            }
        }
    }

    let sso = &classifiers.sso;
    if sso.enabled {
        check_path(errors, "classifiers.sso.login_path", &sso.login_path);
        for (field, value) in [
            ("classifiers.sso.action_param", &sso.action_param),
            ("classifiers.sso.action", &sso.action),
            ("classifiers.sso.token_param", &sso.token_param),
        ] {
            if value.is_empty() {
                errors.push(ValidationError::EmptyField(field));
            }
        }
    }

    if classifiers.share.enabled {
        check_path(errors, "classifiers.share.prefix", &classifiers.share.prefix);
    }

    let remote = &classifiers.remote;
    check_url(errors, "classifiers.remote.session_url", &remote.session_url);
    check_url(errors, "classifiers.remote.verifier_url", &remote.verifier_url);
    check_url(errors, "classifiers.remote.token_url", &remote.token_url);
    check_url(errors, "classifiers.remote.reservation_url", &remote.reservation_url);
}
