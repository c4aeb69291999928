//! Backend pool management.
//!
//! # Responsibilities
//! - Manage collections of backends grouped by name
//! - Apply load balancing algorithms to select backends
//! - Provide connection guards for tracking

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::config::BackendConfig;
use crate::load_balancer::backend::{Backend, BackendGuard};
use crate::load_balancer::round_robin::RoundRobin;
use crate::load_balancer::LoadBalancer;

#[derive(Debug)]
struct Group {
    backends: Vec<Arc<Backend>>,
    balancer: Box<dyn LoadBalancer>,
}

/// Snapshot of one backend for the admin API.
#[derive(Debug, Clone, Serialize)]
pub struct BackendStatus {
    pub name: String,
    pub group: String,
    pub address: String,
    pub active_connections: usize,
}

/// Manages backend pools and load balancing.
#[derive(Debug, Default)]
pub struct BackendManager {
    groups: HashMap<String, Group>,
}

impl BackendManager {
    /// Create a new backend manager from configuration.
    /// Entries with unparsable addresses are skipped with a warning.
    pub fn new(configs: &[BackendConfig]) -> Self {
        let mut grouped: HashMap<String, Vec<Arc<Backend>>> = HashMap::new();
        for config in configs {
            match config.address.parse() {
                Ok(addr) => grouped
                    .entry(config.group.clone())
                    .or_default()
                    .push(Arc::new(Backend::new(&config.name, addr, config.max_connections))),
                Err(_) => tracing::warn!(backend = %config.name, address = %config.address, "Invalid backend address"),
            }
        }

        let groups = grouped
            .into_iter()
            .map(|(name, backends)| {
                let balancer: Box<dyn LoadBalancer> = Box::new(RoundRobin::new());
                (name, Group { backends, balancer })
            })
            .collect();

        Self { groups }
    }

    /// Select a backend for the given group.
    /// Returns a guard that releases the connection slot on drop.
    pub fn get(&self, group_name: &str) -> Option<BackendGuard> {
        let Some(group) = self.groups.get(group_name) else {
            tracing::debug!(group = %group_name, "Group not found in BackendManager");
            return None;
        };

        let guard = group.balancer.next_server(&group.backends);
        if guard.is_none() {
            tracing::debug!(group = %group_name, backend_count = group.backends.len(), "All backends in group are saturated");
        }
        guard
    }

    /// True if a group with this name exists.
    pub fn has_group(&self, group_name: &str) -> bool {
        self.groups.contains_key(group_name)
    }

    /// Status of every backend, sorted by group then name.
    pub fn status(&self) -> Vec<BackendStatus> {
        let mut out: Vec<BackendStatus> = self
            .groups
            .iter()
            .flat_map(|(group, g)| {
                g.backends.iter().map(move |b| BackendStatus {
                    name: b.name.clone(),
                    group: group.clone(),
                    address: b.addr.to_string(),
                    active_connections: b.active_connections(),
                })
            })
            .collect();
        out.sort_by(|a, b| a.group.cmp(&b.group).then_with(|| a.name.cmp(&b.name)));
        out
    }
}
