//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::load_balancer::backend::{Backend, BackendGuard};
use crate::load_balancer::LoadBalancer;

/// Round-robin selector.
/// Stores an internal counter to rotate through backends.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for RoundRobin {
    fn next_server(&self, backends: &[Arc<Backend>]) -> Option<BackendGuard> {
        if backends.is_empty() {
            return None;
        }

        // One full lap at most; backends at their limit are skipped.
        let start = self.counter.fetch_add(1, Ordering::Relaxed);
        let len = backends.len();
        (0..len).find_map(|i| backends[(start + i) % len].try_acquire())
    }
}
