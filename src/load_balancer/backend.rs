//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single backend node serving one or more segments
//! - Track active connections
//! - Enforce max connection limits

use std::net::SocketAddr;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A single backend server.
#[derive(Debug)]
pub struct Backend {
    /// Backend name from configuration.
    pub name: String,
    /// The address of the backend.
    pub addr: SocketAddr,
    /// Maximum concurrent connections allowed.
    pub max_connections: usize,
    /// Number of currently active connections.
    active_connections: AtomicUsize,
}

impl Backend {
    /// Create a new backend.
    pub fn new(name: impl Into<String>, addr: SocketAddr, max_connections: usize) -> Self {
        Self {
            name: name.into(),
            addr,
            max_connections,
            active_connections: AtomicUsize::new(0),
        }
    }

    /// Get the current number of active connections.
    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Try to reserve a connection slot. Returns `None` at the limit.
    pub fn try_acquire(self: &Arc<Self>) -> Option<BackendGuard> {
        let mut prev = self.active_connections.load(Ordering::Relaxed);
        loop {
            if prev >= self.max_connections {
                return None;
            }
            match self.active_connections.compare_exchange_weak(
                prev,
                prev + 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(x) => prev = x,
            }
        }
        Some(BackendGuard {
            backend: self.clone(),
        })
    }
}

/// A RAII guard holding one connection slot.
#[derive(Debug)]
pub struct BackendGuard {
    backend: Arc<Backend>,
}

impl Deref for BackendGuard {
    type Target = Backend;
    fn deref(&self) -> &Self::Target {
        &self.backend
    }
}

impl Drop for BackendGuard {
    fn drop(&mut self) {
        self.backend.active_connections.fetch_sub(1, Ordering::Relaxed);
    }
}
