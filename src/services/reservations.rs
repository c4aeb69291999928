//! In-memory SSO login reservations.
//!
//! # Responsibilities
//! - Issue short-lived, single-use reservation tokens
//! - Let the router peek at a reservation without consuming it
//! - Let the login flow redeem a reservation exactly once
//!
//! # Design Decisions
//! - `peek` never mutates: no removal, no expiry extension
//! - Expired entries are treated as absent and purged on every `reserve`

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::services::{CollaboratorError, Reservation, ReservationLookup};

#[derive(Debug, Clone)]
struct Entry {
    reservation: Reservation,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Reservation store shared between the router and the login flow.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReservationStore {
    inner: Arc<DashMap<String, Entry>>,
}

impl InMemoryReservationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a login for `ttl` and return the opaque token.
    /// Expired entries are purged first, so unredeemed reservations do not pile up.
    pub fn reserve(&self, reservation: Reservation, ttl: Duration) -> String {
        let purged = self.purge_expired();
        if purged > 0 {
            tracing::debug!(purged, "Dropped expired reservations");
        }
        let token = Uuid::new_v4().simple().to_string();
        self.inner.insert(
            token.clone(),
            Entry {
                reservation,
                expires_at: Instant::now() + ttl,
            },
        );
        token
    }

    /// Look at a reservation without consuming it.
    pub fn peek(&self, token: &str) -> Option<Reservation> {
        let now = Instant::now();
        self.inner
            .get(token)
            .filter(|e| e.is_live(now))
            .map(|e| e.reservation)
    }

    /// Consume a reservation. A second redeem of the same token yields `None`.
    pub fn redeem(&self, token: &str) -> Option<Reservation> {
        let now = Instant::now();
        self.inner
            .remove(token)
            .map(|(_, e)| e)
            .filter(|e| e.is_live(now))
            .map(|e| e.reservation)
    }

    /// Drop expired reservations. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.inner.len();
        self.inner.retain(|_, e| e.is_live(now));
        before.saturating_sub(self.inner.len())
    }

    /// Number of stored reservations, expired or not.
    pub fn count(&self) -> usize {
        self.inner.len()
    }
}

#[async_trait]
impl ReservationLookup for InMemoryReservationStore {
    async fn peek_reservation(&self, token: &str) -> Result<Option<Reservation>, CollaboratorError> {
        Ok(self.peek(token))
    }
}
