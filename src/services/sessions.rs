//! In-memory live session index.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::services::{CollaboratorError, LiveSession, SessionLookup};

/// Live sessions keyed by `(login, client)`.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    inner: Arc<DashMap<(String, String), LiveSession>>,
}

impl InMemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a session for a login/client combination, replacing any previous one.
    pub fn insert(&self, login: &str, client: &str, session: LiveSession) {
        self.inner
            .insert((login.to_string(), client.to_string()), session);
    }

    /// Drop the session for a login/client combination.
    pub fn remove(&self, login: &str, client: &str) -> Option<LiveSession> {
        self.inner
            .remove(&(login.to_string(), client.to_string()))
            .map(|(_, session)| session)
    }

    /// Number of live sessions.
    pub fn count(&self) -> usize {
        self.inner.len()
    }
}

#[async_trait]
impl SessionLookup for InMemorySessionStore {
    async fn find_live_session(
        &self,
        login: &str,
        client: &str,
    ) -> Result<Option<LiveSession>, CollaboratorError> {
        let key = (login.to_string(), client.to_string());
        Ok(self.inner.get(&key).map(|r| r.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sessions_are_client_scoped() {
        let store = InMemorySessionStore::new();
        store.insert(
            "anton@ctx",
            "dav",
            LiveSession {
                session_id: "s1".into(),
                context_id: 5,
                user_id: 3,
            },
        );

        let hit = store.find_live_session("anton@ctx", "dav").await.unwrap();
        assert_eq!(hit.unwrap().user_id, 3);
        assert!(store
            .find_live_session("anton@ctx", "web")
            .await
            .unwrap()
            .is_none());

        assert!(store.remove("anton@ctx", "dav").is_some());
        assert_eq!(store.count(), 0);
    }
}
