use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use galaxy_common::ClassificationRecord;
use tokio::sync::Mutex;

/// Chat id on the transport side.
pub type ConversationId = i64;

const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// What the conversation is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingManualLink,
    AwaitingDuplicateDecision,
    AwaitingCategoryChoice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub state: SessionState,
    pub record: ClassificationRecord,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(state: SessionState, record: ClassificationRecord) -> Self {
        Self {
            state,
            record,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Live session for `id`. Expired sessions read as absent.
    async fn get(&self, id: ConversationId) -> Option<Session>;
    async fn put(&self, id: ConversationId, session: Session);
    async fn clear(&self, id: ConversationId);
}

/// Process-local session map. Lost on restart.
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<ConversationId, Session>>,
    ttl: chrono::Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
        }
    }

    fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(session.created_at) >= self.ttl
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: ConversationId) -> Option<Session> {
        let mut sessions = self.sessions.lock().await;
        let now = Utc::now();
        match sessions.get(&id) {
            Some(session) if self.is_expired(session, now) => {
                sessions.remove(&id);
                None
            }
            Some(session) => Some(session.clone()),
            None => None,
        }
    }

    async fn put(&self, id: ConversationId, session: Session) {
        let mut sessions = self.sessions.lock().await;
        // Opportunistic eviction so abandoned conversations don't pile up
        let now = Utc::now();
        let ttl = self.ttl;
        sessions.retain(|_, s| now.signed_duration_since(s.created_at) < ttl);
        sessions.insert(id, session);
    }

    async fn clear(&self, id: ConversationId) {
        self.sessions.lock().await.remove(&id);
    }
}
