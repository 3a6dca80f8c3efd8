//! Connection-to-phase bookkeeping
//!
//! Written only by the game server actor; HTTP handlers read it concurrently.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

/// Opaque identity assigned to each live connection
pub type ConnectionId = Uuid;

/// Where a connection currently lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    /// Connected but not ready
    Connected,
    /// Waiting in the lobby
    Lobby,
    /// On the active match roster
    Match,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: ConnectionId,
    pub phase: SessionPhase,
    pub connected_at: DateTime<Utc>,
}

/// All live connections
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<ConnectionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new connection; returns false if it was already known
    pub fn register(&self, id: ConnectionId) -> bool {
        if self.sessions.contains_key(&id) {
            return false;
        }
        self.sessions.insert(
            id,
            Session {
                id,
                phase: SessionPhase::Connected,
                connected_at: Utc::now(),
            },
        );
        true
    }

    /// Forget a connection, returning the phase it was in
    pub fn remove(&self, id: &ConnectionId) -> Option<SessionPhase> {
        self.sessions.remove(id).map(|(_, s)| s.phase)
    }

    pub fn phase(&self, id: &ConnectionId) -> Option<SessionPhase> {
        self.sessions.get(id).map(|s| s.phase)
    }

    /// Move a known connection to `phase`; unknown ids are left alone
    pub fn set_phase(&self, id: &ConnectionId, phase: SessionPhase) -> bool {
        match self.sessions.get_mut(id) {
            Some(mut session) => {
                session.phase = phase;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    #[cfg(test)]
    pub fn count_in(&self, phase: SessionPhase) -> usize {
        self.sessions.iter().filter(|s| s.phase == phase).count()
    }

    /// Snapshot of all sessions, oldest first
    pub fn list(&self) -> Vec<Session> {
        let mut sessions: Vec<Session> = self.sessions.iter().map(|s| s.value().clone()).collect();
        sessions.sort_by_key(|s| s.connected_at);
        sessions
    }
}
