//! Memory trait and error types

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use std::time::Duration;
use tokio::sync::RwLock;

use squad_core::{ConversationTurn, SessionId};

/// Storage error types
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Out of order append to {session}: last sequence {last}, attempted {attempted}")]
    OutOfOrder {
        session: SessionId,
        last: u64,
        attempted: u64,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Storage operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Per-session overview
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session: SessionId,
    /// Number of stored turns
    pub turns: usize,
    pub last_sequence: u64,
    pub last_activity: DateTime<Utc>,
}

/// Append-only conversation history (Object Safe)
#[async_trait]
pub trait Memory: Send + Sync + Debug {
    /// Get the backend name
    fn name(&self) -> &str;

    /// Check if backend is healthy
    async fn is_healthy(&self) -> bool;

    /// Append a turn. The turn's sequence must be greater than every
    /// sequence already stored for its session.
    async fn append(&self, turn: &ConversationTurn) -> Result<(), StorageError>;

    /// Up to `limit` most recent turns of a session, oldest first
    async fn recent_history(&self, session: &SessionId, limit: usize)
        -> Result<Vec<ConversationTurn>, StorageError>;

    /// A single turn by sequence number
    async fn get_turn(
        &self,
        session: &SessionId,
        sequence: u64,
    ) -> Result<ConversationTurn, StorageError>;

    /// Sequence number the next appended turn should carry
    async fn next_sequence(&self, session: &SessionId) -> Result<u64, StorageError>;

    /// Delete a whole session, returning the number of turns removed
    async fn clear_session(&self, session: &SessionId) -> Result<usize, StorageError>;

    /// All sessions, most recently active first
    async fn sessions(&self) -> Result<Vec<SessionSummary>, StorageError>;
}

/// In-memory backend (for testing and ephemeral sessions)
#[derive(Debug, Default)]
pub struct MemoryBackend {
    data: RwLock<HashMap<SessionId, Vec<ConversationTurn>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Memory for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn is_healthy(&self) -> bool {
        true
    }

    async fn append(&self, turn: &ConversationTurn) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        let turns = data.entry(turn.session_id.clone()).or_default();
        if let Some(last) = turns.last() {
            if turn.sequence <= last.sequence {
                return Err(StorageError::OutOfOrder {
                    session: turn.session_id.clone(),
                    last: last.sequence,
                    attempted: turn.sequence,
                });
            }
        }
        turns.push(turn.clone());
        Ok(())
    }

    async fn recent_history(
        &self,
        session: &SessionId,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, StorageError> {
        let data = self.data.read().await;
        let turns = data.get(session).map(Vec::as_slice).unwrap_or_default();
        let start = turns.len().saturating_sub(limit);
        Ok(turns[start..].to_vec())
    }

    async fn get_turn(
        &self,
        session: &SessionId,
        sequence: u64,
    ) -> Result<ConversationTurn, StorageError> {
        let data = self.data.read().await;
        data.get(session)
            .and_then(|turns| turns.iter().find(|t| t.sequence == sequence))
            .cloned()
            .ok_or_else(|| {
                StorageError::NotFound(format!("turn {} of session {}", sequence, session))
            })
    }

    async fn next_sequence(&self, session: &SessionId) -> Result<u64, StorageError> {
        let data = self.data.read().await;
        let last = data
            .get(session)
            .and_then(|turns| turns.last())
            .map_or(0, |t| t.sequence);
        Ok(last + 1)
    }

    async fn clear_session(&self, session: &SessionId) -> Result<usize, StorageError> {
        Ok(self.data.write().await.remove(session).map_or(0, |turns| turns.len()))
    }

    async fn sessions(&self) -> Result<Vec<SessionSummary>, StorageError> {
        let data = self.data.read().await;
        let mut summaries: Vec<SessionSummary> = data
            .iter()
            .filter_map(|(session, turns)| {
                let last = turns.last()?;
                Some(SessionSummary {
                    session: session.clone(),
                    turns: turns.len(),
                    last_sequence: last.sequence,
                    last_activity: last.timestamp,
                })
            })
            .collect();
        summaries.sort_by(|a, b| {
            b.last_activity
                .cmp(&a.last_activity)
                .then_with(|| a.session.cmp(&b.session))
        });
        Ok(summaries)
    }
}
