//! Conversation turns - the unit of squad memory
//!
//! A [`ConversationTurn`] is written once per completed round and never
//! mutated afterwards. Its sequence number is the only ordering key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::role::{Role, Speaker};

/// Opaque identifier of a conversation session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random session id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One recorded debate round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Session this turn belongs to
    pub session_id: SessionId,
    /// Monotonic per session; the sole ordering key
    pub sequence: u64,
    /// What the user asked
    pub user_input: String,
    /// Response text per speaker, including the synthesized decision
    pub responses: BTreeMap<Speaker, String>,
    /// When the round was recorded
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(
        session_id: SessionId,
        sequence: u64,
        user_input: impl Into<String>,
        responses: BTreeMap<Speaker, String>,
    ) -> Self {
        Self {
            session_id,
            sequence,
            user_input: user_input.into(),
            responses,
            timestamp: Utc::now(),
        }
    }

    /// The response a role gave in this turn
    pub fn response(&self, role: Role) -> Option<&str> {
        self.responses.get(&Speaker::Role(role)).map(String::as_str)
    }

    /// The synthesized decision of this turn
    pub fn decision(&self) -> Option<&str> {
        self.responses.get(&Speaker::Decision).map(String::as_str)
    }
}

/// Render turns as plain-text context for prompts.
///
/// Turns are listed oldest first, each with the user input followed by every
/// speaker's response in hierarchy order.
pub fn format_history(turns: &[ConversationTurn]) -> String {
    if turns.is_empty() {
        return String::new();
    }

    let mut formatted = String::from("Recent conversation history:\n\n");
    for turn in turns {
        formatted.push_str(&format!("[#{}] User: {}\n", turn.sequence, turn.user_input));
        for (speaker, text) in &turn.responses {
            formatted.push_str(&format!("{}: {}\n", speaker, text));
        }
        formatted.push('\n');
    }
    formatted
}
