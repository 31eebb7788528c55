//! Debate error types

use std::time::Duration;

use squad_core::{PersonalityError, Role};
use squad_persist::StorageError;

use crate::orchestrator::DebateOutcome;

/// Failure while collecting opinions. The round is discarded.
#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    #[error("{role} failed to respond: {source}")]
    Personality {
        role: Role,
        #[source]
        source: PersonalityError,
    },

    #[error("{role} did not respond within {after:?}")]
    Timeout { role: Role, after: Duration },

    #[error("{role} returned an invalid opinion: {reason}")]
    InvalidOpinion { role: Role, reason: String },
}

impl OrchestrationError {
    /// Role whose turn failed
    pub fn role(&self) -> Role {
        match self {
            OrchestrationError::Personality { role, .. }
            | OrchestrationError::Timeout { role, .. }
            | OrchestrationError::InvalidOpinion { role, .. } => *role,
        }
    }
}

/// Error types for a debate round
#[derive(Debug, thiserror::Error)]
pub enum DebateError {
    #[error("Scenario is empty")]
    EmptyScenario,

    #[error("Orchestration failed: {0}")]
    Orchestration(#[from] OrchestrationError),

    /// `unrecorded` holds the finished outcome when the failure happened
    /// while recording it
    #[error("Storage failed: {source}")]
    Storage {
        #[source]
        source: StorageError,
        unrecorded: Option<Box<DebateOutcome>>,
    },
}

impl DebateError {
    pub(crate) fn storage(source: StorageError) -> Self {
        DebateError::Storage {
            source,
            unrecorded: None,
        }
    }

    /// Take the outcome that could not be recorded, if any
    pub fn into_unrecorded(self) -> Option<DebateOutcome> {
        match self {
            DebateError::Storage { unrecorded, .. } => unrecorded.map(|o| *o),
            _ => None,
        }
    }
}
