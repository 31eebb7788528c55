//! Debate rounds and the state machine phases

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use uuid::Uuid;

use squad_core::{ConversationTurn, Opinion, Role, SessionId, Speaker};

use crate::synthesis::FinalDecision;

/// Phase of a [`crate::SquadDebate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum DebateState {
    /// No active round
    Idle = 0,
    /// Reading history and gathering opinions
    Collecting = 1,
    /// Resolving opinions into a decision
    Synthesizing = 2,
    /// Writing the round to memory
    Recorded = 3,
}

/// Current phase, readable while a round holds `&self`
#[derive(Debug)]
pub(crate) struct Phase(AtomicU8);

impl Phase {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(DebateState::Idle as u8))
    }

    pub(crate) fn get(&self) -> DebateState {
        match self.0.load(Ordering::Acquire) {
            1 => DebateState::Collecting,
            2 => DebateState::Synthesizing,
            3 => DebateState::Recorded,
            _ => DebateState::Idle,
        }
    }

    pub(crate) fn set(&self, state: DebateState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// Puts the phase back to Idle when the round ends, even if its future is dropped
pub(crate) struct IdleOnDrop<'a>(pub(crate) &'a Phase);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.set(DebateState::Idle);
    }
}

impl fmt::Display for DebateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DebateState::Idle => "idle",
            DebateState::Collecting => "collecting",
            DebateState::Synthesizing => "synthesizing",
            DebateState::Recorded => "recorded",
        };
        f.write_str(s)
    }
}

/// One user input, the opinions it drew and the decision they produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateRound {
    /// Unique ID, used to correlate logs
    pub id: Uuid,
    pub session: SessionId,
    pub user_input: String,
    /// Opinions in speaking order
    pub opinions: Vec<Opinion>,
    /// Set once the round is synthesized
    pub decision: Option<FinalDecision>,
    pub started_at: DateTime<Utc>,
    pub concluded_at: Option<DateTime<Utc>>,
}

impl DebateRound {
    /// Create a new round
    pub fn new(session: SessionId, user_input: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            session,
            user_input: user_input.to_string(),
            opinions: Vec::new(),
            decision: None,
            started_at: Utc::now(),
            concluded_at: None,
        }
    }

    /// Add the next speaker's opinion
    pub fn add_opinion(&mut self, opinion: Opinion) {
        self.opinions.push(opinion);
    }

    /// Conclude the round with its decision
    pub fn conclude(&mut self, decision: FinalDecision) {
        self.decision = Some(decision);
        self.concluded_at = Some(Utc::now());
    }

    /// Check if round is concluded
    pub fn is_concluded(&self) -> bool {
        self.decision.is_some()
    }

    pub fn opinion(&self, role: Role) -> Option<&Opinion> {
        self.opinions.iter().find(|o| o.role == role)
    }

    /// Response text per speaker, including the decision once concluded
    pub fn responses(&self) -> BTreeMap<Speaker, String> {
        let mut responses: BTreeMap<Speaker, String> = self
            .opinions
            .iter()
            .map(|o| (Speaker::Role(o.role), o.rationale.clone()))
            .collect();
        if let Some(decision) = &self.decision {
            responses.insert(Speaker::Decision, decision.text.clone());
        }
        responses
    }

    /// The memory record of this round, stamped with its conclusion time
    pub fn to_turn(&self, sequence: u64) -> ConversationTurn {
        let mut turn = ConversationTurn::new(
            self.session.clone(),
            sequence,
            self.user_input.clone(),
            self.responses(),
        );
        turn.timestamp = self.concluded_at.unwrap_or(self.started_at);
        turn
    }
}
