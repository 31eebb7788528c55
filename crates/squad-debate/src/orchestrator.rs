//! SquadDebate - drives one round from user input to recorded turn

use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info_span, warn, Instrument};

use squad_core::{ConversationTurn, Opinion, Role, SessionId, Speaker, Squad, Stance};
use squad_persist::{Memory, StorageError};

use crate::config::DebateConfig;
use crate::consensus::SquadConsensus;
use crate::debate::{DebateRound, DebateState, IdleOnDrop, Phase};
use crate::error::{DebateError, OrchestrationError};
use crate::synthesis::{synthesize, DecisionOutcome, FinalDecision};

/// Result of a completed round
#[derive(Debug, Clone, Serialize)]
pub struct DebateOutcome {
    /// The round with its opinions and decision
    pub round: DebateRound,
    /// Speaker -> text, including the decision
    pub responses: BTreeMap<Speaker, String>,
    pub decision: FinalDecision,
    pub consensus: SquadConsensus,
    /// Sequence the round was recorded under, `None` until it is stored
    pub sequence: Option<u64>,
}

impl DebateOutcome {
    pub fn is_recorded(&self) -> bool {
        self.sequence.is_some()
    }

    /// The memory record of this outcome, once it has one
    pub fn recorded_turn(&self) -> Option<ConversationTurn> {
        self.sequence.map(|sequence| self.round.to_turn(sequence))
    }
}

/// Orchestrates the squad through debate rounds
pub struct SquadDebate {
    squad: Squad,
    memory: Arc<dyn Memory>,
    config: DebateConfig,
    state: Phase,
}

impl SquadDebate {
    /// Create a new debate over a squad and a shared memory
    pub fn new(squad: Squad, memory: Arc<dyn Memory>, config: DebateConfig) -> Self {
        Self {
            squad,
            memory,
            config,
            state: Phase::new(),
        }
    }

    pub fn state(&self) -> DebateState {
        self.state.get()
    }

    pub fn squad(&self) -> &Squad {
        &self.squad
    }

    pub fn config(&self) -> &DebateConfig {
        &self.config
    }

    pub fn memory(&self) -> &Arc<dyn Memory> {
        &self.memory
    }

    /// Run one full round for `user_input` and record it in `session`.
    ///
    /// Nothing is written unless every personality responded with a valid
    /// opinion. The debate is back in [`DebateState::Idle`] once this returns
    /// or its future is dropped.
    pub async fn conduct_debate(
        &mut self,
        session: &SessionId,
        user_input: &str,
    ) -> Result<DebateOutcome, DebateError> {
        let scenario = user_input.trim();
        if scenario.is_empty() {
            return Err(DebateError::EmptyScenario);
        }

        let _idle = IdleOnDrop(&self.state);
        let round = DebateRound::new(session.clone(), scenario);
        let span = info_span!("debate_round", session = %session, round_id = %round.id);
        self.run(round).instrument(span).await
    }

    /// Store an outcome whose recording failed, returning its sequence.
    ///
    /// A fresh sequence is taken from memory. Outcomes that already carry
    /// one are left alone.
    pub async fn record(&self, outcome: &mut DebateOutcome) -> Result<u64, DebateError> {
        if let Some(sequence) = outcome.sequence {
            return Ok(sequence);
        }
        match self.store(outcome).await {
            Ok(sequence) => {
                metrics::counter!("squad_debate_rounds_total").increment(1);
                debug!(sequence, "Round recorded on retry");
                Ok(sequence)
            }
            Err(source) => {
                metrics::counter!("squad_debate_recording_failures_total").increment(1);
                warn!(
                    session = %outcome.round.session,
                    error = %source,
                    "Retry of round recording failed"
                );
                Err(DebateError::storage(source))
            }
        }
    }

    async fn run(&self, mut round: DebateRound) -> Result<DebateOutcome, DebateError> {
        let opinions = self.collect(&round.session, &round.user_input).await?;
        for opinion in opinions {
            round.add_opinion(opinion);
        }

        self.state.set(DebateState::Synthesizing);
        let (decision, consensus) = self.resolve(&round.opinions);
        round.conclude(decision.clone());

        self.state.set(DebateState::Recorded);
        self.finish(round, decision, consensus).await
    }

    async fn collect(
        &self,
        session: &SessionId,
        scenario: &str,
    ) -> Result<Vec<Opinion>, DebateError> {
        self.state.set(DebateState::Collecting);

        let history = self
            .with_storage_timeout(self.memory.recent_history(session, self.config.history_limit))
            .await
            .map_err(|source| {
                warn!(error = %source, "Could not read history");
                DebateError::storage(source)
            })?;

        let mut opinions: Vec<Opinion> = Vec::with_capacity(self.squad.len());
        for member in self.squad.members() {
            let role = member.role();
            let after = self.config.personality_timeout;
            let reply = member.generate_response(scenario, &history, &opinions);
            let response = tokio::time::timeout(after, reply)
                .await
                .map_err(|_| OrchestrationError::Timeout { role, after })
                .and_then(|r| r.map_err(|source| OrchestrationError::Personality { role, source }))
                .and_then(|opinion| validate(role, opinion, &opinions));

            match response {
                Ok(opinion) => {
                    debug!(
                        role = role.key(),
                        stance = %opinion.stance,
                        confidence = opinion.confidence,
                        "Opinion collected"
                    );
                    opinions.push(opinion);
                }
                Err(e) => {
                    metrics::counter!("squad_debate_aborted_total").increment(1);
                    warn!(role = role.key(), error = %e, "Round aborted");
                    return Err(e.into());
                }
            }
        }

        metrics::gauge!("squad_debate_opinions_count").set(opinions.len() as f64);
        Ok(opinions)
    }

    fn resolve(&self, opinions: &[Opinion]) -> (FinalDecision, SquadConsensus) {
        let decision = synthesize(opinions, self.config.amendment_margin);
        match &decision.outcome {
            DecisionOutcome::Blocked { by } => {
                metrics::counter!("squad_debate_vetoes_total").increment(1);
                debug!(by = by.key(), "Decision blocked by veto");
            }
            DecisionOutcome::Amended { by } => {
                metrics::counter!("squad_debate_amendments_total").increment(by.len() as u64);
            }
            DecisionOutcome::Upheld | DecisionOutcome::Pending => {}
        }
        let consensus = SquadConsensus::evaluate(opinions, self.config.consensus_protocol);
        (decision, consensus)
    }

    async fn finish(
        &self,
        round: DebateRound,
        decision: FinalDecision,
        consensus: SquadConsensus,
    ) -> Result<DebateOutcome, DebateError> {
        let mut outcome = DebateOutcome {
            responses: round.responses(),
            round,
            decision,
            consensus,
            sequence: None,
        };

        match self.store(&mut outcome).await {
            Ok(sequence) => {
                metrics::counter!("squad_debate_rounds_total").increment(1);
                debug!(sequence, "Round recorded");
                Ok(outcome)
            }
            Err(source) => {
                metrics::counter!("squad_debate_recording_failures_total").increment(1);
                warn!(error = %source, "Round concluded but could not be recorded");
                Err(DebateError::Storage {
                    source,
                    unrecorded: Some(Box::new(outcome)),
                })
            }
        }
    }

    /// Take the next sequence and append; the outcome is only stamped on success
    async fn store(&self, outcome: &mut DebateOutcome) -> Result<u64, StorageError> {
        let sequence = self
            .with_storage_timeout(self.memory.next_sequence(&outcome.round.session))
            .await?;
        let turn = outcome.round.to_turn(sequence);
        self.with_storage_timeout(self.memory.append(&turn)).await?;
        outcome.sequence = Some(sequence);
        Ok(sequence)
    }

    async fn with_storage_timeout<T>(
        &self,
        fut: impl Future<Output = Result<T, StorageError>>,
    ) -> Result<T, StorageError> {
        let after: Duration = self.config.storage_timeout;
        tokio::time::timeout(after, fut)
            .await
            .map_err(|_| StorageError::Timeout(after))?
    }
}

impl std::fmt::Debug for SquadDebate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SquadDebate")
            .field("squad", &self.squad)
            .field("memory", &self.memory.name())
            .field("config", &self.config)
            .field("state", &self.state.get())
            .finish()
    }
}

/// Check an opinion against its speaker and the opinions already given
fn validate(
    speaker: Role,
    opinion: Opinion,
    prior: &[Opinion],
) -> Result<Opinion, OrchestrationError> {
    let invalid = |reason: String| OrchestrationError::InvalidOpinion {
        role: speaker,
        reason,
    };

    if opinion.role != speaker {
        return Err(invalid(format!("opinion is attributed to {}", opinion.role)));
    }
    if opinion.stance == Stance::Veto && !speaker.has_veto() {
        return Err(invalid("role has no veto power".to_string()));
    }
    if let Some(reference) = opinion
        .references
        .iter()
        .find(|r| !prior.iter().any(|p| p.role == r.role))
    {
        return Err(invalid(format!("references {}, who has not spoken yet", reference.role)));
    }
    Ok(opinion)
}
