//! SquadDebate rounds end to end against in-memory storage

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use squad_core::{
    ConversationTurn, Opinion, Personality, PersonalityError, Profile, Role, SessionId, Speaker,
    Squad, Stance,
};
use squad_debate::{
    DebateConfig, DebateError, DebateState, DecisionOutcome, OrchestrationError, SquadDebate,
};
use squad_llm::{voiced_roster, MockProvider};
use squad_persist::{Memory, MemoryBackend, SessionSummary, StorageError};

/// Personality with a fixed answer, optionally slow or broken
struct Scripted {
    profile: Profile,
    stance: Stance,
    confidence: f64,
    delay: Duration,
    fail: bool,
}

impl Scripted {
    fn new(role: Role, stance: Stance, confidence: f64) -> Self {
        Self {
            profile: Profile::new(format!("Scripted {}", role.key()), role, &["steady"], "*"),
            stance,
            confidence,
            delay: Duration::ZERO,
            fail: false,
        }
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl Personality for Scripted {
    fn profile(&self) -> &Profile {
        &self.profile
    }

    async fn generate_response(
        &self,
        _scenario: &str,
        _history: &[ConversationTurn],
        _prior: &[Opinion],
    ) -> Result<Opinion, PersonalityError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(PersonalityError::Backend("model unreachable".to_string()));
        }
        let text = format!("{} says {}", self.profile.role.title(), self.stance);
        Ok(Opinion::new(self.profile.role, self.stance, text, self.confidence))
    }
}

/// In-memory store whose reads can be slowed and whose writes can be broken
#[derive(Debug, Default)]
struct FlakyMemory {
    inner: MemoryBackend,
    read_delay: Duration,
    fail_appends: AtomicBool,
    fail_sequence: AtomicBool,
}

#[async_trait]
impl Memory for FlakyMemory {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn is_healthy(&self) -> bool {
        !self.fail_appends.load(Ordering::SeqCst)
    }

    async fn append(&self, turn: &ConversationTurn) -> Result<(), StorageError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("disk unplugged".to_string()));
        }
        self.inner.append(turn).await
    }

    async fn recent_history(
        &self,
        session: &SessionId,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, StorageError> {
        if !self.read_delay.is_zero() {
            tokio::time::sleep(self.read_delay).await;
        }
        self.inner.recent_history(session, limit).await
    }

    async fn get_turn(
        &self,
        session: &SessionId,
        sequence: u64,
    ) -> Result<ConversationTurn, StorageError> {
        self.inner.get_turn(session, sequence).await
    }

    async fn next_sequence(&self, session: &SessionId) -> Result<u64, StorageError> {
        if self.fail_sequence.load(Ordering::SeqCst) {
            return Err(StorageError::Query("sequence lookup failed".to_string()));
        }
        self.inner.next_sequence(session).await
    }

    async fn clear_session(&self, session: &SessionId) -> Result<usize, StorageError> {
        self.inner.clear_session(session).await
    }

    async fn sessions(&self) -> Result<Vec<SessionSummary>, StorageError> {
        self.inner.sessions().await
    }
}

fn standard_debate(memory: Arc<dyn Memory>) -> SquadDebate {
    SquadDebate::new(Squad::standard(), memory, DebateConfig::default())
}

#[tokio::test]
async fn test_full_squad_yields_six_entries() {
    let memory = Arc::new(MemoryBackend::new());
    let mut debate = standard_debate(memory.clone());
    let session = SessionId::from("alpha");

    let outcome = debate
        .conduct_debate(&session, "Resupply the northern outpost before winter")
        .await
        .unwrap();

    assert_eq!(outcome.responses.len(), 6);
    for role in Role::ALL {
        assert!(outcome.responses.contains_key(&Speaker::Role(role)));
    }
    assert_eq!(outcome.decision.outcome, DecisionOutcome::Upheld);
    assert_eq!(
        outcome.responses[&Speaker::Decision],
        outcome.round.opinions[0].rationale
    );
    assert_eq!(outcome.sequence, Some(1));
    assert_eq!(debate.state(), DebateState::Idle);

    let stored = memory.get_turn(&session, 1).await.unwrap();
    assert_eq!(Some(stored), outcome.recorded_turn());
}

#[tokio::test]
async fn test_rounds_see_previous_turns() {
    let memory = Arc::new(MemoryBackend::new());
    let mut debate = standard_debate(memory.clone());
    let session = SessionId::from("alpha");

    let first = debate.conduct_debate(&session, "Hold the bridge").await.unwrap();
    let second = debate
        .conduct_debate(&session, "Now resupply the bridge team")
        .await
        .unwrap();

    assert_eq!(second.sequence, Some(2));
    let decided = first.decision.text.lines().next().unwrap().trim();
    let leader = second.round.opinion(Role::Leader).unwrap();
    assert!(leader
        .rationale
        .contains(&format!("Last round (#1) we decided: \"{decided}\"")));
    assert_eq!(memory.next_sequence(&session).await.unwrap(), 3);
}

#[tokio::test]
async fn test_medic_veto_blocks_the_leader() {
    let mut debate = standard_debate(Arc::new(MemoryBackend::new()));
    let outcome = debate
        .conduct_debate(&SessionId::from("v"), "Clear the village even if civilians get hurt")
        .await
        .unwrap();

    assert_eq!(
        outcome.decision.outcome,
        DecisionOutcome::Blocked { by: Role::Medic }
    );
    let decision = &outcome.responses[&Speaker::Decision];
    assert!(decision.starts_with("BLOCKED (Squad Medic veto): "));
    assert!(!decision.contains("My decision is"));
    assert_eq!(outcome.consensus.vetoed_by, Some(Role::Medic));
    assert!(outcome.decision.is_blocked());
}

#[tokio::test]
async fn test_amendment_from_confident_challenger_only() {
    let squad = Squad::builder()
        .member(Scripted::new(Role::Leader, Stance::Support, 0.5))
        .member(Scripted::new(Role::TacticalPlanner, Stance::Challenge, 0.8))
        .member(Scripted::new(Role::Scout, Stance::Challenge, 0.7))
        .build()
        .unwrap();
    let memory = Arc::new(MemoryBackend::new());
    let mut debate = SquadDebate::new(squad, memory, DebateConfig::default());

    let outcome = debate
        .conduct_debate(&SessionId::from("a"), "Cross the river")
        .await
        .unwrap();

    assert_eq!(
        outcome.decision.outcome,
        DecisionOutcome::Amended {
            by: vec![Role::TacticalPlanner]
        }
    );
    assert!(outcome.decision.text.starts_with("Squad Leader says support"));
    assert!(outcome.decision.text.contains("Tactical Planner says challenge"));
    assert!(!outcome.decision.text.contains("Scout says challenge"));
    assert_eq!(outcome.responses.len(), 4);
}

#[tokio::test]
async fn test_same_input_same_decision() {
    let scenario = "Storm the warehouse immediately";
    let mut first = standard_debate(Arc::new(MemoryBackend::new()));
    let mut second = standard_debate(Arc::new(MemoryBackend::new()));

    let a = first.conduct_debate(&SessionId::from("d"), scenario).await.unwrap();
    let b = second.conduct_debate(&SessionId::from("d"), scenario).await.unwrap();

    assert_eq!(a.decision, b.decision);
    assert_eq!(a.responses, b.responses);
    assert_ne!(a.round.id, b.round.id);
}

#[tokio::test]
async fn test_failing_personality_leaves_no_trace() {
    let squad = Squad::builder()
        .member(Scripted::new(Role::Leader, Stance::Support, 0.65))
        .member(Scripted::new(Role::Medic, Stance::Support, 0.6).failing())
        .member(Scripted::new(Role::Scout, Stance::Neutral, 0.5))
        .build()
        .unwrap();
    let memory = Arc::new(MemoryBackend::new());
    let session = SessionId::from("f");

    let mut earlier = standard_debate(memory.clone());
    earlier.conduct_debate(&session, "Hold the bridge").await.unwrap();
    earlier.conduct_debate(&session, "Resupply the bridge team").await.unwrap();
    let history_before = memory.recent_history(&session, 10).await.unwrap();
    let next_before = memory.next_sequence(&session).await.unwrap();
    assert_eq!(history_before.len(), 2);
    assert_eq!(next_before, 3);

    let mut debate = SquadDebate::new(squad, memory.clone(), DebateConfig::default());
    let err = debate.conduct_debate(&session, "Move out").await.unwrap_err();

    assert!(matches!(
        err,
        DebateError::Orchestration(OrchestrationError::Personality {
            role: Role::Medic,
            ..
        })
    ));
    assert_eq!(debate.state(), DebateState::Idle);
    assert_eq!(memory.recent_history(&session, 10).await.unwrap(), history_before);
    assert_eq!(memory.next_sequence(&session).await.unwrap(), next_before);
}

#[tokio::test]
async fn test_empty_input_is_rejected() {
    let memory = Arc::new(MemoryBackend::new());
    let mut debate = standard_debate(memory.clone());

    let err = debate
        .conduct_debate(&SessionId::from("e"), "   \n")
        .await
        .unwrap_err();
    assert!(matches!(err, DebateError::EmptyScenario));
    assert!(memory.sessions().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_slow_personality_times_out() {
    let squad = Squad::builder()
        .member(Scripted::new(Role::Leader, Stance::Support, 0.65))
        .member(
            Scripted::new(Role::TacticalPlanner, Stance::Support, 0.7)
                .slow(Duration::from_secs(60)),
        )
        .build()
        .unwrap();
    let config =
        DebateConfig::default().with_timeouts(Duration::from_secs(2), Duration::from_secs(2));
    let memory = Arc::new(MemoryBackend::new());
    let mut debate = SquadDebate::new(squad, memory.clone(), config);
    let session = SessionId::from("t");

    let err = debate.conduct_debate(&session, "Hold position").await.unwrap_err();

    match err {
        DebateError::Orchestration(OrchestrationError::Timeout { role, after }) => {
            assert_eq!(role, Role::TacticalPlanner);
            assert_eq!(after, Duration::from_secs(2));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(memory.next_sequence(&session).await.unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_history_read_times_out() {
    let memory = Arc::new(FlakyMemory {
        read_delay: Duration::from_secs(30),
        ..Default::default()
    });
    let config =
        DebateConfig::default().with_timeouts(Duration::from_secs(5), Duration::from_secs(1));
    let mut debate = SquadDebate::new(Squad::standard(), memory, config);

    let err = debate
        .conduct_debate(&SessionId::from("t"), "Hold position")
        .await
        .unwrap_err();

    match err {
        DebateError::Storage { source, unrecorded } => {
            assert!(matches!(source, StorageError::Timeout(d) if d == Duration::from_secs(1)));
            assert!(unrecorded.is_none());
        }
        other => panic!("expected storage timeout, got {other:?}"),
    }
    assert_eq!(debate.state(), DebateState::Idle);
}

#[tokio::test]
async fn test_storage_failure_returns_unrecorded_outcome() {
    let memory = Arc::new(FlakyMemory::default());
    memory.fail_appends.store(true, Ordering::SeqCst);
    let mut debate = standard_debate(memory.clone());
    let session = SessionId::from("s");

    let err = debate
        .conduct_debate(&session, "Resupply the outpost")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DebateError::Storage {
            source: StorageError::Connection(_),
            ..
        }
    ));

    let mut outcome = err.into_unrecorded().unwrap();
    assert_eq!(outcome.responses.len(), 6);
    assert_eq!(outcome.sequence, None);
    assert!(memory.recent_history(&session, 5).await.unwrap().is_empty());

    assert!(debate.record(&mut outcome).await.is_err());
    assert_eq!(outcome.sequence, None);

    memory.fail_appends.store(false, Ordering::SeqCst);
    assert_eq!(debate.record(&mut outcome).await.unwrap(), 1);
    assert_eq!(outcome.sequence, Some(1));

    let history = memory.recent_history(&session, 5).await.unwrap();
    assert_eq!(history, vec![outcome.recorded_turn().unwrap()]);

    // Recording again is a no-op
    assert_eq!(debate.record(&mut outcome).await.unwrap(), 1);
    assert_eq!(memory.recent_history(&session, 5).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_record_after_sequence_lookup_failure() {
    let memory = Arc::new(FlakyMemory::default());
    let mut debate = standard_debate(memory.clone());
    let session = SessionId::from("seq");

    debate.conduct_debate(&session, "Hold the bridge").await.unwrap();

    memory.fail_sequence.store(true, Ordering::SeqCst);
    let err = debate
        .conduct_debate(&session, "Resupply the bridge team")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DebateError::Storage {
            source: StorageError::Query(_),
            ..
        }
    ));
    let mut outcome = err.into_unrecorded().unwrap();
    assert!(!outcome.is_recorded());
    assert_eq!(memory.recent_history(&session, 5).await.unwrap().len(), 1);

    memory.fail_sequence.store(false, Ordering::SeqCst);
    assert_eq!(debate.record(&mut outcome).await.unwrap(), 2);

    let history = memory.recent_history(&session, 5).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].sequence, 1);
    assert_eq!(Some(history[1].clone()), outcome.recorded_turn());
    assert_eq!(history[1].user_input, "Resupply the bridge team");
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_round_returns_to_idle() {
    let squad = Squad::builder()
        .member(Scripted::new(Role::Leader, Stance::Support, 0.65))
        .member(Scripted::new(Role::Scout, Stance::Neutral, 0.5).slow(Duration::from_secs(20)))
        .build()
        .unwrap();
    let memory = Arc::new(MemoryBackend::new());
    let mut debate = SquadDebate::new(squad, memory.clone(), DebateConfig::default());
    let session = SessionId::from("drop");

    let abandoned = tokio::time::timeout(
        Duration::from_secs(1),
        debate.conduct_debate(&session, "Hold position"),
    )
    .await;

    assert!(abandoned.is_err());
    assert_eq!(debate.state(), DebateState::Idle);
    assert!(memory.recent_history(&session, 5).await.unwrap().is_empty());

    let outcome = debate.conduct_debate(&session, "Hold position").await.unwrap();
    assert_eq!(outcome.sequence, Some(1));
}

#[tokio::test]
async fn test_custom_speaking_order() {
    let squad = Squad::standard()
        .with_speaking_order(&[
            Role::Scout,
            Role::Leader,
            Role::TacticalPlanner,
            Role::Medic,
            Role::CommsSpecialist,
        ])
        .unwrap();
    let memory = Arc::new(MemoryBackend::new());
    let mut debate = SquadDebate::new(squad, memory, DebateConfig::default());

    let outcome = debate
        .conduct_debate(&SessionId::from("o"), "Hold the bridge")
        .await
        .unwrap();

    let order: Vec<Role> = outcome.round.opinions.iter().map(|o| o.role).collect();
    assert_eq!(order[0], Role::Scout);
    assert_eq!(order[1], Role::Leader);
    assert_eq!(outcome.responses.len(), 6);
}

#[tokio::test]
async fn test_voiced_squad_debates() {
    let provider = Arc::new(MockProvider::in_character().with_latency(Duration::ZERO));
    let squad = Squad::new(voiced_roster(provider)).unwrap();
    let memory = Arc::new(MemoryBackend::new());
    let mut debate = SquadDebate::new(squad, memory, DebateConfig::default());

    let outcome = debate
        .conduct_debate(&SessionId::from("llm"), "Hold the bridge")
        .await
        .unwrap();

    assert_eq!(outcome.responses.len(), 6);
    assert!(outcome.responses[&Speaker::Decision].starts_with("Commander Harris here."));
}

#[tokio::test]
async fn test_outcome_serializes_with_decision_key() {
    let mut debate = standard_debate(Arc::new(MemoryBackend::new()));
    let outcome = debate
        .conduct_debate(&SessionId::from("j"), "Hold the bridge")
        .await
        .unwrap();

    let json = serde_json::to_value(&outcome).unwrap();
    assert!(json["responses"]["decision"].is_string());
    assert!(json["responses"]["leader"].is_string());
    assert_eq!(json["decision"]["outcome"]["kind"], "upheld");
}
