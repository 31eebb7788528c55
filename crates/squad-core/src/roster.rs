//! Built-in personalities, one per [`Role`]
//!
//! Stances are derived from keyword predicates on the words of the scenario
//! and from the opinions already given this round. The wording is template
//! text coloured by each profile's lead trait.

use async_trait::async_trait;

use crate::opinion::{opinion_of, Opinion, ReferenceKind, Stance};
use crate::personality::{ensure_scenario, Personality, PersonalityError, Profile};
use crate::role::Role;
use crate::turn::ConversationTurn;

/// Words that make an operation risky or aggressive.
///
/// Signals match whole words plus simple inflections ("storms", "forced").
/// A trailing `*` marks a stem matching any word it starts ("casualt*").
pub const RISK_SIGNALS: &[&str] = &[
    "aggressive",
    "attack",
    "assault",
    "force",
    "rush",
    "raid",
    "storm",
    "head-on",
    "risk",
    "risky",
    "immediately",
];

/// Words that put people or principles in danger
pub const ETHICAL_RISKS: &[&str] = &[
    "harm",
    "civilian",
    "casualt*",
    "torture",
    "illegal",
    "endanger",
    "sacrifice",
    "coerce",
    "hostage",
];

/// Words that call for acting now
pub const URGENCY_SIGNALS: &[&str] = &[
    "urgent",
    "urgency",
    "immediately",
    "asap",
    "right now",
    "deadline",
    "quickly",
];

/// Planner challenges above this confidence make the Leader defer
pub const DEFER_THRESHOLD: f64 = 0.75;

const LEADER_CONFIDENCE: f64 = 0.65;
const DEFERRED_CONFIDENCE: f64 = 0.5;
const PLANNER_SUPPORT: f64 = 0.7;
const PLANNER_BASE_CHALLENGE: f64 = 0.55;
const PLANNER_SIGNAL_STEP: f64 = 0.1;
const PLANNER_MAX_CHALLENGE: f64 = 0.95;
const MEDIC_VETO: f64 = 0.9;
const MEDIC_CONCERN: f64 = 0.6;
const COMMS_TENSION: f64 = 0.55;
const COMMS_SUPPORT: f64 = 0.6;
const SCOUT_CONFIDENCE: f64 = 0.5;

/// Endings a signal word may carry and still count
const INFLECTIONS: &[&str] = &["", "s", "es", "d", "ed", "ing", "er", "ers", "ly", "ful"];

fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn word_matches(word: &str, signal: &str) -> bool {
    match signal.strip_suffix('*') {
        Some(stem) => word.starts_with(stem),
        None => word
            .strip_prefix(signal)
            .is_some_and(|ending| INFLECTIONS.contains(&ending)),
    }
}

/// Whether the consecutive words of `signal` appear in `words`
fn contains_signal(words: &[String], signal: &str) -> bool {
    let parts: Vec<&str> = signal
        .split(|c: char| !c.is_alphanumeric() && c != '*')
        .filter(|p| !p.is_empty())
        .collect();
    !parts.is_empty()
        && words
            .windows(parts.len())
            .any(|window| window.iter().zip(&parts).all(|(w, p)| word_matches(w, p)))
}

fn count_matches(text: &str, signals: &[&str]) -> usize {
    let words = words(text);
    signals.iter().filter(|s| contains_signal(&words, s)).count()
}

/// Number of distinct risk signals in `text`
pub fn risk_signals(text: &str) -> usize {
    count_matches(text, RISK_SIGNALS)
}

/// Whether `text` puts people or principles at stake
pub fn is_ethical_risk(text: &str) -> bool {
    count_matches(text, ETHICAL_RISKS) > 0
}

/// Whether `text` asks for immediate action
pub fn is_urgent(text: &str) -> bool {
    count_matches(text, URGENCY_SIGNALS) > 0
}

/// Opening phrase for a lead trait
fn tone(profile: &Profile) -> &'static str {
    match profile.lead_trait() {
        Some("decisive") => "Here's the call.",
        Some("analytical") => "Running the numbers.",
        Some("empathetic") => "Thinking about the people involved first.",
        Some("diplomatic") => "Let's consider how this lands.",
        Some("observant") => "Here's what I'm seeing.",
        Some("cautious") => "Slow down a moment.",
        Some("strategic") => "Looking at the whole board.",
        _ => "Noted.",
    }
}

macro_rules! builtin {
    ($(#[$doc:meta])* $ty:ident, $role:expr, $name:expr, [$($tr:expr),*], $avatar:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $ty {
            profile: Profile,
        }

        impl $ty {
            pub fn new() -> Self {
                Self {
                    profile: Profile::new($name, $role, &[$($tr),*], $avatar),
                }
            }

            /// Replace the trait set; the first trait sets the tone
            pub fn with_traits(mut self, traits: &[&str]) -> Self {
                self.profile.traits = traits.iter().map(|t| t.to_string()).collect();
                self
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

builtin!(
    /// Commander Harris: makes the call and owns it
    Leader,
    Role::Leader,
    "Commander Harris",
    ["decisive", "confident", "responsible", "mission-focused"],
    "🎖️"
);

builtin!(
    /// Lt. Rodriguez: analyzes the plan and questions its assumptions
    TacticalPlanner,
    Role::TacticalPlanner,
    "Lt. Rodriguez",
    ["analytical", "strategic", "detail-oriented", "questioning"],
    "🧩"
);

builtin!(
    /// Dr. Chen: weighs human impact and holds the moral veto
    Medic,
    Role::Medic,
    "Dr. Chen",
    ["empathetic", "ethical", "cautious", "principled"],
    "🩺"
);

builtin!(
    /// Sgt. Morgan: watches the squad's internal and external messaging
    CommsSpecialist,
    Role::CommsSpecialist,
    "Sgt. Morgan",
    ["diplomatic", "persuasive", "perceptive", "adaptive"],
    "📡"
);

builtin!(
    /// Specialist Patel: reports what the ground looks like
    Scout,
    Role::Scout,
    "Specialist Patel",
    ["observant", "detail-focused", "pragmatic", "straightforward"],
    "🔭"
);

/// The five built-in personalities in default speaking order
pub fn standard_roster() -> Vec<Box<dyn Personality>> {
    vec![
        Box::new(Leader::new()),
        Box::new(TacticalPlanner::new()),
        Box::new(Medic::new()),
        Box::new(CommsSpecialist::new()),
        Box::new(Scout::new()),
    ]
}

/// Add an Agrees/Challenges reference for every prior opinion that took a side
fn acknowledge(mut opinion: Opinion, prior: &[Opinion]) -> Opinion {
    for p in prior {
        opinion = match p.stance {
            Stance::Support => opinion.referencing(p.role, ReferenceKind::Agrees),
            Stance::Challenge | Stance::Veto => {
                opinion.referencing(p.role, ReferenceKind::Challenges)
            }
            Stance::Neutral => opinion,
        };
    }
    opinion
}

#[async_trait]
impl Personality for Leader {
    fn profile(&self) -> &Profile {
        &self.profile
    }

    async fn generate_response(
        &self,
        scenario: &str,
        history: &[ConversationTurn],
        prior: &[Opinion],
    ) -> Result<Opinion, PersonalityError> {
        let scenario = ensure_scenario(scenario)?;
        let mut text = format!(
            "{} Alright, let's assess the situation: {}\n\n",
            tone(&self.profile),
            scenario
        );

        if let Some(last) = history.last() {
            let decided = last.decision().and_then(|d| d.lines().next()).unwrap_or_default();
            text.push_str(&format!(
                "Last round (#{}) we decided: \"{}\" That still frames this one. ",
                last.sequence,
                decided.trim()
            ));
        }

        let strong_challenge = opinion_of(prior, Role::TacticalPlanner)
            .filter(|o| o.stance == Stance::Challenge && o.confidence > DEFER_THRESHOLD);

        if let Some(planner) = strong_challenge {
            text.push_str(&format!(
                "The tactical objections are strong enough ({:.0}% confidence) that I'm deferring \
                 to Lt. Rodriguez's plan. We hold until the alternative is mapped out.",
                planner.confidence * 100.0
            ));
            let opinion = Opinion::neutral(Role::Leader, text, DEFERRED_CONFIDENCE)
                .referencing(Role::TacticalPlanner, ReferenceKind::DefersTo);
            return Ok(acknowledge(opinion, prior));
        }

        if !prior.is_empty() {
            text.push_str("I've heard the squad's input. ");
        }

        if is_urgent(scenario) {
            text.push_str(
                "My decision is to proceed with a direct approach, focusing on the primary \
                 objective while keeping room for the unexpected. Any objections need to be \
                 voiced now.",
            );
        } else {
            text.push_str(
                "My decision is a measured approach with clear objectives, focusing on the \
                 primary objective while keeping room for the unexpected. Any objections need \
                 to be voiced now.",
            );
        }

        Ok(acknowledge(Opinion::support(Role::Leader, text, LEADER_CONFIDENCE), prior))
    }
}

#[async_trait]
impl Personality for TacticalPlanner {
    fn profile(&self) -> &Profile {
        &self.profile
    }

    async fn generate_response(
        &self,
        scenario: &str,
        _history: &[ConversationTurn],
        prior: &[Opinion],
    ) -> Result<Opinion, PersonalityError> {
        let scenario = ensure_scenario(scenario)?;
        let leader = opinion_of(prior, Role::Leader);
        // the Leader commits to a direct approach whenever it backs an urgent scenario
        let direct = leader.is_some_and(|l| l.stance == Stance::Support) && is_urgent(scenario);
        let signals = risk_signals(scenario) + usize::from(direct);

        let mut text = format!(
            "{} From a tactical perspective, I see multiple angles:\n\n",
            tone(&self.profile)
        );

        if signals == 0 {
            text.push_str(
                "I concur with the core assessment, but recommend we establish secondary and \
                 tertiary contingencies to keep our options open.",
            );
            let mut opinion = Opinion::support(Role::TacticalPlanner, text, PLANNER_SUPPORT);
            if leader.is_some() {
                opinion = opinion.referencing(Role::Leader, ReferenceKind::Agrees);
            }
            return Ok(opinion);
        }

        let confidence = (PLANNER_BASE_CHALLENGE + PLANNER_SIGNAL_STEP * signals as f64)
            .min(PLANNER_MAX_CHALLENGE);
        text.push_str(&format!(
            "1. I count {} risk factor(s); the plan as stated has roughly a {:.0}% chance of \
             going sideways.\n\
             2. We should consider alternative entry points to reduce exposure.\n\
             3. The timeline needs slack for unexpected variables.\n\n",
            signals,
            confidence * 100.0
        ));
        if leader.is_some() {
            text.push_str(
                "Commander, with respect, I challenge the head-on plan. \
                 A flanking, indirect approach gets us there with fewer risks.",
            );
        } else {
            text.push_str(
                "I challenge going in like this. An indirect approach carries fewer risks.",
            );
        }

        let mut opinion = Opinion::challenge(Role::TacticalPlanner, text, confidence);
        if leader.is_some() {
            opinion = opinion.referencing(Role::Leader, ReferenceKind::Challenges);
        }
        Ok(opinion)
    }
}

#[async_trait]
impl Personality for Medic {
    fn profile(&self) -> &Profile {
        &self.profile
    }

    async fn generate_response(
        &self,
        scenario: &str,
        _history: &[ConversationTurn],
        prior: &[Opinion],
    ) -> Result<Opinion, PersonalityError> {
        let scenario = ensure_scenario(scenario)?;
        let mut text = format!(
            "{} Looking at this from a humanitarian and ethical standpoint:\n\n",
            tone(&self.profile)
        );

        if is_ethical_risk(scenario) {
            text.push_str(
                "This puts people at unacceptable risk of harm. I will not sign off on it, \
                 whatever the mission gain. We find another way.",
            );
            let mut opinion = Opinion::veto(Role::Medic, text, MEDIC_VETO);
            if opinion_of(prior, Role::Leader).is_some() {
                opinion = opinion.referencing(Role::Leader, ReferenceKind::Challenges);
            }
            return Ok(opinion);
        }

        let planner_challenged = opinion_of(prior, Role::TacticalPlanner)
            .is_some_and(|o| o.stance == Stance::Challenge);

        if planner_challenged || risk_signals(scenario) > 0 {
            text.push_str(
                "I have concerns about how aggressive this is. We should minimize potential harm \
                 and consider more measured alternatives; our actions carry consequences beyond \
                 the mission.",
            );
            let mut opinion = Opinion::challenge(Role::Medic, text, MEDIC_CONCERN);
            if planner_challenged {
                opinion = opinion.referencing(Role::TacticalPlanner, ReferenceKind::Agrees);
            }
            if opinion_of(prior, Role::Leader).is_some() {
                opinion = opinion.referencing(Role::Leader, ReferenceKind::Challenges);
            }
            return Ok(opinion);
        }

        text.push_str(
            "The plan seems sound from an ethical perspective, though I'd build in safeguards \
             for everyone involved.",
        );
        let mut opinion = Opinion::support(Role::Medic, text, MEDIC_CONCERN);
        if opinion_of(prior, Role::Leader).is_some() {
            opinion = opinion.referencing(Role::Leader, ReferenceKind::Agrees);
        }
        Ok(opinion)
    }
}

#[async_trait]
impl Personality for CommsSpecialist {
    fn profile(&self) -> &Profile {
        &self.profile
    }

    async fn generate_response(
        &self,
        scenario: &str,
        _history: &[ConversationTurn],
        prior: &[Opinion],
    ) -> Result<Opinion, PersonalityError> {
        ensure_scenario(scenario)?;
        let mut text = format!(
            "{} From a communications perspective, how we frame this will be critical.\n\n",
            tone(&self.profile)
        );

        let dissenters: Vec<Role> = prior
            .iter()
            .filter(|o| o.stance.is_dissent())
            .map(|o| o.role)
            .collect();

        if !dissenters.is_empty() {
            let names: Vec<&str> = dissenters.iter().map(|r| r.title()).collect();
            text.push_str(&format!(
                "I'm noticing tension in our internal communications ({} raised concerns). \
                 We should align our messaging before engaging externally; a unified front \
                 with clear roles strengthens our position.",
                names.join(", ")
            ));
            let opinion = dissenters.iter().fold(
                Opinion::neutral(Role::CommsSpecialist, text, COMMS_TENSION),
                |op, role| op.referencing(*role, ReferenceKind::Agrees),
            );
            return Ok(opinion);
        }

        text.push_str(
            "Our internal alignment is solid. I recommend we open clear channels with all \
             stakeholders, listen actively, and adapt our tone to their responses.",
        );
        let mut opinion = Opinion::support(Role::CommsSpecialist, text, COMMS_SUPPORT);
        if opinion_of(prior, Role::Leader).is_some() {
            opinion = opinion.referencing(Role::Leader, ReferenceKind::Agrees);
        }
        Ok(opinion)
    }
}

#[async_trait]
impl Personality for Scout {
    fn profile(&self) -> &Profile {
        &self.profile
    }

    async fn generate_response(
        &self,
        scenario: &str,
        _history: &[ConversationTurn],
        prior: &[Opinion],
    ) -> Result<Opinion, PersonalityError> {
        ensure_scenario(scenario)?;
        let mut text = format!("{} Based on my observations:\n\n", tone(&self.profile));

        if prior.len() >= 2 {
            text.push_str(
                "With all due respect to the command chain, the ground doesn't always match \
                 the models. Practical considerations:\n\n\
                 1. The information presented has gaps that could affect execution.\n\
                 2. Expect delays in the timeline; similar situations always ran long.\n\
                 3. Conditions will change rapidly once we engage.\n\n\
                 Just my two cents from the field.",
            );
        } else {
            text.push_str(
                "The situation looks straightforward from the ground. I've seen similar \
                 patterns before; expect standard complications, nothing extraordinary.",
            );
        }

        Ok(Opinion::neutral(Role::Scout, text, SCOUT_CONFIDENCE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Speaker;
    use crate::turn::SessionId;
    use std::collections::BTreeMap;

    #[test]
    fn test_signal_predicates() {
        assert_eq!(risk_signals("Storm the gate and attack immediately"), 3);
        assert_eq!(risk_signals("Hold position and observe"), 0);
        assert!(is_ethical_risk("Use the Civilians as cover"));
        assert!(!is_ethical_risk("Resupply the outpost"));
        assert!(is_urgent("We need this done ASAP"));
        assert!(is_urgent("Get there right now"));
    }

    #[test]
    fn test_signals_match_whole_words() {
        assert!(!is_ethical_risk("Restock the pharmacy at the base"));
        assert!(!is_ethical_risk("Set up a charming welcome for the delegation"));
        assert!(!is_ethical_risk("Keep the harmony in the camp"));
        assert_eq!(risk_signals("Hold until reinforcements arrive"), 0);
        assert_eq!(risk_signals("A brisk walk to the checkpoint"), 0);
        assert_eq!(risk_signals("Hold the head of the valley on the ridge"), 0);
    }

    #[test]
    fn test_signals_match_inflections_and_stems() {
        assert!(is_ethical_risk("Nobody gets harmed"));
        assert!(is_ethical_risk("Accept heavy casualties"));
        assert!(is_ethical_risk("Two hostages remain"));
        assert_eq!(risk_signals("Storming the gate is risky"), 2);
        assert_eq!(risk_signals("Meet them head-on"), 1);
        assert_eq!(risk_signals("They forced the door"), 1);
    }

    #[tokio::test]
    async fn test_leader_supports_by_default() {
        let opinion = Leader::new().generate_response("Secure the ridge", &[], &[]).await.unwrap();
        assert_eq!(opinion.stance, Stance::Support);
        assert_eq!(opinion.confidence, LEADER_CONFIDENCE);
        assert!(opinion.references.is_empty());
        assert!(opinion.rationale.contains("measured approach"));
    }

    #[tokio::test]
    async fn test_leader_recalls_last_decision() {
        let mut responses = BTreeMap::new();
        responses.insert(
            Speaker::Decision,
            "Hold the bridge until dawn.\n\nAmendments:\n- Squad Medic: keep a medevac ready."
                .to_string(),
        );
        let last = ConversationTurn::new(SessionId::from("s"), 3, "What now?", responses);

        let opinion = Leader::new()
            .generate_response("Secure the ridge", &[last], &[])
            .await
            .unwrap();
        assert!(opinion
            .rationale
            .contains("Last round (#3) we decided: \"Hold the bridge until dawn.\""));
        assert!(!opinion.rationale.contains("What now?"));
    }

    #[tokio::test]
    async fn test_leader_defers_to_strong_challenge() {
        let prior = vec![Opinion::challenge(Role::TacticalPlanner, "too risky", 0.85)];
        let opinion = Leader::new()
            .generate_response("Secure the ridge", &[], &prior)
            .await
            .unwrap();
        assert_eq!(opinion.stance, Stance::Neutral);
        assert_eq!(opinion.references.len(), 1);
        assert_eq!(opinion.references[0].kind, ReferenceKind::DefersTo);
    }

    #[tokio::test]
    async fn test_leader_ignores_weak_challenge() {
        let prior = vec![Opinion::challenge(Role::TacticalPlanner, "hmm", 0.75)];
        let opinion = Leader::new()
            .generate_response("Secure the ridge", &[], &prior)
            .await
            .unwrap();
        assert_eq!(opinion.stance, Stance::Support);
        assert_eq!(opinion.references[0].kind, ReferenceKind::Challenges);
    }

    #[tokio::test]
    async fn test_planner_challenges_direct_approach() {
        let leader = Leader::new()
            .generate_response("Move out immediately", &[], &[])
            .await
            .unwrap();
        assert!(leader.rationale.contains("direct approach"));

        let opinion = TacticalPlanner::new()
            .generate_response("Move out immediately", &[], &[leader])
            .await
            .unwrap();
        assert_eq!(opinion.stance, Stance::Challenge);
        // "immediately" plus the leader's direct approach
        assert!((opinion.confidence - 0.75).abs() < 1e-9);
        assert!(opinion.references_role(Role::Leader));
    }

    #[tokio::test]
    async fn test_planner_confidence_is_capped() {
        let scenario =
            "aggressive assault to storm and raid by force, attack immediately at any risk";
        let opinion = TacticalPlanner::new()
            .generate_response(scenario, &[], &[])
            .await
            .unwrap();
        assert_eq!(opinion.confidence, PLANNER_MAX_CHALLENGE);
        assert!(opinion.references.is_empty());
    }

    #[tokio::test]
    async fn test_medic_vetoes_ethical_risk() {
        let prior = vec![Opinion::support(Role::Leader, "go", 0.65)];
        let opinion = Medic::new()
            .generate_response("Evacuate, accepting civilian casualties", &[], &prior)
            .await
            .unwrap();
        assert_eq!(opinion.stance, Stance::Veto);
        assert_eq!(opinion.confidence, MEDIC_VETO);
    }

    #[tokio::test]
    async fn test_medic_follows_planner_concern() {
        let prior = vec![
            Opinion::support(Role::Leader, "go", 0.65),
            Opinion::challenge(Role::TacticalPlanner, "flank instead", 0.65),
        ];
        let opinion = Medic::new().generate_response("Cross the river", &[], &prior).await.unwrap();
        assert_eq!(opinion.stance, Stance::Challenge);
        assert!(opinion.references_role(Role::TacticalPlanner));
    }

    #[tokio::test]
    async fn test_comms_notices_tension() {
        let prior = vec![
            Opinion::support(Role::Leader, "go", 0.65),
            Opinion::challenge(Role::TacticalPlanner, "no", 0.8),
        ];
        let opinion = CommsSpecialist::new()
            .generate_response("Cross the river", &[], &prior)
            .await
            .unwrap();
        assert_eq!(opinion.stance, Stance::Neutral);
        assert!(opinion.references_role(Role::TacticalPlanner));
        assert!(!opinion.references_role(Role::Leader));
    }

    #[tokio::test]
    async fn test_scout_detail_grows_with_prior() {
        let scout = Scout::new();
        let short = scout.generate_response("Cross the river", &[], &[]).await.unwrap();
        let prior = vec![
            Opinion::support(Role::Leader, "go", 0.65),
            Opinion::support(Role::TacticalPlanner, "ok", 0.7),
        ];
        let long = scout.generate_response("Cross the river", &[], &prior).await.unwrap();
        assert_eq!(long.stance, Stance::Neutral);
        assert!(long.rationale.len() > short.rationale.len());
    }

    #[tokio::test]
    async fn test_empty_scenario_rejected() {
        for personality in standard_roster() {
            let err = personality.generate_response("   ", &[], &[]).await.unwrap_err();
            assert!(matches!(err, PersonalityError::EmptyScenario));
        }
    }

    #[tokio::test]
    async fn test_lead_trait_sets_tone() {
        let scout = Scout::new().with_traits(&["cautious"]);
        let opinion = scout.generate_response("Cross the river", &[], &[]).await.unwrap();
        assert!(opinion.rationale.starts_with("Slow down a moment."));
    }
}
