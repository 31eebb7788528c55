//! Resolution of a round's opinions into one decision
//!
//! Precedence: a veto blocks; otherwise the Leader's opinion stands,
//! amended by challengers who are clearly more confident than the Leader.

use serde::{Deserialize, Serialize};

use squad_core::{Opinion, Role, Stance};

/// Tolerance when comparing a confidence gap with the amendment margin
const MARGIN_EPSILON: f64 = 1e-9;

/// How the final decision came about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionOutcome {
    /// The baseline opinion stands as-is
    Upheld,
    /// The baseline stands with amendment notes, challengers in rank order
    Amended { by: Vec<Role> },
    /// A veto overrode everything else
    Blocked { by: Role },
    /// There were no opinions to decide from
    Pending,
}

/// The synthesized outcome of a round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalDecision {
    pub text: String,
    pub outcome: DecisionOutcome,
}

impl FinalDecision {
    pub fn is_blocked(&self) -> bool {
        matches!(self.outcome, DecisionOutcome::Blocked { .. })
    }
}

/// Resolve opinions into a [`FinalDecision`].
///
/// Deterministic: the same opinions and margin always give the same text.
pub fn synthesize(opinions: &[Opinion], amendment_margin: f64) -> FinalDecision {
    let veto = opinions
        .iter()
        .filter(|o| o.stance == Stance::Veto)
        .min_by_key(|o| o.role);

    if let Some(veto) = veto {
        return FinalDecision {
            text: format!("BLOCKED ({} veto): {}", veto.role.title(), veto.rationale),
            outcome: DecisionOutcome::Blocked { by: veto.role },
        };
    }

    let baseline = opinions
        .iter()
        .find(|o| o.role == Role::Leader)
        .or_else(|| opinions.iter().min_by_key(|o| o.role));

    let Some(baseline) = baseline else {
        return FinalDecision {
            text: "The squad is still assessing the situation. Stand by for a decision."
                .to_string(),
            outcome: DecisionOutcome::Pending,
        };
    };

    let mut amendments: Vec<&Opinion> = opinions
        .iter()
        .filter(|o| o.role != baseline.role && o.stance == Stance::Challenge)
        .filter(|o| !o.role.is_information_only())
        .filter(|o| o.confidence - baseline.confidence + MARGIN_EPSILON >= amendment_margin)
        .collect();
    amendments.sort_by_key(|o| o.role);

    if amendments.is_empty() {
        return FinalDecision {
            text: baseline.rationale.clone(),
            outcome: DecisionOutcome::Upheld,
        };
    }

    let mut text = baseline.rationale.clone();
    text.push_str("\n\nAmendments:");
    for amendment in &amendments {
        text.push_str(&format!(
            "\n- {} ({:.0}% confidence): {}",
            amendment.role.title(),
            amendment.confidence * 100.0,
            amendment.rationale
        ));
    }

    FinalDecision {
        text,
        outcome: DecisionOutcome::Amended {
            by: amendments.iter().map(|o| o.role).collect(),
        },
    }
}
