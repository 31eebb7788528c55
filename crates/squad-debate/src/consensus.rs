//! Consensus protocols for squad agreement

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use squad_core::{Opinion, Role, Stance};

/// A vote from one squad member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    /// Role that cast this vote
    pub role: Role,
    /// Whether they agree (true) or disagree (false)
    pub agrees: bool,
    /// Confidence in the vote (0.0 - 1.0)
    pub confidence: f64,
    /// Optional reasoning
    pub reasoning: Option<String>,
}

impl Vote {
    /// Create a new vote
    pub fn new(role: Role, agrees: bool, confidence: f64) -> Self {
        Self {
            role,
            agrees,
            confidence: confidence.clamp(0.0, 1.0),
            reasoning: None,
        }
    }

    /// The vote an opinion casts; Neutral abstains
    pub fn from_opinion(opinion: &Opinion) -> Option<Self> {
        let agrees = match opinion.stance {
            Stance::Support => true,
            Stance::Challenge | Stance::Veto => false,
            Stance::Neutral => return None,
        };
        Some(Self {
            reasoning: Some(opinion.rationale.clone()),
            ..Self::new(opinion.role, agrees, opinion.confidence)
        })
    }
}

/// Type of consensus protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusProtocol {
    /// Simple majority (> 50%)
    Majority,
    /// Super majority (> 66%)
    SuperMajority,
    /// Unanimous agreement
    Unanimous,
    /// Weighted by confidence scores
    WeightedConfidence,
}

impl FromStr for ConsensusProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "majority" => Ok(ConsensusProtocol::Majority),
            "super_majority" | "supermajority" => Ok(ConsensusProtocol::SuperMajority),
            "unanimous" => Ok(ConsensusProtocol::Unanimous),
            "weighted" | "weighted_confidence" => Ok(ConsensusProtocol::WeightedConfidence),
            other => Err(format!("unknown consensus protocol: {}", other)),
        }
    }
}

impl fmt::Display for ConsensusProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConsensusProtocol::Majority => "majority",
            ConsensusProtocol::SuperMajority => "super_majority",
            ConsensusProtocol::Unanimous => "unanimous",
            ConsensusProtocol::WeightedConfidence => "weighted_confidence",
        };
        f.write_str(s)
    }
}

/// Result of a consensus vote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consensus {
    /// The protocol used
    pub protocol: ConsensusProtocol,
    /// All votes cast
    pub votes: Vec<Vote>,
    /// Whether consensus was reached
    pub reached: bool,
    /// The consensus decision (if reached)
    pub decision: Option<bool>,
    /// Overall confidence
    pub confidence: f64,
}

impl Consensus {
    /// Create a new consensus with the given protocol
    pub fn new(protocol: ConsensusProtocol) -> Self {
        Self {
            protocol,
            votes: Vec::new(),
            reached: false,
            decision: None,
            confidence: 0.0,
        }
    }

    /// Add a vote
    pub fn add_vote(&mut self, vote: Vote) {
        self.votes.push(vote);
    }

    /// Share of votes that agree
    pub fn agree_ratio(&self) -> f64 {
        if self.votes.is_empty() {
            return 0.0;
        }
        self.votes.iter().filter(|v| v.agrees).count() as f64 / self.votes.len() as f64
    }

    /// Evaluate the votes and determine consensus
    pub fn evaluate(&mut self) {
        if self.votes.is_empty() {
            self.reached = false;
            self.decision = None;
            self.confidence = 0.0;
            return;
        }

        let agree_ratio = self.agree_ratio();

        let (reached, decision) = match self.protocol {
            ConsensusProtocol::Majority => {
                if agree_ratio == 0.5 {
                    (false, None)
                } else {
                    (true, Some(agree_ratio > 0.5))
                }
            }
            ConsensusProtocol::SuperMajority => {
                if agree_ratio > 0.66 {
                    (true, Some(true))
                } else if agree_ratio < 0.34 {
                    (true, Some(false))
                } else {
                    (false, None)
                }
            }
            ConsensusProtocol::Unanimous => {
                if agree_ratio == 1.0 {
                    (true, Some(true))
                } else if agree_ratio == 0.0 {
                    (true, Some(false))
                } else {
                    (false, None)
                }
            }
            ConsensusProtocol::WeightedConfidence => {
                let weighted_agree: f64 = self
                    .votes
                    .iter()
                    .filter(|v| v.agrees)
                    .map(|v| v.confidence)
                    .sum();
                let weighted_disagree: f64 = self
                    .votes
                    .iter()
                    .filter(|v| !v.agrees)
                    .map(|v| v.confidence)
                    .sum();
                let total_confidence = weighted_agree + weighted_disagree;

                if total_confidence > 0.0 {
                    (true, Some(weighted_agree / total_confidence > 0.5))
                } else {
                    (false, None)
                }
            }
        };

        self.reached = reached;
        self.decision = decision;
        self.confidence =
            self.votes.iter().map(|v| v.confidence).sum::<f64>() / self.votes.len() as f64;
    }
}

/// How firmly the squad stands together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusStrength {
    Low,
    Moderate,
    High,
}

impl fmt::Display for ConsensusStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConsensusStrength::Low => "low",
            ConsensusStrength::Moderate => "moderate",
            ConsensusStrength::High => "high",
        };
        f.write_str(s)
    }
}

/// Squad-level reading of a round's opinions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SquadConsensus {
    /// Support/Challenge/Veto votes under the chosen protocol
    pub consensus: Consensus,
    /// Roles that stayed neutral
    pub abstentions: Vec<Role>,
    /// Role whose veto blocked the round, if any
    pub vetoed_by: Option<Role>,
    pub strength: ConsensusStrength,
    pub description: String,
}

impl SquadConsensus {
    /// Evaluate the opinions of one round
    pub fn evaluate(opinions: &[Opinion], protocol: ConsensusProtocol) -> Self {
        let mut consensus = Consensus::new(protocol);
        let mut abstentions = Vec::new();
        for opinion in opinions {
            match Vote::from_opinion(opinion) {
                Some(vote) => consensus.add_vote(vote),
                None => abstentions.push(opinion.role),
            }
        }
        consensus.evaluate();

        let vetoed_by = opinions
            .iter()
            .filter(|o| o.stance == Stance::Veto)
            .map(|o| o.role)
            .min();

        if let Some(role) = vetoed_by {
            consensus.reached = true;
            consensus.decision = Some(false);
            return Self {
                consensus,
                abstentions,
                vetoed_by,
                strength: ConsensusStrength::High,
                description: format!(
                    "The squad is blocked: the {} vetoed this course of action.",
                    role
                ),
            };
        }

        let (strength, description) = match (consensus.reached, consensus.decision) {
            _ if consensus.votes.is_empty() => (
                ConsensusStrength::Low,
                "Nobody took a position; the squad needs more information.".to_string(),
            ),
            (true, Some(agrees)) => {
                let majority = if agrees {
                    consensus.agree_ratio()
                } else {
                    1.0 - consensus.agree_ratio()
                };
                let side = if agrees { "behind" } else { "against" };
                if majority >= 1.0 {
                    (
                        ConsensusStrength::High,
                        format!("The squad is united {} the plan.", side),
                    )
                } else {
                    (
                        ConsensusStrength::Moderate,
                        format!("Most of the squad stands {} the plan, with some dissent.", side),
                    )
                }
            }
            _ => (
                ConsensusStrength::Low,
                "The squad has differing perspectives on this matter.".to_string(),
            ),
        };

        Self {
            consensus,
            abstentions,
            vetoed_by,
            strength,
            description,
        }
    }

    pub fn reached(&self) -> bool {
        self.consensus.reached
    }
}
