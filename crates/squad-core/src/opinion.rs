//! Opinions: one role's structured contribution to a round

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::role::Role;

/// Categorical position of an opinion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    Support,
    Challenge,
    Neutral,
    Veto,
}

impl Stance {
    /// Whether this stance counts against the proposed course of action
    pub fn is_dissent(self) -> bool {
        matches!(self, Stance::Challenge | Stance::Veto)
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stance::Support => "support",
            Stance::Challenge => "challenge",
            Stance::Neutral => "neutral",
            Stance::Veto => "veto",
        };
        f.write_str(s)
    }
}

/// How an opinion relates to an earlier one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Agrees,
    Challenges,
    DefersTo,
}

/// Back-reference to an opinion given earlier in the same round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub role: Role,
    pub kind: ReferenceKind,
}

/// One role's output for one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opinion {
    /// Role that produced this opinion
    pub role: Role,
    /// Categorical position
    pub stance: Stance,
    /// The response text for this role
    pub rationale: String,
    /// Confidence in the stance (0.0 - 1.0)
    pub confidence: f64,
    /// Opinions this one reacts to
    #[serde(default)]
    pub references: Vec<Reference>,
}

impl Opinion {
    /// Create an opinion; confidence is clamped to 0.0 - 1.0
    pub fn new(role: Role, stance: Stance, rationale: impl Into<String>, confidence: f64) -> Self {
        Self {
            role,
            stance,
            rationale: rationale.into(),
            confidence: confidence.clamp(0.0, 1.0),
            references: Vec::new(),
        }
    }

    pub fn support(role: Role, rationale: impl Into<String>, confidence: f64) -> Self {
        Self::new(role, Stance::Support, rationale, confidence)
    }

    pub fn challenge(role: Role, rationale: impl Into<String>, confidence: f64) -> Self {
        Self::new(role, Stance::Challenge, rationale, confidence)
    }

    pub fn neutral(role: Role, rationale: impl Into<String>, confidence: f64) -> Self {
        Self::new(role, Stance::Neutral, rationale, confidence)
    }

    pub fn veto(role: Role, rationale: impl Into<String>, confidence: f64) -> Self {
        Self::new(role, Stance::Veto, rationale, confidence)
    }

    /// Add a back-reference
    pub fn referencing(mut self, role: Role, kind: ReferenceKind) -> Self {
        if !self.references.iter().any(|r| r.role == role) {
            self.references.push(Reference { role, kind });
        }
        self
    }

    /// Replace the rationale, keeping stance, confidence and references
    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    /// Whether this opinion references the given role
    pub fn references_role(&self, role: Role) -> bool {
        self.references.iter().any(|r| r.role == role)
    }
}

/// Find the opinion a role gave earlier in the round
pub fn opinion_of(opinions: &[Opinion], role: Role) -> Option<&Opinion> {
    opinions.iter().find(|o| o.role == role)
}
