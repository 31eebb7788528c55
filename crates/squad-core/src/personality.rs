//! The [`Personality`] capability
//!
//! A personality is bound to exactly one [`Role`] and turns a scenario, the
//! recent history and the opinions already given this round into its own
//! [`Opinion`]. Implementations hold no mutable state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::opinion::Opinion;
use crate::role::Role;
use crate::turn::ConversationTurn;

/// Errors a personality can report
#[derive(Debug, Error)]
pub enum PersonalityError {
    #[error("Scenario is empty")]
    EmptyScenario,
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Immutable character sheet of a personality
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Display name, e.g. "Commander Harris"
    pub name: String,
    /// The role this personality fills
    pub role: Role,
    /// Descriptive tags that bias wording; the first one leads
    pub traits: Vec<String>,
    /// Derived from role rank
    pub authority_level: u8,
    /// Glyph shown next to the name
    pub avatar: String,
}

impl Profile {
    pub fn new(
        name: impl Into<String>,
        role: Role,
        traits: &[&str],
        avatar: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            role,
            traits: traits.iter().map(|t| t.to_string()).collect(),
            authority_level: role.authority_level(),
            avatar: avatar.into(),
        }
    }

    /// The first trait, if any
    pub fn lead_trait(&self) -> Option<&str> {
        self.traits.first().map(String::as_str)
    }
}

/// Maps (scenario, context) to one role's opinion
#[async_trait]
pub trait Personality: Send + Sync {
    /// Character sheet of this personality
    fn profile(&self) -> &Profile;

    /// Role this personality is bound to
    fn role(&self) -> Role {
        self.profile().role
    }

    /// Produce this role's opinion.
    ///
    /// `history` is already bounded by the caller, oldest first. `prior` holds
    /// the opinions given earlier in the current round, in speaking order.
    async fn generate_response(
        &self,
        scenario: &str,
        history: &[ConversationTurn],
        prior: &[Opinion],
    ) -> Result<Opinion, PersonalityError>;
}

/// Reject empty or whitespace-only scenarios
pub fn ensure_scenario(scenario: &str) -> Result<&str, PersonalityError> {
    let trimmed = scenario.trim();
    if trimmed.is_empty() {
        Err(PersonalityError::EmptyScenario)
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_authority_follows_rank() {
        let profile = Profile::new("Dr. Chen", Role::Medic, &["empathetic", "ethical"], "+");
        assert_eq!(profile.authority_level, 3);
        assert_eq!(profile.lead_trait(), Some("empathetic"));
    }

    #[test]
    fn test_ensure_scenario() {
        assert!(matches!(ensure_scenario("  \n\t"), Err(PersonalityError::EmptyScenario)));
        assert_eq!(ensure_scenario("  hold the bridge ").unwrap(), "hold the bridge");
    }
}
