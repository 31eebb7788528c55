//! Squad composition
//!
//! A [`Squad`] owns one personality per participating role plus the order in
//! which they speak. It is validated once at construction; there is no way
//! to observe a half-built squad.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::personality::Personality;
use crate::role::Role;
use crate::roster::standard_roster;

/// Errors building a squad
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SquadError {
    #[error("Squad has no members")]
    Empty,
    #[error("Duplicate role in squad: {0}")]
    DuplicateRole(Role),
    #[error("Squad has no leader")]
    MissingLeader,
    #[error("Invalid speaking order: {0}")]
    InvalidSpeakingOrder(String),
}

/// A validated set of personalities and their speaking order
pub struct Squad {
    members: Vec<Box<dyn Personality>>,
}

impl Squad {
    /// Build a squad from personalities; they speak in hierarchy order
    pub fn new(members: Vec<Box<dyn Personality>>) -> Result<Self, SquadError> {
        if members.is_empty() {
            return Err(SquadError::Empty);
        }

        let mut seen = HashSet::new();
        for member in &members {
            if !seen.insert(member.role()) {
                return Err(SquadError::DuplicateRole(member.role()));
            }
        }
        if !seen.contains(&Role::Leader) {
            return Err(SquadError::MissingLeader);
        }

        let mut members = members;
        members.sort_by_key(|m| m.role());
        debug!(members = members.len(), "Squad assembled");
        Ok(Self { members })
    }

    pub fn builder() -> SquadBuilder {
        SquadBuilder::default()
    }

    /// The five built-in personalities
    pub fn standard() -> Self {
        Self {
            members: standard_roster(),
        }
    }

    /// Reorder speakers. `order` must name every member exactly once.
    pub fn with_speaking_order(mut self, order: &[Role]) -> Result<Self, SquadError> {
        if order.len() != self.members.len() {
            return Err(SquadError::InvalidSpeakingOrder(format!(
                "expected {} roles, got {}",
                self.members.len(),
                order.len()
            )));
        }

        let mut remaining: Vec<Option<Box<dyn Personality>>> =
            self.members.drain(..).map(Some).collect();
        let mut ordered = Vec::with_capacity(order.len());
        for role in order {
            let slot = remaining
                .iter_mut()
                .find(|m| m.as_ref().is_some_and(|p| p.role() == *role));
            match slot.and_then(Option::take) {
                Some(member) => ordered.push(member),
                None => {
                    return Err(SquadError::InvalidSpeakingOrder(format!(
                        "{} is not a member or is listed twice",
                        role.key()
                    )))
                }
            }
        }

        self.members = ordered;
        Ok(self)
    }

    /// Personalities in speaking order
    pub fn members(&self) -> impl Iterator<Item = &dyn Personality> {
        self.members.iter().map(|m| m.as_ref())
    }

    /// Roles in speaking order
    pub fn speaking_order(&self) -> Vec<Role> {
        self.members.iter().map(|m| m.role()).collect()
    }

    pub fn member(&self, role: Role) -> Option<&dyn Personality> {
        self.members().find(|m| m.role() == role)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl fmt::Debug for Squad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Squad")
            .field("speaking_order", &self.speaking_order())
            .finish()
    }
}

/// Incremental [`Squad`] construction
#[derive(Default)]
pub struct SquadBuilder {
    members: Vec<Box<dyn Personality>>,
    order: Option<Vec<Role>>,
}

impl SquadBuilder {
    pub fn member(mut self, personality: impl Personality + 'static) -> Self {
        self.members.push(Box::new(personality));
        self
    }

    pub fn boxed(mut self, personality: Box<dyn Personality>) -> Self {
        self.members.push(personality);
        self
    }

    pub fn speaking_order(mut self, order: Vec<Role>) -> Self {
        self.order = Some(order);
        self
    }

    pub fn build(self) -> Result<Squad, SquadError> {
        let squad = Squad::new(self.members)?;
        match self.order {
            Some(order) => squad.with_speaking_order(&order),
            None => Ok(squad),
        }
    }
}
