//! Squad roles and the hierarchy they form
//!
//! The roster is closed: every [`Role`] carries its rank and veto power as
//! compile-time constants. [`Speaker`] extends the roles with the synthetic
//! `decision` entry used in response maps.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A fixed position in the squad hierarchy.
///
/// Variants are declared in rank order, so the derived `Ord` sorts the
/// highest authority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Makes the final call and carries responsibility for it
    Leader,
    /// Analyzes the situation and questions assumptions
    TacticalPlanner,
    /// Weighs human impact; holds a moral veto
    Medic,
    /// Manages messaging and interpersonal dynamics
    CommsSpecialist,
    /// Reports ground-level observations only
    Scout,
}

impl Role {
    /// All roles in default speaking order (highest rank first)
    pub const ALL: [Role; 5] = [
        Role::Leader,
        Role::TacticalPlanner,
        Role::Medic,
        Role::CommsSpecialist,
        Role::Scout,
    ];

    /// Hierarchy rank, 1 being the highest
    pub fn rank(self) -> u8 {
        match self {
            Role::Leader => 1,
            Role::TacticalPlanner => 2,
            Role::Medic => 3,
            Role::CommsSpecialist => 4,
            Role::Scout => 5,
        }
    }

    /// Authority level derived from rank (Leader 5 … Scout 1)
    pub fn authority_level(self) -> u8 {
        6 - self.rank()
    }

    /// Whether this role may block a round regardless of rank
    pub fn has_veto(self) -> bool {
        matches!(self, Role::Medic)
    }

    /// Whether this role only reports observations; its challenges never amend a decision
    pub fn is_information_only(self) -> bool {
        matches!(self, Role::Scout)
    }

    /// Stable key used in persisted maps and CLI output
    pub fn key(self) -> &'static str {
        match self {
            Role::Leader => "leader",
            Role::TacticalPlanner => "tactical",
            Role::Medic => "medic",
            Role::CommsSpecialist => "comms",
            Role::Scout => "scout",
        }
    }

    /// Human-readable title
    pub fn title(self) -> &'static str {
        match self {
            Role::Leader => "Squad Leader",
            Role::TacticalPlanner => "Tactical Planner",
            Role::Medic => "Squad Medic",
            Role::CommsSpecialist => "Communications Specialist",
            Role::Scout => "Scout",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Error for unknown role or speaker keys
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "leader" => Ok(Role::Leader),
            "tactical" | "tactical_planner" => Ok(Role::TacticalPlanner),
            "medic" => Ok(Role::Medic),
            "comms" | "comms_specialist" => Ok(Role::CommsSpecialist),
            "scout" => Ok(Role::Scout),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Key of a round's response map: a squad role or the synthesized decision.
///
/// Sorts by hierarchy rank with `Decision` last, and serializes as its key
/// string so it can key a JSON object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Speaker {
    Role(Role),
    Decision,
}

impl Speaker {
    pub const DECISION_KEY: &'static str = "decision";

    pub fn key(self) -> &'static str {
        match self {
            Speaker::Role(role) => role.key(),
            Speaker::Decision => Self::DECISION_KEY,
        }
    }

    pub fn role(self) -> Option<Role> {
        match self {
            Speaker::Role(role) => Some(role),
            Speaker::Decision => None,
        }
    }
}

impl From<Role> for Speaker {
    fn from(role: Role) -> Self {
        Speaker::Role(role)
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::Role(role) => role.fmt(f),
            Speaker::Decision => f.write_str("Decision"),
        }
    }
}

impl FromStr for Speaker {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case(Self::DECISION_KEY) {
            return Ok(Speaker::Decision);
        }
        s.parse().map(Speaker::Role)
    }
}

impl From<Speaker> for String {
    fn from(speaker: Speaker) -> Self {
        speaker.key().to_string()
    }
}

impl TryFrom<String> for Speaker {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_hierarchy_order() {
        let mut shuffled = vec![
            Role::Scout,
            Role::Medic,
            Role::Leader,
            Role::CommsSpecialist,
            Role::TacticalPlanner,
        ];
        shuffled.sort();
        assert_eq!(shuffled, Role::ALL.to_vec());

        let ranks: Vec<u8> = Role::ALL.iter().map(|r| r.rank()).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
        assert_eq!(Role::Leader.authority_level(), 5);
        assert_eq!(Role::Scout.authority_level(), 1);
    }

    #[test]
    fn test_only_medic_vetoes() {
        let vetoers: Vec<Role> = Role::ALL.into_iter().filter(|r| r.has_veto()).collect();
        assert_eq!(vetoers, vec![Role::Medic]);
    }

    #[test]
    fn test_key_roundtrip() {
        for role in Role::ALL {
            assert_eq!(role.key().parse::<Role>().unwrap(), role);
        }
        assert!("sniper".parse::<Role>().is_err());
        assert_eq!("Decision".parse::<Speaker>().unwrap(), Speaker::Decision);
    }

    #[test]
    fn test_speaker_map_serializes_with_string_keys() {
        let mut map = BTreeMap::new();
        map.insert(Speaker::Decision, "go".to_string());
        map.insert(Speaker::Role(Role::Scout), "clear".to_string());
        map.insert(Speaker::Role(Role::Leader), "move".to_string());

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"leader":"move","scout":"clear","decision":"go"}"#);

        let back: BTreeMap<Speaker, String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
