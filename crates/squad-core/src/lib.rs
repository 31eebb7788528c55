//! # Squad Core
//!
//! Core types for the squad advisor:
//! - [`Role`] — Fixed positions of the squad hierarchy
//! - [`Opinion`] — One role's stance, rationale and confidence for a round
//! - [`Personality`] — Capability mapping a scenario to an opinion
//! - [`Squad`] — Validated composition of personalities and speaking order
//! - [`ConversationTurn`] — The persisted record of a round
//!
//! ## Quick Start
//!
//! ```rust
//! use squad_core::{Personality, Role, Squad};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let squad = Squad::standard();
//! let leader = squad.member(Role::Leader).unwrap();
//! let opinion = leader.generate_response("Secure the ridge", &[], &[]).await.unwrap();
//! println!("{}: {}", leader.profile().name, opinion.rationale);
//! # }
//! ```

pub mod config;
pub mod opinion;
pub mod personality;
pub mod role;
pub mod roster;
pub mod squad;
pub mod turn;

pub use config::ConfigError;
pub use opinion::{opinion_of, Opinion, Reference, ReferenceKind, Stance};
pub use personality::{ensure_scenario, Personality, PersonalityError, Profile};
pub use role::{Role, Speaker, UnknownRole};
pub use roster::{standard_roster, CommsSpecialist, Leader, Medic, Scout, TacticalPlanner};
pub use squad::{Squad, SquadBuilder, SquadError};
pub use turn::{format_history, ConversationTurn, SessionId};
