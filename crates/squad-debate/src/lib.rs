//! # Squad Debate
//!
//! Runs the squad through a debate round and resolves it into one decision.
//!
//! ## Key Types
//!
//! - [`SquadDebate`] — State machine driving a round from input to recorded turn
//! - [`DebateRound`] — The opinions one input drew, in speaking order
//! - [`FinalDecision`] — Veto, amended or upheld outcome of a round
//! - [`SquadConsensus`] — Voting summary of how firmly the squad agrees
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use squad_core::{SessionId, Speaker, Squad};
//! use squad_debate::{DebateConfig, SquadDebate};
//! use squad_persist::MemoryBackend;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let memory = Arc::new(MemoryBackend::new());
//! let mut debate = SquadDebate::new(Squad::standard(), memory, DebateConfig::default());
//! let session = SessionId::generate();
//!
//! let outcome = debate
//!     .conduct_debate(&session, "Secure the ridge before nightfall")
//!     .await
//!     .unwrap();
//! assert_eq!(outcome.responses.len(), 6);
//! println!("{}", outcome.responses[&Speaker::Decision]);
//! # }
//! ```
//!
//! ## Consensus Voting
//!
//! ```rust
//! use squad_core::Role;
//! use squad_debate::{Consensus, ConsensusProtocol, Vote};
//!
//! let mut consensus = Consensus::new(ConsensusProtocol::SuperMajority);
//! consensus.add_vote(Vote::new(Role::Leader, true, 0.9));
//! consensus.add_vote(Vote::new(Role::TacticalPlanner, true, 0.8));
//! consensus.add_vote(Vote::new(Role::Medic, true, 0.7));
//! consensus.evaluate();
//!
//! assert!(consensus.reached);
//! ```

pub mod config;
pub mod consensus;
pub mod debate;
pub mod error;
pub mod orchestrator;
pub mod synthesis;

pub use config::DebateConfig;
pub use consensus::{Consensus, ConsensusProtocol, ConsensusStrength, SquadConsensus, Vote};
pub use debate::{DebateRound, DebateState};
pub use error::{DebateError, OrchestrationError};
pub use orchestrator::{DebateOutcome, SquadDebate};
pub use synthesis::{synthesize, DecisionOutcome, FinalDecision};
