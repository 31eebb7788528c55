//! Debate configuration

use std::time::Duration;

use squad_core::config::env_or;
use squad_core::ConfigError;

use crate::consensus::ConsensusProtocol;

/// Configuration for a [`crate::SquadDebate`]
#[derive(Debug, Clone, PartialEq)]
pub struct DebateConfig {
    /// Number of prior turns handed to each personality
    pub history_limit: usize,
    /// Confidence lead a challenger needs over the Leader to amend the decision
    pub amendment_margin: f64,
    /// Upper bound on a single personality call
    pub personality_timeout: Duration,
    /// Upper bound on each memory call
    pub storage_timeout: Duration,
    /// Protocol for the squad consensus summary
    pub consensus_protocol: ConsensusProtocol,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            history_limit: 5,
            amendment_margin: 0.15,
            personality_timeout: Duration::from_secs(30),
            storage_timeout: Duration::from_secs(5),
            consensus_protocol: ConsensusProtocol::Majority,
        }
    }
}

impl DebateConfig {
    /// Defaults overridden by `SQUAD_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            history_limit: env_or("SQUAD_HISTORY_LIMIT", defaults.history_limit)?,
            amendment_margin: env_or("SQUAD_AMENDMENT_MARGIN", defaults.amendment_margin)?,
            personality_timeout: Duration::from_secs(env_or(
                "SQUAD_PERSONALITY_TIMEOUT_SECS",
                defaults.personality_timeout.as_secs(),
            )?),
            storage_timeout: Duration::from_secs(env_or(
                "SQUAD_STORAGE_TIMEOUT_SECS",
                defaults.storage_timeout.as_secs(),
            )?),
            consensus_protocol: env_or("SQUAD_CONSENSUS", defaults.consensus_protocol)?,
        })
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_amendment_margin(mut self, margin: f64) -> Self {
        self.amendment_margin = margin;
        self
    }

    pub fn with_timeouts(mut self, personality: Duration, storage: Duration) -> Self {
        self.personality_timeout = personality;
        self.storage_timeout = storage;
        self
    }

    pub fn with_consensus_protocol(mut self, protocol: ConsensusProtocol) -> Self {
        self.consensus_protocol = protocol;
        self
    }
}
