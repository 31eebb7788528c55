//! Provider configuration
//!
//! Read from the environment; unset variables fall back to defaults, set but
//! invalid ones are reported.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use squad_core::config::{env_or, ConfigError};

use crate::mock::MockProvider;
use crate::ollama::OllamaProvider;
use crate::provider::LlmProvider;

/// Which provider voices the squad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Mock,
    Ollama,
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mock" => Ok(ProviderKind::Mock),
            "ollama" => Ok(ProviderKind::Ollama),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Mock => f.write_str("mock"),
            ProviderKind::Ollama => f.write_str("ollama"),
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider (env: SQUAD_LLM_PROVIDER)
    pub provider: ProviderKind,
    /// Model name (env: SQUAD_LLM_MODEL)
    pub model: String,
    /// Ollama base URL (env: OLLAMA_URL, default: http://localhost:11434)
    pub ollama_url: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Mock,
            model: "llama3".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
        }
    }
}

impl LlmConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            provider: env_or("SQUAD_LLM_PROVIDER", defaults.provider)?,
            model: env_or("SQUAD_LLM_MODEL", defaults.model)?,
            ollama_url: env_or("OLLAMA_URL", defaults.ollama_url)?,
        })
    }

    /// Build the configured provider
    pub fn build_provider(&self) -> Arc<dyn LlmProvider> {
        match self.provider {
            ProviderKind::Mock => Arc::new(MockProvider::in_character()),
            ProviderKind::Ollama => Arc::new(OllamaProvider::from_config(self)),
        }
    }
}
