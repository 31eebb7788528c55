//! Provider seam for voicing squad members
//!
//! Every request is one squad member answering in character: the persona
//! comes from the member's [`Profile`], the prompt from the round so far.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use squad_core::Profile;

/// Sampling temperature unless a personality overrides it
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Upper bound on a reply; members answer in a few sentences
pub const REPLY_TOKEN_BUDGET: u32 = 400;

/// Errors from LLM providers
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Cannot reach provider: {0}")]
    ConnectionFailed(String),
    #[error("Provider rejected the request: {0}")]
    RequestFailed(String),
    #[error("Unusable completion: {0}")]
    InvalidResponse(String),
    #[error("Provider not available")]
    NotAvailable,
}

/// System prompt that puts a model in a squad member's shoes
pub fn persona_prompt(profile: &Profile) -> String {
    format!(
        "You are {}, the {} of a five-member advisory squad. Your traits: {}. \
         Stay in character, speak in the first person, and answer in at most four sentences.",
        profile.name,
        profile.role.title(),
        profile.traits.join(", ")
    )
}

/// One squad member's turn to speak
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// Who the model speaks as
    pub persona: String,
    /// The round so far and the position to argue
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmRequest {
    /// Ask `profile`'s character to answer `prompt`
    pub fn in_character(profile: &Profile, prompt: impl Into<String>) -> Self {
        Self::with_persona(persona_prompt(profile), prompt)
    }

    /// Request with a hand-written persona
    pub fn with_persona(persona: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
            prompt: prompt.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: REPLY_TOKEN_BUDGET,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }
}

/// What the model said
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    /// Model that produced the reply
    pub model: String,
    pub tokens_used: Option<u32>,
    pub latency_ms: u64,
}

impl LlmResponse {
    /// The reply without surrounding whitespace
    pub fn text(&self) -> &str {
        self.content.trim()
    }
}

/// A language model that can voice squad members
#[async_trait]
pub trait LlmProvider: Send + Sync + std::fmt::Debug {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Check if the provider is available
    async fn is_available(&self) -> bool;

    /// Produce one in-character reply
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError>;
}
