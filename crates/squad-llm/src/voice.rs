//! Model-backed personalities
//!
//! [`LlmPersonality`] keeps the stance, confidence and references a rule
//! personality derives and has an [`LlmProvider`] phrase the rationale in
//! character.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use squad_core::{
    format_history, standard_roster, ConversationTurn, Opinion, Personality, PersonalityError,
    Profile,
};

use crate::provider::{LlmProvider, LlmRequest, DEFAULT_TEMPERATURE};

/// A personality whose wording comes from a language model
pub struct LlmPersonality {
    inner: Box<dyn Personality>,
    provider: Arc<dyn LlmProvider>,
    temperature: f32,
}

impl LlmPersonality {
    pub fn new(inner: Box<dyn Personality>, provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            inner,
            provider,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn user_prompt(
        scenario: &str,
        history: &[ConversationTurn],
        prior: &[Opinion],
        draft: &Opinion,
    ) -> String {
        let mut prompt = format_history(history);
        prompt.push_str(&format!("Scenario: {}\n", scenario.trim()));

        if !prior.is_empty() {
            prompt.push_str("\nWhat the squad has said so far:\n");
            for opinion in prior {
                prompt.push_str(&format!(
                    "- {} ({}, {:.0}% confidence): {}\n",
                    opinion.role,
                    opinion.stance,
                    opinion.confidence * 100.0,
                    opinion.rationale
                ));
            }
        }

        prompt.push_str(&format!("\nNotes for your answer: {}\n", draft.rationale));
        prompt.push_str(&format!(
            "Your position: {} ({:.0}% confidence)\n",
            draft.stance,
            draft.confidence * 100.0
        ));
        prompt
    }
}

impl std::fmt::Debug for LlmPersonality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmPersonality")
            .field("role", &self.inner.role())
            .field("provider", &self.provider.name())
            .finish()
    }
}

#[async_trait]
impl Personality for LlmPersonality {
    fn profile(&self) -> &Profile {
        self.inner.profile()
    }

    async fn generate_response(
        &self,
        scenario: &str,
        history: &[ConversationTurn],
        prior: &[Opinion],
    ) -> Result<Opinion, PersonalityError> {
        let draft = self.inner.generate_response(scenario, history, prior).await?;

        let request = LlmRequest::in_character(
            self.profile(),
            Self::user_prompt(scenario, history, prior, &draft),
        )
        .temperature(self.temperature);

        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| PersonalityError::Backend(e.to_string()))?;

        let text = response.text();
        if text.is_empty() {
            return Err(PersonalityError::Malformed(format!(
                "{} returned an empty completion",
                self.provider.name()
            )));
        }

        debug!(
            role = %draft.role,
            provider = self.provider.name(),
            latency_ms = response.latency_ms,
            "Rationale voiced by model"
        );
        Ok(draft.with_rationale(text))
    }
}

/// The built-in roster with every member voiced by `provider`
pub fn voiced_roster(provider: Arc<dyn LlmProvider>) -> Vec<Box<dyn Personality>> {
    standard_roster()
        .into_iter()
        .map(|inner| Box::new(LlmPersonality::new(inner, provider.clone())) as Box<dyn Personality>)
        .collect()
}
