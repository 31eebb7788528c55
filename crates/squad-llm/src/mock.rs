//! Mock LLM provider for testing and offline runs

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::provider::{LlmError, LlmProvider, LlmRequest, LlmResponse};

#[derive(Debug)]
enum Behaviour {
    /// Cycle through canned responses
    Canned(Vec<String>),
    /// Answer in character from the request itself
    InCharacter,
    /// Fail every request
    Failing(String),
}

/// A mock LLM provider; needs no network access
#[derive(Debug)]
pub struct MockProvider {
    /// Name of this mock
    pub name: String,
    behaviour: Behaviour,
    /// Next canned response
    index: AtomicUsize,
    /// Simulated latency
    latency: Duration,
    /// Requests served or refused so far
    calls: AtomicUsize,
}

impl MockProvider {
    fn with_behaviour(name: &str, behaviour: Behaviour) -> Self {
        Self {
            name: name.to_string(),
            behaviour,
            index: AtomicUsize::new(0),
            latency: Duration::from_millis(50),
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a new mock provider with given responses
    pub fn new(responses: Vec<String>) -> Self {
        Self::with_behaviour("mock", Behaviour::Canned(responses))
    }

    /// Create a mock that always returns the same response
    pub fn constant(response: &str) -> Self {
        Self::new(vec![response.to_string()])
    }

    /// Create a mock that speaks as whoever the persona describes
    pub fn in_character() -> Self {
        Self::with_behaviour("in-character-mock", Behaviour::InCharacter)
    }

    /// Create a mock whose every request fails
    pub fn failing(reason: &str) -> Self {
        Self::with_behaviour("failing-mock", Behaviour::Failing(reason.to_string()))
    }

    /// Change the simulated latency
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of completions requested so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn in_character_response(request: &LlmRequest) -> String {
        // "You are <name>, the <title> ..." -> <name>
        let speaker = request
            .persona
            .strip_prefix("You are ")
            .and_then(|rest| rest.split(',').next())
            .unwrap_or("The squad member");

        let position = request
            .prompt
            .lines()
            .find_map(|line| line.strip_prefix("Your position: "))
            .unwrap_or("undecided");

        format!(
            "{} here. My position is {}. I've weighed the situation and the squad's input.",
            speaker, position
        )
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_available(&self) -> bool {
        !matches!(self.behaviour, Behaviour::Failing(_))
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = Instant::now();
        self.calls.fetch_add(1, Ordering::Relaxed);

        tokio::time::sleep(self.latency).await;

        let content = match &self.behaviour {
            Behaviour::Failing(reason) => return Err(LlmError::ConnectionFailed(reason.clone())),
            Behaviour::InCharacter => Self::in_character_response(&request),
            Behaviour::Canned(responses) if responses.is_empty() => String::new(),
            Behaviour::Canned(responses) => {
                let idx = self.index.fetch_add(1, Ordering::Relaxed);
                responses[idx % responses.len()].clone()
            }
        };

        Ok(LlmResponse {
            content,
            model: self.name.clone(),
            tokens_used: Some((request.prompt.len() / 4) as u32 + 100),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
