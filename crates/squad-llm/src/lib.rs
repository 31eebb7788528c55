//! # Squad LLM
//!
//! Language-model voices for the squad advisor.
//!
//! ## Supported Backends
//!
//! | Provider | Type | Key Required |
//! |----------|------|--------------|
//! | Ollama | Local | None |
//! | Mock | Testing | None |
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use squad_core::{Personality, Scout};
//! use squad_llm::{LlmPersonality, MockProvider};
//!
//! #[tokio::main]
//! async fn main() {
//!     let provider = Arc::new(MockProvider::in_character());
//!     let scout = LlmPersonality::new(Box::new(Scout::new()), provider);
//!     let opinion = scout.generate_response("Cross the river", &[], &[]).await.unwrap();
//!     println!("{}", opinion.rationale);
//! }
//! ```
//!
//! ## With Ollama
//!
//! ```rust,ignore
//! use squad_llm::{LlmConfig, voiced_roster};
//!
//! let config = LlmConfig::from_env()?; // SQUAD_LLM_PROVIDER=ollama SQUAD_LLM_MODEL=llama3
//! let members = voiced_roster(config.build_provider());
//! ```

pub mod config;
pub mod mock;
pub mod ollama;
pub mod provider;
pub mod voice;

pub use config::{LlmConfig, ProviderKind};
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use provider::{persona_prompt, LlmError, LlmProvider, LlmRequest, LlmResponse};
pub use voice::{voiced_roster, LlmPersonality};
