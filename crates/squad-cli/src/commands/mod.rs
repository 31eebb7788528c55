//! Subcommands and the options they share

pub mod chat;
pub mod debate;
pub mod forget;
pub mod history;
pub mod info;
pub mod sessions;

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

use squad_core::{SessionId, Squad};
use squad_llm::{voiced_roster, LlmConfig, ProviderKind};
use squad_persist::{Memory, MemoryBackend, SqliteConfig, SqliteMemory};

/// Where the conversation history lives
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Path to the squad database (default: <data dir>/squad-advisor/squad.db)
    #[arg(long, env = "SQUAD_DB", value_name = "FILE")]
    pub db: Option<PathBuf>,

    /// Keep history in memory only, for this run (ignores --db)
    #[arg(long)]
    pub ephemeral: bool,
}

impl StoreArgs {
    /// Open the configured memory backend
    pub async fn open(&self) -> Result<Arc<dyn Memory>> {
        if self.ephemeral {
            return Ok(Arc::new(MemoryBackend::new()));
        }

        let path = match &self.db {
            Some(path) => path.clone(),
            None => default_db_path()?,
        };
        tracing::debug!(path = %path.display(), "Opening squad database");

        let memory = SqliteMemory::open(SqliteConfig::file(&path))
            .await
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        Ok(Arc::new(memory))
    }
}

/// Which session a command works on
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Session identifier
    #[arg(long, short = 's', env = "SQUAD_SESSION", default_value = "default")]
    pub session: String,
}

impl SessionArgs {
    pub fn id(&self) -> SessionId {
        SessionId::new(self.session.trim())
    }
}

/// Who voices the squad
#[derive(Args, Debug, Clone)]
pub struct SquadArgs {
    /// Voice the squad through an LLM provider (mock or ollama)
    #[arg(long, value_name = "PROVIDER")]
    pub llm: Option<ProviderKind>,

    /// Model to use with --llm (overrides SQUAD_LLM_MODEL)
    #[arg(long, requires = "llm")]
    pub model: Option<String>,
}

impl SquadArgs {
    /// The built-in squad, voiced when --llm is given
    pub fn build(&self) -> Result<Squad> {
        let Some(kind) = self.llm else {
            return Ok(Squad::standard());
        };

        let mut config = LlmConfig::from_env().context("Invalid LLM configuration")?;
        config.provider = kind;
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        tracing::info!(
            provider = %config.provider,
            model = %config.model,
            "Voicing squad through LLM"
        );

        Squad::new(voiced_roster(config.build_provider()))
            .context("Failed to assemble voiced squad")
    }
}

/// Default database location under the platform data directory
pub fn default_db_path() -> Result<PathBuf> {
    let dir = dirs::data_dir()
        .context("Could not determine the platform data directory; pass --db")?
        .join("squad-advisor");
    std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    Ok(dir.join("squad.db"))
}

/// Shorten `text` to at most `max` characters on one line
pub fn truncate(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() <= max && line.len() == text.len() {
        return line.to_string();
    }
    let cut: String = line.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a rather long sentence", 8), "a rathe…");
        assert_eq!(truncate("first line\nsecond", 40), "first line…");
    }
}
