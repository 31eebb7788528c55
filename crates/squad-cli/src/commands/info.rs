//! Info command - Show the roster and configuration
//!
//! Usage:
//! ```bash
//! squad info
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use squad_core::Squad;
use squad_debate::DebateConfig;
use squad_llm::LlmConfig;

use super::default_db_path;

/// Arguments for the info command
#[derive(Args)]
pub struct InfoArgs;

/// Run the info command
pub fn run(_args: InfoArgs) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");

    println!("{}", "Squad Advisor".bold().cyan());
    println!("{}", "═".repeat(50).cyan());
    println!();

    println!("{}", "Version Information:".bold());
    println!("  {} {}", "CLI Version:".dimmed(), version.green());
    println!();

    println!("{}", "Roster (speaking order):".bold());
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("").fg(Color::Cyan),
            Cell::new("Name").fg(Color::Cyan),
            Cell::new("Role").fg(Color::Cyan),
            Cell::new("Authority").fg(Color::Cyan),
            Cell::new("Traits").fg(Color::Cyan),
        ]);

    for member in Squad::standard().members() {
        let profile = member.profile();
        let mut role = Cell::new(profile.role.title());
        if profile.role.has_veto() {
            role = Cell::new(format!("{} (veto)", profile.role.title())).fg(Color::Red);
        }
        table.add_row(vec![
            Cell::new(&profile.avatar),
            Cell::new(&profile.name).fg(Color::Green),
            role,
            Cell::new(profile.authority_level),
            Cell::new(profile.traits.join(", ")).fg(Color::Yellow),
        ]);
    }
    println!("{table}");
    println!();

    let debate = DebateConfig::from_env().context("Invalid debate configuration")?;
    let llm = LlmConfig::from_env().context("Invalid LLM configuration")?;

    println!("{}", "Configuration:".bold());
    println!("  {} {}", "History limit:".dimmed(), debate.history_limit);
    println!("  {} {}", "Amendment margin:".dimmed(), debate.amendment_margin);
    println!("  {} {:?}", "Personality timeout:".dimmed(), debate.personality_timeout);
    println!("  {} {:?}", "Storage timeout:".dimmed(), debate.storage_timeout);
    println!("  {} {}", "Consensus protocol:".dimmed(), debate.consensus_protocol);
    println!(
        "  {} {} ({}, {})",
        "LLM provider:".dimmed(),
        llm.provider,
        llm.model,
        llm.ollama_url
    );
    match default_db_path() {
        Ok(path) => println!("  {} {}", "Default database:".dimmed(), path.display()),
        Err(e) => println!("  {} {}", "Default database:".dimmed(), e.to_string().red()),
    }
    println!();

    println!("{}", "Environment:".bold());
    for var in [
        "SQUAD_DB",
        "SQUAD_SESSION",
        "SQUAD_HISTORY_LIMIT",
        "SQUAD_AMENDMENT_MARGIN",
        "SQUAD_PERSONALITY_TIMEOUT_SECS",
        "SQUAD_STORAGE_TIMEOUT_SECS",
        "SQUAD_CONSENSUS",
        "SQUAD_LLM_PROVIDER",
        "SQUAD_LLM_MODEL",
        "OLLAMA_URL",
    ] {
        println!("  {} {}", "•".cyan(), var.green());
    }
    println!();

    Ok(())
}
