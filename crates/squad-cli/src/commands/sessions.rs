//! Sessions command - List recorded sessions
//!
//! Usage:
//! ```bash
//! squad sessions
//! squad sessions --db ./squad.db
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use super::StoreArgs;
use crate::print_info;

/// Arguments for the sessions command
#[derive(Args)]
pub struct SessionsArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Output sessions as JSON
    #[arg(long)]
    json: bool,
}

/// Run the sessions command
pub async fn run(args: SessionsArgs) -> Result<()> {
    let memory = args.store.open().await?;
    let sessions = memory.sessions().await.context("Failed to list sessions")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        print_info("No sessions recorded yet.");
        return Ok(());
    }

    println!("{}", "🗂️  Squad Sessions".bold().cyan());
    println!();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Session").fg(Color::Cyan),
            Cell::new("Turns").fg(Color::Cyan),
            Cell::new("Last #").fg(Color::Cyan),
            Cell::new("Last activity").fg(Color::Cyan),
        ]);

    for summary in &sessions {
        table.add_row(vec![
            Cell::new(summary.session.as_str()).fg(Color::Green),
            Cell::new(summary.turns),
            Cell::new(summary.last_sequence),
            Cell::new(summary.last_activity.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }

    println!("{table}");
    println!();
    println!("Show a session: {}", "squad history --session <id>".green());

    Ok(())
}
