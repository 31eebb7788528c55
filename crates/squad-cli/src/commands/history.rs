//! History command - Show a session's recent turns
//!
//! Usage:
//! ```bash
//! squad history --session ridge
//! squad history --session ridge --limit 3 --full
//! squad history --json
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use squad_core::ConversationTurn;

use super::{truncate, SessionArgs, StoreArgs};
use crate::print_info;

/// Arguments for the history command
#[derive(Args)]
pub struct HistoryArgs {
    #[command(flatten)]
    session: SessionArgs,

    #[command(flatten)]
    store: StoreArgs,

    /// Number of most recent turns to show
    #[arg(long, short = 'n', default_value_t = 10)]
    limit: usize,

    /// Print every member's response instead of a summary table
    #[arg(long, conflicts_with = "json")]
    full: bool,

    /// Output turns as JSON
    #[arg(long)]
    json: bool,
}

/// Run the history command
pub async fn run(args: HistoryArgs) -> Result<()> {
    let memory = args.store.open().await?;
    let session = args.session.id();
    let turns = memory
        .recent_history(&session, args.limit)
        .await
        .with_context(|| format!("Failed to read history of session '{}'", session))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&turns)?);
        return Ok(());
    }

    if turns.is_empty() {
        print_info(&format!("No turns recorded in session '{}'.", session));
        return Ok(());
    }

    println!("{} {}", "📜 History of session".bold().cyan(), session.as_str().green().bold());
    println!();

    if args.full {
        for turn in &turns {
            print_turn(turn);
        }
    } else {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                Cell::new("#").fg(Color::Cyan),
                Cell::new("When").fg(Color::Cyan),
                Cell::new("Scenario").fg(Color::Cyan),
                Cell::new("Decision").fg(Color::Cyan),
            ]);

        for turn in &turns {
            let decision = turn.decision().unwrap_or_default();
            let decision_color = if decision.starts_with("BLOCKED") {
                Color::Red
            } else {
                Color::Green
            };
            table.add_row(vec![
                Cell::new(turn.sequence),
                Cell::new(turn.timestamp.format("%Y-%m-%d %H:%M").to_string()),
                Cell::new(truncate(&turn.user_input, 40)),
                Cell::new(truncate(decision, 60)).fg(decision_color),
            ]);
        }
        println!("{table}");
    }

    Ok(())
}

fn print_turn(turn: &ConversationTurn) {
    println!(
        "{} {} {}",
        format!("#{}", turn.sequence).bold(),
        turn.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
        turn.user_input.bold()
    );
    for (speaker, text) in &turn.responses {
        println!("  {}", format!("{}:", speaker).cyan());
        for line in text.lines() {
            println!("    {}", line);
        }
    }
    println!();
}
