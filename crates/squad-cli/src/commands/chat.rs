//! Chat command - Debate scenarios line by line
//!
//! Usage:
//! ```bash
//! squad chat --session ridge
//! printf 'Hold the bridge\nResupply the team\n' | squad chat --ephemeral
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use squad_debate::DebateError;

use super::debate::{build_debate, print_outcome};
use super::{SessionArgs, SquadArgs, StoreArgs};
use crate::{print_error, print_info, print_warning};

const QUIT: &str = "/quit";

/// Arguments for the chat command
#[derive(Args)]
pub struct ChatArgs {
    #[command(flatten)]
    session: SessionArgs,

    #[command(flatten)]
    store: StoreArgs,

    #[command(flatten)]
    squad: SquadArgs,
}

/// Run the chat command
pub async fn run(args: ChatArgs) -> Result<()> {
    let mut debate = build_debate(&args.squad, &args.store).await?;
    let session = args.session.id();

    println!("{}", "🎖️  Squad Advisor".bold().cyan());
    println!("{}", "═".repeat(50).cyan());
    print_info(&format!(
        "Session {}. Describe a scenario, or {} to stop.",
        session.as_str().green(),
        QUIT.yellow()
    ));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut rounds = 0usize;
    loop {
        print!("\n{} ", "you>".bold().green());
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == QUIT {
            break;
        }

        match debate.conduct_debate(&session, input).await {
            Ok(outcome) => {
                print_outcome(debate.squad(), &outcome);
                rounds += 1;
            }
            Err(DebateError::Storage {
                source,
                unrecorded: Some(mut outcome),
            }) => {
                print_warning(&format!("Round not saved: {}", source));
                match debate.record(&mut outcome).await {
                    Ok(sequence) => {
                        print_info(&format!("Round saved on retry as #{}.", sequence));
                        rounds += 1;
                    }
                    Err(e) => print_error(&format!("Retry failed: {}", e)),
                }
                print_outcome(debate.squad(), &outcome);
            }
            Err(e) => print_error(&format!("Round abandoned: {}", e)),
        }
    }

    println!();
    print_info(&format!("{} round(s) recorded in session {}.", rounds, session));
    Ok(())
}
