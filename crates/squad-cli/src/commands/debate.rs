//! Debate command - Run one round for a scenario
//!
//! Usage:
//! ```bash
//! squad debate "Secure the ridge before nightfall"
//! squad debate --session ridge --llm ollama "Hold until reinforcements arrive"
//! squad debate --json "Resupply the outpost"
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::{ColoredString, Colorize};

use squad_core::{Squad, Stance};
use squad_debate::{
    ConsensusStrength, DebateConfig, DebateError, DebateOutcome, DecisionOutcome, SquadDebate,
};

use super::{SessionArgs, SquadArgs, StoreArgs};
use crate::{print_error, print_warning};

/// Arguments for the debate command
#[derive(Args)]
pub struct DebateArgs {
    /// The scenario to debate
    #[arg(required = true, num_args = 1..)]
    scenario: Vec<String>,

    #[command(flatten)]
    session: SessionArgs,

    #[command(flatten)]
    store: StoreArgs,

    #[command(flatten)]
    squad: SquadArgs,

    /// Output the outcome as JSON
    #[arg(long)]
    json: bool,
}

/// Run the debate command
pub async fn run(args: DebateArgs) -> Result<()> {
    let mut debate = build_debate(&args.squad, &args.store).await?;
    let scenario = args.scenario.join(" ");
    let session = args.session.id();

    match debate.conduct_debate(&session, &scenario).await {
        Ok(outcome) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(debate.squad(), &outcome);
            }
            Ok(())
        }
        Err(DebateError::Storage {
            source,
            unrecorded: Some(outcome),
        }) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(debate.squad(), &outcome);
            }
            print_error("The decision above was not saved to the session history.");
            Err(source).context("Failed to record the round")
        }
        Err(e) => Err(e).context("Debate failed"),
    }
}

/// Assemble the squad, memory and configuration into a debate
pub async fn build_debate(squad: &SquadArgs, store: &StoreArgs) -> Result<SquadDebate> {
    let config = DebateConfig::from_env().context("Invalid debate configuration")?;
    let squad = squad.build()?;
    let memory = store.open().await?;
    if !memory.is_healthy().await {
        print_warning(&format!("Memory backend '{}' reports unhealthy", memory.name()));
    }
    Ok(SquadDebate::new(squad, memory, config))
}

/// Print every member's response, the decision and the consensus
pub fn print_outcome(squad: &Squad, outcome: &DebateOutcome) {
    println!();
    for opinion in &outcome.round.opinions {
        let (avatar, name) = squad
            .member(opinion.role)
            .map(|m| (m.profile().avatar.clone(), m.profile().name.clone()))
            .unwrap_or_else(|| ("•".to_string(), opinion.role.title().to_string()));

        println!(
            "{} {} {} {} {}",
            avatar,
            name.bold(),
            format!("({})", opinion.role.title()).dimmed(),
            stance_label(opinion.stance),
            format!("{:.0}%", opinion.confidence * 100.0).dimmed()
        );
        for line in opinion.rationale.lines() {
            println!("   {}", line);
        }
        println!();
    }

    let heading = match &outcome.decision.outcome {
        DecisionOutcome::Blocked { .. } => "⛔ Decision".red().bold(),
        DecisionOutcome::Amended { .. } => "📝 Decision (amended)".yellow().bold(),
        DecisionOutcome::Upheld | DecisionOutcome::Pending => "✅ Decision".green().bold(),
    };
    println!("{}", heading);
    println!("{}", "═".repeat(50).cyan());
    println!("{}", outcome.decision.text);
    println!();

    let strength = match outcome.consensus.strength {
        ConsensusStrength::High => outcome.consensus.strength.to_string().green(),
        ConsensusStrength::Moderate => outcome.consensus.strength.to_string().yellow(),
        ConsensusStrength::Low => outcome.consensus.strength.to_string().red(),
    };
    println!(
        "{} {} {}",
        "Consensus:".dimmed(),
        strength,
        format!("({})", outcome.consensus.consensus.protocol).dimmed()
    );
    println!("  {}", outcome.consensus.description);
    let recorded = match outcome.sequence {
        Some(sequence) => format!("#{}", sequence),
        None => "(not saved)".to_string(),
    };
    println!("{} {} {}", "Session:".dimmed(), outcome.round.session, recorded);
}

fn stance_label(stance: Stance) -> ColoredString {
    let label = format!("[{}]", stance);
    match stance {
        Stance::Support => label.green(),
        Stance::Challenge => label.yellow(),
        Stance::Neutral => label.blue(),
        Stance::Veto => label.red().bold(),
    }
}
