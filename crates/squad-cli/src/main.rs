//! Squad CLI - ask a five-member advisory squad for a decision
//!
//! # Usage
//!
//! ```bash
//! # One round
//! squad debate "Secure the ridge before nightfall"
//!
//! # Interactive session, one round per line
//! squad chat --session ridge
//!
//! # Look back at a session
//! squad history --session ridge --limit 5
//!
//! # Show the roster and configuration
//! squad info
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

mod commands;

use commands::{chat, debate, forget, history, info, sessions};

/// Squad - a five-member advisory squad
///
/// Every scenario is debated by the Leader, Tactical Planner, Medic,
/// Communications Specialist and Scout, then resolved into one decision.
#[derive(Parser)]
#[command(
    name = "squad",
    version,
    about = "Squad CLI - a debating advisory squad",
    long_about = "Each scenario is debated by five personalities in order of rank.\n\n\
                  The Medic can veto, confident challengers amend the Leader's call,\n\
                  and every round is recorded in the session history."
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Debate a single scenario
    #[command(name = "debate")]
    Debate(debate::DebateArgs),

    /// Debate scenarios read line by line from stdin
    #[command(name = "chat")]
    Chat(chat::ChatArgs),

    /// Show the recent turns of a session
    #[command(name = "history")]
    History(history::HistoryArgs),

    /// List recorded sessions
    #[command(name = "sessions")]
    Sessions(sessions::SessionsArgs),

    /// Delete a session's history
    #[command(name = "forget")]
    Forget(forget::ForgetArgs),

    /// Show the roster and configuration
    #[command(name = "info")]
    Info(info::InfoArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Debate(args) => debate::run(args).await,
        Commands::Chat(args) => chat::run(args).await,
        Commands::History(args) => history::run(args).await,
        Commands::Sessions(args) => sessions::run(args).await,
        Commands::Forget(args) => forget::run(args).await,
        Commands::Info(args) => info::run(args),
    }
}

/// Setup logging based on verbosity level
fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Print a success message with a checkmark
pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print an error message with an X
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("{} {}", "⚠".yellow().bold(), msg);
}

/// Print an info message
pub fn print_info(msg: &str) {
    println!("{} {}", "ℹ".blue().bold(), msg);
}
