//! Forget command - Delete a session's history
//!
//! Usage:
//! ```bash
//! squad forget --session ridge
//! ```

use anyhow::{Context, Result};
use clap::Args;

use squad_core::SessionId;

use super::StoreArgs;
use crate::{print_info, print_success};

/// Arguments for the forget command
#[derive(Args)]
pub struct ForgetArgs {
    /// Session to delete
    #[arg(long, short = 's', env = "SQUAD_SESSION")]
    session: String,

    #[command(flatten)]
    store: StoreArgs,
}

/// Run the forget command
pub async fn run(args: ForgetArgs) -> Result<()> {
    let memory = args.store.open().await?;
    let session = SessionId::new(args.session.trim());

    let removed = memory
        .clear_session(&session)
        .await
        .with_context(|| format!("Failed to delete session '{}'", session))?;

    if removed == 0 {
        print_info(&format!("Session '{}' has no recorded turns.", session));
    } else {
        print_success(&format!("Deleted {} turn(s) from session '{}'.", removed, session));
    }
    Ok(())
}
