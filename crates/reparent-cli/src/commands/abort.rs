//! `git reparent --abort` - give up and return to the starting position.

use anyhow::Result;
use reparent_core::{ReparentEngine, RestoredPosition};
use reparent_git::short_id;

use crate::commands::utils;
use crate::output;

/// Run the abort command.
pub fn run() -> Result<()> {
    let (repo, store) = utils::open_repo_and_state()?;
    let engine = ReparentEngine::new(&repo, &store);

    let outcome = engine.abort()?;

    if let Some(reason) = &outcome.cancel_failure {
        output::warn(&format!("Could not cancel the cherry-pick: {reason}"));
    }

    match outcome.restored {
        Some(RestoredPosition::Branch(branch)) => {
            output::success(&format!("Reparent aborted - back on '{branch}'"));
        }
        Some(RestoredPosition::Detached(oid)) => {
            output::success(&format!(
                "Reparent aborted - back at detached HEAD {}",
                short_id(oid)
            ));
        }
        None => {
            output::warn("Reparent state cleared, but the original position is unknown");
            output::detail("  Check out the branch you were on with `git checkout <branch>`");
        }
    }

    Ok(())
}
