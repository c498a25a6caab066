//! `git reparent --continue` - resume after conflicts were resolved.

use anyhow::Result;
use reparent_core::ReparentEngine;

use crate::commands::utils;
use crate::output;

/// Run the continue command.
pub fn run() -> Result<()> {
    let (repo, store) = utils::open_repo_and_state()?;
    let engine = ReparentEngine::new(&repo, &store);

    output::info("Continuing reparent...");
    let outcome = engine.continue_()?;
    output::report_replay(&outcome)
}
