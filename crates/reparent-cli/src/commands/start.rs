//! `git reparent --parent <ref>` - start a reparent.
//!
//! Validates the request, optionally asks for confirmation and creates a
//! backup branch, then replays the selected commits onto the new parent.

use std::io::IsTerminal;

use anyhow::{Context, Result, anyhow, bail};
use chrono::Local;
use colored::Colorize;
use inquire::Confirm;
use reparent_core::{PlanOutcome, RangeSpec, ReparentEngine, ReparentPlan, ReparentRequest};
use reparent_git::{GitOps, create_backup_branch, short_id};

use crate::commands::utils;
use crate::output;

/// Options for starting a reparent.
#[derive(Debug)]
#[allow(clippy::struct_excessive_bools)] // CLI options map directly to flags
pub struct StartOptions {
    pub parent: String,
    pub range: RangeSpec,
    pub backup: bool,
    pub confirm: bool,
    pub no_branch: bool,
}

/// Run the start command.
pub fn run(opts: &StartOptions) -> Result<()> {
    let (repo, store) = utils::open_repo_and_state()?;
    let config = utils::load_config(&repo)?;
    let engine = ReparentEngine::new(&repo, &store);

    let request = ReparentRequest {
        parent: opts.parent.clone(),
        range: opts.range.clone(),
        no_branch: opts.no_branch,
    };

    let plan = match engine.plan(&request)? {
        PlanOutcome::NothingToReparent => {
            output::info("Nothing to reparent");
            return Ok(());
        }
        PlanOutcome::Ready(plan) => plan,
    };

    if (opts.confirm || config.general.confirm) && !confirm_plan(&repo, &plan)? {
        engine.discard_plan()?;
        output::info("Reparent cancelled");
        return Ok(());
    }

    if opts.backup || config.general.backup {
        let name = create_backup_branch(&repo, &config.backup.prefix, Local::now().date_naive())
            .map_err(|e| anyhow!("Failed to create backup branch: {e}"))?;
        output::success(&format!("Created backup branch '{name}'"));
    }

    output::info(&format!(
        "Reparenting {} commit(s) onto '{}' ({})",
        plan.commits.len(),
        plan.parent_ref,
        short_id(plan.parent)
    ));

    let outcome = engine.start(&plan)?;
    output::report_replay(&outcome)
}

/// Print the plan and ask whether to go ahead.
fn confirm_plan<G: GitOps>(git: &G, plan: &ReparentPlan) -> Result<bool> {
    if !std::io::stdin().is_terminal() {
        bail!("--confirm needs an interactive terminal");
    }

    output::detail("");
    output::detail(&"Reparent summary:".cyan().to_string());
    output::detail(&format!(
        "  Current branch:  {}",
        plan.original_branch.as_deref().unwrap_or("(detached HEAD)")
    ));
    output::detail(&format!(
        "  New parent:      {} ({})",
        plan.parent_ref,
        short_id(plan.parent)
    ));
    output::detail(&format!("  Commits to move: {}", plan.commits.len()));
    for (i, &commit) in plan.commits.iter().enumerate() {
        let summary = git.commit_summary(commit)?;
        output::detail(&format!("    {}. {} - {summary}", i + 1, short_id(commit)));
    }
    if plan.moves_branch() {
        output::detail("  The branch will be moved to the new location");
    } else {
        output::detail("  The result will be left on a detached HEAD");
    }
    output::detail("");

    let confirmed = Confirm::new("Proceed with reparent?")
        .with_default(false)
        .prompt()
        .context("Confirmation cancelled")?;

    Ok(confirmed)
}
