//! Terminal output formatting utilities.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, bail};
use colored::Colorize;
use reparent_core::{Completion, ReplayOutcome, Suspension};
use reparent_git::short_id;

static QUIET_MODE: AtomicBool = AtomicBool::new(false);

/// Set quiet mode globally. Call once at startup.
pub fn set_quiet(quiet: bool) {
    QUIET_MODE.store(quiet, Ordering::Relaxed);
}

fn is_quiet() -> bool {
    QUIET_MODE.load(Ordering::Relaxed)
}

/// Print a success message (suppressed in quiet mode).
pub fn success(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "✓".green(), msg);
    }
}

/// Print an error message (always prints to stderr).
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a warning message (always prints to stderr).
pub fn warn(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

/// Print an info message (suppressed in quiet mode).
pub fn info(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "→".blue(), msg);
    }
}

/// Print a detail line without prefix (suppressed in quiet mode).
///
/// Use for indented detail lines that accompany info or warn messages.
pub fn detail(msg: &str) {
    if !is_quiet() {
        println!("{msg}");
    }
}

/// Print a horizontal line (suppressed in quiet mode).
pub fn hr() {
    if !is_quiet() {
        println!("{}", "─".repeat(50).dimmed());
    }
}

/// Report how a replay ended.
///
/// A suspension is printed with recovery steps and returned as an error so
/// the process exits non-zero.
pub fn report_replay(outcome: &ReplayOutcome) -> Result<()> {
    match outcome {
        ReplayOutcome::Completed(done) => {
            report_completion(done);
            Ok(())
        }
        ReplayOutcome::Suspended(stop) => {
            report_conflict(stop);
            bail!(
                "Stopped on conflicts at {} - resolve them and run `git reparent --continue`",
                short_id(stop.commit)
            );
        }
    }
}

fn report_completion(done: &Completion) {
    for commit in &done.skipped {
        warn(&format!(
            "Skipped {} - its changes are already on the new parent",
            short_id(*commit)
        ));
    }

    match &done.branch {
        Some(branch) => success(&format!(
            "Reparent complete - '{branch}' now points at {}",
            short_id(done.new_tip)
        )),
        None => success(&format!(
            "Reparent complete - detached HEAD at {}",
            short_id(done.new_tip)
        )),
    }
}

fn report_conflict(stop: &Suspension) {
    error(&format!(
        "Conflict while applying {} ({}/{})",
        short_id(stop.commit),
        stop.position,
        stop.total
    ));

    if !stop.files.is_empty() {
        detail("Conflicting files:");
        for file in &stop.files {
            detail(&format!("  {}", file.red()));
        }
        hr();
    }

    if stop.remaining > 0 {
        detail(&format!(
            "{} more commit(s) will be replayed after this one.",
            stop.remaining
        ));
    }
    detail("Resolve the conflicts, then run:");
    detail("  git add <resolved-files>");
    detail("  git reparent --continue      (commits the resolution for you)");
    detail("");
    detail("Or give up and go back with:");
    detail("  git reparent --abort");
}
